use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::AnalyzeError;
use crate::nutrition::{self, NutritionData};
use crate::transport::{self, ImageUpload, NutritionAnalyzer, WebhookClient};

/// Build the webhook client from configuration.
///
/// Fails with [`AnalyzeError::Configuration`] when no URL is set, before any
/// request could be attempted.
pub fn build_analyzer(config: &Config) -> Result<WebhookClient, AnalyzeError> {
    let url = config.webhook_url()?;
    Ok(WebhookClient::new(url))
}

/// Read one meal photo, send it off, and normalize what comes back.
///
/// # Example
///
/// ```rust,no_run
/// use meal_lens::analysis::{analyze_path, build_analyzer};
/// use meal_lens::config::Config;
/// use std::path::Path;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::load(None)?.with_env_overrides();
/// let analyzer = build_analyzer(&config)?;
///
/// let data = analyze_path(Path::new("dinner.jpg"), &analyzer).await?;
/// println!("{}: {} kcal", data.meal_name, data.calories);
/// # Ok(())
/// # }
/// ```
pub async fn analyze_path(
    path: &Path,
    analyzer: &dyn NutritionAnalyzer,
) -> Result<NutritionData, AnalyzeError> {
    let image = ImageUpload::from_path(path)?;
    analyze_upload(&image, analyzer).await
}

pub async fn analyze_upload(
    image: &ImageUpload,
    analyzer: &dyn NutritionAnalyzer,
) -> Result<NutritionData, AnalyzeError> {
    let raw = analyzer.analyze(image).await?;
    log::debug!("{} returned: {raw:#}", analyzer.name());
    Ok(nutrition::normalize(&raw))
}

/// Collect image files from the given paths.
///
/// Files named directly are always kept and checked on upload. Directories
/// are walked recursively (following symlinks) and only files with an image
/// extension are picked up. Missing paths are skipped with a
/// warning.
pub fn collect_images(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut images = Vec::new();

    for path in paths {
        if path.is_file() {
            // Named explicitly: the upload sniffs the contents and rejects non-images.
            images.push(path.clone());
        } else if path.is_dir() {
            for entry in WalkDir::new(path)
                .follow_links(true)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let p = entry.path();
                if p.is_file() && is_supported_image(p) {
                    images.push(p.to_path_buf());
                }
            }
        } else {
            log::warn!("Path does not exist: {}", path.display());
        }
    }

    images
}

fn is_supported_image(path: &Path) -> bool {
    transport::mime_type_from_path(path).is_some()
}

/// Transient view state: the current result and whether a request is out.
///
/// At most one analysis runs at a time. Nothing here outlives the process.
#[derive(Debug, Default)]
pub struct AnalysisSession {
    result: Option<NutritionData>,
    analyzing: bool,
}

/// How an analysis ended, for the caller to surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ready,
    Failed,
}

impl Outcome {
    /// The one-line message shown to the user. Error details go to the log only.
    pub fn message(self) -> &'static str {
        match self {
            Outcome::Ready => "Your nutrition breakdown is ready!",
            Outcome::Failed => "Oops! Something went wrong. Try again?",
        }
    }
}

impl AnalysisSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_analyzing(&self) -> bool {
        self.analyzing
    }

    pub fn result(&self) -> Option<&NutritionData> {
        self.result.as_ref()
    }

    /// Mark a request as started. Returns `false` if one is already running.
    pub fn begin(&mut self) -> bool {
        if self.analyzing {
            return false;
        }
        self.analyzing = true;
        true
    }

    /// Record how the running request ended and clear the in-flight flag.
    ///
    /// A failure keeps the previous result (if any) and leaves the session
    /// ready for another attempt.
    pub fn finish(&mut self, outcome: Result<NutritionData, AnalyzeError>) -> Outcome {
        self.analyzing = false;
        match outcome {
            Ok(data) => {
                log::info!("Analysis complete: {}", data.meal_name);
                self.result = Some(data);
                Outcome::Ready
            }
            Err(e) => {
                log::error!("Analysis error: {e}");
                Outcome::Failed
            }
        }
    }

    /// Drop the current result.
    pub fn reset(&mut self) {
        self.result = None;
    }
}
