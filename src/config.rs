use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::AnalyzeError;

/// Environment variable that overrides `webhook.url`.
pub const WEBHOOK_URL_ENV: &str = "MEAL_LENS_WEBHOOK_URL";

/// Top-level configuration.
///
/// Only the webhook endpoint is required. It is usually supplied through the
/// environment (or a `.env` file) rather than written to disk:
///
/// ```rust,no_run
/// use meal_lens::config::Config;
///
/// let config = Config::load(None).unwrap().with_env_overrides();
/// match config.webhook_url() {
///     Ok(url) => println!("Sending meals to {url}"),
///     Err(e) => eprintln!("{e}"),
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub webhook: WebhookConfig,
}

/// The external analysis service.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WebhookConfig {
    /// Endpoint that receives the multipart upload. Empty means "not configured".
    #[serde(default)]
    pub url: String,
}

impl Config {
    /// Resolve the config file path, in the same directory as the executable.
    pub fn config_path() -> Result<PathBuf> {
        let exe_path = std::env::current_exe().context("Failed to get executable path")?;
        let exe_dir = exe_path
            .parent()
            .context("Failed to get executable directory")?;
        Ok(exe_dir.join("config.json"))
    }

    /// Load config from the given path, or from the default location.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if !config_path.exists() {
            log::warn!(
                "Config file not found at {}. Using defaults.",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;
        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Save config to the given path, or to the default location.
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, contents).context("Failed to write config file")?;
        log::info!("Config saved to {}", config_path.display());
        Ok(())
    }

    /// Apply [`WEBHOOK_URL_ENV`] if it is set and non-empty.
    pub fn with_env_overrides(self) -> Self {
        let env_url = std::env::var(WEBHOOK_URL_ENV).ok();
        self.with_url_override(env_url)
    }

    /// Replace the webhook URL when `url` holds something other than whitespace.
    pub fn with_url_override(mut self, url: Option<String>) -> Self {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            self.webhook.url = url;
        }
        self
    }

    /// The configured webhook URL, trimmed.
    pub fn webhook_url(&self) -> Result<&str, AnalyzeError> {
        let url = self.webhook.url.trim();
        if url.is_empty() {
            Err(AnalyzeError::Configuration)
        } else {
            Ok(url)
        }
    }
}
