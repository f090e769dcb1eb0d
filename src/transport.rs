use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use std::path::Path;

use crate::error::AnalyzeError;

/// Multipart field names the image is attached under. Receivers differ in
/// which one they read, so both carry the same file.
pub const UPLOAD_FIELDS: [&str; 2] = ["image", "file"];

/// An image ready to be uploaded.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Read an image from disk.
    ///
    /// The MIME type is sniffed from the file contents, falling back to the
    /// extension. Anything that is not `image/*` is rejected.
    pub fn from_path(path: &Path) -> Result<Self, AnalyzeError> {
        let bytes = std::fs::read(path).map_err(|source| AnalyzeError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mime_type = sniff_mime_type(&bytes)
            .or_else(|| mime_type_from_path(path))
            .unwrap_or("application/octet-stream");

        if !mime_type.starts_with("image/") {
            return Err(AnalyzeError::NotAnImage {
                path: path.to_path_buf(),
                mime_type: mime_type.to_string(),
            });
        }

        let file_name = path
            .file_name()
            .map(|f| f.to_string_lossy().to_string())
            .unwrap_or_else(|| "meal.jpg".to_string());

        Ok(Self {
            file_name,
            mime_type: mime_type.to_string(),
            bytes,
        })
    }

    fn part(&self) -> Result<Part, AnalyzeError> {
        Part::bytes(self.bytes.clone())
            .file_name(self.file_name.clone())
            .mime_str(&self.mime_type)
            .map_err(AnalyzeError::Transport)
    }

    fn form(&self) -> Result<Form, AnalyzeError> {
        let mut form = Form::new();
        for field in UPLOAD_FIELDS {
            form = form.part(field, self.part()?);
        }
        Ok(form)
    }
}

/// MIME type from the file's magic bytes.
fn sniff_mime_type(bytes: &[u8]) -> Option<&'static str> {
    image::guess_format(bytes)
        .ok()
        .map(|format| format.to_mime_type())
}

/// MIME type from the file extension.
pub fn mime_type_from_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    let mime = match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "heic" => "image/heic",
        "heif" => "image/heif",
        "avif" => "image/avif",
        _ => return None,
    };
    Some(mime)
}

/// Something that turns a meal photo into raw nutrition JSON.
///
/// [`WebhookClient`] is the only implementation shipped; the trait is the seam
/// the front ends and tests depend on.
#[async_trait::async_trait]
pub trait NutritionAnalyzer: Send + Sync {
    /// Display name for logs.
    fn name(&self) -> &str;
    /// Send the image and return the service's JSON, whatever its shape.
    async fn analyze(&self, image: &ImageUpload) -> Result<Value, AnalyzeError>;
}

/// Posts meal photos to the configured webhook.
///
/// One request per call: no retries, no timeout.
///
/// # Example
///
/// ```rust,no_run
/// use meal_lens::transport::{ImageUpload, NutritionAnalyzer, WebhookClient};
/// use std::path::Path;
///
/// # async fn example() -> Result<(), meal_lens::error::AnalyzeError> {
/// let client = WebhookClient::new("https://n8n.example.com/webhook/meal");
/// let image = ImageUpload::from_path(Path::new("lunch.jpg"))?;
/// let raw = client.analyze(&image).await?;
/// println!("{raw:#}");
/// # Ok(())
/// # }
/// ```
pub struct WebhookClient {
    url: String,
    client: Client,
}

impl WebhookClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: Client::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Upload the image and parse the response body as JSON.
    pub async fn submit_image(&self, image: &ImageUpload) -> Result<Value, AnalyzeError> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err(AnalyzeError::Configuration);
        }

        log::info!(
            "Sending {} ({} bytes, {}) to webhook",
            image.file_name,
            image.bytes.len(),
            image.mime_type
        );

        let resp = self
            .client
            .post(url)
            .multipart(image.form()?)
            .send()
            .await
            .map_err(|e| AnalyzeError::from_send(url, e))?;

        let status = resp.status();
        log::debug!("Webhook response status: {status}");
        log::debug!("Webhook response headers: {:?}", resp.headers());

        if !status.is_success() {
            return Err(AnalyzeError::HttpStatus {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let text = resp.text().await.map_err(AnalyzeError::Transport)?;
        log::debug!("Raw webhook response:\n{text}");

        let json: Value = serde_json::from_str(&text)?;
        Ok(json)
    }
}

#[async_trait::async_trait]
impl NutritionAnalyzer for WebhookClient {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn analyze(&self, image: &ImageUpload) -> Result<Value, AnalyzeError> {
        self.submit_image(image).await
    }
}
