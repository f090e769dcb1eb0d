use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong between picking an image and getting JSON back
/// from the analysis webhook.
///
/// Normalizing the returned JSON never fails, so there is no variant for it.
#[derive(Error, Debug)]
pub enum AnalyzeError {
    /// No webhook URL configured. Nothing was sent.
    #[error(
        "No webhook URL configured. Set MEAL_LENS_WEBHOOK_URL (or webhook.url in config.json)."
    )]
    Configuration,

    /// The request never got a response. From the caller's side this looks
    /// the same as the receiving service refusing our origin.
    #[error(
        "Could not reach the webhook at {url}. Make sure the service is up and accepts requests from this origin: {source}"
    )]
    CrossOrigin {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Any other network-level failure.
    #[error("Webhook request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// The webhook answered with a non-2xx status.
    #[error("Webhook request failed with status {status}: {status_text}")]
    HttpStatus { status: u16, status_text: String },

    /// The response body was not JSON.
    #[error("Webhook response is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The selected file is not an image.
    #[error("{path} is not an image ({mime_type})")]
    NotAnImage { path: PathBuf, mime_type: String },
}

impl AnalyzeError {
    /// Classify a reqwest error raised while sending the request.
    pub(crate) fn from_send(url: &str, err: reqwest::Error) -> Self {
        if err.is_connect() {
            Self::CrossOrigin {
                url: url.to_string(),
                source: err,
            }
        } else {
            Self::Transport(err)
        }
    }
}
