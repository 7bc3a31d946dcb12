//! Error types for external collaborators.

use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

/// Errors reported by image, crop, detection and export services.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Source rejected before any load was attempted
    #[error("Unsupported file '{name}': only .tif and .tiff images are accepted")]
    UnsupportedExtension { name: String },

    /// Non-success response carrying the server's explanation
    #[error("Server error: {message}")]
    Server { message: String },

    /// I/O error while reading a local source
    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The source could not be decoded into a raster
    #[error("Failed to decode '{name}': {message}")]
    Decode { name: String, message: String },

    /// Malformed request, e.g. a crop region outside the image
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// No backend is configured for this kind of request
    #[error("No {0} service is configured")]
    Unavailable(&'static str),

    /// The background worker is gone
    #[error("Service worker disconnected")]
    Disconnected,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

impl ServiceError {
    /// Build a [`ServiceError::Server`] from a failed response body.
    ///
    /// Bodies of the form `{"error": "..."}` yield the server message;
    /// anything else is passed through as text.
    pub fn from_response_body(body: &[u8]) -> Self {
        let message = match serde_json::from_slice::<ErrorBody>(body) {
            Ok(parsed) => parsed.error,
            Err(_) => {
                let text = String::from_utf8_lossy(body).trim().to_string();
                if text.is_empty() {
                    "empty response".to_string()
                } else {
                    text
                }
            }
        };
        Self::Server { message }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
