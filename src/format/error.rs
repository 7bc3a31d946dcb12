//! Error types for label format operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading or writing label data.
#[derive(Error, Debug)]
pub enum FormatError {
    /// I/O error during file operations
    #[error("IO error on {path:?}: {source}")]
    Io {
        /// File being read or written
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Image dimensions unusable for normalized conversion
    #[error("Invalid image dimensions {width}x{height}: both sides must be non-zero")]
    InvalidDimensions {
        /// Reported width
        width: u32,
        /// Reported height
        height: u32,
    },
}

impl FormatError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// A line that was skipped during import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatWarning {
    /// 1-based line number in the input
    pub line: usize,
    /// Human-readable reason
    pub message: String,
}

impl FormatWarning {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}
