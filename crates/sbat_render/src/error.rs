//! Error types for the rendering backend.

use thiserror::Error;

/// Errors that can occur while building rasters or executing draw commands.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Pixel buffer length does not match `width * height * 4`
    #[error("Raster data size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        /// Expected buffer length
        expected: usize,
        /// Actual buffer length
        actual: usize,
    },

    /// Requested surface or raster has a zero dimension
    #[error("Invalid surface size {width}x{height}")]
    InvalidSize {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
    },

    /// PopTransform without a matching PushTransform
    #[error("Transform stack underflow")]
    TransformUnderflow,

    /// PNG encoding failed
    #[error("PNG encoding failed: {0}")]
    Encode(String),
}
