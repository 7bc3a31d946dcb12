use std::sync::Arc;

use crate::error::RenderError;

/// A decoded RGBA8 raster.
///
/// Cloning is cheap: the pixel buffer is shared, so the session, the render
/// pass and a pending crop request can all hold the same image.
#[derive(Clone, Debug)]
pub struct Raster {
    /// Straight (non-premultiplied) RGBA8 pixels, row major
    data: Arc<Vec<u8>>,
    width: u32,
    height: u32,
}

impl Raster {
    /// Create a raster from RGBA8 data.
    pub fn from_rgba8(data: Vec<u8>, width: u32, height: u32) -> Result<Self, RenderError> {
        Self::from_rgba8_arc(Arc::new(data), width, height)
    }

    /// Create a raster from Arc-wrapped RGBA8 data.
    pub fn from_rgba8_arc(
        data: Arc<Vec<u8>>,
        width: u32,
        height: u32,
    ) -> Result<Self, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidSize { width, height });
        }
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(RenderError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// A raster filled with a single color. Handy for tests and placeholders.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self, RenderError> {
        let pixels = width as usize * height as usize;
        let data = rgba.iter().copied().cycle().take(pixels * 4).collect();
        Self::from_rgba8(data, width, height)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether two handles share the same pixel buffer.
    pub fn ptr_eq(&self, other: &Raster) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}
