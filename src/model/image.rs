use serde::{Deserialize, Serialize};

/// Pixel dimensions of the loaded raster. Both sides are non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawImageSize")]
pub struct ImageSize {
    width: u32,
    height: u32,
}

#[derive(Deserialize)]
struct RawImageSize {
    width: u32,
    height: u32,
}

impl TryFrom<RawImageSize> for ImageSize {
    type Error = String;

    fn try_from(raw: RawImageSize) -> Result<Self, Self::Error> {
        ImageSize::new(raw.width, raw.height)
            .ok_or_else(|| format!("invalid image size {}x{}", raw.width, raw.height))
    }
}

impl ImageSize {
    /// Returns `None` if either dimension is zero.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        (width > 0 && height > 0).then_some(Self { width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn width_f64(&self) -> f64 {
        f64::from(self.width)
    }

    pub fn height_f64(&self) -> f64 {
        f64::from(self.height)
    }

    /// Whether an image-space point lies within `[0, W] x [0, H]`.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        (0.0..=self.width_f64()).contains(&x) && (0.0..=self.height_f64()).contains(&y)
    }

    /// Clamp an image-space point into `[0, W] x [0, H]`.
    pub fn clamp(&self, x: f64, y: f64) -> (f64, f64) {
        (
            x.clamp(0.0, self.width_f64()),
            y.clamp(0.0, self.height_f64()),
        )
    }
}
