//! Request and response types exchanged with external services.
//!
//! Field names match the JSON bodies of the conversion/detection backend.

use serde::{Deserialize, Serialize};

use sbat_render::Raster;

use crate::constants::DEFAULT_MODEL;
use crate::model::{BoundingBox, ImageSize};

/// A decoded raster ready for display.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub raster: Raster,
    pub size: ImageSize,
    /// Identifier the image was loaded from; crop requests refer to it.
    pub source: String,
}

/// Reply to a successful upload/conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub converted_url: String,
}

/// Pixel-space crop of the current source image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRequest {
    pub filename: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

fn round_px(value: f64) -> u32 {
    // `as` saturates, so huge values clamp to u32::MAX.
    value.round().max(0.0) as u32
}

impl CropRequest {
    /// Round a normalized image-space region to whole pixels.
    pub fn from_region(filename: impl Into<String>, region: &BoundingBox) -> Self {
        Self {
            filename: filename.into(),
            x: round_px(region.x),
            y: round_px(region.y),
            width: round_px(region.w),
            height: round_px(region.h),
        }
    }
}

/// Ask the detector for boxes on the current image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRequest {
    pub threshold: f32,
    pub model: String,
}

impl DetectionRequest {
    /// The threshold is clamped into `[0, 1]`; NaN becomes 0.
    pub fn new(threshold: f32, model: impl Into<String>) -> Self {
        let threshold = if threshold.is_nan() {
            0.0
        } else {
            threshold.clamp(0.0, 1.0)
        };
        Self {
            threshold,
            model: model.into(),
        }
    }
}

impl Default for DetectionRequest {
    fn default() -> Self {
        Self::new(crate::constants::DEFAULT_DETECTION_THRESHOLD, DEFAULT_MODEL)
    }
}

/// Detector output: normalized lines plus the dimensions they refer to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionResponse {
    pub annotations: String,
    pub image_width: u32,
    pub image_height: u32,
}

/// Package the current labels for download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRequest {
    pub yolo_data: String,
    pub original_filename: String,
}
