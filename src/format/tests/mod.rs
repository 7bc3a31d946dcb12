//! Scenario tests for the label codec.


use crate::model::ImageSize;

/// Tolerance for one unit in the 6th decimal of a normalized value,
/// expressed in pixels of an image side of `side` pixels.
fn pixel_tolerance(side: u32) -> f64 {
    0.5e-6 * f64::from(side) * 2.0
}

fn size(w: u32, h: u32) -> ImageSize {
    ImageSize::new(w, h).expect("test sizes are non-zero")
}
