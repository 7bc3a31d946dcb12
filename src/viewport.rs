//! Pan/zoom transform between screen space and image space.
//!
//! `screen = offset + scale * image`. Zoom steps keep the scale inside
//! [`ZoomLimits`], so it stays strictly positive and far from the
//! subnormal range where the inverse mapping overflows.

use serde::{Deserialize, Serialize};

use crate::constants::{MAX_SCALE, MIN_SCALE};

/// Inclusive range a zoom step may move the scale into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomLimits {
    pub min_scale: f64,
    pub max_scale: f64,
}

impl ZoomLimits {
    /// Returns `None` unless `0 < min_scale <= max_scale` and both are finite.
    pub fn new(min_scale: f64, max_scale: f64) -> Option<Self> {
        let valid = min_scale.is_finite()
            && max_scale.is_finite()
            && min_scale > 0.0
            && min_scale <= max_scale;
        valid.then_some(Self {
            min_scale,
            max_scale,
        })
    }
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self {
            min_scale: MIN_SCALE,
            max_scale: MAX_SCALE,
        }
    }
}

/// Represents the pan/zoom state of the annotation canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    scale: f64,
    offset_x: f64,
    offset_y: f64,
}

impl Viewport {
    /// Create a viewport with the given scale and offset.
    ///
    /// Returns `None` if `scale` is not a finite positive number.
    pub fn new(scale: f64, offset_x: f64, offset_y: f64) -> Option<Self> {
        (scale.is_finite() && scale > 0.0).then_some(Self {
            scale,
            offset_x,
            offset_y,
        })
    }

    /// Identity transform (scale 1, no offset).
    pub fn identity() -> Self {
        Self {
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }

    /// Scale and center an image of `image_w x image_h` inside a surface of
    /// `surface_w x surface_h`.
    pub fn fit(image_w: f64, image_h: f64, surface_w: f64, surface_h: f64) -> Self {
        if image_w <= 0.0 || image_h <= 0.0 || surface_w <= 0.0 || surface_h <= 0.0 {
            return Self::identity();
        }
        let scale = (surface_w / image_w).min(surface_h / image_h);
        Self {
            scale,
            offset_x: (surface_w - image_w * scale) / 2.0,
            offset_y: (surface_h - image_h * scale) / 2.0,
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn offset(&self) -> (f64, f64) {
        (self.offset_x, self.offset_y)
    }

    /// Map a screen-space point to image space.
    pub fn screen_to_image(&self, sx: f64, sy: f64) -> (f64, f64) {
        (
            (sx - self.offset_x) / self.scale,
            (sy - self.offset_y) / self.scale,
        )
    }

    /// Map an image-space point to screen space.
    pub fn image_to_screen(&self, ix: f64, iy: f64) -> (f64, f64) {
        (
            ix * self.scale + self.offset_x,
            iy * self.scale + self.offset_y,
        )
    }

    /// Move the image by a screen-space delta. Unbounded.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.offset_x += dx;
        self.offset_y += dy;
    }

    /// Zoom by `factor` within the default [`ZoomLimits`].
    pub fn zoom_at(&mut self, screen_x: f64, screen_y: f64, factor: f64) {
        self.zoom_within(screen_x, screen_y, factor, ZoomLimits::default());
    }

    /// Zoom by `factor` keeping the image point under `(screen_x, screen_y)`
    /// fixed on screen.
    ///
    /// The resulting scale is clamped to `limits`; a step never moves the
    /// scale in the direction opposite to `factor`, even when the current
    /// scale already lies outside the limits. The scale is updated first,
    /// then the offset is corrected by the drift of the anchor point measured
    /// with the new scale and the old offset.
    pub fn zoom_within(&mut self, screen_x: f64, screen_y: f64, factor: f64, limits: ZoomLimits) {
        if !(factor.is_finite() && factor > 0.0) {
            log::warn!("Ignoring invalid zoom factor {}", factor);
            return;
        }

        let target = self.scale * factor;
        let new_scale = if factor >= 1.0 {
            target.min(limits.max_scale).max(self.scale)
        } else {
            target.max(limits.min_scale).min(self.scale)
        };
        if new_scale == self.scale {
            return;
        }

        let before = self.screen_to_image(screen_x, screen_y);
        self.scale = new_scale;
        let after = self.screen_to_image(screen_x, screen_y);

        self.offset_x += (after.0 - before.0) * self.scale;
        self.offset_y += (after.1 - before.1) * self.scale;
    }

    /// Back to the identity transform.
    pub fn reset(&mut self) {
        *self = Self::identity();
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::identity()
    }
}
