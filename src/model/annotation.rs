//! Bounding box annotation types.

use serde::{Deserialize, Serialize};

/// Unique identifier for an annotation, assigned by the store.
pub type BoxId = u64;

/// An axis-aligned box in image space with its class index.
///
/// `w`/`h` may be negative while a drag is in progress; boxes held by the
/// store are always normalized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Top-left corner X coordinate
    pub x: f64,
    /// Top-left corner Y coordinate
    pub y: f64,
    /// Width of the box
    pub w: f64,
    /// Height of the box
    pub h: f64,
    /// Index into the class palette
    pub class: usize,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, w: f64, h: f64, class: usize) -> Self {
        Self { x, y, w, h, class }
    }

    /// Flip negative extents so the box covers the same rectangle with a
    /// top-left origin. A box that is already non-negative is unchanged.
    pub fn normalized(self) -> Self {
        let mut b = self;
        if b.w < 0.0 {
            b.w = -b.w;
            b.x -= b.w;
        }
        if b.h < 0.0 {
            b.h = -b.h;
            b.y -= b.h;
        }
        b
    }

    /// Get the center point of the box.
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Inclusive point-in-box test.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.x + self.w && y >= self.y && y <= self.y + self.h
    }

    /// Same geometry, different class.
    pub fn with_class(mut self, class: usize) -> Self {
        self.class = class;
        self
    }
}

/// A box held by the annotation store.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: BoxId,
    pub bbox: BoundingBox,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_is_noop_for_positive_extent() {
        let b = BoundingBox::new(10.0, 20.0, 30.0, 40.0, 1);
        assert_eq!(b.normalized(), b);
    }

    #[test]
    fn test_normalized_flips_negative_extent() {
        // Drag from (300, 200) back to (100, 100).
        let b = BoundingBox::new(300.0, 200.0, -200.0, -100.0, 0).normalized();
        assert_eq!(b, BoundingBox::new(100.0, 100.0, 200.0, 100.0, 0));
    }

    #[test]
    fn test_normalized_covers_same_rectangle() {
        let raw = BoundingBox::new(50.0, 50.0, -20.0, 10.0, 3);
        let n = raw.normalized();
        assert_eq!(n.x, 30.0);
        assert_eq!(n.w, 20.0);
        assert_eq!(n.y, 50.0);
        assert_eq!(n.h, 10.0);
        assert_eq!(n.class, 3);
        assert_eq!(n.normalized(), n);
    }

    #[test]
    fn test_contains_edges() {
        let b = BoundingBox::new(10.0, 10.0, 100.0, 100.0, 0);
        assert!(b.contains(50.0, 50.0));
        assert!(b.contains(10.0, 10.0));
        assert!(b.contains(110.0, 110.0));
        assert!(!b.contains(5.0, 50.0));
        assert!(!b.contains(50.0, 110.5));
    }

    #[test]
    fn test_center() {
        let b = BoundingBox::new(0.0, 0.0, 500.0, 250.0, 2);
        assert_eq!(b.center(), (250.0, 125.0));
    }
}
