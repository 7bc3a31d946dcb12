//! Data models for SBAT.

mod annotation;
mod category;
mod image;

pub use annotation::{Annotation, BoundingBox, BoxId};
pub use category::{ClassDef, ColorParseError, Rgb, default_classes};
pub use image::ImageSize;
