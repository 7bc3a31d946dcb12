//! Normalized box format ("YOLO format") import/export.
//!
//! One annotation per line: `class cx cy w h`, where the spatial values are
//! fractions of the image width/height and `(cx, cy)` is the box center.
//! Import also accepts a sixth, ignored confidence field.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sbat::format::yolo;
//!
//! let text = yolo::export_boxes(store.boxes(), size);
//! let decoded = yolo::import(&text, size);
//! store.replace_all(decoded.boxes);
//! ```

mod error;
pub mod yolo;

#[cfg(test)]
mod tests;

pub use error::{FormatError, FormatWarning};
pub use yolo::{Decoded, ImportReport, LineGrammar};
