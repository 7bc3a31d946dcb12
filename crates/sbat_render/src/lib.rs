//! sbat_render - software rendering backend for the SBAT annotation viewport.
//!
//! Drawing is split in two steps: a [`Renderer`] records [`DrawCommand`]s,
//! and a [`Canvas`] executes them on a CPU pixmap.

mod adjustments;
mod canvas;
mod color;
mod error;
mod raster;
mod renderer;

pub use adjustments::ImageAdjustments;
pub use canvas::Canvas;
pub use color::Color;
pub use error::RenderError;
pub use raster::Raster;
pub use renderer::{Affine, DrawCommand, Rectangle, Renderer};
