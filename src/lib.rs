//! SBAT - Scientific Box Annotation Tool
//!
//! The interactive core of a bounding-box annotator for large scientific
//! images: a pan/zoom [`viewport`], a pointer [`gesture`] state machine, an
//! ordered annotation [`store`], the normalized label [`format`], and a
//! [`session`] that ties them to external [`services`] and the software
//! [`render`] pass.

pub mod config;
pub mod constants;
pub mod format;
pub mod gesture;
pub mod model;
pub mod render;
pub mod services;
pub mod session;
pub mod store;
pub mod viewport;

pub use config::AppConfig;
pub use session::{Session, SessionError};
