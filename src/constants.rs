//! Global constants for the SBAT application

/// Zoom factor applied per wheel step towards the user (zoom in)
pub const ZOOM_IN_FACTOR: f64 = 1.1;

/// Zoom factor applied per wheel step away from the user (zoom out)
pub const ZOOM_OUT_FACTOR: f64 = 0.9;

/// Smallest viewport scale a zoom step may reach
pub const MIN_SCALE: f64 = 1e-3;

/// Largest viewport scale a zoom step may reach
pub const MAX_SCALE: f64 = 1e3;

/// Box outline width in screen pixels, independent of zoom
pub const STROKE_WIDTH: f64 = 2.0;

/// Default score threshold sent with detection requests
pub const DEFAULT_DETECTION_THRESHOLD: f32 = 0.5;

/// Model identifier used when none is configured
pub const DEFAULT_MODEL: &str = "default";

/// Lower bound of the brightness/contrast sliders (percentage offset)
pub const ADJUSTMENT_MIN: f32 = -100.0;

/// Upper bound of the brightness/contrast sliders (percentage offset)
pub const ADJUSTMENT_MAX: f32 = 100.0;

/// Decimal digits written for normalized coordinates
pub const YOLO_PRECISION: usize = 6;

/// File extensions accepted by the image provider (compared case-insensitively)
pub const ACCEPTED_EXTENSIONS: &[&str] = &["tif", "tiff"];

/// Background color behind the raster (matches the viewer's dark backdrop)
pub const BACKGROUND_RGB: [u8; 3] = [0x11, 0x11, 0x11];

/// Outline color for boxes whose class index has no palette entry
pub const FALLBACK_CLASS_RGB: [u8; 3] = [0xb3, 0xb3, 0xb3];
