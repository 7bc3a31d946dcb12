//! Configuration file support for SBAT.
//!
//! Settings are stored as pretty-printed JSON with a format version, so files
//! written by a newer release are rejected instead of half-read.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{
    ADJUSTMENT_MAX, ADJUSTMENT_MIN, DEFAULT_DETECTION_THRESHOLD, DEFAULT_MODEL, MAX_SCALE,
    MIN_SCALE, STROKE_WIDTH, ZOOM_IN_FACTOR, ZOOM_OUT_FACTOR,
};
use crate::model::{ClassDef, default_classes};
use crate::viewport::ZoomLimits;

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version of the configuration file format
    pub version: u32,

    /// Application name (for identification)
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// User preferences
    #[serde(default)]
    pub preferences: UserPreferences,

    /// Class palette; label files address it by index
    #[serde(default = "default_classes")]
    pub classes: Vec<ClassDef>,

    /// Slider limits for the image filter
    #[serde(default)]
    pub adjustments: AdjustmentRanges,
}

fn default_app_name() -> String {
    "SBAT".to_string()
}

/// User preferences section of the config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Viewport scale multiplier per wheel step up
    #[serde(default = "default_zoom_in_factor")]
    pub zoom_in_factor: f64,

    /// Viewport scale multiplier per wheel step down
    #[serde(default = "default_zoom_out_factor")]
    pub zoom_out_factor: f64,

    /// Smallest scale reachable with the wheel
    #[serde(default = "default_min_zoom")]
    pub min_zoom: f64,

    /// Largest scale reachable with the wheel
    #[serde(default = "default_max_zoom")]
    pub max_zoom: f64,

    /// Box outline width in screen pixels
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f64,

    /// Score threshold sent with detection requests
    #[serde(default = "default_detection_threshold")]
    pub detection_threshold: f32,

    /// Detector model identifier
    #[serde(default = "default_model")]
    pub model: String,
}

fn default_zoom_in_factor() -> f64 {
    ZOOM_IN_FACTOR
}

fn default_zoom_out_factor() -> f64 {
    ZOOM_OUT_FACTOR
}

fn default_min_zoom() -> f64 {
    MIN_SCALE
}

fn default_max_zoom() -> f64 {
    MAX_SCALE
}

fn default_stroke_width() -> f64 {
    STROKE_WIDTH
}

fn default_detection_threshold() -> f32 {
    DEFAULT_DETECTION_THRESHOLD
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            zoom_in_factor: default_zoom_in_factor(),
            zoom_out_factor: default_zoom_out_factor(),
            min_zoom: default_min_zoom(),
            max_zoom: default_max_zoom(),
            stroke_width: default_stroke_width(),
            detection_threshold: default_detection_threshold(),
            model: default_model(),
        }
    }
}

/// Inclusive bounds of one slider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SliderRange {
    pub min: f32,
    pub max: f32,
}

impl SliderRange {
    /// NaN counts as 0. Never panics, even for an inverted range.
    pub fn clamp(&self, value: f32) -> f32 {
        let value = if value.is_nan() { 0.0 } else { value };
        value.max(self.min).min(self.max)
    }
}

impl UserPreferences {
    /// Wheel zoom bounds, or the defaults if the configured pair is unusable.
    pub fn zoom_limits(&self) -> ZoomLimits {
        ZoomLimits::new(self.min_zoom, self.max_zoom).unwrap_or_default()
    }
}

impl Default for SliderRange {
    fn default() -> Self {
        Self {
            min: ADJUSTMENT_MIN,
            max: ADJUSTMENT_MAX,
        }
    }
}

/// Brightness/contrast slider limits (percentage offsets from 100%).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AdjustmentRanges {
    #[serde(default)]
    pub brightness: SliderRange,
    #[serde(default)]
    pub contrast: SliderRange,
}

impl AppConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            app_name: default_app_name(),
            preferences: UserPreferences::default(),
            classes: default_classes(),
            adjustments: AdjustmentRanges::default(),
        }
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize and validate configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        config.validate()?;
        Ok(config)
    }

    /// Check values serde can not constrain.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let prefs = &self.preferences;
        for (name, factor) in [
            ("zoom_in_factor", prefs.zoom_in_factor),
            ("zoom_out_factor", prefs.zoom_out_factor),
            ("stroke_width", prefs.stroke_width),
        ] {
            if !(factor.is_finite() && factor > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "{} must be a positive number, got {}",
                    name, factor
                )));
            }
        }
        if ZoomLimits::new(prefs.min_zoom, prefs.max_zoom).is_none() {
            return Err(ConfigError::Invalid(format!(
                "zoom range {}..{} is invalid",
                prefs.min_zoom, prefs.max_zoom
            )));
        }
        if self.classes.is_empty() {
            return Err(ConfigError::Invalid("at least one class is required".to_string()));
        }
        for (name, range) in [
            ("brightness", self.adjustments.brightness),
            ("contrast", self.adjustments.contrast),
        ] {
            // The filter factor is (100 + value) / 100 and must stay non-negative.
            if !(range.min <= range.max && range.min >= -100.0) {
                return Err(ConfigError::Invalid(format!(
                    "{} range {}..{} is invalid",
                    name, range.min, range.max
                )));
            }
        }
        Ok(())
    }

    /// Get the default filename for the config file.
    pub fn default_filename() -> &'static str {
        "sbat-config.json"
    }

    /// Get the default config file path for auto-load/save.
    pub fn default_path() -> Option<PathBuf> {
        // Try to use XDG config directory, fall back to home directory
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join("sbat").join(Self::default_filename()))
        } else {
            dirs::home_dir().map(|home_dir| {
                home_dir
                    .join(".config")
                    .join("sbat")
                    .join(Self::default_filename())
            })
        }
    }

    /// Load configuration from an explicit path.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Try to load configuration from the default path.
    /// Returns None if the file doesn't exist or can't be read.
    pub fn load_from_default_path() -> Option<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return None;
        }

        match Self::load_from_path(&path) {
            Ok(config) => Some(config),
            Err(e) => {
                log::warn!("Failed to load config file {:?}: {}", path, e);
                None
            }
        }
    }

    /// Save configuration to `path`, creating parent directories.
    pub fn save_to_path(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = self.to_json()?;
        std::fs::write(path, json)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// Semantically invalid value
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Rgb;

    #[test]
    fn test_default_roundtrip() {
        let config = AppConfig::new();
        let json = config.to_json().unwrap();
        assert_eq!(AppConfig::from_json(&json).unwrap(), config);
        assert!(json.contains("\"#ff0000\""));
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config = AppConfig::from_json(r#"{"version": 1}"#).unwrap();
        assert_eq!(config.app_name, "SBAT");
        assert_eq!(config.preferences.zoom_in_factor, 1.1);
        assert_eq!(config.preferences.zoom_out_factor, 0.9);
        assert_eq!(config.preferences.stroke_width, 2.0);
        assert_eq!(config.classes.len(), 5);
        assert_eq!(config.adjustments.brightness.min, -100.0);
    }

    #[test]
    fn test_partial_preferences() {
        let config = AppConfig::from_json(
            r##"{"version": 1, "preferences": {"log_level": "debug", "model": "cells-v2"},
                "classes": [{"name": "Nucleus", "color": "#00ff00"}]}"##,
        )
        .unwrap();
        assert_eq!(config.preferences.log_level, LogLevel::Debug);
        assert_eq!(config.preferences.model, "cells-v2");
        assert_eq!(config.preferences.detection_threshold, 0.5);
        assert_eq!(config.classes, vec![ClassDef::new("Nucleus", Rgb::new(0, 255, 0))]);
    }

    #[test]
    fn test_zoom_limits_from_preferences() {
        let config = AppConfig::from_json(
            r#"{"version": 1, "preferences": {"min_zoom": 0.25, "max_zoom": 8.0}}"#,
        )
        .unwrap();
        assert_eq!(config.preferences.zoom_limits(), ZoomLimits::new(0.25, 8.0).unwrap());
        assert_eq!(UserPreferences::default().zoom_limits(), ZoomLimits::default());
    }

    #[test]
    fn test_version_too_new() {
        let err = AppConfig::from_json(r#"{"version": 99}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::VersionTooNew {
                file_version: 99,
                supported_version: CONFIG_VERSION
            }
        ));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let zero_zoom = r#"{"version": 1, "preferences": {"zoom_in_factor": 0.0}}"#;
        assert!(matches!(AppConfig::from_json(zero_zoom), Err(ConfigError::Invalid(_))));

        let no_classes = r#"{"version": 1, "classes": []}"#;
        assert!(matches!(AppConfig::from_json(no_classes), Err(ConfigError::Invalid(_))));

        let inverted = r#"{"version": 1, "adjustments": {"contrast": {"min": 10, "max": -10}}}"#;
        assert!(matches!(AppConfig::from_json(inverted), Err(ConfigError::Invalid(_))));

        let inverted_zoom = r#"{"version": 1, "preferences": {"min_zoom": 5.0, "max_zoom": 2.0}}"#;
        assert!(matches!(AppConfig::from_json(inverted_zoom), Err(ConfigError::Invalid(_))));

        let bad_color = r#"{"version": 1, "classes": [{"name": "a", "color": "red"}]}"#;
        assert!(matches!(AppConfig::from_json(bad_color), Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_slider_clamp() {
        let range = SliderRange::default();
        assert_eq!(range.clamp(250.0), 100.0);
        assert_eq!(range.clamp(-250.0), -100.0);
        assert_eq!(range.clamp(12.5), 12.5);
        assert_eq!(range.clamp(f32::NAN), 0.0);
    }

    #[test]
    fn test_save_and_load_path() {
        let path = std::env::temp_dir()
            .join(format!("sbat-config-test-{}", std::process::id()))
            .join(AppConfig::default_filename());
        let mut config = AppConfig::new();
        config.preferences.stroke_width = 3.5;
        config.save_to_path(&path).unwrap();
        let loaded = AppConfig::load_from_path(&path).unwrap();
        if let Some(dir) = path.parent() {
            std::fs::remove_dir_all(dir).ok();
        }
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_log_level_mapping() {
        assert_eq!(LogLevel::default().to_level_filter(), log::LevelFilter::Info);
        assert_eq!(LogLevel::Trace.to_level_filter(), log::LevelFilter::Trace);
    }
}
