//! Class palette: names and display colors.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opaque display color, serialized as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb(pub [u8; 3]);

/// Error for a color string that is not `#rrggbb`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid color '{0}', expected #rrggbb")]
pub struct ColorParseError(pub String);

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b])
    }

    pub fn to_render_color(self) -> sbat_render::Color {
        let [r, g, b] = self.0;
        sbat_render::Color::from_rgb8(r, g, b)
    }
}

impl FromStr for Rgb {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ColorParseError(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(err)?;
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(err());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| err());
        Ok(Self([channel(0)?, channel(2)?, channel(4)?]))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{:02x}{:02x}{:02x}", r, g, b)
    }
}

impl TryFrom<String> for Rgb {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(color: Rgb) -> Self {
        color.to_string()
    }
}

/// An annotation class with a name and color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDef {
    /// Display name of the class
    pub name: String,
    /// Outline color for boxes of this class
    pub color: Rgb,
}

impl ClassDef {
    pub fn new(name: impl Into<String>, color: Rgb) -> Self {
        Self {
            name: name.into(),
            color,
        }
    }
}

/// The built-in palette; class indices in label files address this list.
pub fn default_classes() -> Vec<ClassDef> {
    vec![
        ClassDef::new("Class 0", Rgb::new(0xff, 0x00, 0x00)),
        ClassDef::new("Class 1", Rgb::new(0x00, 0xff, 0x00)),
        ClassDef::new("Class 2", Rgb::new(0x00, 0x80, 0xff)),
        ClassDef::new("Class 3", Rgb::new(0xff, 0xff, 0x00)),
        ClassDef::new("Class 4", Rgb::new(0xff, 0x00, 0xff)),
    ]
}
