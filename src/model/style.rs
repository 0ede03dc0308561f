//! Resolved style values: colors, fills, lines and fonts.

use crate::options::FallbackStyle;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// An sRGB color with alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub alpha: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(0xFF, 0xFF, 0xFF);
    /// Substituted for color references that cannot be resolved.
    pub const MID_GRAY: Color = Color::rgb(0x80, 0x80, 0x80);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            r,
            g,
            b,
            alpha: 0xFF,
        }
    }

    pub fn with_alpha(mut self, alpha: u8) -> Self {
        self.alpha = alpha;
        self
    }

    /// Parse `RRGGBB` or `RRGGBBAA`, with or without a leading `#`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if !hex.is_ascii() || (hex.len() != 6 && hex.len() != 8) {
            return None;
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        let alpha = if hex.len() == 8 { byte(6)? } else { 0xFF };
        Some(Self {
            r: byte(0)?,
            g: byte(2)?,
            b: byte(4)?,
            alpha,
        })
    }

    /// `#RRGGBB`, or `#RRGGBBAA` when not fully opaque.
    pub fn to_hex(&self) -> String {
        if self.alpha == 0xFF {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            format!(
                "#{:02X}{:02X}{:02X}{:02X}",
                self.r, self.g, self.b, self.alpha
            )
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Color::from_hex(&hex)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid color: {}", hex)))
    }
}

/// A gradient stop; `position` runs from 0 to 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    pub position: f64,
    pub color: Color,
}

/// A resolved fill.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Fill {
    #[default]
    None,
    Solid {
        color: Color,
    },
    Gradient {
        stops: Vec<GradientStop>,
        /// Direction in degrees, clockwise from left-to-right.
        angle: f64,
    },
    Picture {
        /// Media part name.
        media: String,
    },
}

impl Fill {
    pub fn solid(color: Color) -> Self {
        Fill::Solid { color }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Fill::None)
    }

    /// The color of a solid fill.
    pub fn color(&self) -> Option<Color> {
        match self {
            Fill::Solid { color } => Some(*color),
            _ => None,
        }
    }
}

/// A resolved outline. A line with [`Fill::None`] is not drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    /// Width in pixels.
    pub width: f64,
    pub fill: Fill,
    /// Preset dash name (`solid`, `dash`, `sysDot`, ...).
    pub dash: String,
}

impl Default for Line {
    fn default() -> Self {
        Self {
            width: 0.0,
            fill: Fill::None,
            dash: "solid".to_string(),
        }
    }
}

/// A resolved font.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Font {
    pub family: String,
    /// Size in points.
    pub size: f64,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub color: Color,
}

/// Fully resolved style of one shape.
///
/// Every property has a value; absent properties at every level are filled
/// from the configured defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleContext {
    pub fill: Fill,
    pub line: Line,
    pub font: Font,
    /// Name of the theme whose color scheme resolved the colors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_scheme: Option<String>,
}

impl StyleContext {
    /// The style of a shape for which no level defines anything.
    pub fn defaults(fallback: &FallbackStyle) -> Self {
        Self {
            fill: Fill::None,
            line: Line::default(),
            font: Font {
                family: fallback.font_family.clone(),
                size: fallback.font_size,
                bold: false,
                italic: false,
                underline: false,
                color: fallback.text_color,
            },
            color_scheme: None,
        }
    }
}
