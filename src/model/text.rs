//! Text body, paragraph and run models.

use super::style::Font;
use serde::{Deserialize, Serialize};

/// Text alignment within a paragraph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
    Distributed,
}

impl TextAlignment {
    /// Parse an `algn` attribute value.
    pub fn from_ooxml(value: &str) -> Option<Self> {
        match value {
            "l" => Some(TextAlignment::Left),
            "ctr" => Some(TextAlignment::Center),
            "r" => Some(TextAlignment::Right),
            "just" | "justLow" => Some(TextAlignment::Justify),
            "dist" | "thaiDist" => Some(TextAlignment::Distributed),
            _ => None,
        }
    }
}

/// Vertical anchoring of text inside its shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAnchor {
    #[default]
    Top,
    Middle,
    Bottom,
}

impl VerticalAnchor {
    pub fn from_ooxml(value: &str) -> Option<Self> {
        match value {
            "t" => Some(VerticalAnchor::Top),
            "ctr" | "dist" | "just" => Some(VerticalAnchor::Middle),
            "b" => Some(VerticalAnchor::Bottom),
            _ => None,
        }
    }
}

/// Paragraph bullet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Bullet {
    /// A literal bullet character.
    Char { char: String },
    /// An automatic numbering scheme such as `arabicPeriod`.
    AutoNumber { scheme: String, start_at: u32 },
}

/// Inner margins of a text body, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Insets {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

/// A run of text with one resolved font.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    pub font: Font,

    /// Hyperlink URL (if this run is a link)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hyperlink: Option<String>,

    /// An explicit line break (`a:br`) rather than text.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub line_break: bool,
}

/// A paragraph of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    /// Outline level (0 = top level).
    #[serde(default)]
    pub level: u8,

    #[serde(default)]
    pub alignment: TextAlignment,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bullet: Option<Bullet>,

    #[serde(default)]
    pub runs: Vec<TextRun>,
}

impl Paragraph {
    /// Concatenated text, with line breaks as `\n`.
    pub fn plain_text(&self) -> String {
        self.runs
            .iter()
            .map(|r| if r.line_break { "\n" } else { r.text.as_str() })
            .collect()
    }

    /// Whether any run carries text.
    pub fn has_text(&self) -> bool {
        self.runs.iter().any(|r| !r.text.is_empty())
    }
}

/// The text content of a shape or table cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBody {
    pub paragraphs: Vec<Paragraph>,
    pub anchor: VerticalAnchor,
    pub insets: Insets,
    /// Whether lines wrap at the shape boundary.
    pub wrap: bool,
}

impl TextBody {
    pub fn plain_text(&self) -> String {
        self.paragraphs
            .iter()
            .map(|p| p.plain_text())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// At least one run with non-empty text.
    pub fn has_text(&self) -> bool {
        self.paragraphs.iter().any(|p| p.has_text())
    }
}
