//! Resolved slide and shape models.

use super::style::StyleContext;
use super::table::Table;
use super::text::TextBody;
use crate::diagnostics::Diagnostic;
use crate::geometry::Geometry;
use serde::Serialize;

/// Placeholder identity of a shape (`p:ph`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaceholderRef {
    /// Placeholder type; `obj` when the `type` attribute is absent.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idx: Option<u32>,
}

impl PlaceholderRef {
    pub const DEFAULT_KIND: &'static str = "obj";

    pub fn new(kind: Option<&str>, idx: Option<u32>) -> Self {
        Self {
            kind: kind.unwrap_or(Self::DEFAULT_KIND).to_string(),
            idx,
        }
    }
}

/// What a shape is, with its kind-specific content.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ShapeKind {
    /// A shape whose text body holds at least one non-empty run.
    TextBox { text: TextBody },
    Picture {
        /// Media part name.
        media: String,
        #[serde(rename = "contentType", skip_serializing_if = "Option::is_none")]
        content_type: Option<String>,
    },
    /// A preset or custom geometry shape, or a connector.
    AutoShape {
        #[serde(skip_serializing_if = "Option::is_none")]
        preset: Option<String>,
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        connector: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        text: Option<TextBody>,
    },
    Group { children: Vec<ResolvedShape> },
    Table { table: Table },
    /// Content that could not be modelled; `reason` says why.
    Unsupported { element: String, reason: String },
}

impl ShapeKind {
    pub fn name(&self) -> &'static str {
        match self {
            ShapeKind::TextBox { .. } => "textBox",
            ShapeKind::Picture { .. } => "picture",
            ShapeKind::AutoShape { .. } => "autoShape",
            ShapeKind::Group { .. } => "group",
            ShapeKind::Table { .. } => "table",
            ShapeKind::Unsupported { .. } => "unsupported",
        }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, ShapeKind::Unsupported { .. })
    }
}

/// A shape with absolute geometry and fully resolved style.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedShape {
    pub id: u32,
    pub name: String,
    /// Slide-wide paint order, starting at 0.
    pub z_order: usize,
    pub geometry: Geometry,
    pub style: StyleContext,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<PlaceholderRef>,
    pub kind: ShapeKind,
}

impl ResolvedShape {
    /// This shape followed by every nested group child, in paint order.
    pub fn flatten(&self) -> Vec<&ResolvedShape> {
        let mut out = vec![self];
        if let ShapeKind::Group { children } = &self.kind {
            for child in children {
                out.extend(child.flatten());
            }
        }
        out
    }
}

/// One slide, ready for HTML emission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlideModel {
    /// Zero-based position in the presentation.
    pub index: usize,
    /// One-based slide number.
    pub number: usize,
    pub part_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout_part: Option<String>,
    /// Slide width in pixels.
    pub width: f64,
    /// Slide height in pixels.
    pub height: f64,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub hidden: bool,
    /// The slide part could not be read; `shapes` is empty.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub degraded: bool,
    pub background: StyleContext,
    pub shapes: Vec<ResolvedShape>,
    pub diagnostics: Vec<Diagnostic>,
}

impl SlideModel {
    /// Every shape including group children, in paint order.
    pub fn all_shapes(&self) -> Vec<&ResolvedShape> {
        self.shapes.iter().flat_map(|s| s.flatten()).collect()
    }

    /// Concatenated text of all text boxes and shapes with text.
    pub fn plain_text(&self) -> String {
        self.all_shapes()
            .into_iter()
            .filter_map(|shape| match &shape.kind {
                ShapeKind::TextBox { text } => Some(text.plain_text()),
                ShapeKind::AutoShape {
                    text: Some(text), ..
                } => Some(text.plain_text()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
