//! Table model structures.

use super::style::Fill;
use super::text::TextBody;
use serde::{Deserialize, Serialize};

/// A cell in a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// Cell content
    pub text: TextBody,

    /// Horizontal span (gridSpan)
    #[serde(default = "default_span", skip_serializing_if = "is_default_span")]
    pub col_span: u32,

    /// Vertical span (rowSpan)
    #[serde(default = "default_span", skip_serializing_if = "is_default_span")]
    pub row_span: u32,

    /// Covered by a horizontal span to its left
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub h_merge: bool,

    /// Covered by a vertical span above
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub v_merge: bool,

    #[serde(default)]
    pub fill: Fill,
}

fn default_span() -> u32 {
    1
}

fn is_default_span(n: &u32) -> bool {
    *n == 1
}

/// A row in a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// Height in pixels
    pub height: f64,
    pub cells: Vec<Cell>,
}

/// A table from an `a:tbl` graphic frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Grid column widths in pixels
    pub columns: Vec<f64>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
