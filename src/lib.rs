//! # pptx2html
//!
//! PowerPoint (.pptx) ingestion and layout resolution for HTML slide emission.
//!
//! The crate opens a PresentationML package, resolves the relationship graph
//! between slides, layouts, masters and themes, and produces one fully
//! resolved [`SlideModel`] per slide: absolute pixel geometry, RGB colors,
//! concrete fonts and text, and a paint order. Problems that affect only part
//! of a deck are reported as [`Diagnostic`]s instead of failing the whole
//! conversion.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pptx2html::{convert_file, ConvertOptions};
//!
//! let conversion = convert_file("deck.pptx", &ConvertOptions::default())?;
//! for slide in &conversion.slides {
//!     println!("slide {}: {} shapes", slide.number, slide.shapes.len());
//! }
//! for diagnostic in &conversion.diagnostics {
//!     eprintln!("{}", diagnostic);
//! }
//! # Ok::<(), pptx2html::Error>(())
//! ```
//!
//! ## Options
//!
//! ```no_run
//! use pptx2html::{ConvertOptions, Converter};
//!
//! let options = ConvertOptions::default().with_dpi(144.0).with_strict(true);
//! let conversion = Converter::open("deck.pptx")?.convert(&options)?;
//! let json = pptx2html::render::to_json_default(&conversion)?;
//! # Ok::<(), pptx2html::Error>(())
//! ```

pub mod container;
pub mod content_types;
pub mod diagnostics;
pub mod error;
pub mod geometry;
pub mod model;
pub mod options;
pub mod pptx;
pub mod relationships;
pub mod render;
pub mod xml;

#[cfg(test)]
mod test_support;

// Re-exports
pub use container::Package;
pub use diagnostics::{Diagnostic, DiagnosticCode, Location, Severity};
pub use error::{Error, ErrorCode, Result};
pub use geometry::Geometry;
pub use model::{
    Color, Fill, Font, Line, MediaAsset, PlaceholderRef, ResolvedShape, ShapeKind, SlideModel,
    StyleContext, Table, TextBody,
};
pub use options::{CancellationToken, ConvertOptions, FallbackStyle};
pub use pptx::{Conversion, Converter};

use std::path::Path;

/// Convert a presentation file.
///
/// # Example
///
/// ```no_run
/// use pptx2html::{convert_file, ConvertOptions};
///
/// let conversion = convert_file("deck.pptx", &ConvertOptions::default())?;
/// println!("Slides: {}", conversion.slide_count());
/// # Ok::<(), pptx2html::Error>(())
/// ```
pub fn convert_file(path: impl AsRef<Path>, options: &ConvertOptions) -> Result<Conversion> {
    Converter::open(path)?.convert(options)
}

/// Convert a presentation held in memory.
///
/// # Example
///
/// ```no_run
/// use pptx2html::{convert_bytes, ConvertOptions};
///
/// let data = std::fs::read("deck.pptx")?;
/// let conversion = convert_bytes(data, &ConvertOptions::default())?;
/// # Ok::<(), pptx2html::Error>(())
/// ```
pub fn convert_bytes(data: impl Into<Vec<u8>>, options: &ConvertOptions) -> Result<Conversion> {
    Converter::from_bytes(data.into())?.convert(options)
}

/// Plain text of every slide, one block per slide.
pub fn extract_text(path: impl AsRef<Path>) -> Result<String> {
    let conversion = convert_file(path, &ConvertOptions::default())?;
    Ok(conversion
        .slides
        .iter()
        .map(SlideModel::plain_text)
        .collect::<Vec<_>>()
        .join("\n\n"))
}
