//! Structured, non-fatal conversion diagnostics.

use serde::Serialize;
use std::fmt;

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// Diagnostic codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticCode {
    /// A part or shape was not well-formed.
    XmlParseFailed,
    /// A theme part could not be loaded.
    ThemeResolveFailed,
    /// Content the model cannot represent, or an unresolved reference.
    UnsupportedFeature,
    /// Content that a renderer has to rasterize.
    RasterizedFallback,
    /// A relationship points at a part absent from the package.
    MissingPart,
}

impl DiagnosticCode {
    /// Stable numeric code, e.g. `W3001`.
    pub fn code(&self) -> &'static str {
        match self {
            DiagnosticCode::XmlParseFailed => "E3001",
            DiagnosticCode::ThemeResolveFailed => "E3002",
            DiagnosticCode::UnsupportedFeature => "W3001",
            DiagnosticCode::RasterizedFallback => "W3002",
            DiagnosticCode::MissingPart => "W3003",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DiagnosticCode::XmlParseFailed => "XML_PARSE_FAILED",
            DiagnosticCode::ThemeResolveFailed => "THEME_RESOLVE_FAILED",
            DiagnosticCode::UnsupportedFeature => "UNSUPPORTED_FEATURE",
            DiagnosticCode::RasterizedFallback => "RASTERIZED_FALLBACK",
            DiagnosticCode::MissingPart => "MISSING_PART",
        }
    }
}

/// Where a diagnostic applies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Location {
    /// Zero-based slide index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slide: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub part: Option<String>,
}

impl Location {
    pub fn part(part: impl Into<String>) -> Self {
        Self {
            part: Some(part.into()),
            ..Self::default()
        }
    }

    pub fn slide(index: usize) -> Self {
        Self {
            slide: Some(index),
            ..Self::default()
        }
    }

    pub fn with_shape(mut self, shape_id: u32) -> Self {
        self.shape_id = Some(shape_id);
        self
    }

    pub fn with_part(mut self, part: impl Into<String>) -> Self {
        self.part = Some(part.into());
        self
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(slide) = self.slide {
            parts.push(format!("slide {}", slide + 1));
        }
        if let Some(id) = self.shape_id {
            parts.push(format!("shape {}", id));
        }
        if let Some(part) = &self.part {
            parts.push(part.clone());
        }
        write!(f, "{}", parts.join(", "))
    }
}

/// A recoverable issue found during conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: DiagnosticCode,
    pub message: String,
    pub location: Location,
}

impl Diagnostic {
    pub fn new(
        severity: Severity,
        code: DiagnosticCode,
        message: impl Into<String>,
        location: Location,
    ) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            location,
        }
    }

    pub fn warning(code: DiagnosticCode, message: impl Into<String>, location: Location) -> Self {
        Self::new(Severity::Warning, code, message, location)
    }

    pub fn error(code: DiagnosticCode, message: impl Into<String>, location: Location) -> Self {
        Self::new(Severity::Error, code, message, location)
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{} {}] {} ({})",
            self.code.code(),
            self.code.name(),
            self.message,
            self.location
        )
    }
}

/// Accumulates diagnostics in the order they are recorded.
///
/// Identical diagnostics are kept; each one stands for a distinct location.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, diagnostic: Diagnostic) {
        log::warn!("{}", diagnostic);
        self.entries.push(diagnostic);
    }

    pub fn warn(&mut self, code: DiagnosticCode, message: impl Into<String>, location: Location) {
        self.record(Diagnostic::warning(code, message, location));
    }

    pub fn error(&mut self, code: DiagnosticCode, message: impl Into<String>, location: Location) {
        self.record(Diagnostic::error(code, message, location));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// Take every recorded diagnostic, oldest first.
    pub fn drain(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.entries)
    }
}

impl Extend<Diagnostic> for Diagnostics {
    fn extend<T: IntoIterator<Item = Diagnostic>>(&mut self, iter: T) {
        for diagnostic in iter {
            self.record(diagnostic);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_preserves_order_without_dedup() {
        let mut diags = Diagnostics::new();
        let loc = Location::slide(0).with_shape(4);
        diags.warn(DiagnosticCode::UnsupportedFeature, "chart", loc.clone());
        diags.error(DiagnosticCode::XmlParseFailed, "bad xfrm", loc.clone());
        diags.warn(DiagnosticCode::UnsupportedFeature, "chart", loc);

        let drained = diags.drain();
        assert_eq!(drained.len(), 3);
        assert_eq!(drained[0], drained[2]);
        assert_eq!(drained[1].code, DiagnosticCode::XmlParseFailed);
        assert!(diags.is_empty());
        assert!(diags.drain().is_empty());
    }

    #[test]
    fn test_codes() {
        assert_eq!(DiagnosticCode::UnsupportedFeature.code(), "W3001");
        assert_eq!(DiagnosticCode::MissingPart.name(), "MISSING_PART");
    }

    #[test]
    fn test_display() {
        let d = Diagnostic::warning(
            DiagnosticCode::MissingPart,
            "image not found",
            Location::slide(2).with_part("ppt/media/image9.png"),
        );
        assert_eq!(
            d.to_string(),
            "[W3003 MISSING_PART] image not found (slide 3, ppt/media/image9.png)"
        );
    }

    #[test]
    fn test_serialize() {
        let d = Diagnostic::error(
            DiagnosticCode::XmlParseFailed,
            "oops",
            Location::part("ppt/slides/slide1.xml"),
        );
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["severity"], "error");
        assert_eq!(json["code"], "XML_PARSE_FAILED");
        assert_eq!(json["location"]["part"], "ppt/slides/slide1.xml");
        assert!(json["location"].get("slide").is_none());
    }
}
