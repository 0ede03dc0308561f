//! Conversion options configuration.

use crate::geometry::DEFAULT_DPI;
use crate::model::Color;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Built-in defaults used when no level of the inheritance chain supplies a
/// value.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackStyle {
    /// Font family when no run, placeholder, master or theme names one
    pub font_family: String,

    /// Font size in points
    pub font_size: f64,

    /// Text color
    pub text_color: Color,

    /// Substituted for color references that cannot be resolved
    pub unresolved_color: Color,

    /// Slide background when no level defines one
    pub background: Color,

    /// Slide size in EMU when the presentation part does not declare one
    pub slide_size: (i64, i64),
}

impl Default for FallbackStyle {
    fn default() -> Self {
        Self {
            font_family: "Calibri".to_string(),
            font_size: 18.0,
            text_color: Color::BLACK,
            unresolved_color: Color::MID_GRAY,
            background: Color::WHITE,
            slide_size: (12_192_000, 6_858_000),
        }
    }
}

/// Options for converting a presentation.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Target pixel density for EMU conversion; always finite and positive
    dpi: f64,

    /// Promote the first error diagnostic to a fatal error
    pub strict: bool,

    /// Build slides on the rayon thread pool
    pub parallel: bool,

    /// Built-in style defaults
    pub fallback: FallbackStyle,

    /// Checked before each slide is built
    pub cancellation: Option<CancellationToken>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            dpi: DEFAULT_DPI,
            strict: false,
            parallel: true,
            fallback: FallbackStyle::default(),
            cancellation: None,
        }
    }
}

impl ConvertOptions {
    /// Create new convert options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Target pixel density.
    pub fn dpi(&self) -> f64 {
        self.dpi
    }

    /// Set the target DPI. Non-positive values keep the default.
    pub fn with_dpi(mut self, dpi: f64) -> Self {
        if dpi.is_finite() && dpi > 0.0 {
            self.dpi = dpi;
        }
        self
    }

    /// Enable strict mode.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Build slides in parallel.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Replace the built-in style defaults.
    pub fn with_fallback(mut self, fallback: FallbackStyle) -> Self {
        self.fallback = fallback;
        self
    }

    /// Attach a cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }
}

/// Shared flag for cancelling a running conversion between slides.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
