//! `[Content_Types].xml` parsing and part classification.

use crate::xml::{ns, Element};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const SLIDE_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";
pub const SLIDE_LAYOUT_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml";
pub const SLIDE_MASTER_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml";
pub const THEME_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.theme+xml";
pub const PRESENTATION_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";

/// Classification of a package part by its declared content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PartKind {
    Slide,
    SlideLayout,
    SlideMaster,
    Theme,
    Media,
    Other,
}

impl PartKind {
    /// Classify a content type string.
    pub fn from_content_type(content_type: &str) -> Self {
        let ct = content_type.trim().to_ascii_lowercase();
        match ct.as_str() {
            c if c == SLIDE_CONTENT_TYPE.to_ascii_lowercase() => PartKind::Slide,
            c if c == SLIDE_LAYOUT_CONTENT_TYPE.to_ascii_lowercase() => PartKind::SlideLayout,
            c if c == SLIDE_MASTER_CONTENT_TYPE.to_ascii_lowercase() => PartKind::SlideMaster,
            c if c == THEME_CONTENT_TYPE.to_ascii_lowercase() => PartKind::Theme,
            c if c.starts_with("image/") || c.starts_with("audio/") || c.starts_with("video/") => {
                PartKind::Media
            }
            _ => PartKind::Other,
        }
    }
}

/// Content-type declarations of a package.
///
/// Overrides are keyed by part name (no leading slash, ASCII lower-case);
/// defaults by lower-case extension.
#[derive(Debug, Clone, Default)]
pub struct ContentTypes {
    defaults: HashMap<String, String>,
    overrides: HashMap<String, String>,
}

impl ContentTypes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a parsed `[Content_Types].xml` root.
    ///
    /// Returns `None` when the root is not a `Types` element.
    pub fn from_element(root: &Element) -> Option<Self> {
        if !root.is(ns::CONTENT_TYPES, "Types") {
            return None;
        }

        let mut types = ContentTypes::new();
        for el in root.elements() {
            if el.is(ns::CONTENT_TYPES, "Default") {
                if let (Some(ext), Some(ct)) = (el.attr("Extension"), el.attr("ContentType")) {
                    types.add_default(ext, ct);
                }
            } else if el.is(ns::CONTENT_TYPES, "Override") {
                if let (Some(part), Some(ct)) = (el.attr("PartName"), el.attr("ContentType")) {
                    types.add_override(part, ct);
                }
            }
        }
        Some(types)
    }

    pub fn add_default(&mut self, extension: &str, content_type: &str) {
        self.defaults.insert(
            extension.trim_start_matches('.').to_ascii_lowercase(),
            content_type.to_string(),
        );
    }

    pub fn add_override(&mut self, part_name: &str, content_type: &str) {
        self.overrides
            .insert(normalize_part_name(part_name), content_type.to_string());
    }

    /// Resolve a part's content type: Override first, then Default by extension.
    pub fn resolve(&self, part_name: &str) -> Option<&str> {
        let key = normalize_part_name(part_name);
        if let Some(ct) = self.overrides.get(&key) {
            return Some(ct.as_str());
        }
        let file = key.rsplit('/').next().unwrap_or(&key);
        let (_, ext) = file.rsplit_once('.')?;
        self.defaults.get(ext).map(|s| s.as_str())
    }

    /// Classify a part; parts without a content type are `Other`.
    pub fn classify(&self, part_name: &str) -> PartKind {
        self.resolve(part_name)
            .map(PartKind::from_content_type)
            .unwrap_or(PartKind::Other)
    }
}

fn normalize_part_name(name: &str) -> String {
    name.trim_start_matches('/').to_ascii_lowercase()
}
