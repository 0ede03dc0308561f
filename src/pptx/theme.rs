//! Theme parts: color scheme, font scheme and format scheme.

use super::style::{FillSpec, LineSpec};
use crate::model::Color;
use crate::relationships::PartRels;
use crate::xml::{ns, Element};
use std::collections::HashMap;

/// The twelve color slots of a theme color scheme.
pub const SCHEME_SLOTS: [&str; 12] = [
    "dk1", "lt1", "dk2", "lt2", "accent1", "accent2", "accent3", "accent4", "accent5", "accent6",
    "hlink", "folHlink",
];

/// Theme information extracted from a theme part.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    /// Theme name
    pub name: String,
    colors: HashMap<String, Color>,
    /// Major (heading) latin typeface
    pub major_font: Option<String>,
    /// Minor (body) latin typeface
    pub minor_font: Option<String>,
    pub fill_styles: Vec<FillSpec>,
    pub line_styles: Vec<LineSpec>,
    pub bg_fill_styles: Vec<FillSpec>,
}

impl Theme {
    /// Parse a theme without relationship context.
    pub fn from_element(root: &Element) -> Result<Self, String> {
        Self::parse(root, PartRels::detached())
    }

    /// Parse an `a:theme` root.
    ///
    /// Missing sections leave the corresponding lists empty; only a wrong
    /// root element is an error.
    pub fn parse(root: &Element, rels: PartRels<'_>) -> Result<Self, String> {
        if !root.is(ns::A, "theme") {
            return Err(format!("expected a:theme root, found {}", root.name()));
        }

        let name = root.attr("name").unwrap_or_default().to_string();
        let elements = root.child(ns::A, "themeElements");

        let mut colors = HashMap::new();
        if let Some(scheme) = elements.and_then(|e| e.child(ns::A, "clrScheme")) {
            for slot in scheme.elements() {
                if !SCHEME_SLOTS.contains(&slot.local_name()) {
                    continue;
                }
                if let Some(color) = slot.elements().find_map(scheme_slot_color) {
                    colors.insert(slot.local_name().to_string(), color);
                }
            }
        }

        let font_scheme = elements.and_then(|e| e.child(ns::A, "fontScheme"));
        let latin = |which: &str| {
            font_scheme
                .and_then(|f| f.child(ns::A, which))
                .and_then(|f| f.child(ns::A, "latin"))
                .and_then(|l| l.attr("typeface"))
                .filter(|t| !t.is_empty())
                .map(str::to_string)
        };

        let format = elements.and_then(|e| e.child(ns::A, "fmtScheme"));
        let fill_list = |list: &str| -> Vec<FillSpec> {
            format
                .and_then(|f| f.child(ns::A, list))
                .map(|l| {
                    l.elements()
                        .map(|el| FillSpec::from_element(el, rels).unwrap_or(FillSpec::NoFill))
                        .collect()
                })
                .unwrap_or_default()
        };
        let line_styles = format
            .and_then(|f| f.child(ns::A, "lnStyleLst"))
            .map(|l| {
                l.children_named(ns::A, "ln")
                    .map(|ln| LineSpec::from_element(ln, rels))
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            name,
            colors,
            major_font: latin("majorFont"),
            minor_font: latin("minorFont"),
            fill_styles: fill_list("fillStyleLst"),
            line_styles,
            bg_fill_styles: fill_list("bgFillStyleLst"),
        })
    }

    /// Color of a scheme slot (`accent1`, `dk1`, ...).
    pub fn color(&self, slot: &str) -> Option<Color> {
        self.colors.get(slot).copied()
    }

    /// Fill style by 1-based index; 1001 and above index the background list.
    pub fn fill_style(&self, idx: u32) -> Option<&FillSpec> {
        match idx {
            0 => None,
            1..=999 => self.fill_styles.get(idx as usize - 1),
            _ => self.bg_fill_styles.get(idx.checked_sub(1001)? as usize),
        }
    }

    /// Line style by 1-based index.
    pub fn line_style(&self, idx: u32) -> Option<&LineSpec> {
        if idx == 0 {
            return None;
        }
        self.line_styles.get(idx as usize - 1)
    }
}

fn scheme_slot_color(el: &Element) -> Option<Color> {
    match el.local_name() {
        "srgbClr" => el.attr("val").and_then(Color::from_hex),
        "sysClr" => el
            .attr("lastClr")
            .and_then(Color::from_hex)
            .or_else(|| match el.attr("val") {
                Some("windowText") => Some(Color::BLACK),
                Some("window") => Some(Color::WHITE),
                _ => None,
            }),
        _ => None,
    }
}
