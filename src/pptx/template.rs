//! Layout and master parts: placeholder index, background, color map and
//! text styles.
//!
//! A [`TemplatePart`] is built once per layout or master and shared by every
//! slide that inherits from it.

use super::color::{ColorMap, ColorSpec};
use super::style::{FillSpec, StyleFragment};
use super::text::{BodyProps, ListStyle};
use super::theme::Theme;
use crate::diagnostics::{DiagnosticCode, Diagnostics, Location};
use crate::geometry::Xfrm;
use crate::model::PlaceholderRef;
use crate::relationships::{PartId, PartRels};
use crate::xml::{ns, Element};

/// A placeholder shape on a layout or master.
#[derive(Debug, Clone)]
pub struct PlaceholderEntry {
    pub placeholder: PlaceholderRef,
    pub xfrm: Option<Xfrm>,
    /// Fill, line and first-level font from the shape itself.
    pub fragment: StyleFragment,
    /// Fragment from the shape's `p:style` theme references.
    pub style_refs: Option<StyleFragment>,
    pub list_style: ListStyle,
    pub body: BodyProps,
}

/// `p:txStyles` of a master.
#[derive(Debug, Clone, Default)]
pub struct TextStyles {
    pub title: ListStyle,
    pub body: ListStyle,
    pub other: ListStyle,
}

impl TextStyles {
    fn from_element(tx_styles: &Element) -> Self {
        let list = |name: &str| {
            tx_styles
                .child(ns::P, name)
                .map(ListStyle::from_element)
                .unwrap_or_default()
        };
        Self {
            title: list("titleStyle"),
            body: list("bodyStyle"),
            other: list("otherStyle"),
        }
    }

    /// The list style a shape falls back to, by placeholder type.
    pub fn for_placeholder(&self, placeholder: Option<&PlaceholderRef>) -> &ListStyle {
        match placeholder.map(|ph| text_category(&ph.kind)) {
            Some(TextCategory::Title) => &self.title,
            Some(TextCategory::Body) => &self.body,
            _ => &self.other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextCategory {
    Title,
    Body,
    Other,
}

fn text_category(kind: &str) -> TextCategory {
    match kind {
        "title" | "ctrTitle" => TextCategory::Title,
        "body" | "subTitle" | "obj" | "pic" | "chart" | "tbl" | "dgm" | "media" | "clipArt" => {
            TextCategory::Body
        }
        _ => TextCategory::Other,
    }
}

/// Placeholder type a master uses for a given layout or slide type.
pub fn master_kind(kind: &str) -> &str {
    match text_category(kind) {
        TextCategory::Title => "title",
        TextCategory::Body => "body",
        TextCategory::Other => kind,
    }
}

/// A parsed layout or master.
#[derive(Debug, Clone)]
pub struct TemplatePart {
    pub part: PartId,
    pub name: String,
    pub placeholders: Vec<PlaceholderEntry>,
    pub background: Option<FillSpec>,
    /// `p:clrMap` on a master, `p:clrMapOvr/a:overrideClrMapping` on a layout.
    pub color_map: Option<ColorMap>,
    /// Masters only.
    pub text_styles: Option<TextStyles>,
}

impl TemplatePart {
    /// A template with nothing in it, for parts that failed to load.
    pub fn empty(part: PartId, name: impl Into<String>) -> Self {
        Self {
            part,
            name: name.into(),
            placeholders: Vec::new(),
            background: None,
            color_map: None,
            text_styles: None,
        }
    }

    /// Index a `p:sldLayout` or `p:sldMaster` root.
    ///
    /// Placeholders with an unreadable transform are kept without geometry
    /// and reported.
    pub fn parse(
        root: &Element,
        name: &str,
        rels: PartRels<'_>,
        theme: Option<&Theme>,
        diagnostics: &mut Diagnostics,
    ) -> Self {
        let mut template = Self::empty(rels.part(), name);
        let c_sld = root.child(ns::P, "cSld");

        if let Some(tree) = c_sld.and_then(|c| c.child(ns::P, "spTree")) {
            collect_placeholders(tree, name, rels, theme, diagnostics, &mut template.placeholders);
        }

        template.background = c_sld.and_then(|c| parse_background(c, rels, theme));
        template.color_map = if root.is(ns::P, "sldMaster") {
            root.child(ns::P, "clrMap").map(ColorMap::from_element)
        } else {
            color_map_override(root)
        };
        template.text_styles = root.child(ns::P, "txStyles").map(TextStyles::from_element);

        log::debug!(
            "indexed {} with {} placeholders",
            name,
            template.placeholders.len()
        );
        template
    }

    /// Layout lookup: by `idx` when the slide gives one, else by type.
    pub fn find_for_slide(&self, placeholder: &PlaceholderRef) -> Option<&PlaceholderEntry> {
        placeholder
            .idx
            .and_then(|idx| {
                self.placeholders
                    .iter()
                    .find(|p| p.placeholder.idx == Some(idx))
            })
            .or_else(|| self.find_by_type(&placeholder.kind))
    }

    /// First placeholder of the given type.
    pub fn find_by_type(&self, kind: &str) -> Option<&PlaceholderEntry> {
        self.placeholders
            .iter()
            .find(|p| p.placeholder.kind == kind)
    }

    /// Master lookup by normalized type (`ctrTitle` matches `title`, content
    /// types match `body`).
    pub fn find_for_layout(&self, kind: &str) -> Option<&PlaceholderEntry> {
        let wanted = master_kind(kind);
        self.placeholders
            .iter()
            .find(|p| master_kind(&p.placeholder.kind) == wanted)
    }
}

fn collect_placeholders(
    tree: &Element,
    part_name: &str,
    rels: PartRels<'_>,
    theme: Option<&Theme>,
    diagnostics: &mut Diagnostics,
    out: &mut Vec<PlaceholderEntry>,
) {
    for shape in tree.elements() {
        if shape.is(ns::P, "grpSp") {
            collect_placeholders(shape, part_name, rels, theme, diagnostics, out);
            continue;
        }
        let Some(placeholder) = placeholder_of(shape) else {
            continue;
        };
        let xfrm = match Xfrm::of_shape(shape) {
            Ok(xfrm) => xfrm,
            Err(e) => {
                diagnostics.error(
                    DiagnosticCode::XmlParseFailed,
                    format!("placeholder {} has an unreadable transform: {}", placeholder.kind, e),
                    Location::part(part_name),
                );
                None
            }
        };
        out.push(PlaceholderEntry {
            xfrm,
            fragment: StyleFragment::from_shape(shape, rels),
            style_refs: shape
                .child(ns::P, "style")
                .map(|style| StyleFragment::from_style_refs(style, theme)),
            list_style: shape
                .child(ns::P, "txBody")
                .and_then(|body| body.child(ns::A, "lstStyle"))
                .map(ListStyle::from_element)
                .unwrap_or_default(),
            body: BodyProps::of_shape(shape),
            placeholder,
        });
    }
}

/// The `p:ph` of a shape, from whichever non-visual properties it carries.
pub fn placeholder_of(shape: &Element) -> Option<PlaceholderRef> {
    let ph = shape
        .elements()
        .find(|el| el.namespace() == Some(ns::P) && el.local_name().starts_with("nv"))?
        .child(ns::P, "nvPr")?
        .child(ns::P, "ph")?;
    Some(PlaceholderRef::new(
        ph.attr("type"),
        ph.attr("idx").and_then(|i| i.parse().ok()),
    ))
}

/// Background fill declared in a `p:cSld`.
///
/// `p:bgPr` carries the fill directly; `p:bgRef` indexes the theme's
/// format scheme and binds `phClr` to its own color.
pub fn parse_background(
    c_sld: &Element,
    rels: PartRels<'_>,
    theme: Option<&Theme>,
) -> Option<FillSpec> {
    let bg = c_sld.child(ns::P, "bg")?;
    if let Some(bg_pr) = bg.child(ns::P, "bgPr") {
        return FillSpec::from_properties(bg_pr, rels);
    }
    let bg_ref = bg.child(ns::P, "bgRef")?;
    let color = ColorSpec::from_parent(bg_ref);
    let entry = bg_ref
        .attr("idx")
        .and_then(|i| i.parse::<u32>().ok())
        .and_then(|idx| theme?.fill_style(idx));
    match (entry, color) {
        (Some(spec), Some(color)) => Some(spec.substitute_placeholder(&color)),
        (Some(spec), None) => Some(spec.clone()),
        (None, Some(color)) => Some(FillSpec::Solid(color)),
        (None, None) => None,
    }
}

/// `p:clrMapOvr/a:overrideClrMapping` of a layout or slide.
pub fn color_map_override(root: &Element) -> Option<ColorMap> {
    root.child(ns::P, "clrMapOvr")?
        .child(ns::A, "overrideClrMapping")
        .map(ColorMap::from_element)
}
