//! Style fragments and their resolution into a [`StyleContext`].
//!
//! Each level of the inheritance chain (slide, layout, master, theme)
//! contributes a [`StyleFragment`] in which every property may be absent.
//! Resolution picks, for each property on its own, the first level that
//! defines it and falls back to the configured defaults otherwise.

use super::color::{ColorResolver, ColorSpec};
use super::theme::Theme;
use crate::diagnostics::{DiagnosticCode, Diagnostics, Location};
use crate::geometry::emu_to_px;
use crate::model::{Fill, Font, GradientStop, Line, StyleContext};
use crate::options::FallbackStyle;
use crate::relationships::PartRels;
use crate::xml::{ns, Element};

/// An unresolved fill.
#[derive(Debug, Clone, PartialEq)]
pub enum FillSpec {
    NoFill,
    Solid(ColorSpec),
    Gradient {
        stops: Vec<(f64, ColorSpec)>,
        angle: f64,
    },
    /// Picture fill; `media` is the target part, if the relationship resolved.
    Picture {
        media: Option<String>,
    },
}

impl FillSpec {
    /// Parse a fill element (`a:solidFill`, `a:gradFill`, ...).
    pub fn from_element(el: &Element, rels: PartRels<'_>) -> Option<Self> {
        if el.namespace() != Some(ns::A) {
            return None;
        }
        match el.local_name() {
            "noFill" => Some(FillSpec::NoFill),
            "solidFill" => ColorSpec::from_parent(el).map(FillSpec::Solid),
            "gradFill" => {
                let stops = el
                    .child(ns::A, "gsLst")
                    .map(|list| {
                        list.children_named(ns::A, "gs")
                            .filter_map(|gs| {
                                let pos = gs.attr("pos")?.parse::<f64>().ok()? / 100_000.0;
                                Some((pos, ColorSpec::from_parent(gs)?))
                            })
                            .collect::<Vec<_>>()
                    })
                    .unwrap_or_default();
                let angle = el
                    .child(ns::A, "lin")
                    .and_then(|lin| lin.attr("ang"))
                    .and_then(|a| a.parse::<f64>().ok())
                    .map(|a| a / 60_000.0)
                    .unwrap_or(0.0);
                Some(FillSpec::Gradient { stops, angle })
            }
            "blipFill" => {
                let media = el
                    .child(ns::A, "blip")
                    .and_then(|blip| blip.attr_ns(ns::R, "embed"))
                    .and_then(|id| rels.part_name(id))
                    .map(str::to_string);
                Some(FillSpec::Picture { media })
            }
            // Patterns are approximated by their foreground color.
            "pattFill" => el
                .child(ns::A, "fgClr")
                .and_then(ColorSpec::from_parent)
                .map(FillSpec::Solid),
            _ => None,
        }
    }

    /// First fill among the children of a properties element (`p:spPr`, `p:bgPr`, `a:tcPr`).
    pub fn from_properties(props: &Element, rels: PartRels<'_>) -> Option<Self> {
        props
            .elements()
            .find_map(|child| Self::from_element(child, rels))
    }

    /// Bind `phClr` to a style reference's color.
    pub fn substitute_placeholder(&self, color: &ColorSpec) -> Self {
        match self {
            FillSpec::Solid(c) => FillSpec::Solid(c.substitute_placeholder(color)),
            FillSpec::Gradient { stops, angle } => FillSpec::Gradient {
                stops: stops
                    .iter()
                    .map(|(pos, c)| (*pos, c.substitute_placeholder(color)))
                    .collect(),
                angle: *angle,
            },
            other => other.clone(),
        }
    }
}

/// An unresolved outline (`a:ln`); every field may be absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineSpec {
    /// Width in EMU.
    pub width: Option<i64>,
    pub fill: Option<FillSpec>,
    pub dash: Option<String>,
}

impl LineSpec {
    pub fn from_element(ln: &Element, rels: PartRels<'_>) -> Self {
        Self {
            width: ln.attr("w").and_then(|w| w.parse::<i64>().ok()),
            fill: FillSpec::from_properties(ln, rels),
            dash: ln
                .child(ns::A, "prstDash")
                .and_then(|d| d.attr("val"))
                .map(str::to_string),
        }
    }

    pub fn substitute_placeholder(&self, color: &ColorSpec) -> Self {
        Self {
            width: self.width,
            fill: self.fill.as_ref().map(|f| f.substitute_placeholder(color)),
            dash: self.dash.clone(),
        }
    }
}

/// Unresolved character properties (`a:rPr`, `a:defRPr`, `a:endParaRPr`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FontSpec {
    /// Latin typeface; may be a theme reference such as `+mn-lt`.
    pub typeface: Option<String>,
    /// Size in points.
    pub size: Option<f64>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
    pub color: Option<ColorSpec>,
}

impl FontSpec {
    pub fn from_element(props: &Element) -> Self {
        Self {
            typeface: props
                .child(ns::A, "latin")
                .and_then(|l| l.attr("typeface"))
                .filter(|t| !t.is_empty())
                .map(str::to_string),
            size: props
                .attr("sz")
                .and_then(|s| s.parse::<f64>().ok())
                .map(|s| s / 100.0),
            bold: props.attr("b").map(parse_bool),
            italic: props.attr("i").map(parse_bool),
            underline: props.attr("u").map(|u| u != "none"),
            color: props
                .child(ns::A, "solidFill")
                .and_then(ColorSpec::from_parent),
        }
    }

    /// Fill absent properties from `base`; present values win.
    pub fn or(&self, base: &FontSpec) -> FontSpec {
        FontSpec {
            typeface: self.typeface.clone().or_else(|| base.typeface.clone()),
            size: self.size.or(base.size),
            bold: self.bold.or(base.bold),
            italic: self.italic.or(base.italic),
            underline: self.underline.or(base.underline),
            color: self.color.clone().or_else(|| base.color.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == FontSpec::default()
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(value, "1" | "true" | "on")
}

/// The style properties one level of the chain contributes to a shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleFragment {
    pub fill: Option<FillSpec>,
    pub line: LineSpec,
    pub font: FontSpec,
}

impl StyleFragment {
    /// Fill and outline from a shape's `p:spPr`, font from its list style's first level.
    pub fn from_shape(shape: &Element, rels: PartRels<'_>) -> Self {
        let sp_pr = shape.child(ns::P, "spPr");
        let font = shape
            .child(ns::P, "txBody")
            .and_then(|body| body.child(ns::A, "lstStyle"))
            .and_then(|list| list.child(ns::A, "lvl1pPr"))
            .and_then(|lvl| lvl.child(ns::A, "defRPr"))
            .map(FontSpec::from_element)
            .unwrap_or_default();
        Self {
            fill: sp_pr.and_then(|p| FillSpec::from_properties(p, rels)),
            line: sp_pr
                .and_then(|p| p.child(ns::A, "ln"))
                .map(|ln| LineSpec::from_element(ln, rels))
                .unwrap_or_default(),
            font,
        }
    }

    /// Theme-level fragment from a shape's `p:style` references.
    ///
    /// `fillRef`/`lnRef` index the theme's format scheme (1-based, 0 means
    /// none); `fontRef` names the major or minor font. Each reference's color
    /// replaces `phClr` in the referenced entry.
    pub fn from_style_refs(style: &Element, theme: Option<&Theme>) -> Self {
        let mut fragment = StyleFragment::default();

        if let Some(fill_ref) = style.child(ns::A, "fillRef") {
            let color = ColorSpec::from_parent(fill_ref);
            let entry = fill_ref
                .attr("idx")
                .and_then(|i| i.parse::<u32>().ok())
                .and_then(|idx| theme.and_then(|t| t.fill_style(idx)));
            fragment.fill = match (entry, &color) {
                (Some(spec), Some(color)) => Some(spec.substitute_placeholder(color)),
                (Some(spec), None) => Some(spec.clone()),
                (None, Some(color)) if fill_ref.attr("idx") != Some("0") => {
                    Some(FillSpec::Solid(color.clone()))
                }
                _ => None,
            };
        }

        if let Some(ln_ref) = style.child(ns::A, "lnRef") {
            let color = ColorSpec::from_parent(ln_ref);
            let entry = ln_ref
                .attr("idx")
                .and_then(|i| i.parse::<u32>().ok())
                .and_then(|idx| theme.and_then(|t| t.line_style(idx)));
            fragment.line = match (entry, &color) {
                (Some(spec), Some(color)) => spec.substitute_placeholder(color),
                (Some(spec), None) => spec.clone(),
                _ => LineSpec::default(),
            };
        }

        if let Some(font_ref) = style.child(ns::A, "fontRef") {
            fragment.font.typeface = match font_ref.attr("idx") {
                Some("major") => Some("+mj-lt".to_string()),
                Some("minor") => Some("+mn-lt".to_string()),
                _ => None,
            };
            fragment.font.color = ColorSpec::from_parent(font_ref);
        }

        fragment
    }
}

/// Resolves fragments and specs for one slide.
#[derive(Debug, Clone, Copy)]
pub struct StyleResolver<'a> {
    pub colors: ColorResolver<'a>,
    pub fallback: &'a FallbackStyle,
    pub dpi: f64,
}

impl<'a> StyleResolver<'a> {
    pub fn new(colors: ColorResolver<'a>, fallback: &'a FallbackStyle, dpi: f64) -> Self {
        Self {
            colors,
            fallback,
            dpi,
        }
    }

    /// Fold the levels, highest priority first, into a complete style.
    pub fn resolve_style(
        &self,
        levels: &[&StyleFragment],
        diagnostics: &mut Diagnostics,
        location: &Location,
    ) -> StyleContext {
        let fill = levels.iter().find_map(|l| l.fill.as_ref());
        let line_fill = levels.iter().find_map(|l| l.line.fill.as_ref());
        let line_width = levels.iter().find_map(|l| l.line.width);
        let dash = levels.iter().find_map(|l| l.line.dash.clone());

        let line_fill = self.resolve_fill(line_fill, diagnostics, location);
        let line = Line {
            width: if line_fill.is_none() {
                0.0
            } else {
                // 0.75pt when a line is drawn without a width anywhere
                emu_to_px(line_width.unwrap_or(9_525), self.dpi)
            },
            fill: line_fill,
            dash: dash.unwrap_or_else(|| "solid".to_string()),
        };

        StyleContext {
            fill: self.resolve_fill(fill, diagnostics, location),
            line,
            font: self.resolve_font(levels.iter().map(|l| &l.font), diagnostics, location),
            color_scheme: self.colors.theme().map(|t| t.name.clone()),
        }
    }

    pub fn resolve_fill(
        &self,
        spec: Option<&FillSpec>,
        diagnostics: &mut Diagnostics,
        location: &Location,
    ) -> Fill {
        match spec {
            None | Some(FillSpec::NoFill) => Fill::None,
            Some(FillSpec::Solid(color)) => {
                Fill::solid(self.colors.resolve(color, diagnostics, location))
            }
            Some(FillSpec::Gradient { stops, angle }) => Fill::Gradient {
                stops: stops
                    .iter()
                    .map(|(position, color)| GradientStop {
                        position: *position,
                        color: self.colors.resolve(color, diagnostics, location),
                    })
                    .collect(),
                angle: *angle,
            },
            Some(FillSpec::Picture { media: Some(media) }) => Fill::Picture {
                media: media.clone(),
            },
            Some(FillSpec::Picture { media: None }) => {
                diagnostics.warn(
                    DiagnosticCode::MissingPart,
                    "picture fill references no media part",
                    location.clone(),
                );
                Fill::None
            }
        }
    }

    /// Fold font levels, highest priority first.
    pub fn resolve_font<'f>(
        &self,
        levels: impl Iterator<Item = &'f FontSpec>,
        diagnostics: &mut Diagnostics,
        location: &Location,
    ) -> Font {
        let merged = levels.fold(FontSpec::default(), |acc, level| acc.or(level));
        self.font_from_spec(&merged, diagnostics, location)
    }

    /// Complete a merged spec with theme fonts and defaults.
    pub fn font_from_spec(
        &self,
        spec: &FontSpec,
        diagnostics: &mut Diagnostics,
        location: &Location,
    ) -> Font {
        Font {
            family: self.typeface(spec.typeface.as_deref()),
            size: spec.size.unwrap_or(self.fallback.font_size),
            bold: spec.bold.unwrap_or(false),
            italic: spec.italic.unwrap_or(false),
            underline: spec.underline.unwrap_or(false),
            color: spec
                .color
                .as_ref()
                .map(|c| self.colors.resolve(c, diagnostics, location))
                .unwrap_or(self.fallback.text_color),
        }
    }

    /// Resolve theme font references (`+mj-lt`, `+mn-ea`, ...).
    pub fn typeface(&self, typeface: Option<&str>) -> String {
        let theme = self.colors.theme();
        match typeface {
            Some(name) if name.starts_with("+mj") => theme
                .and_then(|t| t.major_font.clone())
                .unwrap_or_else(|| self.fallback.font_family.clone()),
            Some(name) if name.starts_with("+mn") => theme
                .and_then(|t| t.minor_font.clone())
                .unwrap_or_else(|| self.fallback.font_family.clone()),
            Some(name) => name.to_string(),
            None => theme
                .and_then(|t| t.minor_font.clone())
                .unwrap_or_else(|| self.fallback.font_family.clone()),
        }
    }
}
