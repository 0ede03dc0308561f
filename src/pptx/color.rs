//! DrawingML color references and their resolution against a theme.
//!
//! A [`ColorSpec`] is what the XML says (`<a:schemeClr val="accent1">` plus
//! transforms); it is turned into a concrete [`Color`] only at lookup time,
//! through a [`ColorResolver`] that knows the theme and the master's color
//! map.

use super::theme::Theme;
use crate::diagnostics::{DiagnosticCode, Diagnostics, Location};
use crate::model::Color;
use crate::xml::{ns, Element};
use std::collections::HashMap;

/// Placeholder scheme color used inside theme style lists.
pub const PLACEHOLDER_COLOR: &str = "phClr";

/// The base color of a reference.
#[derive(Debug, Clone, PartialEq)]
pub enum ColorBase {
    Rgb(Color),
    /// Scheme slot or alias (`accent1`, `tx1`, `phClr`, ...).
    Scheme(String),
    System {
        name: String,
        last: Option<Color>,
    },
    Preset(String),
}

/// A color transform applied after the base color is known.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColorTransform {
    LumMod(f64),
    LumOff(f64),
    Tint(f64),
    Shade(f64),
    Alpha(f64),
}

/// An unresolved color reference.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorSpec {
    pub base: ColorBase,
    pub transforms: Vec<ColorTransform>,
}

impl ColorSpec {
    pub fn rgb(color: Color) -> Self {
        Self {
            base: ColorBase::Rgb(color),
            transforms: Vec::new(),
        }
    }

    pub fn scheme(slot: impl Into<String>) -> Self {
        Self {
            base: ColorBase::Scheme(slot.into()),
            transforms: Vec::new(),
        }
    }

    /// Parse a color choice element (`a:srgbClr`, `a:schemeClr`, ...).
    pub fn from_element(el: &Element) -> Option<Self> {
        if el.namespace() != Some(ns::A) {
            return None;
        }
        let base = match el.local_name() {
            "srgbClr" => ColorBase::Rgb(Color::from_hex(el.attr("val")?)?),
            "schemeClr" => ColorBase::Scheme(el.attr("val")?.to_string()),
            "sysClr" => ColorBase::System {
                name: el.attr("val")?.to_string(),
                last: el.attr("lastClr").and_then(Color::from_hex),
            },
            "prstClr" => ColorBase::Preset(el.attr("val")?.to_string()),
            "scrgbClr" => ColorBase::Rgb(Color::rgb(
                percent_channel(el.attr("r")?)?,
                percent_channel(el.attr("g")?)?,
                percent_channel(el.attr("b")?)?,
            )),
            "hslClr" => {
                let hue = el.attr("hue")?.parse::<f64>().ok()? / 60_000.0;
                let sat = el.attr("sat")?.parse::<f64>().ok()? / 100_000.0;
                let lum = el.attr("lum")?.parse::<f64>().ok()? / 100_000.0;
                let (r, g, b) = hsl_to_rgb(hue, sat, lum);
                ColorBase::Rgb(Color::rgb(r, g, b))
            }
            _ => return None,
        };

        let transforms = el
            .elements()
            .filter(|t| t.namespace() == Some(ns::A))
            .filter_map(|t| {
                let val = t.attr("val")?.parse::<f64>().ok()? / 100_000.0;
                match t.local_name() {
                    "lumMod" => Some(ColorTransform::LumMod(val)),
                    "lumOff" => Some(ColorTransform::LumOff(val)),
                    "tint" => Some(ColorTransform::Tint(val)),
                    "shade" => Some(ColorTransform::Shade(val)),
                    "alpha" => Some(ColorTransform::Alpha(val)),
                    _ => None,
                }
            })
            .collect();

        Some(Self { base, transforms })
    }

    /// First color choice among the children of `parent` (e.g. `a:solidFill`).
    pub fn from_parent(parent: &Element) -> Option<Self> {
        parent.elements().find_map(Self::from_element)
    }

    /// Whether this is the `phClr` placeholder.
    pub fn is_placeholder(&self) -> bool {
        matches!(&self.base, ColorBase::Scheme(s) if s == PLACEHOLDER_COLOR)
    }

    /// Replace a `phClr` base with `color`, keeping both transform lists.
    pub fn substitute_placeholder(&self, color: &ColorSpec) -> ColorSpec {
        if !self.is_placeholder() {
            return self.clone();
        }
        let mut transforms = color.transforms.clone();
        transforms.extend(self.transforms.iter().copied());
        ColorSpec {
            base: color.base.clone(),
            transforms,
        }
    }
}

fn percent_channel(value: &str) -> Option<u8> {
    let v = value.parse::<f64>().ok()? / 100_000.0;
    Some((v.clamp(0.0, 1.0) * 255.0).round() as u8)
}

/// Mapping from scheme aliases (`bg1`, `tx1`, ...) to theme slots (`lt1`, `dk1`, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct ColorMap {
    entries: HashMap<String, String>,
}

impl Default for ColorMap {
    fn default() -> Self {
        let entries = [
            ("bg1", "lt1"),
            ("tx1", "dk1"),
            ("bg2", "lt2"),
            ("tx2", "dk2"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        Self { entries }
    }
}

impl ColorMap {
    /// Read a `p:clrMap` or `a:overrideClrMapping` element.
    pub fn from_element(el: &Element) -> Self {
        let mut map = Self::default();
        for attr in el.attributes() {
            if attr.name.namespace.is_none() {
                map.entries
                    .insert(attr.name.local.clone(), attr.value.clone());
            }
        }
        map
    }

    /// Map an alias to its theme slot; other names map to themselves.
    pub fn map<'a>(&'a self, name: &'a str) -> &'a str {
        self.entries.get(name).map(String::as_str).unwrap_or(name)
    }
}

/// Turns color references into colors for one slide's inheritance chain.
#[derive(Debug, Clone, Copy)]
pub struct ColorResolver<'a> {
    theme: Option<&'a Theme>,
    color_map: &'a ColorMap,
    unresolved: Color,
}

impl<'a> ColorResolver<'a> {
    pub fn new(theme: Option<&'a Theme>, color_map: &'a ColorMap, unresolved: Color) -> Self {
        Self {
            theme,
            color_map,
            unresolved,
        }
    }

    pub fn theme(&self) -> Option<&'a Theme> {
        self.theme
    }

    /// Resolve a reference; the error names what could not be found.
    pub fn try_resolve(&self, spec: &ColorSpec) -> Result<Color, String> {
        let base = match &spec.base {
            ColorBase::Rgb(color) => *color,
            ColorBase::Scheme(name) => self.scheme_color(name)?,
            ColorBase::System { name, last } => match last {
                Some(color) => *color,
                None => system_color(name)
                    .ok_or_else(|| format!("unknown system color '{}'", name))?,
            },
            ColorBase::Preset(name) => {
                preset_color(name).ok_or_else(|| format!("unknown preset color '{}'", name))?
            }
        };
        Ok(apply_transforms(base, &spec.transforms))
    }

    /// Resolve a reference, substituting the unresolved color and recording
    /// `UNSUPPORTED_FEATURE` on failure.
    pub fn resolve(
        &self,
        spec: &ColorSpec,
        diagnostics: &mut Diagnostics,
        location: &Location,
    ) -> Color {
        match self.try_resolve(spec) {
            Ok(color) => color,
            Err(reason) => {
                diagnostics.warn(DiagnosticCode::UnsupportedFeature, reason, location.clone());
                self.unresolved
            }
        }
    }

    fn scheme_color(&self, name: &str) -> Result<Color, String> {
        if name == PLACEHOLDER_COLOR {
            return Err("phClr used outside a style reference".to_string());
        }
        let slot = self.color_map.map(name);
        let theme = self
            .theme
            .ok_or_else(|| format!("scheme color '{}' without a theme", name))?;
        theme
            .color(slot)
            .ok_or_else(|| format!("theme '{}' has no color for scheme slot '{}'", theme.name, slot))
    }
}

fn system_color(name: &str) -> Option<Color> {
    match name {
        "windowText" | "menuText" | "captionText" | "btnText" => Some(Color::BLACK),
        "window" | "menu" | "btnHighlight" => Some(Color::WHITE),
        "btnFace" | "3dLight" => Some(Color::rgb(0xF0, 0xF0, 0xF0)),
        "highlight" => Some(Color::rgb(0x00, 0x78, 0xD7)),
        "highlightText" => Some(Color::WHITE),
        "grayText" => Some(Color::rgb(0x6D, 0x6D, 0x6D)),
        _ => None,
    }
}

fn preset_color(name: &str) -> Option<Color> {
    let hex = match name {
        "black" => "000000",
        "white" => "FFFFFF",
        "red" => "FF0000",
        "green" => "008000",
        "lime" => "00FF00",
        "blue" => "0000FF",
        "yellow" => "FFFF00",
        "cyan" | "aqua" => "00FFFF",
        "magenta" | "fuchsia" => "FF00FF",
        "gray" | "grey" => "808080",
        "silver" => "C0C0C0",
        "ltGray" | "lightGray" => "D3D3D3",
        "dkGray" | "darkGray" => "A9A9A9",
        "maroon" => "800000",
        "navy" => "000080",
        "olive" => "808000",
        "purple" => "800080",
        "teal" => "008080",
        "orange" => "FFA500",
        "pink" => "FFC0CB",
        "brown" => "A52A2A",
        "gold" => "FFD700",
        _ => return None,
    };
    Color::from_hex(hex)
}

fn apply_transforms(color: Color, transforms: &[ColorTransform]) -> Color {
    let mut rgb = [color.r as f64, color.g as f64, color.b as f64];
    let mut alpha = color.alpha as f64 / 255.0;

    for transform in transforms {
        match *transform {
            ColorTransform::LumMod(_) | ColorTransform::LumOff(_) => {
                let (h, s, l) = rgb_to_hsl(rgb[0], rgb[1], rgb[2]);
                let l = match *transform {
                    ColorTransform::LumMod(m) => l * m,
                    ColorTransform::LumOff(o) => l + o,
                    _ => l,
                };
                let (r, g, b) = hsl_to_rgb(h, s, l.clamp(0.0, 1.0));
                rgb = [r as f64, g as f64, b as f64];
            }
            ColorTransform::Tint(t) => {
                for c in &mut rgb {
                    *c = *c * t + 255.0 * (1.0 - t);
                }
            }
            ColorTransform::Shade(s) => {
                for c in &mut rgb {
                    *c *= s;
                }
            }
            ColorTransform::Alpha(a) => alpha = a,
        }
    }

    let channel = |v: f64| v.round().clamp(0.0, 255.0) as u8;
    Color::rgb(channel(rgb[0]), channel(rgb[1]), channel(rgb[2]))
        .with_alpha(channel(alpha.clamp(0.0, 1.0) * 255.0))
}

fn rgb_to_hsl(r: f64, g: f64, b: f64) -> (f64, f64, f64) {
    let (r, g, b) = (r / 255.0, g / 255.0, b / 255.0);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;
    if (max - min).abs() < f64::EPSILON {
        return (0.0, 0.0, l);
    }
    let d = max - min;
    let s = if l > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    };
    let h = if max == r {
        ((g - b) / d).rem_euclid(6.0)
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };
    (h * 60.0, s, l)
}

fn hsl_to_rgb(h: f64, s: f64, l: f64) -> (u8, u8, u8) {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let hp = h.rem_euclid(360.0) / 60.0;
    let x = c * (1.0 - (hp.rem_euclid(2.0) - 1.0).abs());
    let (r1, g1, b1) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    let channel = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    (channel(r1), channel(g1), channel(b1))
}
