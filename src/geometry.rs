//! EMU conversion and shape geometry resolution.
//!
//! Positions are kept in EMU (914400 per inch) until the very end, where
//! they are converted once to device pixels at the configured DPI.

use crate::diagnostics::{DiagnosticCode, Diagnostics, Location};
use crate::xml::{ns, Element};
use serde::{Deserialize, Serialize};

/// EMUs per inch.
pub const EMUS_PER_INCH: i64 = 914_400;

/// EMUs per typographic point.
pub const EMUS_PER_PT: i64 = 12_700;

/// Default target pixel density.
pub const DEFAULT_DPI: f64 = 96.0;

/// Angle units per degree (`rot` is in 1/60000 of a degree).
pub const ANGLE_UNITS_PER_DEGREE: f64 = 60_000.0;

/// Convert EMU to pixels at the given DPI.
pub fn emu_to_px(emu: i64, dpi: f64) -> f64 {
    emu_to_px_f64(emu as f64, dpi)
}

fn emu_to_px_f64(emu: f64, dpi: f64) -> f64 {
    emu * dpi / EMUS_PER_INCH as f64
}

/// Convert pixels back to EMU, rounded to the nearest unit.
pub fn px_to_emu(px: f64, dpi: f64) -> i64 {
    (px * EMUS_PER_INCH as f64 / dpi).round() as i64
}

/// Convert EMU to points.
pub fn emu_to_pt(emu: i64) -> f64 {
    emu as f64 / EMUS_PER_PT as f64
}

/// Normalize an angle in degrees into `[0, 360)`.
pub fn normalize_rotation(degrees: f64) -> f64 {
    if !degrees.is_finite() {
        return 0.0;
    }
    let r = degrees.rem_euclid(360.0);
    if r >= 360.0 {
        0.0
    } else {
        r
    }
}

/// A transform that could not be read.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid transform: {0}")]
pub struct XfrmError(pub String);

/// Offset and extent of a group's child coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildSpace {
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
}

/// A transform as written in `a:xfrm` / `p:xfrm`, in EMU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Xfrm {
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
    /// Rotation in 1/60000 degree.
    pub rot: i64,
    pub flip_h: bool,
    pub flip_v: bool,
    /// `chOff`/`chExt` of a group transform.
    pub child: Option<ChildSpace>,
}

impl Xfrm {
    /// Read a transform element.
    ///
    /// An element without `off` and `ext` carries no transform and yields
    /// `None`. Unparseable numbers, a lone `off` or `ext`, or negative
    /// extents are errors.
    pub fn from_element(el: &Element) -> Result<Option<Self>, XfrmError> {
        let off = el.child(ns::A, "off");
        let ext = el.child(ns::A, "ext");
        let (off, ext) = match (off, ext) {
            (None, None) => return Ok(None),
            (Some(off), Some(ext)) => (off, ext),
            _ => return Err(XfrmError("xfrm needs both off and ext".to_string())),
        };

        let child = match (el.child(ns::A, "chOff"), el.child(ns::A, "chExt")) {
            (Some(ch_off), Some(ch_ext)) => Some(ChildSpace {
                x: int_attr(ch_off, "x")?,
                y: int_attr(ch_off, "y")?,
                cx: extent_attr(ch_ext, "cx")?,
                cy: extent_attr(ch_ext, "cy")?,
            }),
            _ => None,
        };

        Ok(Some(Self {
            x: int_attr(off, "x")?,
            y: int_attr(off, "y")?,
            cx: extent_attr(ext, "cx")?,
            cy: extent_attr(ext, "cy")?,
            rot: match el.attr("rot") {
                Some(v) => parse_int(v, "rot")?,
                None => 0,
            },
            flip_h: bool_attr(el, "flipH"),
            flip_v: bool_attr(el, "flipV"),
            child,
        }))
    }

    /// Find and read the transform inside a shape-properties element.
    pub fn from_properties(props: Option<&Element>) -> Result<Option<Self>, XfrmError> {
        match props.and_then(|p| p.child(ns::A, "xfrm")) {
            Some(xfrm) => Self::from_element(xfrm),
            None => Ok(None),
        }
    }

    /// The transform of a shape element: inside `p:spPr` or `p:grpSpPr`, or
    /// the graphic frame's own `p:xfrm`.
    pub fn of_shape(shape: &Element) -> Result<Option<Self>, XfrmError> {
        if let Some(xfrm) = shape.child(ns::P, "xfrm") {
            return Self::from_element(xfrm);
        }
        Self::from_properties(
            shape
                .child(ns::P, "spPr")
                .or_else(|| shape.child(ns::P, "grpSpPr")),
        )
    }

    pub fn frame(&self) -> Frame {
        Frame {
            x: self.x as f64,
            y: self.y as f64,
            cx: self.cx as f64,
            cy: self.cy as f64,
            rotation: self.rot as f64 / ANGLE_UNITS_PER_DEGREE,
            flip_h: self.flip_h,
            flip_v: self.flip_v,
        }
    }
}

fn parse_int(value: &str, name: &str) -> Result<i64, XfrmError> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| XfrmError(format!("{}=\"{}\" is not an integer", name, value)))
}

fn int_attr(el: &Element, name: &str) -> Result<i64, XfrmError> {
    let value = el
        .attr(name)
        .ok_or_else(|| XfrmError(format!("{} missing {}", el.local_name(), name)))?;
    parse_int(value, name)
}

fn extent_attr(el: &Element, name: &str) -> Result<i64, XfrmError> {
    let value = int_attr(el, name)?;
    if value < 0 {
        return Err(XfrmError(format!("negative extent {}={}", name, value)));
    }
    Ok(value)
}

fn bool_attr(el: &Element, name: &str) -> bool {
    matches!(el.attr(name), Some("1") | Some("true"))
}

/// A rectangle in (possibly fractional) EMU with rotation in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub x: f64,
    pub y: f64,
    pub cx: f64,
    pub cy: f64,
    pub rotation: f64,
    pub flip_h: bool,
    pub flip_v: bool,
}

impl Frame {
    /// Convert to device pixels.
    pub fn to_geometry(&self, dpi: f64) -> Geometry {
        Geometry {
            x: emu_to_px_f64(self.x, dpi),
            y: emu_to_px_f64(self.y, dpi),
            width: emu_to_px_f64(self.cx.max(0.0), dpi),
            height: emu_to_px_f64(self.cy.max(0.0), dpi),
            rotation: normalize_rotation(self.rotation),
            flip_h: self.flip_h,
            flip_v: self.flip_v,
        }
    }
}

/// A group's mapping from its child space into its parent's space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupTransform {
    frame: Frame,
    child: Option<ChildSpace>,
}

impl GroupTransform {
    pub fn new(xfrm: &Xfrm) -> Self {
        Self {
            frame: xfrm.frame(),
            child: xfrm.child,
        }
    }

    /// Map a child frame into the group's parent space:
    /// `off + (child − chOff) × ext / chExt`. Rotation adds up; flips toggle.
    pub fn apply(&self, child: Frame) -> Frame {
        let (origin_x, origin_y, scale_x, scale_y) = match self.child {
            Some(space) => (
                space.x as f64,
                space.y as f64,
                scale(self.frame.cx, space.cx),
                scale(self.frame.cy, space.cy),
            ),
            None => (self.frame.x, self.frame.y, 1.0, 1.0),
        };
        Frame {
            x: self.frame.x + (child.x - origin_x) * scale_x,
            y: self.frame.y + (child.y - origin_y) * scale_y,
            cx: child.cx * scale_x,
            cy: child.cy * scale_y,
            rotation: child.rotation + self.frame.rotation,
            flip_h: child.flip_h ^ self.frame.flip_h,
            flip_v: child.flip_v ^ self.frame.flip_v,
        }
    }
}

fn scale(ext: f64, child_ext: i64) -> f64 {
    if child_ext == 0 {
        1.0
    } else {
        ext / child_ext as f64
    }
}

/// Compose a frame through enclosing groups, innermost last in `groups`.
pub fn compose_groups(frame: Frame, groups: &[GroupTransform]) -> Frame {
    groups.iter().rev().fold(frame, |f, g| g.apply(f))
}

/// Absolute geometry of a shape in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Clockwise rotation in degrees, `[0, 360)`.
    pub rotation: f64,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub flip_h: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub flip_v: bool,
}

impl Geometry {
    pub fn zero() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            rotation: 0.0,
            flip_h: false,
            flip_v: false,
        }
    }
}

/// Default placeholder rectangles as `(x, y, width, height)` fractions of the
/// slide size. Taken from the stock 16:9 Office master.
pub const DEFAULT_RECTS: &[(&str, [f64; 4])] = &[
    ("title", [0.0688, 0.0532, 0.8625, 0.1933]),
    ("ctrTitle", [0.1250, 0.1637, 0.7500, 0.3481]),
    ("subTitle", [0.1250, 0.5252, 0.7500, 0.2414]),
    ("body", [0.0688, 0.2662, 0.8625, 0.6345]),
    ("obj", [0.0688, 0.2662, 0.8625, 0.6345]),
    ("dt", [0.0688, 0.9268, 0.2250, 0.0532]),
    ("ftr", [0.3313, 0.9268, 0.3375, 0.0532]),
    ("sldNum", [0.7063, 0.9268, 0.2250, 0.0532]),
];

/// Rectangle for shapes and placeholder kinds not listed in [`DEFAULT_RECTS`].
pub const FALLBACK_RECT: [f64; 4] = [0.25, 0.25, 0.5, 0.5];

/// Default rectangle for a placeholder kind on a slide of `(cx, cy)` EMU.
pub fn default_rect(kind: Option<&str>, slide_size: (i64, i64)) -> Frame {
    let fractions = kind
        .and_then(|k| DEFAULT_RECTS.iter().find(|(name, _)| *name == k))
        .map(|(_, rect)| *rect)
        .unwrap_or(FALLBACK_RECT);
    let (w, h) = (slide_size.0 as f64, slide_size.1 as f64);
    Frame {
        x: (fractions[0] * w).round(),
        y: (fractions[1] * h).round(),
        cx: (fractions[2] * w).round(),
        cy: (fractions[3] * h).round(),
        rotation: 0.0,
        flip_h: false,
        flip_v: false,
    }
}

/// Pick a shape's frame in EMU.
///
/// The explicit transform wins; otherwise the first transform found on the
/// matching layout then master placeholder (`inherited`, in that order);
/// otherwise the default rectangle for `placeholder_kind`, reported as
/// `UNSUPPORTED_FEATURE`.
pub fn resolve_geometry(
    explicit: Option<&Xfrm>,
    inherited: &[Option<&Xfrm>],
    placeholder_kind: Option<&str>,
    slide_size: (i64, i64),
    diagnostics: &mut Diagnostics,
    location: &Location,
) -> Frame {
    if let Some(xfrm) = explicit.or_else(|| inherited.iter().flatten().next().copied()) {
        return xfrm.frame();
    }

    diagnostics.warn(
        DiagnosticCode::UnsupportedFeature,
        format!(
            "no geometry for {} in the placeholder chain, using default rectangle",
            placeholder_kind.unwrap_or("shape")
        ),
        location.clone(),
    );
    default_rect(placeholder_kind, slide_size)
}
