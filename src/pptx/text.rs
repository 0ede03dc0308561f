//! Text bodies: list-style levels, paragraphs and runs.
//!
//! Paragraph and run properties inherit through an ordered list of
//! [`ListStyle`]s (shape `a:lstStyle`, layout placeholder, master
//! placeholder, master `p:txStyles`), consulted for the paragraph's level.

use super::style::{FontSpec, StyleResolver};
use crate::diagnostics::{Diagnostics, Location};
use crate::geometry::emu_to_px;
use crate::model::{Bullet, Insets, Paragraph, TextAlignment, TextBody, TextRun, VerticalAnchor};
use crate::relationships::PartRels;
use crate::xml::{ns, Element};

const MAX_LEVELS: usize = 9;

/// Default body insets in EMU: 0.1" left/right, 0.05" top/bottom.
const DEFAULT_INSETS: [i64; 4] = [91_440, 45_720, 91_440, 45_720];

/// Bullet as declared on a paragraph or list level.
#[derive(Debug, Clone, PartialEq)]
pub enum BulletSpec {
    /// `a:buNone`: explicitly no bullet.
    None,
    Char(String),
    AutoNumber { scheme: String, start_at: u32 },
}

/// Paragraph properties of one list level (`a:lvlNpPr` or `a:pPr`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParagraphProps {
    pub alignment: Option<TextAlignment>,
    pub bullet: Option<BulletSpec>,
    pub font: FontSpec,
}

impl ParagraphProps {
    pub fn from_element(ppr: &Element) -> Self {
        let bullet = ppr.elements().find_map(|el| {
            if el.namespace() != Some(ns::A) {
                return None;
            }
            match el.local_name() {
                "buNone" => Some(BulletSpec::None),
                "buChar" => el.attr("char").map(|c| BulletSpec::Char(c.to_string())),
                "buAutoNum" => Some(BulletSpec::AutoNumber {
                    scheme: el.attr("type").unwrap_or("arabicPeriod").to_string(),
                    start_at: el
                        .attr("startAt")
                        .and_then(|s| s.parse().ok())
                        .unwrap_or(1),
                }),
                _ => None,
            }
        });
        Self {
            alignment: ppr.attr("algn").and_then(TextAlignment::from_ooxml),
            bullet,
            font: ppr
                .child(ns::A, "defRPr")
                .map(FontSpec::from_element)
                .unwrap_or_default(),
        }
    }
}

/// Nine list levels plus the `a:defPPr` default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListStyle {
    default: Option<ParagraphProps>,
    levels: [Option<ParagraphProps>; MAX_LEVELS],
}

impl ListStyle {
    /// Read `a:lstStyle`, `p:titleStyle`, `p:bodyStyle` or `p:otherStyle`.
    pub fn from_element(list: &Element) -> Self {
        let mut style = ListStyle::default();
        for child in list.elements() {
            if child.namespace() != Some(ns::A) {
                continue;
            }
            let name = child.local_name();
            if name == "defPPr" {
                style.default = Some(ParagraphProps::from_element(child));
            } else if let Some(n) = name
                .strip_prefix("lvl")
                .and_then(|rest| rest.strip_suffix("pPr"))
                .and_then(|n| n.parse::<usize>().ok())
            {
                if (1..=MAX_LEVELS).contains(&n) {
                    style.levels[n - 1] = Some(ParagraphProps::from_element(child));
                }
            }
        }
        style
    }

    /// Properties for a zero-based level, falling back to `defPPr`.
    pub fn level(&self, level: u8) -> Option<&ParagraphProps> {
        self.levels
            .get(level as usize)
            .and_then(Option::as_ref)
            .or(self.default.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.default.is_none() && self.levels.iter().all(Option::is_none)
    }
}

/// Body properties (`a:bodyPr`), every field optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BodyProps {
    pub anchor: Option<VerticalAnchor>,
    /// left, top, right, bottom in EMU
    pub insets: [Option<i64>; 4],
    pub wrap: Option<bool>,
}

impl BodyProps {
    pub fn from_element(body_pr: &Element) -> Self {
        let inset = |name: &str| body_pr.attr(name).and_then(|v| v.parse::<i64>().ok());
        Self {
            anchor: body_pr.attr("anchor").and_then(VerticalAnchor::from_ooxml),
            insets: [inset("lIns"), inset("tIns"), inset("rIns"), inset("bIns")],
            wrap: body_pr.attr("wrap").map(|w| w != "none"),
        }
    }

    /// Read the `a:bodyPr` of a shape's text body.
    pub fn of_shape(shape: &Element) -> Self {
        shape
            .child(ns::P, "txBody")
            .and_then(|b| b.child(ns::A, "bodyPr"))
            .map(Self::from_element)
            .unwrap_or_default()
    }
}

/// Everything a text body inherits from, highest priority first.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextInheritance<'a> {
    /// List styles after the shape's own `a:lstStyle`.
    pub list_styles: &'a [&'a ListStyle],
    /// Body properties after the shape's own `a:bodyPr`.
    pub bodies: &'a [&'a BodyProps],
    /// Theme-level font (`p:style/a:fontRef`).
    pub theme_font: Option<&'a FontSpec>,
}

/// Build a text body from `p:txBody` or `a:txBody`.
pub fn parse_text_body(
    tx_body: &Element,
    inherited: TextInheritance<'_>,
    rels: PartRels<'_>,
    styles: &StyleResolver<'_>,
    diagnostics: &mut Diagnostics,
    location: &Location,
) -> TextBody {
    let own_list = tx_body
        .child(ns::A, "lstStyle")
        .map(ListStyle::from_element)
        .unwrap_or_default();
    let mut lists: Vec<&ListStyle> = vec![&own_list];
    lists.extend(inherited.list_styles.iter().copied());

    let own_body = tx_body
        .child(ns::A, "bodyPr")
        .map(BodyProps::from_element)
        .unwrap_or_default();
    let mut bodies: Vec<&BodyProps> = vec![&own_body];
    bodies.extend(inherited.bodies.iter().copied());

    let insets_emu: Vec<i64> = (0..4)
        .map(|i| {
            bodies
                .iter()
                .find_map(|b| b.insets[i])
                .unwrap_or(DEFAULT_INSETS[i])
        })
        .collect();
    let px = |emu: i64| emu_to_px(emu, styles.dpi);

    let paragraphs = tx_body
        .children_named(ns::A, "p")
        .map(|p| parse_paragraph(p, &lists, inherited.theme_font, rels, styles, diagnostics, location))
        .collect();

    TextBody {
        paragraphs,
        anchor: bodies
            .iter()
            .find_map(|b| b.anchor)
            .unwrap_or_default(),
        insets: Insets {
            left: px(insets_emu[0]),
            top: px(insets_emu[1]),
            right: px(insets_emu[2]),
            bottom: px(insets_emu[3]),
        },
        wrap: bodies.iter().find_map(|b| b.wrap).unwrap_or(true),
    }
}

fn parse_paragraph(
    p: &Element,
    lists: &[&ListStyle],
    theme_font: Option<&FontSpec>,
    rels: PartRels<'_>,
    styles: &StyleResolver<'_>,
    diagnostics: &mut Diagnostics,
    location: &Location,
) -> Paragraph {
    let ppr_el = p.child(ns::A, "pPr");
    let level = ppr_el
        .and_then(|ppr| ppr.attr("lvl"))
        .and_then(|l| l.parse::<u8>().ok())
        .map(|l| l.min(MAX_LEVELS as u8 - 1))
        .unwrap_or(0);
    let own = ppr_el.map(ParagraphProps::from_element).unwrap_or_default();

    let mut chain: Vec<&ParagraphProps> = vec![&own];
    chain.extend(lists.iter().filter_map(|list| list.level(level)));

    let alignment = chain
        .iter()
        .find_map(|props| props.alignment)
        .unwrap_or_default();
    let bullet = match chain.iter().find_map(|props| props.bullet.as_ref()) {
        Some(BulletSpec::Char(c)) => Some(Bullet::Char { char: c.clone() }),
        Some(BulletSpec::AutoNumber { scheme, start_at }) => Some(Bullet::AutoNumber {
            scheme: scheme.clone(),
            start_at: *start_at,
        }),
        Some(BulletSpec::None) | None => None,
    };

    // Paragraph-level font defaults, highest priority first.
    let mut base = FontSpec::default();
    for props in &chain {
        base = base.or(&props.font);
    }
    if let Some(theme_font) = theme_font {
        base = base.or(theme_font);
    }

    let mut runs = Vec::new();
    for child in p.elements() {
        if child.namespace() != Some(ns::A) {
            continue;
        }
        let (text, line_break) = match child.local_name() {
            "r" | "fld" => (
                child.child(ns::A, "t").map(|t| t.text()).unwrap_or_default(),
                false,
            ),
            "br" => (String::new(), true),
            _ => continue,
        };
        let rpr = child.child(ns::A, "rPr");
        let spec = rpr.map(FontSpec::from_element).unwrap_or_default().or(&base);
        let hyperlink = rpr
            .and_then(|r| r.child(ns::A, "hlinkClick"))
            .and_then(|h| h.attr_ns(ns::R, "id"))
            .and_then(|id| rels.external(id))
            .map(str::to_string);

        runs.push(TextRun {
            text,
            font: styles.font_from_spec(&spec, diagnostics, location),
            hyperlink,
            line_break,
        });
    }

    Paragraph {
        level,
        alignment,
        bullet,
        runs,
    }
}
