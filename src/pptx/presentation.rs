//! Conversion pipeline: presentation part, shared template caches and
//! slide building.

use super::slide::{build_slide, missing_slide, SlideContext};
use super::template::TemplatePart;
use super::theme::Theme;
use crate::container::Package;
use crate::content_types::PartKind;
use crate::diagnostics::{Diagnostic, DiagnosticCode, Diagnostics, Location};
use crate::error::{Error, Result};
use crate::geometry::emu_to_px;
use crate::model::{Fill, MediaAsset, ResolvedShape, ShapeKind, SlideModel};
use crate::options::ConvertOptions;
use crate::relationships::{rel_type, PartChain, PartId, PartRels, RelationshipGraph};
use crate::xml::{ns, Element};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;

/// Content type used for media parts that declare none.
const OCTET_STREAM: &str = "application/octet-stream";

/// Result of converting a presentation.
#[derive(Debug, Clone, Serialize)]
pub struct Conversion {
    /// One model per slide, in presentation order.
    pub slides: Vec<SlideModel>,
    /// Package-level diagnostics first, then each slide's in slide order.
    pub diagnostics: Vec<Diagnostic>,
    /// Slide width in pixels.
    pub slide_width: f64,
    /// Slide height in pixels.
    pub slide_height: f64,
    /// Slide size in EMU.
    pub slide_size_emu: (i64, i64),
    /// Media referenced by pictures and picture fills, first use first.
    pub media: Vec<MediaAsset>,
}

impl Conversion {
    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn media(&self, part_name: &str) -> Option<&MediaAsset> {
        self.media.iter().find(|m| m.part_name == part_name)
    }
}

/// Converts an opened `.pptx` package into slide models.
#[derive(Debug)]
pub struct Converter {
    package: Package,
}

impl Converter {
    /// Open a presentation file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            package: Package::open(path)?,
        })
    }

    /// Use an in-memory presentation.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Ok(Self {
            package: Package::from_bytes(data)?,
        })
    }

    pub fn package(&self) -> &Package {
        &self.package
    }

    /// Run the whole pipeline. Calling this again on the same converter
    /// yields an identical result.
    pub fn convert(&self, options: &ConvertOptions) -> Result<Conversion> {
        if options.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let mut diagnostics = Diagnostics::new();
        let graph = RelationshipGraph::resolve(&self.package, &mut diagnostics)?;

        let presentation = PresentationInfo::read(&self.package, &graph, options)?;
        let slide_size = presentation.slide_size;
        log::debug!(
            "{} slides, slide size {}x{} EMU",
            presentation.slides.len(),
            slide_size.0,
            slide_size.1
        );

        let sources = presentation
            .slides
            .iter()
            .map(|entry| match entry {
                SlideEntry::Part(slide) => graph.inheritance_chain(*slide).map(Some),
                SlideEntry::Missing { .. } => Ok(None),
            })
            .collect::<Result<Vec<Option<PartChain>>>>()?;
        let chains: Vec<PartChain> = sources.iter().flatten().copied().collect();
        let cache = TemplateCache::build(&self.package, &graph, &chains, &mut diagnostics);

        let items: Vec<(&SlideEntry, Option<PartChain>)> =
            presentation.slides.iter().zip(sources).collect();
        let slides = build_slides(&items, options, |index, (entry, chain)| match (entry, chain) {
            (_, Some(chain)) => {
                let ctx = SlideContext {
                    package: &self.package,
                    graph: &graph,
                    slide: chain.slide,
                    layout: chain.layout.and_then(|id| cache.template(id)),
                    master: chain.master.and_then(|id| cache.template(id)),
                    theme: chain.theme.and_then(|id| cache.theme(id)),
                    options,
                    slide_size,
                };
                build_slide(&ctx, index)
            }
            (SlideEntry::Missing { part_name, reason }, None) => {
                missing_slide(index, part_name, reason, options, slide_size)
            }
            (SlideEntry::Part(slide), None) => missing_slide(
                index,
                graph.name(*slide),
                "slide part has no inheritance chain",
                options,
                slide_size,
            ),
        })?;

        let mut combined = diagnostics.drain();
        for slide in &slides {
            combined.extend(slide.diagnostics.iter().cloned());
        }

        let (media, media_diagnostics) = collect_media(&self.package, &slides);
        combined.extend(media_diagnostics);

        if options.strict {
            if let Some(first) = combined.iter().find(|d| d.is_error()) {
                return Err(Error::Strict(Box::new(first.clone())));
            }
        }

        log::info!(
            "converted {} slides with {} diagnostics and {} media parts",
            slides.len(),
            combined.len(),
            media.len()
        );

        Ok(Conversion {
            slides,
            diagnostics: combined,
            slide_width: emu_to_px(slide_size.0, options.dpi()),
            slide_height: emu_to_px(slide_size.1, options.dpi()),
            slide_size_emu: slide_size,
            media,
        })
    }
}

/// Build one model per item, checking for cancellation before each.
///
/// A cancelled run returns `Error::Cancelled` and no models.
fn build_slides<T, F>(
    items: &[T],
    options: &ConvertOptions,
    build: F,
) -> Result<Vec<SlideModel>>
where
    T: Sync,
    F: Fn(usize, &T) -> SlideModel + Sync,
{
    let step = |(index, item): (usize, &T)| -> Result<SlideModel> {
        if options.is_cancelled() {
            return Err(Error::Cancelled);
        }
        Ok(build(index, item))
    };
    if options.parallel {
        items.par_iter().enumerate().map(step).collect()
    } else {
        items.iter().enumerate().map(step).collect()
    }
}

/// One entry of the slide order.
#[derive(Debug, Clone, PartialEq, Eq)]
enum SlideEntry {
    Part(PartId),
    /// Listed, but the target is absent or not a slide. `part_name` is
    /// empty when the entry names no part at all.
    Missing { part_name: String, reason: String },
}

/// Slide order and size from the presentation part.
struct PresentationInfo {
    slides: Vec<SlideEntry>,
    slide_size: (i64, i64),
}

impl PresentationInfo {
    /// Slides come from `p:sldIdLst`; without a presentation part or slide
    /// list, every slide part is taken in numeric order.
    fn read(
        package: &Package,
        graph: &RelationshipGraph,
        options: &ConvertOptions,
    ) -> Result<Self> {
        let mut info = Self {
            slides: Vec::new(),
            slide_size: options.fallback.slide_size,
        };

        if let Some(part) = graph.target_of_type(PartId::ROOT, rel_type::OFFICE_DOCUMENT) {
            let name = graph.name(part);
            let root = package.xml(name)?;
            if !root.is(ns::P, "presentation") {
                return Err(Error::MalformedPackage(format!(
                    "{} is not a presentation part",
                    name
                )));
            }
            if let Some(size) = root.child(ns::P, "sldSz").and_then(slide_size) {
                info.slide_size = size;
            }
            info.slides = listed_slides(&root, graph, part);
        }

        if info.slides.is_empty() {
            info.slides = numbered_slides(package, graph)
                .into_iter()
                .map(SlideEntry::Part)
                .collect();
        }
        if info.slides.is_empty() {
            return Err(Error::NoSlides);
        }
        Ok(info)
    }
}

fn slide_size(sld_sz: &Element) -> Option<(i64, i64)> {
    let cx = sld_sz.attr("cx")?.parse::<i64>().ok()?;
    let cy = sld_sz.attr("cy")?.parse::<i64>().ok()?;
    (cx > 0 && cy > 0).then_some((cx, cy))
}

/// Entries of `p:sldIdLst` in order. Every entry with a relationship id
/// yields one slide, so a broken entry still takes its place in the deck.
fn listed_slides(
    root: &Element,
    graph: &RelationshipGraph,
    presentation: PartId,
) -> Vec<SlideEntry> {
    let rels = PartRels::new(graph, presentation);
    let Some(list) = root.child(ns::P, "sldIdLst") else {
        return Vec::new();
    };
    let mut slides = Vec::new();
    for entry in list.children_named(ns::P, "sldId") {
        let Some(rel_id) = entry.attr_ns(ns::R, "id") else {
            continue;
        };
        let slide = match rels.get(rel_id).and_then(|r| r.target_part()) {
            Some(slide) if graph.part(slide).kind == PartKind::Slide => {
                SlideEntry::Part(slide)
            }
            Some(other) => SlideEntry::Missing {
                part_name: graph.name(other).to_string(),
                reason: format!(
                    "slide list entry {} targets {}, which is not a slide",
                    rel_id,
                    graph.name(other)
                ),
            },
            None => match graph.dangling_target(presentation, rel_id) {
                Some(path) => SlideEntry::Missing {
                    part_name: path.to_string(),
                    reason: format!("slide part {} is missing", path),
                },
                None => SlideEntry::Missing {
                    part_name: String::new(),
                    reason: format!("slide list entry {} has no target", rel_id),
                },
            },
        };
        if !slides.contains(&slide) {
            slides.push(slide);
        }
    }
    slides
}

/// Slide parts sorted by the number in their file name.
fn numbered_slides(package: &Package, graph: &RelationshipGraph) -> Vec<PartId> {
    let mut slides: Vec<(u32, &str)> = package
        .slide_part_names()
        .into_iter()
        .map(|name| (slide_number(name), name))
        .collect();
    slides.sort();
    slides
        .into_iter()
        .filter_map(|(_, name)| graph.part_id(name))
        .collect()
}

fn slide_number(name: &str) -> u32 {
    let stem = name
        .rsplit('/')
        .next()
        .unwrap_or(name)
        .trim_end_matches(".xml");
    let digits = stem.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    stem[digits..].parse().unwrap_or(u32::MAX)
}

/// Themes, layouts and masters, parsed once and shared by every slide.
struct TemplateCache {
    themes: BTreeMap<PartId, Option<Arc<Theme>>>,
    templates: BTreeMap<PartId, Arc<TemplatePart>>,
}

impl TemplateCache {
    /// Parse every theme, then masters, then layouts reachable from
    /// `chains`. Failures are recorded and leave an empty entry.
    fn build(
        package: &Package,
        graph: &RelationshipGraph,
        chains: &[PartChain],
        diagnostics: &mut Diagnostics,
    ) -> Self {
        let mut cache = Self {
            themes: BTreeMap::new(),
            templates: BTreeMap::new(),
        };

        for theme in chains.iter().filter_map(|c| c.theme) {
            if cache.themes.contains_key(&theme) {
                continue;
            }
            let parsed = load_theme(package, graph, theme, diagnostics);
            cache.themes.insert(theme, parsed.map(Arc::new));
        }

        let masters = chains.iter().filter_map(|c| c.master.map(|m| (m, c.theme)));
        let layouts = chains.iter().filter_map(|c| c.layout.map(|l| (l, c.theme)));
        for (part, theme) in masters.chain(layouts) {
            if cache.templates.contains_key(&part) {
                continue;
            }
            let theme = theme.and_then(|t| cache.theme(t));
            let template = load_template(package, graph, part, theme, diagnostics);
            cache.templates.insert(part, Arc::new(template));
        }

        log::debug!(
            "template cache: {} themes, {} layouts and masters",
            cache.themes.len(),
            cache.templates.len()
        );
        cache
    }

    fn theme(&self, id: PartId) -> Option<&Theme> {
        self.themes.get(&id)?.as_deref()
    }

    fn template(&self, id: PartId) -> Option<&TemplatePart> {
        self.templates.get(&id).map(Arc::as_ref)
    }
}

fn load_theme(
    package: &Package,
    graph: &RelationshipGraph,
    id: PartId,
    diagnostics: &mut Diagnostics,
) -> Option<Theme> {
    let name = graph.name(id);
    let parsed = package
        .xml(name)
        .map_err(|e| e.to_string())
        .and_then(|root| Theme::parse(&root, PartRels::new(graph, id)));
    match parsed {
        Ok(theme) => Some(theme),
        Err(reason) => {
            diagnostics.error(
                DiagnosticCode::ThemeResolveFailed,
                format!("theme could not be loaded: {}", reason),
                Location::part(name),
            );
            None
        }
    }
}

fn load_template(
    package: &Package,
    graph: &RelationshipGraph,
    id: PartId,
    theme: Option<&Theme>,
    diagnostics: &mut Diagnostics,
) -> TemplatePart {
    let name = graph.name(id);
    match package.xml(name) {
        Ok(root) => TemplatePart::parse(&root, name, PartRels::new(graph, id), theme, diagnostics),
        Err(e) => {
            diagnostics.error(
                DiagnosticCode::XmlParseFailed,
                e.to_string(),
                Location::part(name),
            );
            TemplatePart::empty(id, name)
        }
    }
}

/// Read every media part the slides reference, in first-use order.
fn collect_media(package: &Package, slides: &[SlideModel]) -> (Vec<MediaAsset>, Vec<Diagnostic>) {
    let mut seen = HashSet::new();
    let mut names: Vec<&str> = Vec::new();
    for slide in slides {
        let background = match &slide.background.fill {
            Fill::Picture { media } => Some(media.as_str()),
            _ => None,
        };
        let shapes = slide.all_shapes().into_iter().flat_map(shape_media);
        for name in background.into_iter().chain(shapes) {
            if seen.insert(name) {
                names.push(name);
            }
        }
    }

    let mut diagnostics = Diagnostics::new();
    let mut media = Vec::with_capacity(names.len());
    for name in names {
        match package.read_part(name) {
            Ok(bytes) => media.push(MediaAsset::new(
                name,
                package.content_type(name).unwrap_or(OCTET_STREAM),
                bytes.to_vec(),
            )),
            Err(e) => diagnostics.warn(
                DiagnosticCode::MissingPart,
                format!("media could not be read: {}", e),
                Location::part(name),
            ),
        }
    }
    (media, diagnostics.drain())
}

fn shape_media(shape: &ResolvedShape) -> Vec<&str> {
    let mut out = Vec::new();
    if let ShapeKind::Picture { media, .. } = &shape.kind {
        out.push(media.as_str());
    }
    for fill in [&shape.style.fill, &shape.style.line.fill] {
        if let Fill::Picture { media } = fill {
            out.push(media.as_str());
        }
    }
    if let ShapeKind::Table { table } = &shape.kind {
        for cell in table.rows.iter().flat_map(|r| &r.cells) {
            if let Fill::Picture { media } = &cell.fill {
                out.push(media.as_str());
            }
        }
    }
    out
}
