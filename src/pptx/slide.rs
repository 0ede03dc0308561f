//! Slide model building.
//!
//! Shapes are visited in document order. Each one is resolved on its own:
//! whatever goes wrong with a shape becomes a diagnostic and, at worst, an
//! `Unsupported` entry, and the builder moves on to the next shape.

use super::color::ColorResolver;
use super::style::{FillSpec, FontSpec, StyleFragment, StyleResolver};
use super::template::{
    color_map_override, parse_background, placeholder_of, PlaceholderEntry, TemplatePart,
};
use super::text::{parse_text_body, BodyProps, ListStyle, TextInheritance};
use super::theme::Theme;
use crate::container::Package;
use crate::diagnostics::{DiagnosticCode, Diagnostics, Location};
use crate::geometry::{
    compose_groups, emu_to_px, resolve_geometry, Geometry, GroupTransform, Xfrm,
};
use crate::model::{
    Cell, Fill, PlaceholderRef, ResolvedShape, Row, ShapeKind, SlideModel, StyleContext, Table,
};
use crate::options::ConvertOptions;
use crate::relationships::{PartId, PartRels, RelationshipGraph};
use crate::xml::{ns, Element};

/// Everything a slide needs from the rest of the package, shared read-only.
#[derive(Debug, Clone, Copy)]
pub struct SlideContext<'a> {
    pub package: &'a Package,
    pub graph: &'a RelationshipGraph,
    pub slide: PartId,
    pub layout: Option<&'a TemplatePart>,
    pub master: Option<&'a TemplatePart>,
    pub theme: Option<&'a Theme>,
    pub options: &'a ConvertOptions,
    /// Slide size in EMU.
    pub slide_size: (i64, i64),
}

/// Build the model of one slide. Never fails: an unreadable slide part
/// yields a degraded model carrying one error diagnostic.
pub fn build_slide(ctx: &SlideContext<'_>, index: usize) -> SlideModel {
    let part_name = ctx.graph.name(ctx.slide).to_string();
    let dpi = ctx.options.dpi();
    let fallback = &ctx.options.fallback;
    let mut diagnostics = Diagnostics::new();

    let mut model = SlideModel {
        index,
        number: index + 1,
        part_name: part_name.clone(),
        layout_part: ctx.layout.map(|l| l.name.clone()),
        width: emu_to_px(ctx.slide_size.0, dpi),
        height: emu_to_px(ctx.slide_size.1, dpi),
        hidden: false,
        degraded: false,
        background: background_style(Fill::solid(fallback.background), ctx),
        shapes: Vec::new(),
        diagnostics: Vec::new(),
    };

    let root = match ctx.package.xml(&part_name) {
        Ok(root) if root.is(ns::P, "sld") => root,
        Ok(root) => {
            let reason = format!("expected p:sld root, found {}", display_name(&root));
            return degrade(model, reason, diagnostics);
        }
        Err(e) => return degrade(model, e.to_string(), diagnostics),
    };
    log::debug!("building slide {} from {}", index + 1, part_name);

    model.hidden = root.attr("show") == Some("0");

    let color_map = color_map_override(&root)
        .or_else(|| ctx.layout.and_then(|l| l.color_map.clone()))
        .or_else(|| ctx.master.and_then(|m| m.color_map.clone()))
        .unwrap_or_default();
    let rels = PartRels::new(ctx.graph, ctx.slide);
    let styles = StyleResolver::new(
        ColorResolver::new(ctx.theme, &color_map, fallback.unresolved_color),
        fallback,
        dpi,
    );

    let c_sld = root.child(ns::P, "cSld");
    let background = c_sld
        .and_then(|c| parse_background(c, rels, ctx.theme))
        .or_else(|| ctx.layout.and_then(|l| l.background.clone()))
        .or_else(|| ctx.master.and_then(|m| m.background.clone()));
    if let Some(spec) = background {
        let fill = styles.resolve_fill(Some(&spec), &mut diagnostics, &Location::slide(index));
        model.background = background_style(fill, ctx);
    }

    let mut builder = ShapeBuilder {
        ctx,
        rels,
        styles,
        diagnostics,
        index,
        next_z: 0,
    };
    if let Some(tree) = c_sld.and_then(|c| c.child(ns::P, "spTree")) {
        model.shapes = builder.build_tree(tree, &[]);
    }

    model.diagnostics = builder.diagnostics.drain();
    model
}

fn degrade(mut model: SlideModel, reason: String, mut diagnostics: Diagnostics) -> SlideModel {
    diagnostics.error(
        DiagnosticCode::XmlParseFailed,
        format!("slide part could not be read: {}", reason),
        Location::slide(model.index).with_part(model.part_name.clone()),
    );
    model.degraded = true;
    model.diagnostics = diagnostics.drain();
    model
}

/// Placeholder model for a listed slide whose part is absent or not a slide.
///
/// `part_name` is empty when the slide list entry resolves to no part name.
pub fn missing_slide(
    index: usize,
    part_name: &str,
    reason: &str,
    options: &ConvertOptions,
    slide_size: (i64, i64),
) -> SlideModel {
    let mut location = Location::slide(index);
    if !part_name.is_empty() {
        location = location.with_part(part_name);
    }
    let mut diagnostics = Diagnostics::new();
    diagnostics.error(DiagnosticCode::MissingPart, reason, location);

    SlideModel {
        index,
        number: index + 1,
        part_name: part_name.to_string(),
        layout_part: None,
        width: emu_to_px(slide_size.0, options.dpi()),
        height: emu_to_px(slide_size.1, options.dpi()),
        hidden: false,
        degraded: true,
        background: StyleContext {
            fill: Fill::solid(options.fallback.background),
            ..StyleContext::defaults(&options.fallback)
        },
        shapes: Vec::new(),
        diagnostics: diagnostics.drain(),
    }
}

fn background_style(fill: Fill, ctx: &SlideContext<'_>) -> StyleContext {
    StyleContext {
        fill,
        color_scheme: ctx.theme.map(|t| t.name.clone()),
        ..StyleContext::defaults(&ctx.options.fallback)
    }
}

/// `p:sp` style prefix for element names in messages.
fn display_name(el: &Element) -> String {
    let prefix = match el.namespace() {
        Some(ns::P) => "p:",
        Some(ns::A) => "a:",
        Some(ns::MC) => "mc:",
        _ => "",
    };
    format!("{}{}", prefix, el.local_name())
}

/// Non-visual identity and transform shared by every shape kind.
struct ShapeHeader {
    id: u32,
    name: String,
    placeholder: Option<PlaceholderRef>,
    xfrm: Option<Xfrm>,
}

impl ShapeHeader {
    fn read(el: &Element) -> Result<Self, String> {
        let c_nv_pr = el
            .elements()
            .find(|e| e.namespace() == Some(ns::P) && e.local_name().starts_with("nv"))
            .and_then(|nv| nv.child(ns::P, "cNvPr"))
            .ok_or_else(|| "missing non-visual properties".to_string())?;
        let id = c_nv_pr
            .attr("id")
            .ok_or_else(|| "missing shape id".to_string())?;
        let id = id
            .parse::<u32>()
            .map_err(|_| format!("invalid shape id {:?}", id))?;
        let xfrm = Xfrm::of_shape(el).map_err(|e| e.to_string())?;
        Ok(Self {
            id,
            name: c_nv_pr.attr("name").unwrap_or_default().to_string(),
            placeholder: placeholder_of(el),
            xfrm,
        })
    }
}

/// Best-effort shape id for shapes whose header could not be read.
fn lenient_id(el: &Element) -> u32 {
    el.descendant(ns::P, "cNvPr")
        .and_then(|c| c.attr("id"))
        .and_then(|id| id.parse().ok())
        .unwrap_or(0)
}

struct ShapeBuilder<'s> {
    ctx: &'s SlideContext<'s>,
    rels: PartRels<'s>,
    styles: StyleResolver<'s>,
    diagnostics: Diagnostics,
    index: usize,
    next_z: usize,
}

impl<'s> ShapeBuilder<'s> {
    fn build_tree(&mut self, tree: &Element, groups: &[GroupTransform]) -> Vec<ResolvedShape> {
        let mut shapes = Vec::new();
        for el in tree.elements() {
            self.build_element(el, groups, &mut shapes);
        }
        shapes
    }

    fn build_element(
        &mut self,
        el: &Element,
        groups: &[GroupTransform],
        out: &mut Vec<ResolvedShape>,
    ) {
        if el.is(ns::MC, "AlternateContent") {
            match el.child(ns::MC, "Fallback") {
                Some(fallback) => {
                    for child in fallback.elements() {
                        self.build_element(child, groups, out);
                    }
                }
                None => out.push(self.unsupported(el, "alternate content without a fallback")),
            }
            return;
        }
        if el.namespace() == Some(ns::P)
            && matches!(el.local_name(), "nvGrpSpPr" | "grpSpPr" | "extLst")
        {
            return;
        }
        out.push(self.build_shape(el, groups));
    }

    fn take_z(&mut self) -> usize {
        let z = self.next_z;
        self.next_z += 1;
        z
    }

    fn build_shape(&mut self, el: &Element, groups: &[GroupTransform]) -> ResolvedShape {
        let known = el.namespace() == Some(ns::P)
            && matches!(
                el.local_name(),
                "sp" | "cxnSp" | "pic" | "grpSp" | "graphicFrame"
            );
        if !known {
            return self.unsupported(el, "unknown shape element");
        }

        let z_order = self.take_z();
        let header = match ShapeHeader::read(el) {
            Ok(header) => header,
            Err(reason) => return self.malformed(el, z_order, reason),
        };

        // Table structure is validated before anything is recorded for the
        // shape, so a malformed table yields a single diagnostic.
        let table_grid = match el
            .path(ns::A, &["graphic", "graphicData"])
            .and_then(|data| data.child(ns::A, "tbl"))
        {
            Some(tbl) if el.is(ns::P, "graphicFrame") => match TableGrid::read(tbl) {
                Ok(grid) => Some(grid),
                Err(reason) => return self.malformed(el, z_order, reason),
            },
            _ => None,
        };

        let location = Location::slide(self.index).with_shape(header.id);
        let (layout_entry, master_entry) = self.template_entries(header.placeholder.as_ref());

        let frame = resolve_geometry(
            header.xfrm.as_ref(),
            &[
                layout_entry.and_then(|e| e.xfrm.as_ref()),
                master_entry.and_then(|e| e.xfrm.as_ref()),
            ],
            header.placeholder.as_ref().map(|p| p.kind.as_str()),
            self.ctx.slide_size,
            &mut self.diagnostics,
            &location,
        );
        let geometry = compose_groups(frame, groups).to_geometry(self.styles.dpi);

        let own = if el.is(ns::P, "grpSp") {
            StyleFragment {
                fill: el
                    .child(ns::P, "grpSpPr")
                    .and_then(|p| FillSpec::from_properties(p, self.rels)),
                ..StyleFragment::default()
            }
        } else {
            StyleFragment::from_shape(el, self.rels)
        };
        let theme_refs = el
            .child(ns::P, "style")
            .map(|style| StyleFragment::from_style_refs(style, self.ctx.theme))
            .or_else(|| layout_entry.and_then(|e| e.style_refs.clone()))
            .or_else(|| master_entry.and_then(|e| e.style_refs.clone()))
            .unwrap_or_default();
        let empty = StyleFragment::default();
        let levels = [
            &own,
            layout_entry.map(|e| &e.fragment).unwrap_or(&empty),
            master_entry.map(|e| &e.fragment).unwrap_or(&empty),
            &theme_refs,
        ];
        let style = self
            .styles
            .resolve_style(&levels, &mut self.diagnostics, &location);

        let kind = match el.local_name() {
            "sp" => {
                let text = el.child(ns::P, "txBody").map(|body| {
                    self.text_body(
                        body,
                        header.placeholder.as_ref(),
                        layout_entry,
                        master_entry,
                        &theme_refs.font,
                        &location,
                    )
                });
                match text {
                    Some(text) if text.has_text() => ShapeKind::TextBox { text },
                    text => ShapeKind::AutoShape {
                        preset: preset_geometry(el),
                        connector: false,
                        text,
                    },
                }
            }
            "cxnSp" => ShapeKind::AutoShape {
                preset: preset_geometry(el),
                connector: true,
                text: None,
            },
            "pic" => self.picture(el, &location),
            "grpSp" => {
                let mut inner = groups.to_vec();
                if let Some(xfrm) = &header.xfrm {
                    inner.push(GroupTransform::new(xfrm));
                }
                ShapeKind::Group {
                    children: self.build_tree(el, &inner),
                }
            }
            _ => match table_grid {
                Some(grid) => ShapeKind::Table {
                    table: self.table(grid, &location),
                },
                None => self.graphic_frame(el, &location),
            },
        };

        ResolvedShape {
            id: header.id,
            name: header.name,
            z_order,
            geometry,
            style,
            placeholder: header.placeholder,
            kind,
        }
    }

    /// Matching layout placeholder (by idx, else type), then the master
    /// placeholder for the layout's type.
    fn template_entries(
        &self,
        placeholder: Option<&PlaceholderRef>,
    ) -> (Option<&'s PlaceholderEntry>, Option<&'s PlaceholderEntry>) {
        let Some(placeholder) = placeholder else {
            return (None, None);
        };
        let layout_entry = self
            .ctx
            .layout
            .and_then(|layout| layout.find_for_slide(placeholder));
        let kind = layout_entry
            .map(|e| e.placeholder.kind.as_str())
            .unwrap_or(placeholder.kind.as_str());
        let master_entry = self
            .ctx
            .master
            .and_then(|master| master.find_for_layout(kind));
        (layout_entry, master_entry)
    }

    fn text_body(
        &mut self,
        tx_body: &Element,
        placeholder: Option<&PlaceholderRef>,
        layout_entry: Option<&PlaceholderEntry>,
        master_entry: Option<&PlaceholderEntry>,
        theme_font: &FontSpec,
        location: &Location,
    ) -> crate::model::TextBody {
        let mut lists: Vec<&ListStyle> = Vec::new();
        lists.extend(layout_entry.map(|e| &e.list_style));
        lists.extend(master_entry.map(|e| &e.list_style));
        lists.extend(
            self.ctx
                .master
                .and_then(|m| m.text_styles.as_ref())
                .map(|styles| styles.for_placeholder(placeholder)),
        );
        let mut bodies: Vec<&BodyProps> = Vec::new();
        bodies.extend(layout_entry.map(|e| &e.body));
        bodies.extend(master_entry.map(|e| &e.body));

        let inherited = TextInheritance {
            list_styles: &lists,
            bodies: &bodies,
            theme_font: (!theme_font.is_empty()).then_some(theme_font),
        };
        parse_text_body(
            tx_body,
            inherited,
            self.rels,
            &self.styles,
            &mut self.diagnostics,
            location,
        )
    }

    fn picture(&mut self, el: &Element, location: &Location) -> ShapeKind {
        let embed = el
            .child(ns::P, "blipFill")
            .and_then(|fill| fill.child(ns::A, "blip"))
            .and_then(|blip| blip.attr_ns(ns::R, "embed"));
        let Some(embed) = embed else {
            self.diagnostics.warn(
                DiagnosticCode::UnsupportedFeature,
                "picture without an embedded image",
                location.clone(),
            );
            return ShapeKind::Unsupported {
                element: display_name(el),
                reason: "no embedded image".to_string(),
            };
        };
        match self.rels.part_name(embed) {
            Some(media) => ShapeKind::Picture {
                media: media.to_string(),
                content_type: self.ctx.package.content_type(media).map(str::to_string),
            },
            None => {
                self.diagnostics.warn(
                    DiagnosticCode::MissingPart,
                    format!("picture relationship {} does not resolve to a part", embed),
                    location.clone(),
                );
                ShapeKind::Unsupported {
                    element: display_name(el),
                    reason: format!("missing image {}", embed),
                }
            }
        }
    }

    /// Charts, diagrams and OLE objects. An OLE object with a preview image
    /// becomes that picture.
    fn graphic_frame(&mut self, el: &Element, location: &Location) -> ShapeKind {
        let data = el.path(ns::A, &["graphic", "graphicData"]);
        let uri = data.and_then(|d| d.attr("uri")).unwrap_or_default();

        if let Some(preview) = data.and_then(|d| d.descendant(ns::P, "pic")) {
            if let ShapeKind::Picture { media, content_type } = self.picture_quiet(preview) {
                self.diagnostics.warn(
                    DiagnosticCode::RasterizedFallback,
                    format!("{} replaced by its preview image", describe_graphic(uri)),
                    location.clone(),
                );
                return ShapeKind::Picture { media, content_type };
            }
        }

        let what = describe_graphic(uri);
        self.diagnostics.warn(
            DiagnosticCode::UnsupportedFeature,
            format!("{} is not supported", what),
            location.clone(),
        );
        ShapeKind::Unsupported {
            element: display_name(el),
            reason: what,
        }
    }

    /// Like [`Self::picture`] without recording anything.
    fn picture_quiet(&self, el: &Element) -> ShapeKind {
        let media = el
            .child(ns::P, "blipFill")
            .and_then(|fill| fill.child(ns::A, "blip"))
            .and_then(|blip| blip.attr_ns(ns::R, "embed"))
            .and_then(|embed| self.rels.part_name(embed));
        match media {
            Some(media) => ShapeKind::Picture {
                media: media.to_string(),
                content_type: self.ctx.package.content_type(media).map(str::to_string),
            },
            None => ShapeKind::Unsupported {
                element: display_name(el),
                reason: "no preview image".to_string(),
            },
        }
    }

    fn table(&mut self, grid: TableGrid<'_>, location: &Location) -> Table {
        let dpi = self.styles.dpi;
        let empty = Element::empty();
        let mut rows = Vec::with_capacity(grid.rows.len());
        for row in &grid.rows {
            let mut cells = Vec::with_capacity(row.cells.len());
            for cell in &row.cells {
                let text = parse_text_body(
                    cell.element.child(ns::A, "txBody").unwrap_or(&empty),
                    TextInheritance::default(),
                    self.rels,
                    &self.styles,
                    &mut self.diagnostics,
                    location,
                );
                let fill_spec = cell
                    .element
                    .child(ns::A, "tcPr")
                    .and_then(|props| FillSpec::from_properties(props, self.rels));
                cells.push(Cell {
                    text,
                    col_span: cell.col_span,
                    row_span: cell.row_span,
                    h_merge: cell.h_merge,
                    v_merge: cell.v_merge,
                    fill: self
                        .styles
                        .resolve_fill(fill_spec.as_ref(), &mut self.diagnostics, location),
                });
            }
            rows.push(Row {
                height: emu_to_px(row.height, dpi),
                cells,
            });
        }
        Table {
            columns: grid.columns.iter().map(|w| emu_to_px(*w, dpi)).collect(),
            rows,
        }
    }

    /// A shape that failed validation: one `XML_PARSE_FAILED`, nothing else.
    fn malformed(&mut self, el: &Element, z_order: usize, reason: String) -> ResolvedShape {
        let id = lenient_id(el);
        let mut location = Location::slide(self.index);
        if id != 0 {
            location = location.with_shape(id);
        }
        self.diagnostics.error(
            DiagnosticCode::XmlParseFailed,
            format!("malformed {}: {}", display_name(el), reason),
            location,
        );
        self.placeholder_shape(el, id, z_order, reason)
    }

    /// An element the model has no kind for: one `UNSUPPORTED_FEATURE`.
    fn unsupported(&mut self, el: &Element, reason: &str) -> ResolvedShape {
        let z_order = self.take_z();
        let id = lenient_id(el);
        let mut location = Location::slide(self.index);
        if id != 0 {
            location = location.with_shape(id);
        }
        self.diagnostics.warn(
            DiagnosticCode::UnsupportedFeature,
            format!("{}: {}", display_name(el), reason),
            location,
        );
        self.placeholder_shape(el, id, z_order, reason.to_string())
    }

    fn placeholder_shape(
        &self,
        el: &Element,
        id: u32,
        z_order: usize,
        reason: String,
    ) -> ResolvedShape {
        ResolvedShape {
            id,
            name: el
                .descendant(ns::P, "cNvPr")
                .and_then(|c| c.attr("name"))
                .unwrap_or_default()
                .to_string(),
            z_order,
            geometry: Geometry::zero(),
            style: StyleContext::defaults(&self.ctx.options.fallback),
            placeholder: None,
            kind: ShapeKind::Unsupported {
                element: display_name(el),
                reason,
            },
        }
    }
}

fn preset_geometry(el: &Element) -> Option<String> {
    let sp_pr = el.child(ns::P, "spPr")?;
    if let Some(preset) = sp_pr.child(ns::A, "prstGeom") {
        return preset.attr("prst").map(str::to_string);
    }
    sp_pr.child(ns::A, "custGeom").map(|_| "custom".to_string())
}

fn describe_graphic(uri: &str) -> String {
    match uri.rsplit('/').next().unwrap_or_default() {
        "chart" => "chart".to_string(),
        "diagram" => "SmartArt diagram".to_string(),
        "ole" => "OLE object".to_string(),
        "" => "graphic frame".to_string(),
        _ => format!("graphic frame ({})", uri),
    }
}

/// Validated numeric structure of an `a:tbl`.
struct TableGrid<'t> {
    columns: Vec<i64>,
    rows: Vec<GridRow<'t>>,
}

struct GridRow<'t> {
    height: i64,
    cells: Vec<GridCell<'t>>,
}

struct GridCell<'t> {
    element: &'t Element,
    col_span: u32,
    row_span: u32,
    h_merge: bool,
    v_merge: bool,
}

impl<'t> TableGrid<'t> {
    fn read(tbl: &'t Element) -> Result<Self, String> {
        let columns = tbl
            .child(ns::A, "tblGrid")
            .map(|grid| {
                grid.children_named(ns::A, "gridCol")
                    .map(|col| extent(col, "w"))
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?
            .unwrap_or_default();

        let rows = tbl
            .children_named(ns::A, "tr")
            .map(|tr| {
                let cells = tr
                    .children_named(ns::A, "tc")
                    .map(|tc| {
                        Ok(GridCell {
                            element: tc,
                            col_span: span(tc, "gridSpan")?,
                            row_span: span(tc, "rowSpan")?,
                            h_merge: flag(tc, "hMerge"),
                            v_merge: flag(tc, "vMerge"),
                        })
                    })
                    .collect::<Result<Vec<_>, String>>()?;
                Ok(GridRow {
                    height: extent(tr, "h")?,
                    cells,
                })
            })
            .collect::<Result<Vec<_>, String>>()?;

        Ok(Self { columns, rows })
    }
}

fn extent(el: &Element, name: &str) -> Result<i64, String> {
    match el.attr(name) {
        None => Ok(0),
        Some(v) => match v.parse::<i64>() {
            Ok(n) if n >= 0 => Ok(n),
            _ => Err(format!("invalid {} {:?} on {}", name, v, display_name(el))),
        },
    }
}

fn span(el: &Element, name: &str) -> Result<u32, String> {
    match el.attr(name) {
        None => Ok(1),
        Some(v) => match v.parse::<u32>() {
            Ok(n) if n >= 1 => Ok(n),
            _ => Err(format!("invalid {} {:?}", name, v)),
        },
    }
}

fn flag(el: &Element, name: &str) -> bool {
    matches!(el.attr(name), Some("1") | Some("true"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Severity;
    use crate::test_support::{picture, plain_shape, text_shape, xfrm, DeckBuilder};

    /// Build slide 1 of a deck with the same wiring as a full conversion.
    fn build(deck: DeckBuilder) -> SlideModel {
        let package = Package::from_bytes(deck.build()).unwrap();
        let mut diags = Diagnostics::new();
        let graph = RelationshipGraph::resolve(&package, &mut diags).unwrap();
        let slide = graph.part_id("ppt/slides/slide1.xml").unwrap();
        let chain = graph.inheritance_chain(slide).unwrap();
        let theme = chain.theme.map(|t| {
            let root = package.xml(graph.name(t)).unwrap();
            Theme::parse(&root, PartRels::new(&graph, t)).unwrap()
        });
        let template = |id: Option<PartId>| {
            id.map(|id| {
                let root = package.xml(graph.name(id)).unwrap();
                TemplatePart::parse(
                    &root,
                    graph.name(id),
                    PartRels::new(&graph, id),
                    theme.as_ref(),
                    &mut Diagnostics::new(),
                )
            })
        };
        let layout = template(chain.layout);
        let master = template(chain.master);
        let options = ConvertOptions::default();
        let ctx = SlideContext {
            package: &package,
            graph: &graph,
            slide,
            layout: layout.as_ref(),
            master: master.as_ref(),
            theme: theme.as_ref(),
            options: &options,
            slide_size: (9_144_000, 6_858_000),
        };
        build_slide(&ctx, 0)
    }

    #[test]
    fn test_text_and_auto_shapes() {
        let shapes = format!(
            "{}{}",
            text_shape(2, None, &xfrm(914400, 914400, 914400, 914400), "Hello"),
            plain_shape(
                3,
                &format!(r#"{}<a:prstGeom prst="ellipse"><a:avLst/></a:prstGeom>"#, xfrm(0, 0, 10, 10)),
            ),
        );
        let slide = build(DeckBuilder::new().slide(&shapes));
        assert_eq!(slide.shapes.len(), 2);
        assert!(matches!(&slide.shapes[0].kind, ShapeKind::TextBox { text } if text.plain_text() == "Hello"));
        assert!(matches!(
            &slide.shapes[1].kind,
            ShapeKind::AutoShape { preset: Some(p), connector: false, .. } if p == "ellipse"
        ));
        assert_eq!(slide.shapes[0].geometry.x, 96.0);
        assert_eq!(slide.shapes[0].geometry.width, 96.0);
        assert_eq!(slide.shapes[1].z_order, 1);
        assert!(!slide.degraded);
        assert!(slide.diagnostics.is_empty(), "{:?}", slide.diagnostics);
    }

    #[test]
    fn test_placeholder_inherits_layout_geometry_and_master_text_style() {
        let title = text_shape(2, Some(r#"type="title""#), "", "Deck title");
        let slide = build(DeckBuilder::new().slide(&title));
        let shape = &slide.shapes[0];
        assert_eq!(shape.geometry.x, emu_to_px(457200, 96.0));
        assert_eq!(shape.geometry.height, emu_to_px(1143000, 96.0));
        let ShapeKind::TextBox { text } = &shape.kind else {
            panic!("expected text box, got {:?}", shape.kind);
        };
        let run = &text.paragraphs[0].runs[0];
        assert_eq!(run.font.size, 44.0);
        assert_eq!(run.font.family, "Calibri Light");
        assert_eq!(text.paragraphs[0].alignment, crate::model::TextAlignment::Center);
        assert_eq!(shape.placeholder.as_ref().unwrap().kind, "title");
    }

    #[test]
    fn test_body_placeholder_matched_by_idx() {
        let body = text_shape(3, Some(r#"idx="1""#), "", "Point");
        let slide = build(DeckBuilder::new().slide(&body));
        let shape = &slide.shapes[0];
        assert_eq!(shape.geometry.y, emu_to_px(1600200, 96.0));
        let ShapeKind::TextBox { text } = &shape.kind else {
            panic!("expected text box");
        };
        assert_eq!(text.paragraphs[0].runs[0].font.size, 32.0);
        assert_eq!(
            text.paragraphs[0].bullet,
            Some(crate::model::Bullet::Char { char: "•".into() })
        );
    }

    #[test]
    fn test_unmatched_placeholder_uses_default_rect() {
        let footer = text_shape(4, Some(r#"type="ftr""#), "", "Footer");
        let slide = build(DeckBuilder::new().slide(&footer));
        let g = slide.shapes[0].geometry;
        assert!((g.y - emu_to_px((0.9268f64 * 6_858_000.0).round() as i64, 96.0)).abs() < 1e-9);
        assert_eq!(slide.diagnostics.len(), 1);
        assert_eq!(slide.diagnostics[0].code, DiagnosticCode::UnsupportedFeature);
    }

    #[test]
    fn test_malformed_shape_isolated() {
        let shapes = format!(
            "{}{}{}",
            text_shape(2, None, &xfrm(0, 0, 100, 100), "ok"),
            text_shape(
                3,
                None,
                r#"<a:xfrm><a:off x="0" y="0"/><a:ext cx="-5" cy="10"/></a:xfrm>"#,
                "broken"
            ),
            plain_shape(4, &xfrm(0, 0, 100, 100)),
        );
        let slide = build(DeckBuilder::new().slide(&shapes));
        assert_eq!(slide.shapes.len(), 3);
        let unsupported: Vec<_> = slide
            .shapes
            .iter()
            .filter(|s| s.kind.is_unsupported())
            .collect();
        assert_eq!(unsupported.len(), 1);
        assert_eq!(unsupported[0].id, 3);
        assert_eq!(slide.diagnostics.len(), 1);
        assert_eq!(slide.diagnostics[0].code, DiagnosticCode::XmlParseFailed);
        assert_eq!(slide.diagnostics[0].severity, Severity::Error);
        assert_eq!(slide.diagnostics[0].location.shape_id, Some(3));
    }

    #[test]
    fn test_group_children_compose() {
        let group = format!(
            r#"<p:grpSp><p:nvGrpSpPr><p:cNvPr id="10" name="Group"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="914400" y="914400"/><a:ext cx="1828800" cy="1828800"/><a:chOff x="0" y="0"/><a:chExt cx="914400" cy="914400"/></a:xfrm></p:grpSpPr>{}</p:grpSp>"#,
            plain_shape(11, &xfrm(457200, 0, 457200, 457200))
        );
        let slide = build(DeckBuilder::new().slide(&group));
        let ShapeKind::Group { children } = &slide.shapes[0].kind else {
            panic!("expected group");
        };
        let child = &children[0];
        assert_eq!(child.geometry.x, 192.0);
        assert_eq!(child.geometry.y, 96.0);
        assert_eq!(child.geometry.width, 96.0);
        assert_eq!(slide.shapes[0].z_order, 0);
        assert_eq!(child.z_order, 1);
    }

    #[test]
    fn test_picture_and_missing_media() {
        let shapes = format!(
            "{}{}",
            picture(5, "rId2", &xfrm(0, 0, 10, 10)),
            picture(6, "rId9", &xfrm(0, 0, 10, 10)),
        );
        let deck = DeckBuilder::new()
            .slide_with(&shapes, &[("rId2", "image", "../media/image1.png")], "", "")
            .binary_part("ppt/media/image1.png", &[0x89, b'P', b'N', b'G']);
        let slide = build(deck);
        assert!(matches!(
            &slide.shapes[0].kind,
            ShapeKind::Picture { media, content_type: Some(ct) }
                if media == "ppt/media/image1.png" && ct == "image/png"
        ));
        assert!(slide.shapes[1].kind.is_unsupported());
        assert_eq!(slide.diagnostics.len(), 1);
        assert_eq!(slide.diagnostics[0].code, DiagnosticCode::MissingPart);
    }

    #[test]
    fn test_table_frame() {
        let frame = r#"<p:graphicFrame><p:nvGraphicFramePr><p:cNvPr id="7" name="Table"/><p:cNvGraphicFramePr/><p:nvPr/></p:nvGraphicFramePr><p:xfrm><a:off x="0" y="0"/><a:ext cx="1828800" cy="914400"/></p:xfrm><a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/table"><a:tbl><a:tblGrid><a:gridCol w="914400"/><a:gridCol w="914400"/></a:tblGrid><a:tr h="457200"><a:tc gridSpan="2"><a:txBody><a:bodyPr/><a:p><a:r><a:t>Head</a:t></a:r></a:p></a:txBody><a:tcPr><a:solidFill><a:srgbClr val="FF0000"/></a:solidFill></a:tcPr></a:tc><a:tc hMerge="1"><a:txBody><a:bodyPr/><a:p/></a:txBody><a:tcPr/></a:tc></a:tr></a:tbl></a:graphicData></a:graphic></p:graphicFrame>"#;
        let slide = build(DeckBuilder::new().slide(frame));
        let ShapeKind::Table { table } = &slide.shapes[0].kind else {
            panic!("expected table, got {:?}", slide.shapes[0].kind);
        };
        assert_eq!(table.columns, vec![96.0, 96.0]);
        assert_eq!(table.rows[0].height, 48.0);
        assert_eq!(table.rows[0].cells[0].col_span, 2);
        assert_eq!(table.rows[0].cells[0].text.plain_text(), "Head");
        assert_eq!(table.rows[0].cells[0].fill.color(), Some(crate::model::Color::rgb(255, 0, 0)));
        assert!(table.rows[0].cells[1].h_merge);
        assert_eq!(slide.shapes[0].geometry.width, 192.0);
    }

    #[test]
    fn test_chart_and_unknown_elements() {
        let shapes = r#"<p:graphicFrame><p:nvGraphicFramePr><p:cNvPr id="8" name="Chart"/><p:cNvGraphicFramePr/><p:nvPr/></p:nvGraphicFramePr><p:xfrm><a:off x="0" y="0"/><a:ext cx="10" cy="10"/></p:xfrm><a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/chart"/></a:graphic></p:graphicFrame><p:contentPart r:id="rId5"/>"#;
        let slide = build(DeckBuilder::new().slide(shapes));
        assert_eq!(slide.shapes.len(), 2);
        assert!(slide.shapes.iter().all(|s| s.kind.is_unsupported()));
        assert_eq!(slide.diagnostics.len(), 2);
        assert!(slide
            .diagnostics
            .iter()
            .all(|d| d.code == DiagnosticCode::UnsupportedFeature));
    }

    #[test]
    fn test_alternate_content_fallback() {
        let shapes = format!(
            r#"<mc:AlternateContent xmlns:mc="http://schemas.openxmlformats.org/markup-compatibility/2006"><mc:Choice Requires="p14"><p:contentPart r:id="rId5"/></mc:Choice><mc:Fallback>{}</mc:Fallback></mc:AlternateContent>"#,
            text_shape(2, None, &xfrm(0, 0, 10, 10), "fallback")
        );
        let slide = build(DeckBuilder::new().slide(&shapes));
        assert_eq!(slide.shapes.len(), 1);
        assert!(matches!(&slide.shapes[0].kind, ShapeKind::TextBox { .. }));
    }

    #[test]
    fn test_background_inherited_from_master() {
        let slide = build(DeckBuilder::new().slide(""));
        assert_eq!(slide.background.fill.color(), Some(crate::model::Color::WHITE));

        let slide = build(DeckBuilder::new().slide_with(
            "",
            &[],
            r#"<p:bg><p:bgPr><a:solidFill><a:schemeClr val="accent1"/></a:solidFill></p:bgPr></p:bg>"#,
            "",
        ));
        assert_eq!(slide.background.fill.color(), crate::model::Color::from_hex("4F81BD"));
    }

    #[test]
    fn test_hidden_slide() {
        let slide = build(DeckBuilder::new().slide_with("", &[], "", r#"show="0""#));
        assert!(slide.hidden);
    }

    #[test]
    fn test_hyperlink_run() {
        let shape = r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Link"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="10" cy="10"/></a:xfrm></p:spPr><p:txBody><a:bodyPr/><a:p><a:r><a:rPr><a:hlinkClick r:id="rId3"/></a:rPr><a:t>site</a:t></a:r></a:p></p:txBody></p:sp>"#;
        let slide = build(DeckBuilder::new().slide_with(
            shape,
            &[("rId3", "hyperlink", "https://example.com/")],
            "",
            "",
        ));
        let ShapeKind::TextBox { text } = &slide.shapes[0].kind else {
            panic!("expected text box");
        };
        assert_eq!(
            text.paragraphs[0].runs[0].hyperlink.as_deref(),
            Some("https://example.com/")
        );
    }
}
