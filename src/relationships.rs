//! Relationship graph of an OPC package.
//!
//! Parts live in an arena indexed by [`PartId`]; relationships are plain
//! edges between arena slots. Shared targets (one theme used by several
//! masters) are just several edges pointing at the same slot.

use crate::container::Package;
use crate::content_types::{PartKind, PRESENTATION_CONTENT_TYPE};
use crate::diagnostics::{DiagnosticCode, Diagnostics, Location};
use crate::error::{Error, Result};
use crate::xml::{ns, Element};
use std::collections::{HashMap, VecDeque};

/// Relationship type names, matched on the last segment of the type URI so
/// Transitional and Strict URIs behave the same.
pub mod rel_type {
    pub const OFFICE_DOCUMENT: &str = "officeDocument";
    pub const SLIDE: &str = "slide";
    pub const SLIDE_LAYOUT: &str = "slideLayout";
    pub const SLIDE_MASTER: &str = "slideMaster";
    pub const THEME: &str = "theme";
    pub const IMAGE: &str = "image";
    pub const HYPERLINK: &str = "hyperlink";
}

/// Index of a part in the graph arena. Slot 0 is the package root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartId(usize);

impl PartId {
    pub const ROOT: PartId = PartId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

/// A part known to the graph.
#[derive(Debug, Clone)]
pub struct PartNode {
    /// Part name; empty for the package root.
    pub name: String,
    pub kind: PartKind,
    pub content_type: Option<String>,
}

/// Target of a relationship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelTarget {
    Part(PartId),
    External(String),
}

/// A directed edge from a source part.
#[derive(Debug, Clone)]
pub struct Relationship {
    pub source: PartId,
    pub id: String,
    pub rel_type: String,
    pub target: RelTarget,
}

impl Relationship {
    /// Last segment of the relationship type URI.
    pub fn type_name(&self) -> &str {
        type_name(&self.rel_type)
    }

    pub fn is_type(&self, name: &str) -> bool {
        self.type_name() == name
    }

    pub fn target_part(&self) -> Option<PartId> {
        match self.target {
            RelTarget::Part(id) => Some(id),
            RelTarget::External(_) => None,
        }
    }
}

fn type_name(uri: &str) -> &str {
    uri.rsplit('/').next().unwrap_or(uri)
}

/// The parts a slide inherits from, in inheritance order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartChain {
    pub slide: PartId,
    pub layout: Option<PartId>,
    pub master: Option<PartId>,
    pub theme: Option<PartId>,
}

/// Parts and relationships of a package.
#[derive(Debug)]
pub struct RelationshipGraph {
    parts: Vec<PartNode>,
    by_name: HashMap<String, PartId>,
    edges: Vec<Relationship>,
    outgoing: Vec<Vec<usize>>,
    /// Dropped internal targets, keyed by source part and relationship `Id`.
    dangling: HashMap<(PartId, String), String>,
}

const INHERITANCE_HOPS: [(&str, PartKind); 3] = [
    (rel_type::SLIDE_LAYOUT, PartKind::SlideLayout),
    (rel_type::SLIDE_MASTER, PartKind::SlideMaster),
    (rel_type::THEME, PartKind::Theme),
];

impl RelationshipGraph {
    /// Build the graph from every `.rels` part of the package.
    ///
    /// Dangling internal targets are dropped and reported as `MISSING_PART`.
    /// A malformed package-root or presentation `.rels` is fatal; any other
    /// malformed `.rels` is reported and contributes no edges.
    pub fn resolve(package: &Package, diagnostics: &mut Diagnostics) -> Result<Self> {
        let mut graph = Self {
            parts: vec![PartNode {
                name: String::new(),
                kind: PartKind::Other,
                content_type: None,
            }],
            by_name: HashMap::new(),
            edges: Vec::new(),
            outgoing: vec![Vec::new()],
            dangling: HashMap::new(),
        };

        for name in package.part_names().filter(|n| !is_rels_part(n)) {
            let id = PartId(graph.parts.len());
            graph.parts.push(PartNode {
                name: name.to_string(),
                kind: package.kind(name),
                content_type: package.content_type(name).map(str::to_string),
            });
            graph.by_name.insert(name.to_ascii_lowercase(), id);
            graph.outgoing.push(Vec::new());
        }

        for index in 0..graph.parts.len() {
            let source = PartId(index);
            let source_name = graph.parts[index].name.clone();
            let rels_name = Package::rels_path_for(&source_name);
            if !package.contains(&rels_name) {
                continue;
            }

            let critical = source == PartId::ROOT || graph.is_presentation(source);
            let root = match package.xml(&rels_name) {
                Ok(root) if root.is(ns::PKG_RELS, "Relationships") => root,
                Ok(_) if critical => {
                    return Err(Error::MalformedPackage(format!(
                        "{} is not a relationships part",
                        rels_name
                    )))
                }
                Err(e) if critical => {
                    return Err(Error::MalformedPackage(format!("{}: {}", rels_name, e)))
                }
                Ok(_) => {
                    diagnostics.error(
                        DiagnosticCode::XmlParseFailed,
                        "relationships part has no Relationships root",
                        Location::part(rels_name),
                    );
                    continue;
                }
                Err(e) => {
                    diagnostics.error(
                        DiagnosticCode::XmlParseFailed,
                        e.to_string(),
                        Location::part(rels_name),
                    );
                    continue;
                }
            };

            graph.add_edges(package, source, &source_name, &rels_name, &root, diagnostics);
        }

        graph.check_reachable_content_types()?;

        log::debug!(
            "relationship graph: {} parts, {} edges",
            graph.parts.len() - 1,
            graph.edges.len()
        );
        Ok(graph)
    }

    fn add_edges(
        &mut self,
        package: &Package,
        source: PartId,
        source_name: &str,
        rels_name: &str,
        root: &Element,
        diagnostics: &mut Diagnostics,
    ) {
        for rel in root.children_named(ns::PKG_RELS, "Relationship") {
            let (Some(id), Some(rel_type), Some(target)) =
                (rel.attr("Id"), rel.attr("Type"), rel.attr("Target"))
            else {
                diagnostics.warn(
                    DiagnosticCode::XmlParseFailed,
                    "relationship without Id, Type or Target",
                    Location::part(rels_name),
                );
                continue;
            };

            let external = rel
                .attr("TargetMode")
                .is_some_and(|m| m.eq_ignore_ascii_case("External"));
            let target = if external {
                RelTarget::External(target.to_string())
            } else {
                let path = Package::resolve_path(source_name, target);
                let resolved = package
                    .canonical_name(&path)
                    .and_then(|name| self.part_id(name));
                match resolved {
                    Some(part) => RelTarget::Part(part),
                    None => {
                        diagnostics.warn(
                            DiagnosticCode::MissingPart,
                            format!("relationship {} targets missing part {}", id, path),
                            Location::part(rels_name),
                        );
                        self.dangling.insert((source, id.to_string()), path);
                        continue;
                    }
                }
            };

            self.outgoing[source.0].push(self.edges.len());
            self.edges.push(Relationship {
                source,
                id: id.to_string(),
                rel_type: rel_type.to_string(),
                target,
            });
        }
    }

    /// Every part reachable from the package root must declare a content type.
    fn check_reachable_content_types(&self) -> Result<()> {
        let mut seen = vec![false; self.parts.len()];
        let mut queue = VecDeque::from([PartId::ROOT]);
        seen[0] = true;

        while let Some(current) = queue.pop_front() {
            for rel in self.relationships(current) {
                let Some(target) = rel.target_part() else {
                    continue;
                };
                if seen[target.0] {
                    continue;
                }
                seen[target.0] = true;
                let node = &self.parts[target.0];
                if node.content_type.is_none() {
                    return Err(Error::ContentType {
                        part: node.name.clone(),
                    });
                }
                queue.push_back(target);
            }
        }
        Ok(())
    }

    fn is_presentation(&self, id: PartId) -> bool {
        let node = &self.parts[id.0];
        node.content_type
            .as_deref()
            .is_some_and(|ct| ct.eq_ignore_ascii_case(PRESENTATION_CONTENT_TYPE))
            || node.name.eq_ignore_ascii_case("ppt/presentation.xml")
    }

    /// Look up a part by name (case-insensitive, leading slash ignored).
    pub fn part_id(&self, name: &str) -> Option<PartId> {
        let name = name.trim_start_matches('/');
        if name.is_empty() {
            return Some(PartId::ROOT);
        }
        self.by_name.get(&name.to_ascii_lowercase()).copied()
    }

    pub fn part(&self, id: PartId) -> &PartNode {
        &self.parts[id.0]
    }

    pub fn name(&self, id: PartId) -> &str {
        &self.parts[id.0].name
    }

    /// Outgoing relationships of a part in `.rels` order.
    pub fn relationships(&self, source: PartId) -> impl Iterator<Item = &Relationship> + '_ {
        self.outgoing[source.0].iter().map(move |&i| &self.edges[i])
    }

    /// Relationship of a part by `Id`.
    pub fn relationship(&self, source: PartId, id: &str) -> Option<&Relationship> {
        self.relationships(source).find(|r| r.id == id)
    }

    /// Resolved target name of a relationship dropped because its part is
    /// missing.
    pub fn dangling_target(&self, source: PartId, id: &str) -> Option<&str> {
        self.dangling
            .get(&(source, id.to_string()))
            .map(String::as_str)
    }

    /// First internal target of the given relationship type.
    pub fn target_of_type(&self, source: PartId, type_name: &str) -> Option<PartId> {
        self.relationships(source)
            .filter(|r| r.is_type(type_name))
            .find_map(Relationship::target_part)
    }

    /// All internal targets of the given relationship type, in `.rels` order.
    pub fn targets_of_type(&self, source: PartId, type_name: &str) -> Vec<PartId> {
        self.relationships(source)
            .filter(|r| r.is_type(type_name))
            .filter_map(Relationship::target_part)
            .collect()
    }

    /// Follow slide → layout → master → theme.
    ///
    /// At most three hops are taken. A hop landing on a part of the wrong
    /// kind or on an already visited part, or an inheritance edge leaving the
    /// theme, makes the package malformed. Missing links end the chain early.
    pub fn inheritance_chain(&self, slide: PartId) -> Result<PartChain> {
        let mut chain = PartChain {
            slide,
            layout: None,
            master: None,
            theme: None,
        };
        let mut visited = vec![slide];
        let mut current = slide;

        for (hop, (rel, kind)) in INHERITANCE_HOPS.iter().enumerate() {
            let Some(next) = self.target_of_type(current, rel) else {
                break;
            };
            if visited.contains(&next) {
                return Err(Error::MalformedPackage(format!(
                    "inheritance cycle at {} from {}",
                    self.name(next),
                    self.name(slide)
                )));
            }
            if self.part(next).kind != *kind {
                return Err(Error::MalformedPackage(format!(
                    "{} relationship from {} targets {} ({:?})",
                    rel,
                    self.name(current),
                    self.name(next),
                    self.part(next).kind
                )));
            }
            visited.push(next);
            match hop {
                0 => chain.layout = Some(next),
                1 => chain.master = Some(next),
                _ => chain.theme = Some(next),
            }
            current = next;
        }

        if let Some(theme) = chain.theme {
            if let Some(rel) = self
                .relationships(theme)
                .find(|r| INHERITANCE_HOPS.iter().any(|(t, _)| r.is_type(t)))
            {
                return Err(Error::MalformedPackage(format!(
                    "theme {} continues the inheritance chain via {}",
                    self.name(theme),
                    rel.type_name()
                )));
            }
        }

        Ok(chain)
    }
}

/// Relationship lookups scoped to one source part.
#[derive(Debug, Clone, Copy)]
pub struct PartRels<'a> {
    graph: Option<&'a RelationshipGraph>,
    part: PartId,
}

impl<'a> PartRels<'a> {
    pub fn new(graph: &'a RelationshipGraph, part: PartId) -> Self {
        Self {
            graph: Some(graph),
            part,
        }
    }

    /// Lookups that never find anything, for XML parsed outside a package.
    pub fn detached() -> Self {
        Self {
            graph: None,
            part: PartId::ROOT,
        }
    }

    pub fn part(&self) -> PartId {
        self.part
    }

    pub fn get(&self, id: &str) -> Option<&'a Relationship> {
        self.graph?.relationship(self.part, id)
    }

    /// Name of the internal part behind a relationship id.
    pub fn part_name(&self, id: &str) -> Option<&'a str> {
        let graph = self.graph?;
        self.get(id)?.target_part().map(|p| graph.name(p))
    }

    /// URL of an external relationship.
    pub fn external(&self, id: &str) -> Option<&'a str> {
        match &self.get(id)?.target {
            RelTarget::External(url) => Some(url.as_str()),
            RelTarget::Part(_) => None,
        }
    }
}

fn is_rels_part(name: &str) -> bool {
    name.ends_with(".rels")
}
