//! Namespace-aware XML object model.
//!
//! Parts are parsed once into an owned [`Element`] tree so they can be cached
//! and shared across threads. Names are stored with their resolved namespace
//! URI, never with the document's prefix, so lookups work no matter which
//! prefixes an authoring tool chose.

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;
use std::fmt;

/// Namespace URIs used by PresentationML packages.
pub mod ns {
    pub const P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
    pub const A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
    pub const R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
    pub const MC: &str = "http://schemas.openxmlformats.org/markup-compatibility/2006";
    pub const PKG_RELS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
    pub const CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
    pub const TABLE_URI: &str = "http://schemas.openxmlformats.org/drawingml/2006/table";
}

/// Error produced when a part is not well-formed XML.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} (byte {position})")]
pub struct XmlError {
    pub message: String,
    pub position: u64,
}

impl XmlError {
    pub fn new(message: impl Into<String>, position: u64) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

/// A namespace-qualified name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QName {
    pub namespace: Option<String>,
    pub local: String,
}

impl QName {
    fn matches(&self, namespace: &str, local: &str) -> bool {
        self.local == local && self.namespace.as_deref() == Some(namespace)
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local),
            None => write!(f, "{}", self.local),
        }
    }
}

/// An attribute with its resolved name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: QName,
    pub value: String,
}

/// A child node: either an element or character data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An XML element with resolved names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    name: QName,
    attributes: Vec<Attribute>,
    children: Vec<Node>,
}

impl Element {
    /// An element with no name, attributes or children.
    ///
    /// Stands in for a part that failed to parse.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether this is the placeholder produced by [`Element::empty`].
    pub fn is_empty(&self) -> bool {
        self.name.local.is_empty() && self.children.is_empty()
    }

    pub fn name(&self) -> &QName {
        &self.name
    }

    pub fn local_name(&self) -> &str {
        &self.name.local
    }

    pub fn namespace(&self) -> Option<&str> {
        self.name.namespace.as_deref()
    }

    /// Check the element's namespace and local name.
    pub fn is(&self, namespace: &str, local: &str) -> bool {
        self.name.matches(namespace, local)
    }

    /// Unqualified attribute by local name.
    ///
    /// OOXML puts most attributes in no namespace (`val`, `x`, `cx`, ...).
    pub fn attr(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.namespace.is_none() && a.name.local == local)
            .map(|a| a.value.as_str())
    }

    /// Namespace-qualified attribute, e.g. `r:embed`.
    pub fn attr_ns(&self, namespace: &str, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.matches(namespace, local))
            .map(|a| a.value.as_str())
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// All child nodes, elements and text.
    pub fn nodes(&self) -> &[Node] {
        &self.children
    }

    /// Child elements in document order. Each call starts a fresh traversal.
    pub fn elements(&self) -> impl Iterator<Item = &Element> + '_ {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// First child element with the given name.
    pub fn child(&self, namespace: &str, local: &str) -> Option<&Element> {
        self.elements().find(|e| e.is(namespace, local))
    }

    /// All child elements with the given name.
    pub fn children_named<'a>(
        &'a self,
        namespace: &'a str,
        local: &'a str,
    ) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements().filter(move |e| e.is(namespace, local))
    }

    /// Follow a chain of child elements sharing one namespace.
    pub fn path(&self, namespace: &str, locals: &[&str]) -> Option<&Element> {
        let mut current = self;
        for local in locals {
            current = current.child(namespace, local)?;
        }
        Some(current)
    }

    /// First descendant (depth-first, document order) with the given name.
    pub fn descendant(&self, namespace: &str, local: &str) -> Option<&Element> {
        for child in self.elements() {
            if child.is(namespace, local) {
                return Some(child);
            }
            if let Some(found) = child.descendant(namespace, local) {
                return Some(found);
            }
        }
        None
    }

    /// Concatenated direct text content.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            if let Node::Text(t) = node {
                out.push_str(t);
            }
        }
        out
    }
}

/// Parse XML bytes into an element tree.
///
/// Bytes may be UTF-8 (with or without BOM) or UTF-16 with a BOM.
pub fn parse(bytes: &[u8]) -> Result<Element, XmlError> {
    let content = crate::container::decode_xml_bytes(bytes)
        .map_err(|e| XmlError::new(format!("undecodable part: {}", e), 0))?;
    parse_str(&content)
}

/// Parse an XML string into an element tree.
pub fn parse_str(content: &str) -> Result<Element, XmlError> {
    let mut reader = NsReader::from_str(content);
    reader.config_mut().trim_text(false);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let position = reader.buffer_position() as u64;
        let (resolved, event) = reader
            .read_resolved_event()
            .map_err(|e| XmlError::new(e.to_string(), position))?;
        let namespace = match resolved {
            ResolveResult::Unknown(prefix) => {
                return Err(XmlError::new(
                    format!(
                        "unbound namespace prefix '{}'",
                        String::from_utf8_lossy(&prefix)
                    ),
                    position,
                ));
            }
            other => namespace_of(other),
        };

        match event {
            Event::Start(e) => {
                let element = start_element(&reader, namespace, &e, position)?;
                stack.push(element);
            }
            Event::Empty(e) => {
                let element = start_element(&reader, namespace, &e, position)?;
                attach(&mut stack, &mut root, element, position)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| XmlError::new("unexpected closing tag", position))?;
                attach(&mut stack, &mut root, element, position)?;
            }
            Event::Text(t) => {
                if let Some(parent) = stack.last_mut() {
                    let text = t
                        .unescape()
                        .map_err(|e| XmlError::new(e.to_string(), position))?;
                    if !text.is_empty() {
                        parent.children.push(Node::Text(text.into_owned()));
                    }
                }
            }
            Event::CData(c) => {
                if let Some(parent) = stack.last_mut() {
                    let text = String::from_utf8_lossy(&c).into_owned();
                    parent.children.push(Node::Text(text));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(XmlError::new(
            "unexpected end of document",
            reader.buffer_position() as u64,
        ));
    }
    root.ok_or_else(|| XmlError::new("document has no root element", 0))
}

fn start_element(
    reader: &NsReader<&[u8]>,
    namespace: Option<String>,
    start: &BytesStart<'_>,
    position: u64,
) -> Result<Element, XmlError> {
    let name = QName {
        namespace,
        local: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
    };

    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| XmlError::new(e.to_string(), position))?;
        if attr.key.as_namespace_binding().is_some() {
            continue;
        }
        let (resolved, local) = reader.resolve_attribute(attr.key);
        let value = attr
            .unescape_value()
            .map_err(|e| XmlError::new(e.to_string(), position))?;
        attributes.push(Attribute {
            name: QName {
                namespace: namespace_of(resolved),
                local: String::from_utf8_lossy(local.as_ref()).into_owned(),
            },
            value: value.into_owned(),
        });
    }

    Ok(Element {
        name,
        attributes,
        children: Vec::new(),
    })
}

fn namespace_of(resolved: ResolveResult<'_>) -> Option<String> {
    match resolved {
        ResolveResult::Bound(ns) => Some(String::from_utf8_lossy(ns.as_ref()).into_owned()),
        _ => None,
    }
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
    position: u64,
) -> Result<(), XmlError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None => {
            if root.is_some() {
                return Err(XmlError::new("multiple root elements", position));
            }
            *root = Some(element);
        }
    }
    Ok(())
}
