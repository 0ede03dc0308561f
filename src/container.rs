//! OPC container: the zip archive behind a `.pptx`.
//!
//! Part bytes are read from the archive on first access and kept; parsed XML
//! trees are memoized the same way. Both caches use `OnceCell`, so concurrent
//! first access to a part reads and parses it once and every caller shares
//! the result.

use crate::content_types::{ContentTypes, PartKind};
use crate::error::{Error, Result};
use crate::xml::{self, Element, XmlError};
use once_cell::sync::OnceCell;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::{Component, Path};
use std::sync::{Arc, Mutex};

/// Name of the mandatory content-types part.
pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

/// Package-level relationships part.
pub const ROOT_RELS_PART: &str = "_rels/.rels";

struct PartEntry {
    index: usize,
    bytes: OnceCell<Vec<u8>>,
    xml: OnceCell<std::result::Result<Arc<Element>, XmlError>>,
}

impl PartEntry {
    fn new(index: usize) -> Self {
        Self {
            index,
            bytes: OnceCell::new(),
            xml: OnceCell::new(),
        }
    }
}

/// An opened `.pptx` package.
///
/// Immutable after [`Package::open`]; all caches fill lazily behind `&self`.
pub struct Package {
    archive: Mutex<zip::ZipArchive<Cursor<Vec<u8>>>>,
    parts: BTreeMap<String, PartEntry>,
    content_types: ContentTypes,
}

/// Fix XML encoding declaration from UTF-16 to UTF-8.
///
/// After UTF-16 bytes are decoded into a Rust `String` the declaration still
/// claims UTF-16, which would make the XML reader re-interpret the text.
fn fix_xml_encoding_declaration(content: &str) -> String {
    if content.starts_with("<?xml") {
        if let Some(end_decl) = content.find("?>") {
            let decl = &content[..end_decl + 2];
            let rest = &content[end_decl + 2..];

            let fixed_decl = decl
                .replace("encoding=\"UTF-16\"", "encoding=\"UTF-8\"")
                .replace("encoding='UTF-16'", "encoding='UTF-8'")
                .replace("encoding=\"utf-16\"", "encoding=\"UTF-8\"")
                .replace("encoding='utf-16'", "encoding='UTF-8'");

            return format!("{}{}", fixed_decl, rest);
        }
    }
    content.to_string()
}

/// Decode XML bytes handling UTF-8 (with or without BOM) and UTF-16 LE/BE.
pub fn decode_xml_bytes(bytes: &[u8]) -> Result<String> {
    if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8(bytes[3..].to_vec())
            .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)));
    }

    if bytes.starts_with(&[0xFF, 0xFE]) {
        let content = decode_utf16(&bytes[2..], u16::from_le_bytes)?;
        return Ok(fix_xml_encoding_declaration(&content));
    }

    if bytes.starts_with(&[0xFE, 0xFF]) {
        let content = decode_utf16(&bytes[2..], u16::from_be_bytes)?;
        return Ok(fix_xml_encoding_declaration(&content));
    }

    match String::from_utf8(bytes.to_vec()) {
        Ok(s) => Ok(s),
        Err(_) => {
            // UTF-16 without BOM: ASCII markup leaves every other byte zero
            if bytes.len() >= 4 && bytes[1] == 0 && bytes[3] == 0 {
                decode_utf16(bytes, u16::from_le_bytes).map(|s| fix_xml_encoding_declaration(&s))
            } else if bytes.len() >= 4 && bytes[0] == 0 && bytes[2] == 0 {
                decode_utf16(bytes, u16::from_be_bytes).map(|s| fix_xml_encoding_declaration(&s))
            } else {
                Ok(String::from_utf8_lossy(bytes).into_owned())
            }
        }
    }
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> Result<String> {
    let len = bytes.len() & !1;
    let units = (0..len).step_by(2).map(|i| unit([bytes[i], bytes[i + 1]]));

    char::decode_utf16(units)
        .collect::<std::result::Result<String, _>>()
        .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

impl Package {
    /// Open a package from a file path.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use pptx2html::container::Package;
    ///
    /// let package = Package::open("deck.pptx")?;
    /// # Ok::<(), pptx2html::Error>(())
    /// ```
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(data)
    }

    /// Open a package from an in-memory buffer.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let mut archive = zip::ZipArchive::new(Cursor::new(data))
            .map_err(|e| Error::InvalidPackage(e.to_string()))?;

        let mut parts = BTreeMap::new();
        for i in 0..archive.len() {
            let file = archive.by_index_raw(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().trim_start_matches('/').to_string();
            parts.insert(name, PartEntry::new(i));
        }

        let mut package = Self {
            archive: Mutex::new(archive),
            parts,
            content_types: ContentTypes::new(),
        };

        if !package.parts.contains_key(CONTENT_TYPES_PART) {
            if !package.parts.keys().any(|name| is_conventional_slide_name(name)) {
                return Err(Error::NoSlides);
            }
            return Err(Error::InvalidPackage(format!(
                "missing {}",
                CONTENT_TYPES_PART
            )));
        }
        let types_root = xml::parse(package.read_part(CONTENT_TYPES_PART)?)
            .map_err(|e| Error::InvalidPackage(format!("{}: {}", CONTENT_TYPES_PART, e)))?;
        package.content_types = ContentTypes::from_element(&types_root).ok_or_else(|| {
            Error::InvalidPackage(format!("{} has no Types root", CONTENT_TYPES_PART))
        })?;

        if package.slide_part_names().is_empty() {
            return Err(Error::NoSlides);
        }
        if !package.parts.contains_key(ROOT_RELS_PART) {
            return Err(Error::InvalidPackage(format!("missing {}", ROOT_RELS_PART)));
        }

        log::debug!(
            "opened package with {} parts, {} slide parts",
            package.parts.len(),
            package.slide_part_names().len()
        );
        Ok(package)
    }

    /// All part names in sorted order.
    pub fn part_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.parts.keys().map(|s| s.as_str())
    }

    /// Check if a part exists (case-insensitive, leading slash ignored).
    pub fn contains(&self, name: &str) -> bool {
        self.entry(name).is_some()
    }

    /// The stored spelling of a part name, if present.
    pub fn canonical_name(&self, name: &str) -> Option<&str> {
        self.entry(name).map(|(n, _)| n)
    }

    /// Raw bytes of a part.
    pub fn read_part(&self, name: &str) -> Result<&[u8]> {
        let (_, entry) = self
            .entry(name)
            .ok_or_else(|| Error::PartNotFound(name.to_string()))?;

        let bytes = entry.bytes.get_or_try_init(|| -> Result<Vec<u8>> {
            let mut archive = self.archive.lock().unwrap_or_else(|e| e.into_inner());
            let mut file = archive.by_index(entry.index)?;
            let mut data = Vec::new();
            file.read_to_end(&mut data)?;
            Ok(data)
        })?;
        Ok(bytes.as_slice())
    }

    /// Parsed XML of a part, parsed at most once.
    pub fn xml(&self, name: &str) -> Result<Arc<Element>> {
        let (canonical, entry) = self
            .entry(name)
            .ok_or_else(|| Error::PartNotFound(name.to_string()))?;
        let bytes = self.read_part(canonical)?;

        let parsed = entry.xml.get_or_init(|| {
            log::debug!("parsing part {}", canonical);
            xml::parse(bytes).map(Arc::new)
        });

        match parsed {
            Ok(element) => Ok(Arc::clone(element)),
            Err(e) => Err(Error::XmlParse {
                part: canonical.to_string(),
                source: e.clone(),
            }),
        }
    }

    pub fn content_types(&self) -> &ContentTypes {
        &self.content_types
    }

    /// Declared content type of a part.
    pub fn content_type(&self, name: &str) -> Option<&str> {
        self.content_types.resolve(name)
    }

    /// Kind of a part according to its content type.
    pub fn kind(&self, name: &str) -> PartKind {
        self.content_types.classify(name)
    }

    /// Slide parts, by content type or by the conventional location.
    pub fn slide_part_names(&self) -> Vec<&str> {
        self.part_names()
            .filter(|name| {
                self.kind(name) == PartKind::Slide || is_conventional_slide_name(name)
            })
            .collect()
    }

    /// Path of the `.rels` companion for a part.
    ///
    /// `ppt/slides/slide1.xml` → `ppt/slides/_rels/slide1.xml.rels`;
    /// the package root (empty name) → `_rels/.rels`.
    pub fn rels_path_for(part_name: &str) -> String {
        let part_name = part_name.trim_start_matches('/');
        if part_name.is_empty() {
            return ROOT_RELS_PART.to_string();
        }
        match part_name.rsplit_once('/') {
            Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
            None => format!("_rels/{}.rels", part_name),
        }
    }

    /// Resolve a relationship target relative to its source part.
    pub fn resolve_path(base: &str, relative: &str) -> String {
        if let Some(stripped) = relative.strip_prefix('/') {
            return stripped.to_string();
        }

        let base_path = Path::new(base);
        let base_dir = base_path.parent().unwrap_or(Path::new(""));

        let mut result = base_dir.to_path_buf();
        for component in Path::new(relative).components() {
            match component {
                Component::ParentDir => {
                    result.pop();
                }
                Component::Normal(c) => {
                    result.push(c);
                }
                _ => {}
            }
        }

        result.to_string_lossy().replace('\\', "/")
    }

    fn entry(&self, name: &str) -> Option<(&str, &PartEntry)> {
        let name = name.trim_start_matches('/');
        if let Some((k, v)) = self.parts.get_key_value(name) {
            return Some((k.as_str(), v));
        }
        self.parts
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(k, v)| (k.as_str(), v))
    }
}

fn is_conventional_slide_name(name: &str) -> bool {
    name.strip_prefix("ppt/slides/slide")
        .and_then(|rest| rest.strip_suffix(".xml"))
        .is_some_and(|num| !num.is_empty() && num.chars().all(|c| c.is_ascii_digit()))
}

impl std::fmt::Debug for Package {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Package")
            .field("parts", &self.parts.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{zip_bytes, DeckBuilder};

    #[test]
    fn test_resolve_path() {
        assert_eq!(
            Package::resolve_path("ppt/slides/slide1.xml", "../slideLayouts/slideLayout2.xml"),
            "ppt/slideLayouts/slideLayout2.xml"
        );
        assert_eq!(
            Package::resolve_path("ppt/presentation.xml", "slides/slide1.xml"),
            "ppt/slides/slide1.xml"
        );
        assert_eq!(
            Package::resolve_path("ppt/slides/slide1.xml", "/ppt/media/image1.png"),
            "ppt/media/image1.png"
        );
        assert_eq!(
            Package::resolve_path("", "ppt/presentation.xml"),
            "ppt/presentation.xml"
        );
    }

    #[test]
    fn test_rels_path_for() {
        assert_eq!(
            Package::rels_path_for("ppt/slides/slide1.xml"),
            "ppt/slides/_rels/slide1.xml.rels"
        );
        assert_eq!(Package::rels_path_for(""), "_rels/.rels");
        assert_eq!(Package::rels_path_for("/doc.xml"), "_rels/doc.xml.rels");
    }

    #[test]
    fn test_open_minimal_deck() {
        let package = Package::from_bytes(DeckBuilder::new().slide_text("Hi").build()).unwrap();
        assert!(package.contains("ppt/slides/slide1.xml"));
        assert!(package.contains("/PPT/Slides/Slide1.xml"));
        assert_eq!(package.kind("ppt/slides/slide1.xml"), PartKind::Slide);
        assert_eq!(package.slide_part_names(), vec!["ppt/slides/slide1.xml"]);
    }

    #[test]
    fn test_not_a_zip() {
        let err = Package::from_bytes(b"definitely not a zip".to_vec()).unwrap_err();
        assert!(matches!(err, Error::InvalidPackage(_)));
    }

    #[test]
    fn test_missing_content_types() {
        let data = zip_bytes(&[("ppt/slides/slide1.xml", "<p:sld/>")]);
        let err = Package::from_bytes(data).unwrap_err();
        assert!(matches!(err, Error::InvalidPackage(_)));
    }

    #[test]
    fn test_no_slides() {
        let data = zip_bytes(&[(
            CONTENT_TYPES_PART,
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"/>"#,
        )]);
        let err = Package::from_bytes(data).unwrap_err();
        assert!(matches!(err, Error::NoSlides));
    }

    #[test]
    fn test_empty_archive_has_no_slides() {
        let err = Package::from_bytes(zip_bytes(&[])).unwrap_err();
        assert!(matches!(err, Error::NoSlides));
    }

    #[test]
    fn test_missing_root_rels() {
        let data = DeckBuilder::new().slide_text("Hi").without_presentation().build();
        let err = Package::from_bytes(data).unwrap_err();
        assert!(matches!(err, Error::InvalidPackage(ref m) if m.contains("_rels/.rels")));
    }

    #[test]
    fn test_read_part_not_found() {
        let package = Package::from_bytes(DeckBuilder::new().slide_text("Hi").build()).unwrap();
        let err = package.read_part("ppt/missing.xml").unwrap_err();
        assert!(matches!(err, Error::PartNotFound(_)));
    }

    #[test]
    fn test_xml_memoized() {
        let package = Package::from_bytes(DeckBuilder::new().slide_text("Hi").build()).unwrap();
        let first = package.xml("ppt/slides/slide1.xml").unwrap();
        let second = package.xml("ppt/slides/slide1.xml").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_xml_memoized_concurrently() {
        use rayon::prelude::*;

        let package = Package::from_bytes(DeckBuilder::new().slide_text("Hi").build()).unwrap();
        let trees: Vec<_> = (0..16)
            .into_par_iter()
            .map(|_| package.xml("ppt/slides/slide1.xml").unwrap())
            .collect();
        assert!(trees.iter().all(|t| Arc::ptr_eq(t, &trees[0])));
    }

    #[test]
    fn test_xml_error_is_sticky() {
        let data = DeckBuilder::new()
            .slide_text("Hi")
            .raw_part("ppt/broken.xml", "<a><b></a>")
            .build();
        let package = Package::from_bytes(data).unwrap();
        assert!(matches!(
            package.xml("ppt/broken.xml"),
            Err(Error::XmlParse { .. })
        ));
        assert!(matches!(
            package.xml("ppt/broken.xml"),
            Err(Error::XmlParse { .. })
        ));
    }

    #[test]
    fn test_utf16_part_parses() {
        let xml = r#"<?xml version="1.0" encoding="UTF-16"?><a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Wide"/>"#;
        let mut utf16 = vec![0xFF, 0xFE];
        utf16.extend(xml.encode_utf16().flat_map(u16::to_le_bytes));
        let data = DeckBuilder::new()
            .slide_text("Hi")
            .binary_part("ppt/theme/theme9.xml", &utf16)
            .build();
        let package = Package::from_bytes(data).unwrap();
        let root = package.xml("ppt/theme/theme9.xml").unwrap();
        assert_eq!(root.local_name(), "theme");
        assert_eq!(root.attr("name"), Some("Wide"));
    }

    #[test]
    fn test_decode_xml_bytes() {
        let utf16_le = b"\xFF\xFE<\0?\0x\0m\0l\0>\0";
        assert_eq!(decode_xml_bytes(utf16_le).unwrap(), "<?xml>");

        let utf16_be = b"\xFE\xFF\0<\0?\0x\0m\0l\0>";
        assert_eq!(decode_xml_bytes(utf16_be).unwrap(), "<?xml>");

        let utf8_bom = b"\xEF\xBB\xBF<?xml>";
        assert_eq!(decode_xml_bytes(utf8_bom).unwrap(), "<?xml>");

        assert_eq!(decode_xml_bytes(b"<?xml>").unwrap(), "<?xml>");
    }

    #[test]
    fn test_fix_encoding_declaration() {
        let fixed = fix_xml_encoding_declaration(r#"<?xml version="1.0" encoding="UTF-16"?><a/>"#);
        assert_eq!(fixed, r#"<?xml version="1.0" encoding="UTF-8"?><a/>"#);
    }
}
