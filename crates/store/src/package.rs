//! In-memory OPC package
//!
//! A [`Package`] owns every part of a document: XML parts as parsed
//! element trees, binary parts as bytes, and one relationship table per
//! part plus the package-level table. Loading and saving go through the
//! ZIP reader and writer; everything in between is plain tree editing.

use crate::content_types::ContentTypes;
use crate::error::{StoreError, StoreResult};
use crate::namespaces::{content_type_values, ns, relationship_types};
use crate::part_kind::PartKind;
use crate::reader::PackageReader;
use crate::relationships::{relative_target, resolve_target, Relationship, Relationships, TargetMode};
use crate::writer::PackageWriter;
use crate::xml::Element;
use std::collections::BTreeMap;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;

/// Source name used for package-level relationships
pub const PACKAGE_ROOT: &str = "/";

const CONTENT_TYPES_ENTRY: &str = "[Content_Types].xml";
const ROOT_RELS_ENTRY: &str = "_rels/.rels";

/// Namespace declarations placed on new WordprocessingML roots
const ROOT_NAMESPACES: &[(&str, &str)] = &[
    ("wpc", ns::WPC),
    ("mc", ns::MC),
    ("o", ns::O),
    ("r", ns::R),
    ("m", ns::M),
    ("v", ns::V),
    ("wp14", ns::WP14),
    ("wp", ns::WP),
    ("w10", ns::W10),
    ("w", ns::W),
    ("w14", ns::W14),
    ("wpg", ns::WPG),
    ("wpi", ns::WPI),
    ("wne", ns::WNE),
    ("wps", ns::WPS),
];

/// Create an empty WordprocessingML root element (`w:document`, `w:hdr`,
/// `w:styles`, ...) carrying the usual namespace declarations
pub fn wordprocessing_root(local: &str) -> Element {
    let mut root = Element::new(ns::W, local);
    for (prefix, uri) in ROOT_NAMESPACES {
        root = root.with_namespace(prefix, uri);
    }
    root.with_attr(ns::MC, "Ignorable", "w14 wp14")
}

/// Payload of a part
#[derive(Debug, Clone, PartialEq)]
pub enum PartContent {
    Xml(Element),
    Binary(Vec<u8>),
}

/// A named part with its content type and outgoing relationships
#[derive(Debug, Clone)]
pub struct Part {
    pub name: String,
    pub content_type: String,
    pub content: PartContent,
    pub relationships: Relationships,
}

impl Part {
    pub fn xml(&self) -> Option<&Element> {
        match &self.content {
            PartContent::Xml(root) => Some(root),
            PartContent::Binary(_) => None,
        }
    }

    /// Raw bytes of a binary part, or the serialized tree of an XML part
    pub fn bytes(&self) -> Vec<u8> {
        match &self.content {
            PartContent::Xml(root) => root.to_xml().into_bytes(),
            PartContent::Binary(bytes) => bytes.clone(),
        }
    }

    /// File extension of the part name, lowercased
    pub fn extension(&self) -> String {
        self.name
            .rsplit('/')
            .next()
            .and_then(|file| file.rsplit_once('.'))
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default()
    }
}

/// A part created by [`Package::add_part`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPart {
    /// Part name, e.g. `/word/header3.xml`
    pub name: String,
    /// Relationship id binding the part to its parent
    pub rel_id: String,
}

/// An in-memory document package
#[derive(Debug, Clone, Default)]
pub struct Package {
    parts: BTreeMap<String, Part>,
    relationships: Relationships,
}

impl Package {
    /// Create a package with no parts
    pub fn new() -> Self {
        Self {
            parts: BTreeMap::new(),
            relationships: Relationships::new(),
        }
    }

    /// Create a word-processing package whose main part has an empty body
    pub fn new_document() -> Self {
        let mut package = Self::new();
        let root = wordprocessing_root("document").with_child(Element::new(ns::W, "body"));
        let name = "/word/document.xml".to_string();
        package.parts.insert(
            name.clone(),
            Part {
                name,
                content_type: content_type_values::DOCUMENT.to_string(),
                content: PartContent::Xml(root),
                relationships: Relationships::new(),
            },
        );
        package.relationships.add(
            relationship_types::DOCUMENT,
            "word/document.xml",
            TargetMode::Internal,
        );
        package
    }

    // ===== Loading & saving =====

    /// Load a package from ZIP bytes
    pub fn from_bytes(bytes: &[u8]) -> StoreResult<Self> {
        Self::from_reader(Cursor::new(bytes))
    }

    /// Load a package from a file
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// Load a package from any seekable reader
    pub fn from_reader<R: Read + Seek>(reader: R) -> StoreResult<Self> {
        let mut reader = PackageReader::new(reader)?;
        let content_types = ContentTypes::parse(&reader.read_file_as_string(CONTENT_TYPES_ENTRY)?)?;

        let mut package = Self::new();
        if reader.file_exists(ROOT_RELS_ENTRY) {
            package.relationships = Relationships::parse(&reader.read_file_as_string(ROOT_RELS_ENTRY)?)?;
        }

        for entry in reader.file_names() {
            if entry == CONTENT_TYPES_ENTRY || is_rels_entry(&entry) {
                continue;
            }
            let name = format!("/{}", entry);
            let content_type = content_types
                .get_content_type(&name)
                .cloned()
                .unwrap_or_else(|| "application/octet-stream".to_string());

            let bytes = reader.read_file_as_bytes(&entry)?;
            let content = if is_xml_content_type(&content_type) {
                match Element::parse_bytes(&bytes) {
                    Ok(root) => PartContent::Xml(root),
                    Err(e) => {
                        tracing::warn!("Keeping unparseable XML part {} as binary: {}", name, e);
                        PartContent::Binary(bytes)
                    }
                }
            } else {
                PartContent::Binary(bytes)
            };

            let rels_entry = rels_entry_for(&entry);
            let relationships = if reader.file_exists(&rels_entry) {
                Relationships::parse(&reader.read_file_as_string(&rels_entry)?)?
            } else {
                Relationships::new()
            };

            package.parts.insert(
                name.clone(),
                Part {
                    name,
                    content_type,
                    content,
                    relationships,
                },
            );
        }

        Ok(package)
    }

    /// Serialize the package to ZIP bytes
    pub fn to_bytes(&self) -> StoreResult<Vec<u8>> {
        Ok(self.write_to(Cursor::new(Vec::new()))?.into_inner())
    }

    /// Save the package to a file
    pub fn save(&self, path: impl AsRef<Path>) -> StoreResult<()> {
        std::fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    /// Write the package into a seekable writer, returning it when done
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> StoreResult<W> {
        let mut writer = PackageWriter::new(writer);

        let mut content_types = ContentTypes::new();
        for part in self.parts.values() {
            if content_types.get_content_type(&part.name) != Some(&part.content_type) {
                content_types.add_override(&part.name, &part.content_type);
            }
        }
        writer.write_file(CONTENT_TYPES_ENTRY, &content_types.to_xml())?;
        writer.write_file(ROOT_RELS_ENTRY, &self.relationships.to_xml())?;

        for part in self.parts.values() {
            let entry = part.name.trim_start_matches('/');
            match &part.content {
                PartContent::Xml(root) => writer.write_file(entry, &root.to_xml())?,
                PartContent::Binary(bytes) => writer.write_binary(entry, bytes)?,
            }
            if !part.relationships.is_empty() {
                writer.write_file(&rels_entry_for(entry), &part.relationships.to_xml())?;
            }
        }

        writer.finish()
    }

    // ===== Parts =====

    pub fn part(&self, name: &str) -> Option<&Part> {
        self.parts.get(name)
    }

    pub fn part_mut(&mut self, name: &str) -> Option<&mut Part> {
        self.parts.get_mut(name)
    }

    pub fn contains_part(&self, name: &str) -> bool {
        self.parts.contains_key(name)
    }

    pub fn parts(&self) -> impl Iterator<Item = &Part> {
        self.parts.values()
    }

    /// Names of all parts with the given content type
    pub fn part_names_with_content_type(&self, content_type: &str) -> Vec<String> {
        self.parts
            .values()
            .filter(|p| p.content_type == content_type)
            .map(|p| p.name.clone())
            .collect()
    }

    /// XML tree of a part
    pub fn xml(&self, name: &str) -> Option<&Element> {
        self.parts.get(name).and_then(Part::xml)
    }

    pub fn xml_mut(&mut self, name: &str) -> Option<&mut Element> {
        match self.parts.get_mut(name).map(|p| &mut p.content) {
            Some(PartContent::Xml(root)) => Some(root),
            _ => None,
        }
    }

    /// Take the XML tree out of a part for editing, leaving an empty
    /// placeholder until it is put back with [`Package::set_xml`]
    pub fn take_xml(&mut self, name: &str) -> Option<Element> {
        match self.parts.get_mut(name).map(|p| &mut p.content) {
            Some(PartContent::Xml(root)) => Some(std::mem::replace(root, Element::new("", ""))),
            _ => None,
        }
    }

    /// Replace the XML tree of an existing part
    pub fn set_xml(&mut self, name: &str, root: Element) -> StoreResult<()> {
        let part = self
            .parts
            .get_mut(name)
            .ok_or_else(|| StoreError::MissingPart(name.to_string()))?;
        part.content = PartContent::Xml(root);
        Ok(())
    }

    /// Bytes of a binary part
    pub fn binary(&self, name: &str) -> Option<&[u8]> {
        match self.parts.get(name).map(|p| &p.content) {
            Some(PartContent::Binary(bytes)) => Some(bytes),
            _ => None,
        }
    }

    pub fn content_type(&self, name: &str) -> Option<&str> {
        self.parts.get(name).map(|p| p.content_type.as_str())
    }

    /// Create a new part of the given kind under `parent` (a part name or
    /// [`PACKAGE_ROOT`]) and bind it with a freshly minted relationship id
    pub fn add_part(&mut self, parent: &str, kind: PartKind, content: PartContent) -> StoreResult<NewPart> {
        let name = self.unique_part_name(&kind);
        let target = relative_target(parent, &name);
        let rel_id = self
            .relationships_mut(parent)
            .ok_or_else(|| StoreError::MissingPart(parent.to_string()))?
            .add_unique(kind.relationship_type(), &target, TargetMode::Internal);
        self.insert_part(&name, &kind, content);
        Ok(NewPart { name, rel_id })
    }

    /// Like [`Package::add_part`], binding the part under a caller-chosen id
    pub fn add_part_with_id(
        &mut self,
        parent: &str,
        kind: PartKind,
        content: PartContent,
        rel_id: &str,
    ) -> StoreResult<NewPart> {
        let name = self.unique_part_name(&kind);
        let target = relative_target(parent, &name);
        self.relationships_mut(parent)
            .ok_or_else(|| StoreError::MissingPart(parent.to_string()))?
            .insert(rel_id, kind.relationship_type(), &target, TargetMode::Internal);
        self.insert_part(&name, &kind, content);
        Ok(NewPart {
            name,
            rel_id: rel_id.to_string(),
        })
    }

    fn insert_part(&mut self, name: &str, kind: &PartKind, content: PartContent) {
        tracing::debug!("Created part {} ({})", name, kind.content_type());
        self.parts.insert(
            name.to_string(),
            Part {
                name: name.to_string(),
                content_type: kind.content_type().to_string(),
                content,
                relationships: Relationships::new(),
            },
        );
    }

    fn unique_part_name(&self, kind: &PartKind) -> String {
        let (dir, stem, ext) = kind.location();
        if !kind.is_numbered() {
            let plain = format!("{}/{}.{}", dir, stem, ext);
            if !self.parts.contains_key(&plain) {
                return plain;
            }
        }
        (1..)
            .map(|n| format!("{}/{}{}.{}", dir, stem, n, ext))
            .find(|candidate| !self.parts.contains_key(candidate))
            .unwrap_or_default()
    }

    // ===== Relationships =====

    /// Relationship table of a part, or of the package for [`PACKAGE_ROOT`]
    pub fn relationships(&self, source: &str) -> Option<&Relationships> {
        if source == PACKAGE_ROOT {
            Some(&self.relationships)
        } else {
            self.parts.get(source).map(|p| &p.relationships)
        }
    }

    pub fn relationships_mut(&mut self, source: &str) -> Option<&mut Relationships> {
        if source == PACKAGE_ROOT {
            Some(&mut self.relationships)
        } else {
            self.parts.get_mut(source).map(|p| &mut p.relationships)
        }
    }

    /// Look up a relationship by id
    pub fn relationship(&self, source: &str, id: &str) -> Option<&Relationship> {
        self.relationships(source)?.get(id)
    }

    pub fn has_relationship(&self, source: &str, id: &str) -> bool {
        self.relationship(source, id).is_some()
    }

    /// Name of the existing part an internal relationship points at
    pub fn related_part_name(&self, source: &str, id: &str) -> Option<String> {
        let rel = self.relationship(source, id)?;
        if rel.is_external() {
            return None;
        }
        let name = resolve_target(source, &rel.target);
        self.parts.contains_key(&name).then_some(name)
    }

    /// All existing parts related to `source` by relationships of a type,
    /// as (relationship id, part name)
    pub fn related_parts_by_type(&self, source: &str, rel_type: &str) -> Vec<(String, String)> {
        let Some(rels) = self.relationships(source) else {
            return Vec::new();
        };
        rels.get_all_by_type(rel_type)
            .into_iter()
            .filter(|r| !r.is_external())
            .map(|r| (r.id.clone(), resolve_target(source, &r.target)))
            .filter(|(_, name)| self.parts.contains_key(name))
            .collect()
    }

    /// First existing part related to `source` by a relationship type
    pub fn related_part_by_type(&self, source: &str, rel_type: &str) -> Option<String> {
        self.related_parts_by_type(source, rel_type)
            .into_iter()
            .next()
            .map(|(_, name)| name)
    }

    /// Name of the main document part
    pub fn main_document_part(&self) -> Option<String> {
        self.related_part_by_type(PACKAGE_ROOT, relationship_types::DOCUMENT)
    }

    /// Bind an existing part to `source` under a new relationship id
    pub fn add_relationship(&mut self, source: &str, target_part: &str, rel_type: &str) -> StoreResult<String> {
        if !self.parts.contains_key(target_part) {
            return Err(StoreError::MissingPart(target_part.to_string()));
        }
        let target = relative_target(source, target_part);
        Ok(self
            .relationships_mut(source)
            .ok_or_else(|| StoreError::MissingPart(source.to_string()))?
            .add_unique(rel_type, &target, TargetMode::Internal))
    }

    /// Add an external relationship (hyperlink, linked image, template, ...)
    pub fn add_external_relationship(&mut self, source: &str, rel_type: &str, uri: &str) -> StoreResult<String> {
        Ok(self
            .relationships_mut(source)
            .ok_or_else(|| StoreError::MissingPart(source.to_string()))?
            .add_unique(rel_type, uri, TargetMode::External))
    }
}

fn is_rels_entry(entry: &str) -> bool {
    entry.ends_with(".rels") && (entry.starts_with("_rels/") || entry.contains("/_rels/"))
}

fn rels_entry_for(entry: &str) -> String {
    match entry.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", entry),
    }
}

fn is_xml_content_type(content_type: &str) -> bool {
    content_type.ends_with("+xml") || content_type == "application/xml" || content_type == "text/xml"
}
