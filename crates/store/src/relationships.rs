//! Relationships (.rels) file parsing and generation
//!
//! Every part (and the package itself) owns a relationship table mapping
//! ids to internal part targets or external URIs.

use crate::error::{StoreError, StoreResult};
use crate::reader::XmlParser;
use quick_xml::escape::escape;
use quick_xml::events::Event;

/// A single relationship in a .rels file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Unique ID within the rels file (e.g., "rId1")
    pub id: String,
    /// Relationship type URI
    pub rel_type: String,
    /// Target path (relative to the source part) or external URI
    pub target: String,
    /// Target mode (Internal or External)
    pub target_mode: TargetMode,
}

impl Relationship {
    pub fn is_external(&self) -> bool {
        self.target_mode == TargetMode::External
    }
}

/// Target mode for relationships
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetMode {
    /// Internal target within the package
    #[default]
    Internal,
    /// External target (URL)
    External,
}

/// Collection of relationships from a .rels file, in document order
#[derive(Debug, Clone, Default)]
pub struct Relationships {
    relationships: Vec<Relationship>,
    /// Counter for generating sequential ids
    next_id: u32,
}

impl Relationships {
    /// Create a new empty relationships collection
    pub fn new() -> Self {
        Self {
            relationships: Vec::new(),
            next_id: 1,
        }
    }

    /// Parse a .rels file from its XML content
    pub fn parse(content: &str) -> StoreResult<Self> {
        let mut result = Self::new();
        let mut reader = XmlParser::from_string(content);
        let mut buf = Vec::new();
        let mut max_id = 0u32;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                    let name = e.name();
                    if XmlParser::matches_element(name.as_ref(), "Relationship") {
                        let id = XmlParser::get_attribute(e, b"Id")
                            .ok_or_else(|| StoreError::InvalidStructure("Relationship missing Id".into()))?;
                        let rel_type = XmlParser::get_attribute(e, b"Type")
                            .ok_or_else(|| StoreError::InvalidStructure("Relationship missing Type".into()))?;
                        let target = XmlParser::get_attribute(e, b"Target")
                            .ok_or_else(|| StoreError::InvalidStructure("Relationship missing Target".into()))?;
                        let target_mode = XmlParser::get_attribute(e, b"TargetMode")
                            .map(|m| if m == "External" { TargetMode::External } else { TargetMode::Internal })
                            .unwrap_or(TargetMode::Internal);

                        // Track max ID for generating new ones
                        if let Some(num) = id.strip_prefix("rId").and_then(|n| n.parse::<u32>().ok()) {
                            max_id = max_id.max(num);
                        }

                        result.relationships.push(Relationship {
                            id,
                            rel_type,
                            target,
                            target_mode,
                        });
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(StoreError::from(e)),
                _ => {}
            }
            buf.clear();
        }

        result.next_id = max_id + 1;
        Ok(result)
    }

    /// Add a relationship with a sequential `rIdN` id and return the id
    pub fn add(&mut self, rel_type: &str, target: &str, target_mode: TargetMode) -> String {
        let mut id = format!("rId{}", self.next_id);
        while self.contains(&id) {
            self.next_id += 1;
            id = format!("rId{}", self.next_id);
        }
        self.next_id += 1;
        self.insert(&id, rel_type, target, target_mode);
        id
    }

    /// Add a relationship under a freshly minted id that cannot collide with
    /// ids carried by content copied from other packages
    pub fn add_unique(&mut self, rel_type: &str, target: &str, target_mode: TargetMode) -> String {
        let id = format!("R{}", uuid::Uuid::new_v4().simple());
        self.insert(&id, rel_type, target, target_mode);
        id
    }

    /// Add or replace a relationship under an explicit id
    pub fn insert(&mut self, id: &str, rel_type: &str, target: &str, target_mode: TargetMode) {
        self.relationships.retain(|r| r.id != id);
        self.relationships.push(Relationship {
            id: id.to_string(),
            rel_type: rel_type.to_string(),
            target: target.to_string(),
            target_mode,
        });
    }

    /// Get a relationship by ID
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.relationships.iter().find(|r| r.id == id)
    }

    /// Get the first relationship of a type
    pub fn get_by_type(&self, rel_type: &str) -> Option<&Relationship> {
        self.relationships.iter().find(|r| r.rel_type == rel_type)
    }

    /// Get all relationships of a given type
    pub fn get_all_by_type(&self, rel_type: &str) -> Vec<&Relationship> {
        self.relationships
            .iter()
            .filter(|r| r.rel_type == rel_type)
            .collect()
    }

    /// Check if a relationship exists
    pub fn contains(&self, id: &str) -> bool {
        self.relationships.iter().any(|r| r.id == id)
    }

    /// Remove a relationship, returning it
    pub fn remove(&mut self, id: &str) -> Option<Relationship> {
        let index = self.relationships.iter().position(|r| r.id == id)?;
        Some(self.relationships.remove(index))
    }

    /// Get all relationships
    pub fn all(&self) -> impl Iterator<Item = &Relationship> {
        self.relationships.iter()
    }

    pub fn len(&self) -> usize {
        self.relationships.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relationships.is_empty()
    }

    /// Generate XML content for the .rels file
    pub fn to_xml(&self) -> String {
        let mut xml = String::new();
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        xml.push_str(r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#);

        for rel in &self.relationships {
            xml.push_str(&format!(
                r#"<Relationship Id="{}" Type="{}" Target="{}""#,
                escape(rel.id.as_str()),
                escape(rel.rel_type.as_str()),
                escape(rel.target.as_str())
            ));
            if rel.target_mode == TargetMode::External {
                xml.push_str(r#" TargetMode="External""#);
            }
            xml.push_str("/>");
        }

        xml.push_str("</Relationships>");
        xml
    }
}

/// Resolve a relationship target against the part that owns it.
/// `source` is a part name such as `/word/document.xml`, or `/` for
/// package-level relationships.
pub fn resolve_target(source: &str, target: &str) -> String {
    if target.starts_with('/') {
        return normalize_path(target);
    }
    let base = match source.rfind('/') {
        Some(index) => &source[..index],
        None => "",
    };
    normalize_path(&format!("{}/{}", base, target))
}

/// Express `target` (a part name) relative to the folder of `source`
pub fn relative_target(source: &str, target: &str) -> String {
    let source_dir: Vec<&str> = source
        .rsplit_once('/')
        .map(|(dir, _)| dir)
        .unwrap_or("")
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();
    let target_segments: Vec<&str> = target.split('/').filter(|s| !s.is_empty()).collect();

    let common = source_dir
        .iter()
        .zip(target_segments.iter())
        .take_while(|(a, b)| a == b)
        .count();
    // The file name itself never counts as a shared directory
    let common = common.min(target_segments.len().saturating_sub(1));

    let mut parts: Vec<&str> = Vec::new();
    for _ in common..source_dir.len() {
        parts.push("..");
    }
    parts.extend_from_slice(&target_segments[common..]);
    parts.join("/")
}

fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    format!("/{}", segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespaces::relationship_types;

    #[test]
    fn test_relationships_parsing() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
    <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com/?a=1&amp;b=2" TargetMode="External"/>
</Relationships>"#;

        let rels = Relationships::parse(xml).unwrap();
        assert_eq!(rels.len(), 2);

        let r1 = rels.get("rId1").unwrap();
        assert_eq!(r1.target, "word/document.xml");
        assert_eq!(r1.target_mode, TargetMode::Internal);

        let r2 = rels.get("rId2").unwrap();
        assert_eq!(r2.target, "https://example.com/?a=1&b=2");
        assert!(r2.is_external());
    }

    #[test]
    fn test_add_relationship() {
        let mut rels = Relationships::new();
        let id1 = rels.add(relationship_types::DOCUMENT, "word/document.xml", TargetMode::Internal);
        let id2 = rels.add(relationship_types::STYLES, "word/styles.xml", TargetMode::Internal);

        assert_eq!(id1, "rId1");
        assert_eq!(id2, "rId2");
        assert!(rels.contains("rId1"));
        assert!(rels.contains("rId2"));
    }

    #[test]
    fn test_add_unique_does_not_collide() {
        let mut rels = Relationships::new();
        let a = rels.add_unique(relationship_types::IMAGE, "media/a.png", TargetMode::Internal);
        let b = rels.add_unique(relationship_types::IMAGE, "media/b.png", TargetMode::Internal);
        assert_ne!(a, b);
        assert!(a.starts_with('R'));
        assert!(!a.starts_with("rId"));
    }

    #[test]
    fn test_to_xml_roundtrip_keeps_order() {
        let mut original = Relationships::new();
        original.add(relationship_types::STYLES, "styles.xml", TargetMode::Internal);
        original.add(relationship_types::HYPERLINK, "http://x.test/?q=1&r=2", TargetMode::External);
        let parsed = Relationships::parse(&original.to_xml()).unwrap();

        let ids: Vec<&str> = parsed.all().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["rId1", "rId2"]);
        assert_eq!(parsed.get("rId2").unwrap().target, "http://x.test/?q=1&r=2");
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(resolve_target("/word/document.xml", "media/image1.png"), "/word/media/image1.png");
        assert_eq!(resolve_target("/word/charts/chart1.xml", "../embeddings/book.xlsx"), "/word/embeddings/book.xlsx");
        assert_eq!(resolve_target("/", "word/document.xml"), "/word/document.xml");
        assert_eq!(resolve_target("/word/document.xml", "/customXml/item1.xml"), "/customXml/item1.xml");
    }

    #[test]
    fn test_relative_target() {
        assert_eq!(relative_target("/word/document.xml", "/word/media/image1.png"), "media/image1.png");
        assert_eq!(relative_target("/word/charts/chart1.xml", "/word/embeddings/book.xlsx"), "../embeddings/book.xlsx");
        assert_eq!(relative_target("/", "/word/document.xml"), "word/document.xml");
        assert_eq!(relative_target("/word/document.xml", "/customXml/item1.xml"), "../customXml/item1.xml");
    }

    proptest::proptest! {
        #[test]
        fn test_relative_target_resolves_back(
            source in proptest::collection::vec("[a-z]{1,6}", 1..4),
            target in proptest::collection::vec("[a-z]{1,6}", 1..4),
        ) {
            let source = format!("/{}.xml", source.join("/"));
            let target = format!("/{}.bin", target.join("/"));
            let relative = relative_target(&source, &target);
            proptest::prop_assert_eq!(resolve_target(&source, &relative), target);
        }
    }
}
