//! [Content_Types].xml parsing and generation
//!
//! This file defines the content types for all parts in the package.

use crate::error::{StoreError, StoreResult};
use crate::namespaces::content_type_values;
use crate::reader::XmlParser;
use quick_xml::escape::escape;
use quick_xml::events::Event;
use std::collections::BTreeMap;

/// Represents the content types in a package
#[derive(Debug, Clone, Default)]
pub struct ContentTypes {
    /// Default content types by extension (e.g., "xml" -> "application/xml")
    pub defaults: BTreeMap<String, String>,
    /// Override content types by part name (e.g., "/word/document.xml" -> "...")
    pub overrides: BTreeMap<String, String>,
}

impl ContentTypes {
    /// Create a new ContentTypes with the defaults every package needs
    pub fn new() -> Self {
        let mut ct = Self::default();
        ct.defaults.insert("rels".to_string(), content_type_values::RELATIONSHIPS.to_string());
        ct.defaults.insert("xml".to_string(), "application/xml".to_string());
        ct
    }

    /// Parse [Content_Types].xml from its content
    pub fn parse(content: &str) -> StoreResult<Self> {
        let mut result = Self::default();
        let mut reader = XmlParser::from_string(content);
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                    let name = e.name();
                    if XmlParser::matches_element(name.as_ref(), "Default") {
                        if let (Some(ext), Some(ct)) = (
                            XmlParser::get_attribute(e, b"Extension"),
                            XmlParser::get_attribute(e, b"ContentType"),
                        ) {
                            result.defaults.insert(ext.to_lowercase(), ct);
                        }
                    } else if XmlParser::matches_element(name.as_ref(), "Override") {
                        if let (Some(part), Some(ct)) = (
                            XmlParser::get_attribute(e, b"PartName"),
                            XmlParser::get_attribute(e, b"ContentType"),
                        ) {
                            result.overrides.insert(normalize_part_name(&part), ct);
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(StoreError::from(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(result)
    }

    /// Get the content type for a given part name
    pub fn get_content_type(&self, path: &str) -> Option<&String> {
        // Overrides win over extension defaults
        let normalized_path = normalize_part_name(path);
        if let Some(ct) = self.overrides.get(&normalized_path) {
            return Some(ct);
        }

        let file_name = normalized_path.rsplit('/').next().unwrap_or("");
        let (_, ext) = file_name.rsplit_once('.')?;
        self.defaults.get(&ext.to_lowercase())
    }

    /// Add an override for a specific part
    pub fn add_override(&mut self, part_name: &str, content_type: &str) {
        self.overrides
            .insert(normalize_part_name(part_name), content_type.to_string());
    }

    /// Generate XML content for [Content_Types].xml
    pub fn to_xml(&self) -> String {
        let mut xml = String::new();
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        xml.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);

        for (ext, ct) in &self.defaults {
            xml.push_str(&format!(
                r#"<Default Extension="{}" ContentType="{}"/>"#,
                escape(ext.as_str()),
                escape(ct.as_str())
            ));
        }

        for (part, ct) in &self.overrides {
            xml.push_str(&format!(
                r#"<Override PartName="{}" ContentType="{}"/>"#,
                escape(part.as_str()),
                escape(ct.as_str())
            ));
        }

        xml.push_str("</Types>");
        xml
    }
}

fn normalize_part_name(part_name: &str) -> String {
    if part_name.starts_with('/') {
        part_name.to_string()
    } else {
        format!("/{}", part_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_types_creation() {
        let ct = ContentTypes::new();
        assert!(ct.defaults.contains_key("rels"));
        assert!(ct.defaults.contains_key("xml"));
    }

    #[test]
    fn test_content_types_parsing() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
    <Default Extension="xml" ContentType="application/xml"/>
    <Default Extension="PNG" ContentType="image/png"/>
    <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#;

        let ct = ContentTypes::parse(xml).unwrap();
        assert_eq!(ct.defaults.get("xml"), Some(&"application/xml".to_string()));
        assert_eq!(
            ct.get_content_type("word/document.xml").map(String::as_str),
            Some(content_type_values::DOCUMENT)
        );
        assert_eq!(ct.get_content_type("/word/media/image1.png").map(String::as_str), Some("image/png"));
        assert!(ct.get_content_type("/word/media/noext").is_none());
    }

    #[test]
    fn test_to_xml_roundtrip() {
        let mut original = ContentTypes::new();
        original.add_override("/word/styles.xml", content_type_values::STYLES);
        let parsed = ContentTypes::parse(&original.to_xml()).unwrap();

        assert_eq!(original.defaults, parsed.defaults);
        assert_eq!(original.overrides, parsed.overrides);
    }
}
