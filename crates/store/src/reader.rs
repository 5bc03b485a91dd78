//! ZIP archive reading and low-level XML event helpers

use crate::error::{StoreError, StoreResult};
use quick_xml::events::BytesStart;
use quick_xml::Reader;
use std::io::{Read, Seek};
use zip::ZipArchive;

/// A wrapper around a ZIP archive for reading package entries
pub struct PackageReader<R: Read + Seek> {
    archive: ZipArchive<R>,
}

impl<R: Read + Seek> PackageReader<R> {
    /// Create a new reader from a source that implements Read + Seek
    pub fn new(reader: R) -> StoreResult<Self> {
        let archive = ZipArchive::new(reader)?;
        Ok(Self { archive })
    }

    /// Read an entry from the archive as a string
    pub fn read_file_as_string(&mut self, path: &str) -> StoreResult<String> {
        let bytes = self.read_file_as_bytes(path)?;
        let text = String::from_utf8(bytes)?;
        Ok(text.trim_start_matches('\u{feff}').to_string())
    }

    /// Read an entry from the archive as bytes
    pub fn read_file_as_bytes(&mut self, path: &str) -> StoreResult<Vec<u8>> {
        let mut file = self.archive.by_name(path).map_err(|e| {
            if matches!(e, zip::result::ZipError::FileNotFound) {
                StoreError::MissingPart(path.to_string())
            } else {
                StoreError::from(e)
            }
        })?;

        let mut contents = Vec::new();
        file.read_to_end(&mut contents)?;
        Ok(contents)
    }

    /// Check if an entry exists in the archive
    pub fn file_exists(&self, path: &str) -> bool {
        self.archive.file_names().any(|name| name == path)
    }

    /// Names of all file entries (directories excluded)
    pub fn file_names(&self) -> Vec<String> {
        self.archive
            .file_names()
            .filter(|name| !name.ends_with('/'))
            .map(str::to_string)
            .collect()
    }
}

/// Event-level helpers for the small package-structure documents
/// (`[Content_Types].xml`, `.rels`)
pub struct XmlParser;

impl XmlParser {
    /// Create a new XML reader from a string
    pub fn from_string(content: &str) -> Reader<&[u8]> {
        let mut reader = Reader::from_str(content);
        reader.config_mut().trim_text(true);
        reader
    }

    /// Get an unescaped attribute value from an event
    pub fn get_attribute(event: &BytesStart, name: &[u8]) -> Option<String> {
        event
            .attributes()
            .filter_map(|a| a.ok())
            .find(|a| a.key.as_ref() == name)
            .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
    }

    /// Check if an element name matches with optional namespace prefix
    pub fn matches_element(name: &[u8], expected: &str) -> bool {
        let name_str = std::str::from_utf8(name).unwrap_or("");
        name_str == expected || name_str.ends_with(&format!(":{}", expected))
    }
}
