//! Error types for package storage operations

use thiserror::Error;

/// Errors that can occur while loading, editing, or saving a package
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP archive error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// XML parsing error
    #[error("XML parsing error: {0}")]
    XmlParse(String),

    /// Invalid package structure
    #[error("Invalid package structure: {0}")]
    InvalidStructure(String),

    /// Missing required part
    #[error("Missing required part: {0}")]
    MissingPart(String),

    /// Part exists but holds the wrong kind of payload
    #[error("Part {0} is not an XML part")]
    NotXml(String),

    /// UTF-8 encoding error
    #[error("UTF-8 encoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl From<quick_xml::Error> for StoreError {
    fn from(err: quick_xml::Error) -> Self {
        StoreError::XmlParse(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for StoreError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        StoreError::XmlParse(format!("Attribute error: {}", err))
    }
}

/// Result type for package storage operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;
