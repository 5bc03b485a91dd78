//! Store - OPC package storage for WordprocessingML documents
//!
//! This crate owns the container layer: reading and writing the ZIP
//! archive, the `[Content_Types].xml` registry, relationship tables, and
//! an owned XML element tree for every XML part.
//!
//! ## Structure
//!
//! A DOCX file is a ZIP archive containing XML files:
//! - `[Content_Types].xml` - Content type definitions
//! - `_rels/.rels` - Root relationships
//! - `word/document.xml` - Main document content
//! - `word/_rels/document.xml.rels` - Document relationships
//! - `word/media/` - Embedded images and media

mod content_types;
mod error;
pub mod namespaces;
mod package;
mod part_kind;
mod reader;
mod relationships;
mod writer;
pub mod xml;

pub use content_types::ContentTypes;
pub use error::{StoreError, StoreResult};
pub use namespaces::{content_type_values, ns, relationship_types};
pub use package::{wordprocessing_root, NewPart, Package, Part, PartContent, PACKAGE_ROOT};
pub use part_kind::PartKind;
pub use reader::{PackageReader, XmlParser};
pub use relationships::{relative_target, resolve_target, Relationship, Relationships, TargetMode};
pub use writer::PackageWriter;
pub use xml::{Attribute, Element, Node, XName};
