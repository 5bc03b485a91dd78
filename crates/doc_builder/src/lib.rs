//! Doc Builder - assemble WordprocessingML documents from fragments
//!
//! A build takes an ordered list of [`Source`]s, each selecting a run of
//! top-level body elements from a document, and produces one output
//! package. Everything the fragments depend on comes along: styles,
//! numbering, fonts, images and other related parts, comments, footnotes,
//! endnotes, headers and footers, custom XML and glossary entries. Ids
//! are renumbered so nothing collides.
//!
//! # Features
//!
//! - Style merge by name, with id corrections applied to the copied content
//! - Numbering merge that collapses lists sharing an NSID
//! - Image de-duplication by content
//! - Section keeping with explicit header/footer inheritance
//! - Insertion markers (`pt14:Insert`) filled by later sources
//! - Splitting a document into one document per section
//!
//! # Example
//!
//! ```rust
//! use doc_builder::{BuilderSettings, DocumentBuilder, Source};
//! use store::Package;
//!
//! let first = Package::new_document();
//! let second = Package::new_document();
//!
//! let builder = DocumentBuilder::new(BuilderSettings::default());
//! let output = builder
//!     .build(&[Source::new(first), Source::range(second, 0, 10, false)])
//!     .unwrap();
//! assert!(output.main_document_part().is_some());
//! ```

mod builder;
mod context;
mod custom_xml;
mod error;
mod glossary;
mod ids;
mod images;
mod insert;
mod notes;
mod numbering;
mod ranges;
mod remap;
mod resources;
mod sections;
mod settings;
mod source;
mod split;
mod starting;
mod styles;
mod validate;

pub use builder::{build_document, DocumentBuilder};
pub use error::{BuildError, BuildResult, DocumentErrorKind};
pub use remap::{rewrite, rewrite_all, IdKind};
pub use resources::{find_dangling_relationships, DanglingRelationship, RELATIONSHIP_MARKUP};
pub use settings::BuilderSettings;
pub use source::Source;
pub use split::split_on_sections;
pub use validate::check_document;
