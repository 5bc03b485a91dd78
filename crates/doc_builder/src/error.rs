//! Error types for document assembly

use store::StoreError;
use thiserror::Error;

/// Why a source document cannot be assembled
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentErrorKind {
    #[error("document has no main document part")]
    MissingMainPart,
    #[error("strict conformance documents are not supported")]
    StrictConformance,
    #[error("section property changes (w:sectPrChange) are not supported")]
    SectionPropertyChange,
    #[error("sub-documents (w:subDoc) are not supported")]
    SubDocument,
    #[error("ActiveX controls (w:control) are not supported")]
    ActiveXControl,
    #[error("altChunk content is not supported")]
    AltChunk,
    #[error("legacy content parts (contentPart) are not supported")]
    ContentPart,
    #[error("obsolete namespace {0} is not supported")]
    ObsoleteNamespace(String),
    #[error("mail merge data sources are not supported")]
    MailMergeSource,
    #[error("framesets are not supported")]
    Frameset,
    #[error("numbering is referenced but the document has no numbering part")]
    NumberingWithoutPart,
    #[error("invalid bookmark id {0:?}")]
    InvalidBookmarkId(String),
    #[error("invalid comment id {0:?}")]
    InvalidCommentId(String),
    #[error("comment {0} is referenced but not defined")]
    MissingComment(String),
    #[error("invalid numbering id {0:?}")]
    InvalidNumberingId(String),
    #[error("invalid abstract numbering id {0:?}")]
    InvalidAbstractNumId(String),
    #[error("invalid note id {0:?}")]
    InvalidNoteId(String),
    #[error("relationship {id} does not resolve")]
    InvalidRelationship { id: String },
    #[error("relationship {id} points at an unexpected kind of part")]
    UnexpectedTargetPart { id: String },
    #[error("relationship {id} references a missing image")]
    MissingImage { id: String },
    #[error("font table references an invalid embedded font")]
    InvalidFontTable,
}

/// Errors that can occur while building a document
#[derive(Debug, Error)]
pub enum BuildError {
    /// The input is unsupported or malformed. `index` is the ordinal of the
    /// offending source in the build request.
    #[error("{}", describe_document_error(.index, .reason))]
    Document {
        index: Option<usize>,
        reason: DocumentErrorKind,
    },

    /// An invariant of the engine itself was violated
    #[error("internal error: {0}")]
    Internal(String),

    /// Package storage error
    #[error("package error: {0}")]
    Store(#[from] StoreError),

    /// Builder settings could not be parsed
    #[error("settings error: {0}")]
    Settings(#[from] serde_json::Error),
}

fn describe_document_error(index: &Option<usize>, reason: &DocumentErrorKind) -> String {
    match index {
        Some(index) => format!("source {} is invalid: {}", index, reason),
        None => format!("invalid document: {}", reason),
    }
}

impl BuildError {
    /// A document error not yet attributed to a source
    pub fn document(reason: DocumentErrorKind) -> Self {
        BuildError::Document { index: None, reason }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        BuildError::Internal(message.into())
    }

    /// Attribute a document error to a source, keeping an existing index
    pub fn at_source(self, index: usize) -> Self {
        match self {
            BuildError::Document { index: None, reason } => BuildError::Document {
                index: Some(index),
                reason,
            },
            other => other,
        }
    }

    /// Ordinal of the offending source, if this is an attributed document error
    pub fn source_index(&self) -> Option<usize> {
        match self {
            BuildError::Document { index, .. } => *index,
            _ => None,
        }
    }

    /// Reason code of a document error
    pub fn reason(&self) -> Option<&DocumentErrorKind> {
        match self {
            BuildError::Document { reason, .. } => Some(reason),
            _ => None,
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, BuildError::Internal(_))
    }
}

impl From<DocumentErrorKind> for BuildError {
    fn from(reason: DocumentErrorKind) -> Self {
        BuildError::document(reason)
    }
}

/// Result type for document assembly
pub type BuildResult<T> = std::result::Result<T, BuildError>;
