//! Build inputs
//!
//! A [`Source`] selects a contiguous run of top-level body elements from
//! one document. Sources are cheap to clone: the document itself is shared.

use std::sync::Arc;
use store::Package;

/// A slice of a source document to assemble
#[derive(Debug, Clone)]
pub struct Source {
    document: Arc<Package>,
    start: usize,
    count: usize,
    keep_sections: bool,
    discard_headers_and_footers: bool,
    insert_id: Option<String>,
}

impl Source {
    /// The whole body of `document`, without keeping its sections
    pub fn new(document: impl Into<Arc<Package>>) -> Self {
        Self {
            document: document.into(),
            start: 0,
            count: usize::MAX,
            keep_sections: false,
            discard_headers_and_footers: false,
            insert_id: None,
        }
    }

    /// `count` body elements of `document` starting at `start`
    pub fn range(document: impl Into<Arc<Package>>, start: usize, count: usize, keep_sections: bool) -> Self {
        Self::new(document)
            .with_start(start)
            .with_count(count)
            .keep_sections(keep_sections)
    }

    pub fn with_start(mut self, start: usize) -> Self {
        self.start = start;
        self
    }

    /// Limit the slice to `count` elements
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    /// Keep the section properties (and header/footer bindings) of the slice
    pub fn keep_sections(mut self, keep: bool) -> Self {
        self.keep_sections = keep;
        self
    }

    /// When sections are kept, drop their header and footer references
    pub fn discard_headers_and_footers(mut self, discard: bool) -> Self {
        self.discard_headers_and_footers = discard;
        self
    }

    /// Splice the slice in place of every insertion marker with this id
    /// instead of appending it to the body
    pub fn insert_at(mut self, id: impl Into<String>) -> Self {
        self.insert_id = Some(id.into());
        self
    }

    pub fn document(&self) -> &Package {
        &self.document
    }

    /// Same slice over a replacement document
    pub(crate) fn with_document(mut self, document: Package) -> Self {
        self.document = Arc::new(document);
        self
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn keeps_sections(&self) -> bool {
        self.keep_sections
    }

    pub fn discards_headers_and_footers(&self) -> bool {
        self.discard_headers_and_footers
    }

    pub fn insert_id(&self) -> Option<&str> {
        self.insert_id.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_select_whole_body() {
        let source = Source::new(Package::new_document());
        assert_eq!(source.start(), 0);
        assert_eq!(source.count(), usize::MAX);
        assert!(!source.keeps_sections());
        assert!(source.insert_id().is_none());
    }

    #[test]
    fn test_range_builder() {
        let source = Source::range(Package::new_document(), 3, 4, true)
            .discard_headers_and_footers(true)
            .insert_at("Chapter1");
        assert_eq!(source.start(), 3);
        assert_eq!(source.count(), 4);
        assert!(source.keeps_sections());
        assert!(source.discards_headers_and_footers());
        assert_eq!(source.insert_id(), Some("Chapter1"));
    }
}
