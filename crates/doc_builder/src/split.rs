//! Splitting a document at its section breaks

use crate::builder::DocumentBuilder;
use crate::error::{BuildError, BuildResult};
use crate::source::Source;
use std::sync::Arc;
use store::{ns, Element, Node, Package};

/// (start, count) of each run of top-level body elements that ends with a
/// section break. Trailing elements after the last break form a run too.
fn section_ranges(body: &Element) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    let mut start = 0;
    for (index, element) in body.elements().enumerate() {
        if element.is(ns::W, "sectPr") || element.has_descendant(ns::W, "sectPr") {
            ranges.push((start, index + 1 - start));
            start = index + 1;
        }
    }
    let total = body.elements().count();
    if start < total {
        ranges.push((start, total - start));
    }
    ranges
}

/// Move a section break held by the last paragraph to the end of the body.
/// The paragraph goes away when nothing but its properties remain.
fn lift_final_section(root: &mut Element) {
    let Some(body) = root.element_mut(ns::W, "body") else {
        return;
    };
    if body.elements().any(|e| e.is(ns::W, "sectPr")) {
        return;
    }
    let Some(last) = body.children.iter().rposition(|n| matches!(n, Node::Element(e) if e.is(ns::W, "p"))) else {
        return;
    };
    let Node::Element(paragraph) = &mut body.children[last] else {
        return;
    };
    let Some(ppr) = paragraph.element_mut(ns::W, "pPr") else {
        return;
    };
    let Some(index) = ppr.child_index(ns::W, "sectPr") else {
        return;
    };
    let Node::Element(sect_pr) = ppr.children.remove(index) else {
        return;
    };
    if ppr.children.is_empty() {
        paragraph.remove_elements_named(ns::W, "pPr");
    }
    let only_properties = paragraph.elements().all(|e| e.is(ns::W, "pPr"));
    if only_properties {
        body.children.remove(last);
    }
    body.push(sect_pr);
}

/// Split `document` into one document per section. Each part keeps its
/// own section properties, headers and footers.
pub fn split_on_sections(document: &Package) -> BuildResult<Vec<Package>> {
    let main = document
        .main_document_part()
        .ok_or_else(|| BuildError::document(crate::error::DocumentErrorKind::MissingMainPart))?;
    let ranges = document
        .xml(&main)
        .and_then(|root| root.element(ns::W, "body"))
        .map(section_ranges)
        .unwrap_or_default();
    tracing::info!("Splitting document into {} sections", ranges.len());

    let shared = Arc::new(document.clone());
    let builder = DocumentBuilder::default();
    let mut documents = Vec::with_capacity(ranges.len());
    for (start, count) in ranges {
        let mut built = builder.build(&[Source::range(Arc::clone(&shared), start, count, true)])?;
        let built_main = built
            .main_document_part()
            .ok_or_else(|| BuildError::internal("built section has no main part"))?;
        if let Some(root) = built.xml_mut(&built_main) {
            lift_final_section(root);
        }
        documents.push(built);
    }
    Ok(documents)
}
