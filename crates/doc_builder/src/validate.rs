//! Rejection of documents the builder cannot assemble

use crate::error::{BuildResult, DocumentErrorKind};
use store::{ns, relationship_types as rt, Element, Package};

/// Namespaces of pre-release Word markup
const OBSOLETE_NAMESPACES: &[&str] = &[
    "http://schemas.microsoft.com/office/word/2007/5/30/wordml",
    "http://schemas.microsoft.com/office/word/2008/9/16/wordprocessingDrawing",
    "http://schemas.microsoft.com/office/word/2009/2/wordml",
];

/// Check a source document for constructs that cannot be assembled.
/// Returns the main part name.
pub fn check_document(document: &Package) -> BuildResult<String> {
    let main = document
        .main_document_part()
        .ok_or(DocumentErrorKind::MissingMainPart)?;
    let root = document.xml(&main).ok_or(DocumentErrorKind::MissingMainPart)?;

    if root.name.namespace == ns::W_STRICT {
        return Err(DocumentErrorKind::StrictConformance.into());
    }
    if root.has_descendant(ns::W, "sectPrChange") {
        return Err(DocumentErrorKind::SectionPropertyChange.into());
    }

    let mut story_parts = vec![main.clone()];
    for rel_type in [rt::HEADER, rt::FOOTER, rt::FOOTNOTES, rt::ENDNOTES] {
        story_parts.extend(document.related_parts_by_type(&main, rel_type).into_iter().map(|(_, name)| name));
    }
    for part in &story_parts {
        if let Some(root) = document.xml(part) {
            check_story(root)?;
        }
    }

    if let Some(settings) = document
        .related_part_by_type(&main, rt::SETTINGS)
        .and_then(|name| document.xml(&name))
    {
        let mail_merge = settings
            .descendants()
            .any(|e| e.is(ns::W, "src") || e.is(ns::W, "recipientData") || e.is(ns::W, "mailMerge"));
        if mail_merge {
            return Err(DocumentErrorKind::MailMergeSource.into());
        }
    }

    if let Some(web_settings) = document
        .related_part_by_type(&main, rt::WEB_SETTINGS)
        .and_then(|name| document.xml(&name))
    {
        if web_settings.has_descendant(ns::W, "frameset") {
            return Err(DocumentErrorKind::Frameset.into());
        }
    }

    if document.related_part_by_type(&main, rt::NUMBERING).is_none() && uses_numbering(root) {
        return Err(DocumentErrorKind::NumberingWithoutPart.into());
    }

    Ok(main)
}

fn check_story(root: &Element) -> BuildResult<()> {
    for e in std::iter::once(root).chain(root.descendants()) {
        if e.is(ns::W, "subDoc") {
            return Err(DocumentErrorKind::SubDocument.into());
        }
        if e.is(ns::W, "control") {
            return Err(DocumentErrorKind::ActiveXControl.into());
        }
        if e.is(ns::W, "altChunk") {
            return Err(DocumentErrorKind::AltChunk.into());
        }
        if e.name.local == "contentPart" {
            return Err(DocumentErrorKind::ContentPart.into());
        }
        if let Some(obsolete) = obsolete_namespace(e) {
            return Err(DocumentErrorKind::ObsoleteNamespace(obsolete.to_string()).into());
        }
    }
    Ok(())
}

fn obsolete_namespace(e: &Element) -> Option<&'static str> {
    OBSOLETE_NAMESPACES.iter().copied().find(|obsolete| {
        e.name.namespace == *obsolete || e.attributes.iter().any(|a| a.name.namespace == *obsolete)
    })
}

/// Numbered paragraphs outside of tracked insertions, ignoring `numId` 0
fn uses_numbering(root: &Element) -> bool {
    root.descendants_named(ns::W, "numPr").any(|num_pr| {
        let num_id = num_pr.element(ns::W, "numId").and_then(|n| n.attr(ns::W, "val"));
        num_id.is_some_and(|id| id != "0") && num_pr.element(ns::W, "ins").is_none()
    })
}
