//! Glossary documents (building blocks)
//!
//! The glossary of each source is turned into a small document of its
//! own, those documents are assembled like any other sources, and the
//! `w:docPart`s of the result become the single glossary of the output.

use crate::builder::DocumentBuilder;
use crate::context::BuildContext;
use crate::error::{BuildError, BuildResult};
use crate::resources::copy_resources;
use crate::settings::BuilderSettings;
use crate::source::Source;
use crate::styles::copy_whole_font_table;
use store::{
    ns, relationship_types as rt, relative_target, wordprocessing_root, Element, Package, PartContent, PartKind,
    TargetMode, PACKAGE_ROOT,
};

/// Parts of the assembled glossary copied whole into the output glossary
const GLOSSARY_PARTS: [(&str, PartKind); 5] = [
    (rt::STYLES, PartKind::Styles),
    (rt::STYLES_WITH_EFFECTS, PartKind::StylesWithEffects),
    (rt::SETTINGS, PartKind::Settings),
    (rt::WEB_SETTINGS, PartKind::WebSettings),
    (rt::NUMBERING, PartKind::Numbering),
];

/// A copy of `document` whose main part is its glossary, with the
/// `w:docParts` as the only body element
fn glossary_as_document(document: &Package) -> BuildResult<Option<Package>> {
    let Some(main) = document.main_document_part() else {
        return Ok(None);
    };
    let Some(glossary) = document.related_part_by_type(&main, rt::GLOSSARY) else {
        return Ok(None);
    };
    let Some(doc_parts) = document.xml(&glossary).and_then(|r| r.element(ns::W, "docParts")).cloned() else {
        return Ok(None);
    };

    let mut intermediate = document.clone();
    let root = wordprocessing_root("document").with_child(Element::new(ns::W, "body").with_child(doc_parts));
    intermediate.set_xml(&glossary, root)?;

    let rels = intermediate
        .relationships_mut(PACKAGE_ROOT)
        .ok_or_else(|| BuildError::internal("package relationships are unavailable"))?;
    let documents: Vec<String> = rels.get_all_by_type(rt::DOCUMENT).iter().map(|r| r.id.clone()).collect();
    for id in documents {
        rels.remove(&id);
    }
    rels.add(rt::DOCUMENT, &relative_target(PACKAGE_ROOT, &glossary), TargetMode::Internal);
    Ok(Some(intermediate))
}

/// Point a document error of the glossary build back at the source it came from
fn attribute(err: BuildError, origins: &[usize]) -> BuildError {
    match err {
        BuildError::Document { index: Some(k), reason } => BuildError::Document {
            index: origins.get(k).copied(),
            reason,
        },
        other => other,
    }
}

/// Assemble the glossaries of all sources into one glossary part of the output
pub fn merge_glossaries(sources: &[Source], out: &mut Package, out_main: &str, ctx: &mut BuildContext) -> BuildResult<()> {
    let mut origins = Vec::new();
    let mut intermediates = Vec::new();
    for (index, source) in sources.iter().enumerate() {
        if let Some(document) = glossary_as_document(source.document()).map_err(|e| e.at_source(index))? {
            origins.push(index);
            intermediates.push(Source::new(document));
        }
    }
    if intermediates.is_empty() {
        return Ok(());
    }
    tracing::debug!("Merging {} glossary documents", intermediates.len());

    let assembled = DocumentBuilder::new(BuilderSettings::default())
        .build(&intermediates)
        .map_err(|e| attribute(e, &origins))?;
    let assembled_main = assembled
        .main_document_part()
        .ok_or_else(|| BuildError::internal("assembled glossary has no main part"))?;

    let mut doc_parts = Element::new(ns::W, "docParts");
    if let Some(root) = assembled.xml(&assembled_main) {
        for part in root.descendants_named(ns::W, "docPart") {
            doc_parts.push(part.clone());
        }
    }

    let glossary = out.add_part(out_main, PartKind::Glossary, PartContent::Xml(Element::new("", "")))?;
    for (rel_type, kind) in GLOSSARY_PARTS {
        copy_part_whole(&assembled, &assembled_main, out, &glossary.name, rel_type, kind, ctx)?;
    }
    if let Some(fonts) = assembled.related_part_by_type(&assembled_main, rt::FONT_TABLE) {
        copy_whole_font_table(&assembled, &fonts, out, &glossary.name)?;
    }

    let mut content = vec![doc_parts];
    copy_resources(&assembled, &assembled_main, out, &glossary.name, &mut content, ctx)?;
    let mut root = wordprocessing_root("glossaryDocument");
    for element in content {
        root.push(element);
    }
    out.set_xml(&glossary.name, root)?;
    Ok(())
}

fn copy_part_whole(
    src: &Package,
    src_owner: &str,
    out: &mut Package,
    out_owner: &str,
    rel_type: &str,
    kind: PartKind,
    ctx: &mut BuildContext,
) -> BuildResult<()> {
    let Some(src_part) = src.related_part_by_type(src_owner, rel_type) else {
        return Ok(());
    };
    let Some(mut root) = src.xml(&src_part).cloned() else {
        return Ok(());
    };
    let created = out.add_part(out_owner, kind, PartContent::Xml(Element::new("", "")))?;
    copy_resources(src, &src_part, out, &created.name, std::slice::from_mut(&mut root), ctx)?;
    out.set_xml(&created.name, root)?;
    Ok(())
}
