//! Document assembly
//!
//! [`DocumentBuilder`] runs the whole pipeline: the first source supplies
//! the package singletons, every source contributes a fragment of its
//! body, and the sections, drawing ids and glossary are finalized once
//! all fragments are in place.

use crate::context::BuildContext;
use crate::custom_xml::{copy_bound_custom_xml, copy_custom_xml_parts};
use crate::error::{BuildError, BuildResult};
use crate::glossary::merge_glossaries;
use crate::ids::{remove_legacy_graphics_data, renumber_bookmarks, renumber_drawing_ids, seed_bookmark_counter};
use crate::insert::{declare_marker_namespaces, marker_count, replace_marker};
use crate::notes::{copy_comments, copy_notes, NoteKind};
use crate::numbering::copy_numbering;
use crate::ranges::fix_ranges;
use crate::resources::copy_resources;
use crate::sections::{
    copy_section_dependencies, copy_trailing_section, fix_up_section_properties, inherit_from_following,
    link_to_previous, remove_header_footer_references,
};
use crate::settings::BuilderSettings;
use crate::source::Source;
use crate::starting::{copy_starting_parts, copy_web_extensions};
use crate::styles::{copy_styles_and_fonts, normalize_style_ids};
use crate::validate::check_document;
use std::collections::HashMap;
use store::xml::{remove_fragment_where, try_visit_fragment_mut};
use store::{ns, relationship_types as rt, Element, Package};
use tracing::{debug, info, warn};

/// Where a fragment ends up in the output
enum Placement<'a> {
    /// Appended to the end of the main body
    Body,
    /// In place of the first insertion marker with `id` in `part`
    Marker { part: &'a str, id: &'a str },
}

impl Placement<'_> {
    fn part<'p>(&'p self, out_main: &'p str) -> &'p str {
        match self {
            Placement::Body => out_main,
            Placement::Marker { part, .. } => *part,
        }
    }
}

/// A source document checked and prepared for copying
struct WorkingSource {
    index: usize,
    document: Package,
    main: String,
    start: usize,
    count: usize,
    keep_sections: bool,
}

impl WorkingSource {
    fn open(index: usize, source: &Source) -> BuildResult<Self> {
        let mut document = source.document().clone();
        let main = check_document(&document)?;
        if source.keeps_sections() {
            if source.discards_headers_and_footers() {
                if let Some(root) = document.xml_mut(&main) {
                    remove_header_footer_references(root);
                }
            } else {
                link_to_previous(&mut document, &main)?;
            }
        }
        Ok(Self {
            index,
            document,
            main,
            start: source.start(),
            count: source.count(),
            keep_sections: source.keeps_sections(),
        })
    }

    /// The selected top-level body elements
    fn fragment(&self) -> Vec<Element> {
        self.document
            .xml(&self.main)
            .and_then(|root| root.element(ns::W, "body"))
            .map(|body| body.elements().skip(self.start).take(self.count).cloned().collect())
            .unwrap_or_default()
    }
}

/// Assembles output documents from ordered lists of [`Source`]s
#[derive(Debug, Clone, Default)]
pub struct DocumentBuilder {
    settings: BuilderSettings,
}

impl DocumentBuilder {
    pub fn new(settings: BuilderSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &BuilderSettings {
        &self.settings
    }

    /// Build one document from `sources`. An empty list yields an empty
    /// document. Any error aborts the build; document errors carry the
    /// index of the offending source.
    pub fn build(&self, sources: &[Source]) -> BuildResult<Package> {
        let mut out = Package::new_document();
        if sources.is_empty() {
            return Ok(out);
        }
        let normalized;
        let sources = if self.settings.normalize_style_ids {
            normalized = normalize_style_ids(sources);
            normalized.as_slice()
        } else {
            sources
        };
        let keep_sections = sources.iter().any(Source::keeps_sections);
        info!("Building document from {} sources (keep sections: {})", sources.len(), keep_sections);

        let out_main = out
            .main_document_part()
            .ok_or_else(|| BuildError::internal("new document has no main part"))?;
        let mut ctx = BuildContext::new(self.settings.clone());

        let mut first = WorkingSource::open(0, &sources[0]).map_err(|e| e.at_source(0))?;
        start_output(&mut first, &mut out, &out_main, &mut ctx).map_err(|e| e.at_source(0))?;

        let mut deferred: Vec<(WorkingSource, String)> = Vec::new();
        for (index, source) in sources.iter().enumerate() {
            let mut working = WorkingSource::open(index, source).map_err(|e| e.at_source(index))?;
            debug!("Appending source {} ({} elements from {})", index, working.count, working.start);
            ctx.numbering.begin_source(&out);
            match source.insert_id() {
                None => {
                    let content = working.fragment();
                    append_fragment(&mut working, &mut out, &out_main, content, Placement::Body, &mut ctx)
                        .map_err(|e| e.at_source(index))?;
                    // Later steps read the first source with its style corrections applied
                    if index == 0 {
                        first = working;
                    }
                }
                Some(id) => {
                    insert_at_markers(&mut working, &mut out, &out_main, &out_main, id, &mut ctx)
                        .map_err(|e| e.at_source(index))?;
                    deferred.push((working, id.to_string()));
                }
            }
        }

        if !keep_sections {
            copy_trailing_section(&first.document, &first.main, &mut out, &out_main, &mut ctx)
                .map_err(|e| e.at_source(0))?;
        } else {
            if let Some(root) = out.xml_mut(&out_main) {
                fix_up_section_properties(root);
            }
            inherit_from_following(&mut out, &out_main)?;
        }

        let mut stories: Vec<String> = Vec::new();
        for rel_type in [rt::HEADER, rt::FOOTER] {
            stories.extend(out.related_parts_by_type(&out_main, rel_type).into_iter().map(|(_, name)| name));
        }
        for (mut working, id) in deferred {
            let index = working.index;
            for story in &stories {
                insert_at_markers(&mut working, &mut out, &out_main, story, &id, &mut ctx).map_err(|e| e.at_source(index))?;
            }
        }

        let has_sections = out.xml(&out_main).is_some_and(|root| root.has_descendant(ns::W, "sectPr"));
        if keep_sections && !has_sections {
            copy_trailing_section(&first.document, &first.main, &mut out, &out_main, &mut ctx)
                .map_err(|e| e.at_source(0))?;
        }

        renumber_drawing_ids(&mut out, &out_main);
        merge_glossaries(sources, &mut out, &out_main, &mut ctx)?;
        info!("Built document with {} parts ({} distinct images)", out.parts().count(), ctx.images.len());
        Ok(out)
    }
}

/// Build a document from `sources` with `settings`
pub fn build_document(sources: &[Source], settings: &BuilderSettings) -> BuildResult<Package> {
    DocumentBuilder::new(settings.clone()).build(sources)
}

/// Copy the package singletons of the first source, plus the custom XML
/// parts the settings ask for
fn start_output(first: &mut WorkingSource, out: &mut Package, out_main: &str, ctx: &mut BuildContext) -> BuildResult<()> {
    copy_starting_parts(&mut first.document, &first.main, out, out_main, ctx)?;
    let settings = ctx.settings.clone();
    if !settings.custom_xml_guids.is_empty() {
        copy_custom_xml_parts(&first.document, &first.main, out, out_main, |id| settings.wants_custom_xml(id), ctx)?;
    }
    copy_web_extensions(&first.document, out)
}

/// Fill every marker with `id` in `part` that exists before the source is
/// processed. Markers carried in by the inserted content stay.
fn insert_at_markers(
    working: &mut WorkingSource,
    out: &mut Package,
    out_main: &str,
    part: &str,
    id: &str,
    ctx: &mut BuildContext,
) -> BuildResult<()> {
    let count = out.xml(part).map_or(0, |root| marker_count(root, id));
    if count == 0 && part == out_main {
        warn!("No insertion marker {} in the document", id);
    }
    for _ in 0..count {
        let content = working.fragment();
        append_fragment(working, out, out_main, content, Placement::Marker { part, id }, ctx)?;
    }
    Ok(())
}

/// Copy one fragment and everything it depends on into the output
fn append_fragment(
    working: &mut WorkingSource,
    out: &mut Package,
    out_main: &str,
    mut content: Vec<Element>,
    placement: Placement<'_>,
    ctx: &mut BuildContext,
) -> BuildResult<()> {
    let src_main = working.main.clone();
    let keep_sections = working.keep_sections && matches!(placement, Placement::Body);
    let target = placement.part(out_main).to_string();

    if let Some(root) = working.document.xml(&src_main) {
        fix_ranges(root, &mut content);
    }
    copy_styles_and_fonts(&mut working.document, &src_main, out, out_main, &mut content, ctx)?;

    let src = &working.document;
    copy_resources(src, &src_main, out, &target, &mut content, ctx)?;

    if keep_sections {
        let mut copied: HashMap<String, String> = HashMap::new();
        try_visit_fragment_mut(&mut content, &mut |e| {
            if e.is(ns::W, "sectPr") {
                copy_section_dependencies(src, &src_main, out, out_main, e, &mut copied, ctx)
            } else {
                Ok(())
            }
        })?;
    } else {
        remove_fragment_where(&mut content, &mut |e| e.is(ns::W, "sectPr"));
    }

    let src_numbering = src.related_part_by_type(&src_main, rt::NUMBERING);
    copy_numbering(src, src_numbering.as_deref(), out, out_main, &mut content, ctx)?;
    copy_comments(src, &src_main, out, out_main, &mut content, ctx)?;
    copy_notes(NoteKind::Footnote, src, &src_main, out, out_main, &mut content, ctx)?;
    copy_notes(NoteKind::Endnote, src, &src_main, out, out_main, &mut content, ctx)?;

    if let Some(root) = out.xml(&target) {
        seed_bookmark_counter(root, ctx);
    }
    renumber_bookmarks(&mut content, ctx)?;
    remove_legacy_graphics_data(&mut content);
    copy_bound_custom_xml(src, &src_main, out, out_main, &content, ctx)?;
    copy_web_extensions(src, out)?;

    let root = out
        .xml_mut(&target)
        .ok_or_else(|| BuildError::internal(format!("output part {} is not XML", target)))?;
    match placement {
        Placement::Body => {
            let body = root
                .element_mut(ns::W, "body")
                .ok_or_else(|| BuildError::internal("output document has no body"))?;
            for element in content {
                body.push(element);
            }
        }
        Placement::Marker { id, .. } => {
            if !replace_marker(root, id, &content) {
                return Err(BuildError::internal(format!("insertion marker {} vanished from {}", id, target)));
            }
        }
    }
    declare_marker_namespaces(root);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DocumentErrorKind;
    use store::{wordprocessing_root, PartContent, PartKind};

    fn paragraph(text: &str) -> Element {
        Element::new(ns::W, "p").with_child(Element::new(ns::W, "r").with_child(Element::new(ns::W, "t").with_text(text)))
    }

    fn document(paragraphs: &[&str]) -> Package {
        let mut package = Package::new_document();
        let main = package.main_document_part().unwrap();
        let body = package.xml_mut(&main).unwrap().element_mut(ns::W, "body").unwrap();
        for text in paragraphs {
            body.push(paragraph(text));
        }
        body.push(Element::new(ns::W, "sectPr").with_child(Element::new(ns::W, "pgSz").with_attr(ns::W, "w", "12240")));
        package
    }

    fn body_texts(package: &Package) -> Vec<String> {
        let main = package.main_document_part().unwrap();
        package
            .xml(&main)
            .unwrap()
            .element(ns::W, "body")
            .unwrap()
            .elements()
            .filter(|e| e.is(ns::W, "p"))
            .map(|p| p.text())
            .collect()
    }

    #[test]
    fn test_empty_sources_empty_document() {
        let out = DocumentBuilder::default().build(&[]).unwrap();
        assert!(body_texts(&out).is_empty());
    }

    #[test]
    fn test_fragments_in_order_with_first_section() {
        let sources = vec![
            Source::range(document(&["a1", "a2", "a3"]), 1, 2, false),
            Source::new(document(&["b1"])),
        ];
        let out = DocumentBuilder::default().build(&sources).unwrap();
        assert_eq!(body_texts(&out), vec!["a2", "a3", "b1"]);
        let main = out.main_document_part().unwrap();
        let body = out.xml(&main).unwrap().element(ns::W, "body").unwrap();
        assert_eq!(body.elements().filter(|e| e.is(ns::W, "sectPr")).count(), 1);
        assert!(body.elements().last().unwrap().is(ns::W, "sectPr"));
    }

    #[test]
    fn test_insert_source_replaces_marker() {
        let mut template = document(&["intro"]);
        let main = template.main_document_part().unwrap();
        let marker = Element::new(ns::PT_INSERT, "Insert").with_attr("", "Id", "Body");
        template.xml_mut(&main).unwrap().element_mut(ns::W, "body").unwrap().insert(1, marker);

        let sources = vec![Source::new(template), Source::new(document(&["inserted"])).insert_at("Body")];
        let out = DocumentBuilder::default().build(&sources).unwrap();
        assert_eq!(body_texts(&out), vec!["intro", "inserted"]);
    }

    #[test]
    fn test_error_names_source() {
        let mut bad = document(&["x"]);
        let main = bad.main_document_part().unwrap();
        bad.xml_mut(&main)
            .unwrap()
            .element_mut(ns::W, "body")
            .unwrap()
            .push(Element::new(ns::W, "altChunk").with_attr(ns::R, "id", "rId9"));
        let sources = vec![Source::new(document(&["ok"])), Source::new(bad)];
        let err = DocumentBuilder::default().build(&sources).unwrap_err();
        assert_eq!(err.source_index(), Some(1));
        assert_eq!(err.reason(), Some(&DocumentErrorKind::AltChunk));
    }

    #[test]
    fn test_kept_sections_get_explicit_headers() {
        let mut first = document(&["one"]);
        let main = first.main_document_part().unwrap();
        let header = first
            .add_part(&main, PartKind::Header, PartContent::Xml(wordprocessing_root("hdr").with_child(paragraph("H1"))))
            .unwrap();
        if let Some(sect_pr) = first.xml_mut(&main).unwrap().element_mut(ns::W, "body").unwrap().element_mut(ns::W, "sectPr") {
            sect_pr.insert(
                0,
                Element::new(ns::W, "headerReference")
                    .with_attr(ns::W, "type", "default")
                    .with_attr(ns::R, "id", header.rel_id.clone()),
            );
        }
        let sources = vec![Source::new(first).keep_sections(true), Source::new(document(&["two"])).keep_sections(true)];
        let out = DocumentBuilder::default().build(&sources).unwrap();

        let out_main = out.main_document_part().unwrap();
        let root = out.xml(&out_main).unwrap();
        let sections: Vec<&Element> = root.descendants_named(ns::W, "sectPr").collect();
        assert_eq!(sections.len(), 2);
        for section in sections {
            assert_eq!(section.elements_named(ns::W, "headerReference").count(), 3);
            assert_eq!(section.elements_named(ns::W, "footerReference").count(), 3);
        }
        let body = root.element(ns::W, "body").unwrap();
        assert!(body.elements().last().unwrap().is(ns::W, "sectPr"));
    }
}
