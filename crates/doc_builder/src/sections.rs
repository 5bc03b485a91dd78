//! Section properties and header/footer inheritance
//!
//! A section that does not set one of its six header/footer slots shows
//! the header or footer of a neighbouring section. When sections from
//! several documents are combined that implicit link would point at the
//! wrong content, so every slot is made explicit.

use crate::context::BuildContext;
use crate::error::{BuildError, BuildResult, DocumentErrorKind};
use crate::ids::renumber_bookmarks;
use crate::numbering::copy_numbering;
use crate::resources::copy_resources;
use std::collections::HashMap;
use store::{ns, relationship_types as rt, wordprocessing_root, Element, Package, PartContent, PartKind};

/// Header or footer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderFooter {
    Header,
    Footer,
}

impl HeaderFooter {
    fn reference(self) -> &'static str {
        match self {
            HeaderFooter::Header => "headerReference",
            HeaderFooter::Footer => "footerReference",
        }
    }

    fn part_kind(self) -> PartKind {
        match self {
            HeaderFooter::Header => PartKind::Header,
            HeaderFooter::Footer => PartKind::Footer,
        }
    }

    fn rel_type(self) -> &'static str {
        match self {
            HeaderFooter::Header => rt::HEADER,
            HeaderFooter::Footer => rt::FOOTER,
        }
    }

    /// An empty header or footer with a single styled paragraph
    fn empty_root(self) -> Element {
        let (root, style) = match self {
            HeaderFooter::Header => ("hdr", "Header"),
            HeaderFooter::Footer => ("ftr", "Footer"),
        };
        wordprocessing_root(root).with_child(
            Element::new(ns::W, "p")
                .with_child(Element::new(ns::W, "pPr").with_child(Element::new(ns::W, "pStyle").with_attr(ns::W, "val", style)))
                .with_child(Element::new(ns::W, "r").with_child(Element::new(ns::W, "t"))),
        )
    }
}

/// The six slots, in a fixed order
const SLOTS: [(HeaderFooter, &str); 6] = [
    (HeaderFooter::Header, "first"),
    (HeaderFooter::Header, "even"),
    (HeaderFooter::Header, "default"),
    (HeaderFooter::Footer, "first"),
    (HeaderFooter::Footer, "even"),
    (HeaderFooter::Footer, "default"),
];

type SlotIds = [Option<String>; 6];

fn slot_index(kind: HeaderFooter, subtype: &str) -> usize {
    SLOTS
        .iter()
        .position(|(k, t)| *k == kind && *t == subtype)
        .unwrap_or(0)
}

/// Explicit references a section carries
fn explicit_slots(sect_pr: &Element) -> SlotIds {
    let mut ids: SlotIds = Default::default();
    for (index, (kind, subtype)) in SLOTS.iter().enumerate() {
        ids[index] = sect_pr
            .elements_named(ns::W, kind.reference())
            .find(|r| r.attr(ns::W, "type") == Some(*subtype))
            .and_then(|r| r.attr(ns::R, "id"))
            .map(str::to_string);
    }
    ids
}

fn reference(kind: HeaderFooter, subtype: &str, rel_id: &str) -> Element {
    Element::new(ns::W, kind.reference())
        .with_attr(ns::W, "type", subtype)
        .with_attr(ns::R, "id", rel_id)
}

/// Create an empty header or footer part under `main`, returning its id
fn create_empty(package: &mut Package, main: &str, kind: HeaderFooter) -> BuildResult<String> {
    let created = package.add_part(main, kind.part_kind(), PartContent::Xml(kind.empty_root()))?;
    tracing::debug!("Created empty {:?} {}", kind, created.name);
    Ok(created.rel_id)
}

/// Fill every slot of the first section visited. Missing first/even slots
/// reuse the default reference; a missing default gets an empty part.
fn seed_slots(package: &mut Package, main: &str, explicit: &SlotIds) -> BuildResult<(SlotIds, Vec<(usize, String)>)> {
    let mut cache = explicit.clone();
    let mut added = Vec::new();
    for kind in [HeaderFooter::Header, HeaderFooter::Footer] {
        let default = explicit[slot_index(kind, "default")].clone();
        for subtype in ["first", "even"] {
            let index = slot_index(kind, subtype);
            if explicit[index].is_some() {
                continue;
            }
            let rel_id = match &default {
                Some(id) => id.clone(),
                None => create_empty(package, main, kind)?,
            };
            cache[index] = Some(rel_id.clone());
            added.push((index, rel_id));
        }
        let index = slot_index(kind, "default");
        if default.is_none() {
            let rel_id = create_empty(package, main, kind)?;
            cache[index] = Some(rel_id.clone());
            added.push((index, rel_id));
        }
    }
    Ok((cache, added))
}

/// Make every header/footer slot of the sections of `root` explicit.
/// Sections are visited in document order, or last first when `reverse`
/// is set; each one inherits from the section visited before it.
fn resolve_slots(package: &mut Package, main: &str, root: &mut Element, reverse: bool) -> BuildResult<()> {
    let explicit: Vec<SlotIds> = root.descendants_named(ns::W, "sectPr").map(explicit_slots).collect();
    if explicit.is_empty() {
        return Ok(());
    }
    let mut order: Vec<usize> = (0..explicit.len()).collect();
    if reverse {
        order.reverse();
    }

    let mut additions: Vec<Vec<(usize, String)>> = vec![Vec::new(); explicit.len()];
    let (mut cache, seeded) = seed_slots(package, main, &explicit[order[0]])?;
    additions[order[0]] = seeded;

    for &section in &order[1..] {
        for (index, own) in explicit[section].iter().enumerate() {
            match own {
                Some(id) => cache[index] = Some(id.clone()),
                None => {
                    let inherited = cache[index]
                        .clone()
                        .ok_or_else(|| BuildError::internal("header/footer slot was not seeded"))?;
                    additions[section].push((index, inherited));
                }
            }
        }
    }

    let mut position = 0;
    root.visit_mut(&mut |e| {
        if !e.is(ns::W, "sectPr") {
            return;
        }
        if let Some(added) = additions.get(position) {
            for (index, rel_id) in added {
                let (kind, subtype) = SLOTS[*index];
                e.insert(0, reference(kind, subtype, rel_id));
            }
        }
        position += 1;
    });
    Ok(())
}

/// Make the header/footer links of a source document explicit before its
/// sections are copied. Sections inherit from the previous section.
pub fn link_to_previous(package: &mut Package, main: &str) -> BuildResult<()> {
    let mut root = package
        .take_xml(main)
        .ok_or(DocumentErrorKind::MissingMainPart)?;
    let resolved = resolve_slots(package, main, &mut root, false);
    package.set_xml(main, root)?;
    resolved
}

/// Make the header/footer slots of the output explicit, each section
/// taking unset slots from the nearest following section
pub fn inherit_from_following(out: &mut Package, main: &str) -> BuildResult<()> {
    let mut root = out
        .take_xml(main)
        .ok_or_else(|| BuildError::internal("output has no main part"))?;
    let resolved = resolve_slots(out, main, &mut root, true);
    out.set_xml(main, root)?;
    resolved
}

/// Drop all header and footer references from the sections of `root`
pub fn remove_header_footer_references(root: &mut Element) {
    root.visit_mut(&mut |e| {
        if e.is(ns::W, "sectPr") {
            e.remove_elements_named(ns::W, "headerReference");
            e.remove_elements_named(ns::W, "footerReference");
        }
    });
}

/// Only the final `w:sectPr` may be a direct child of the body. Any other
/// moves into the paragraph properties of the paragraph before it.
pub fn fix_up_section_properties(root: &mut Element) {
    let Some(body) = root.element_mut(ns::W, "body") else {
        return;
    };
    let positions: Vec<usize> = body
        .children
        .iter()
        .enumerate()
        .filter_map(|(i, node)| match node {
            store::Node::Element(e) if e.is(ns::W, "sectPr") => Some(i),
            _ => None,
        })
        .collect();
    let last_element = body
        .children
        .iter()
        .rposition(|node| matches!(node, store::Node::Element(_)));

    for &position in positions.iter().rev() {
        if Some(position) == last_element {
            continue;
        }
        let store::Node::Element(sect_pr) = body.children.remove(position) else {
            continue;
        };
        let previous = body.children[..position]
            .iter()
            .rposition(|node| matches!(node, store::Node::Element(_)));
        let paragraph_before = previous.filter(|&i| matches!(&body.children[i], store::Node::Element(p) if p.is(ns::W, "p")));
        match paragraph_before {
            Some(i) => {
                if let store::Node::Element(paragraph) = &mut body.children[i] {
                    attach_to_paragraph(paragraph, sect_pr);
                }
            }
            None => {
                let mut paragraph = Element::new(ns::W, "p");
                attach_to_paragraph(&mut paragraph, sect_pr);
                body.children.insert(position, store::Node::Element(paragraph));
            }
        }
    }
}

fn attach_to_paragraph(paragraph: &mut Element, sect_pr: Element) {
    if paragraph.element(ns::W, "pPr").is_none() {
        paragraph.insert(0, Element::new(ns::W, "pPr"));
    }
    if let Some(ppr) = paragraph.element_mut(ns::W, "pPr") {
        match ppr.child_index(ns::W, "pPrChange") {
            Some(index) => ppr.insert(index, sect_pr),
            None => ppr.push(sect_pr),
        }
    }
}

/// Copy the headers and footers a section references into the output and
/// point the section at the copies. `copied` maps source relationship ids
/// to output ids so each part is copied once per source.
pub fn copy_section_dependencies(
    src: &Package,
    src_main: &str,
    out: &mut Package,
    out_main: &str,
    sect_pr: &mut Element,
    copied: &mut HashMap<String, String>,
    ctx: &mut BuildContext,
) -> BuildResult<()> {
    let src_numbering = src.related_part_by_type(src_main, rt::NUMBERING);
    for reference in sect_pr.elements_mut() {
        let kind = if reference.is(ns::W, "headerReference") {
            HeaderFooter::Header
        } else if reference.is(ns::W, "footerReference") {
            HeaderFooter::Footer
        } else {
            continue;
        };
        let Some(old_id) = reference.attr(ns::R, "id").map(str::to_string) else {
            continue;
        };
        if let Some(new_id) = copied.get(&old_id) {
            reference.set_attr(ns::R, "id", new_id.clone());
            continue;
        }

        let relationship = src
            .relationship(src_main, &old_id)
            .ok_or_else(|| DocumentErrorKind::InvalidRelationship { id: old_id.clone() })?;
        if relationship.rel_type != kind.rel_type() {
            return Err(DocumentErrorKind::UnexpectedTargetPart { id: old_id }.into());
        }
        let src_part = src
            .related_part_name(src_main, &old_id)
            .ok_or_else(|| DocumentErrorKind::InvalidRelationship { id: old_id.clone() })?;
        let mut root = src
            .xml(&src_part)
            .cloned()
            .ok_or_else(|| DocumentErrorKind::UnexpectedTargetPart { id: old_id.clone() })?;

        copy_numbering(src, src_numbering.as_deref(), out, out_main, std::slice::from_mut(&mut root), ctx)?;
        renumber_bookmarks(std::slice::from_mut(&mut root), ctx)?;
        let created = out.add_part(out_main, kind.part_kind(), PartContent::Xml(Element::new("", "")))?;
        copy_resources(src, &src_part, out, &created.name, std::slice::from_mut(&mut root), ctx)?;
        out.set_xml(&created.name, root)?;

        reference.set_attr(ns::R, "id", created.rel_id.clone());
        copied.insert(old_id, created.rel_id);
    }
    Ok(())
}

/// Append the trailing body `w:sectPr` of `src`, with its headers and
/// footers, to the output body
pub fn copy_trailing_section(
    src: &Package,
    src_main: &str,
    out: &mut Package,
    out_main: &str,
    ctx: &mut BuildContext,
) -> BuildResult<()> {
    let Some(mut sect_pr) = src
        .xml(src_main)
        .and_then(|root| root.element(ns::W, "body"))
        .and_then(|body| body.elements().last())
        .filter(|last| last.is(ns::W, "sectPr"))
        .cloned()
    else {
        return Ok(());
    };
    copy_section_dependencies(src, src_main, out, out_main, &mut sect_pr, &mut HashMap::new(), ctx)?;
    if let Some(body) = out.xml_mut(out_main).and_then(|root| root.element_mut(ns::W, "body")) {
        body.push(sect_pr);
    }
    Ok(())
}
