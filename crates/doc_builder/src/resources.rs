//! Relationship and resource copying
//!
//! Content copied from a source part keeps relationship ids that mean
//! nothing in the destination part. The functions here re-create each
//! relationship on the destination (copying the target part when it is
//! internal) and rewrite the ids in the copied content.
//!
//! Every step skips ids the destination part already knows. Parts such as
//! comments are processed repeatedly as sources are appended, and their
//! earlier content already carries destination ids.

use crate::context::BuildContext;
use crate::error::{BuildError, BuildResult, DocumentErrorKind};
use crate::remap::rewrite_relationship_id;
use std::collections::HashSet;
use store::xml::fragment_descendants;
use store::{
    ns, relationship_types as rt, Element, Package, PartContent, PartKind, Relationship, Relationships, XName,
};

/// Every element/attribute pair that holds a relationship id
pub const RELATIONSHIP_MARKUP: &[(&str, &str, &[&str])] = &[
    (ns::A, "blip", &["embed", "link"]),
    (ns::A, "hlinkClick", &["id"]),
    (ns::A, "hlinkHover", &["id"]),
    (ns::A, "hlinkMouseOver", &["id"]),
    (ns::A, "relIds", &["cs", "dm", "lo", "qs"]),
    (ns::C, "chart", &["id"]),
    (ns::C, "externalData", &["id"]),
    (ns::C, "userShapes", &["id"]),
    (ns::DGM, "relIds", &["cs", "dm", "lo", "qs"]),
    (ns::O, "OLEObject", &["id"]),
    (ns::V, "fill", &["id"]),
    (ns::V, "imagedata", &["href", "id", "pict"]),
    (ns::V, "stroke", &["id"]),
    (ns::W, "altChunk", &["id"]),
    (ns::W, "attachedTemplate", &["id"]),
    (ns::W, "control", &["id"]),
    (ns::W, "dataSource", &["id"]),
    (ns::W, "embedBold", &["id"]),
    (ns::W, "embedBoldItalic", &["id"]),
    (ns::W, "embedItalic", &["id"]),
    (ns::W, "embedRegular", &["id"]),
    (ns::W, "footerReference", &["id"]),
    (ns::W, "headerReference", &["id"]),
    (ns::W, "headerSource", &["id"]),
    (ns::W, "hyperlink", &["id"]),
    (ns::W, "printerSettings", &["id"]),
    (ns::W, "recipientData", &["id"]),
    (ns::W, "saveThroughXslt", &["id"]),
    (ns::W, "sourceFileName", &["id"]),
    (ns::W, "src", &["id"]),
    (ns::W, "subDoc", &["id"]),
    (ns::WNE, "toolbarData", &["id"]),
];

/// What a link-style relationship must look like in the source part
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkKind {
    /// A hyperlink relationship, internal or external. Missing ones are
    /// skipped.
    Hyperlink,
    /// An external relationship that must exist
    External,
    /// An external relationship that is skipped when missing
    OptionalExternal,
}

const LINK_SITES: &[(&str, &str, &str, LinkKind)] = &[
    (ns::W, "hyperlink", "id", LinkKind::Hyperlink),
    (ns::A, "hlinkClick", "id", LinkKind::Hyperlink),
    (ns::A, "hlinkHover", "id", LinkKind::Hyperlink),
    (ns::A, "hlinkMouseOver", "id", LinkKind::Hyperlink),
    (ns::W, "attachedTemplate", "id", LinkKind::External),
    (ns::W, "saveThroughXslt", "id", LinkKind::External),
    (ns::V, "imagedata", "href", LinkKind::External),
    (ns::A, "blip", "link", LinkKind::OptionalExternal),
];

const IMAGE_ELEMENTS: &[(&str, &str)] = &[(ns::V, "imagedata"), (ns::V, "fill"), (ns::V, "stroke"), (ns::A, "blip")];
const IMAGE_ATTRIBUTES: &[&str] = &["embed", "pict", "id"];

/// The four diagram attributes: data, layout, quick style and colors
const DIAGRAM_ATTRIBUTES: &[&str] = &["dm", "lo", "qs", "cs"];

fn diagram_part_kind(attr: &str) -> PartKind {
    match attr {
        "dm" => PartKind::DiagramData,
        "lo" => PartKind::DiagramLayout,
        "qs" => PartKind::DiagramStyle,
        _ => PartKind::DiagramColors,
    }
}

/// Re-create hyperlinks and other link relationships of `content`
pub fn add_relationships(
    src: &Package,
    src_part: &str,
    out: &mut Package,
    out_part: &str,
    content: &mut [Element],
) -> BuildResult<()> {
    for &(ens, elocal, attr, kind) in LINK_SITES {
        for id in referenced_ids(content, (ens, elocal), attr) {
            if out.has_relationship(out_part, &id) {
                continue;
            }
            let old = src.relationship(src_part, &id).filter(|rel| match kind {
                LinkKind::Hyperlink => rel.rel_type == rt::HYPERLINK,
                LinkKind::External | LinkKind::OptionalExternal => rel.is_external(),
            });
            let Some(old) = old else {
                if kind == LinkKind::External {
                    return Err(DocumentErrorKind::InvalidRelationship { id }.into());
                }
                tracing::warn!("Skipping unresolved {} relationship {} in {}", elocal, id, src_part);
                continue;
            };
            let new_id = relationships_of(out, out_part)?.add_unique(&old.rel_type, &old.target, old.target_mode);
            rewrite_relationship_id(content, (ens, elocal), (ns::R, attr), &id, &new_id);
        }
    }
    Ok(())
}

/// Copy images, diagrams, OLE objects and charts referenced by `content`
pub fn copy_related_parts(
    src: &Package,
    src_part: &str,
    out: &mut Package,
    out_part: &str,
    content: &mut [Element],
    ctx: &mut BuildContext,
) -> BuildResult<()> {
    copy_images(src, src_part, out, out_part, content, ctx)?;
    copy_diagrams(src, src_part, out, out_part, content, ctx)?;
    copy_ole_objects(src, src_part, out, out_part, content)?;
    copy_charts(src, src_part, out, out_part, content, ctx)?;
    copy_user_shapes(src, src_part, out, out_part, content, ctx)?;
    copy_external_data(src, src_part, out, out_part, content)
}

/// [`add_relationships`] followed by [`copy_related_parts`]
pub fn copy_resources(
    src: &Package,
    src_part: &str,
    out: &mut Package,
    out_part: &str,
    content: &mut [Element],
    ctx: &mut BuildContext,
) -> BuildResult<()> {
    add_relationships(src, src_part, out, out_part, content)?;
    copy_related_parts(src, src_part, out, out_part, content, ctx)
}

fn copy_images(
    src: &Package,
    src_part: &str,
    out: &mut Package,
    out_part: &str,
    content: &mut [Element],
    ctx: &mut BuildContext,
) -> BuildResult<()> {
    for &element in IMAGE_ELEMENTS {
        for &attr in IMAGE_ATTRIBUTES {
            for id in referenced_ids(content, element, attr) {
                if out.has_relationship(out_part, &id) {
                    continue;
                }
                let new_id = copy_image(src, src_part, out, out_part, &id, ctx)?;
                rewrite_relationship_id(content, element, (ns::R, attr), &id, &new_id);
            }
        }
    }
    Ok(())
}

fn copy_image(
    src: &Package,
    src_part: &str,
    out: &mut Package,
    out_part: &str,
    id: &str,
    ctx: &mut BuildContext,
) -> BuildResult<String> {
    let missing = || BuildError::from(DocumentErrorKind::MissingImage { id: id.to_string() });
    let rel = src.relationship(src_part, id).ok_or_else(missing)?;
    if rel.is_external() {
        return Ok(relationships_of(out, out_part)?.add_unique(&rel.rel_type, &rel.target, rel.target_mode));
    }
    let name = src.related_part_name(src_part, id).ok_or_else(missing)?;
    let part = src.part(&name).ok_or_else(missing)?;
    if rel.rel_type != rt::IMAGE && !part.content_type.starts_with("image/") {
        return Err(DocumentErrorKind::UnexpectedTargetPart { id: id.to_string() }.into());
    }
    let bytes = part.bytes();
    Ok(ctx
        .images
        .bind(out, out_part, &part.content_type, &part.extension(), &bytes)?)
}

fn copy_diagrams(
    src: &Package,
    src_part: &str,
    out: &mut Package,
    out_part: &str,
    content: &mut [Element],
    ctx: &mut BuildContext,
) -> BuildResult<()> {
    for element in [(ns::DGM, "relIds"), (ns::A, "relIds")] {
        for &attr in DIAGRAM_ATTRIBUTES {
            for id in referenced_ids(content, element, attr) {
                if out.has_relationship(out_part, &id) {
                    continue;
                }
                let name = src
                    .related_part_name(src_part, &id)
                    .ok_or_else(|| DocumentErrorKind::InvalidRelationship { id: id.clone() })?;
                let new_id = copy_part(src, &name, out, out_part, diagram_part_kind(attr), ctx)?;
                rewrite_relationship_id(content, element, (ns::R, attr), &id, &new_id);
            }
        }
    }
    Ok(())
}

fn copy_ole_objects(
    src: &Package,
    src_part: &str,
    out: &mut Package,
    out_part: &str,
    content: &mut [Element],
) -> BuildResult<()> {
    for id in referenced_ids(content, (ns::O, "OLEObject"), "id") {
        if out.has_relationship(out_part, &id) {
            continue;
        }
        let rel = src
            .relationship(src_part, &id)
            .ok_or_else(|| DocumentErrorKind::InvalidRelationship { id: id.clone() })?;
        let new_id = copy_embedding(src, src_part, out, out_part, rel)?;
        rewrite_relationship_id(content, (ns::O, "OLEObject"), (ns::R, "id"), &id, &new_id);
    }
    Ok(())
}

/// Copy an embedded object or package, or re-create its external link
fn copy_embedding(
    src: &Package,
    src_part: &str,
    out: &mut Package,
    out_part: &str,
    rel: &Relationship,
) -> BuildResult<String> {
    if rel.is_external() {
        return Ok(relationships_of(out, out_part)?.add_unique(&rel.rel_type, &rel.target, rel.target_mode));
    }
    let name = src
        .related_part_name(src_part, &rel.id)
        .ok_or_else(|| DocumentErrorKind::InvalidRelationship { id: rel.id.clone() })?;
    let part = src
        .part(&name)
        .ok_or_else(|| DocumentErrorKind::InvalidRelationship { id: rel.id.clone() })?;
    let kind = if rel.rel_type == rt::PACKAGE {
        PartKind::embedded_package(&part.content_type, &part.extension())
    } else {
        PartKind::embedded_object(&part.content_type, &part.extension())
    };
    let new_part = out.add_part(out_part, kind, PartContent::Binary(part.bytes()))?;
    Ok(new_part.rel_id)
}

fn copy_charts(
    src: &Package,
    src_part: &str,
    out: &mut Package,
    out_part: &str,
    content: &mut [Element],
    ctx: &mut BuildContext,
) -> BuildResult<()> {
    for id in referenced_ids(content, (ns::C, "chart"), "id") {
        if out.has_relationship(out_part, &id) {
            continue;
        }
        let Some(name) = src.related_part_name(src_part, &id) else {
            tracing::warn!("Skipping chart {} with no target in {}", id, src_part);
            continue;
        };
        let new_id = copy_part(src, &name, out, out_part, PartKind::Chart, ctx)?;
        rewrite_relationship_id(content, (ns::C, "chart"), (ns::R, "id"), &id, &new_id);
    }
    Ok(())
}

fn copy_user_shapes(
    src: &Package,
    src_part: &str,
    out: &mut Package,
    out_part: &str,
    content: &mut [Element],
    ctx: &mut BuildContext,
) -> BuildResult<()> {
    for id in referenced_ids(content, (ns::C, "userShapes"), "id") {
        if out.has_relationship(out_part, &id) {
            continue;
        }
        let Some(name) = src.related_part_name(src_part, &id) else {
            tracing::warn!("Skipping chart user shapes {} with no target in {}", id, src_part);
            continue;
        };
        let new_id = copy_part(src, &name, out, out_part, PartKind::ChartDrawing, ctx)?;
        rewrite_relationship_id(content, (ns::C, "userShapes"), (ns::R, "id"), &id, &new_id);
    }
    Ok(())
}

/// Embedded workbooks (or links to external ones) behind chart data
fn copy_external_data(
    src: &Package,
    src_part: &str,
    out: &mut Package,
    out_part: &str,
    content: &mut [Element],
) -> BuildResult<()> {
    for id in referenced_ids(content, (ns::C, "externalData"), "id") {
        if out.has_relationship(out_part, &id) {
            continue;
        }
        let rel = src
            .relationship(src_part, &id)
            .ok_or_else(|| DocumentErrorKind::InvalidRelationship { id: id.clone() })?;
        let new_id = copy_embedding(src, src_part, out, out_part, rel)?;
        rewrite_relationship_id(content, (ns::C, "externalData"), (ns::R, "id"), &id, &new_id);
    }
    Ok(())
}

/// Copy an XML part under `parent` together with everything it references.
/// Returns the relationship id binding the copy.
fn copy_part(
    src: &Package,
    name: &str,
    out: &mut Package,
    parent: &str,
    kind: PartKind,
    ctx: &mut BuildContext,
) -> BuildResult<String> {
    let part = src
        .part(name)
        .ok_or_else(|| BuildError::internal(format!("related part {} vanished", name)))?;
    let Some(root) = part.xml() else {
        return Ok(out.add_part(parent, kind, part.content.clone())?.rel_id);
    };
    let mut root = root.clone();
    let new_part = out.add_part(parent, kind, PartContent::Xml(Element::new("", "")))?;
    copy_resources(src, name, out, &new_part.name, std::slice::from_mut(&mut root), ctx)?;
    out.set_xml(&new_part.name, root)?;
    Ok(new_part.rel_id)
}

/// Copy the embedded fonts of a font table whose root was cloned from
/// `src_font_table` into `out_font_table`
pub fn copy_embedded_fonts(
    src: &Package,
    src_font_table: &str,
    out: &mut Package,
    out_font_table: &str,
    content: &mut [Element],
) -> BuildResult<()> {
    for local in ["embedRegular", "embedBold", "embedItalic", "embedBoldItalic"] {
        for id in referenced_ids(content, (ns::W, local), "id") {
            if out.has_relationship(out_font_table, &id) {
                continue;
            }
            let part = src
                .related_part_name(src_font_table, &id)
                .and_then(|name| src.part(&name))
                .ok_or(DocumentErrorKind::InvalidFontTable)?;
            let is_font = src
                .relationship(src_font_table, &id)
                .is_some_and(|rel| rel.rel_type == rt::FONT);
            if !is_font {
                return Err(DocumentErrorKind::InvalidFontTable.into());
            }
            let kind = PartKind::font(&part.content_type, &part.extension());
            let new_part = out.add_part(out_font_table, kind, PartContent::Binary(part.bytes()))?;
            rewrite_relationship_id(content, (ns::W, local), (ns::R, "id"), &id, &new_part.rel_id);
        }
    }
    Ok(())
}

/// A relationship-bearing attribute whose id is not in its part's table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingRelationship {
    pub part: String,
    pub element: XName,
    pub attribute: XName,
    pub id: String,
}

/// Audit every XML part of a package for relationship ids that do not
/// resolve on the part that uses them
pub fn find_dangling_relationships(package: &Package) -> Vec<DanglingRelationship> {
    let mut dangling = Vec::new();
    for part in package.parts() {
        let Some(root) = part.xml() else {
            continue;
        };
        for e in std::iter::once(root).chain(root.descendants()) {
            let Some((_, _, attrs)) = RELATIONSHIP_MARKUP.iter().find(|(ens, elocal, _)| e.is(ens, elocal)) else {
                continue;
            };
            for attr in attrs.iter() {
                let Some(id) = e.attr(ns::R, attr).filter(|id| !id.is_empty()) else {
                    continue;
                };
                if !part.relationships.contains(id) {
                    dangling.push(DanglingRelationship {
                        part: part.name.clone(),
                        element: e.name.clone(),
                        attribute: XName::new(ns::R, attr),
                        id: id.to_string(),
                    });
                }
            }
        }
    }
    dangling
}

/// Distinct non-empty ids carried by an attribute (in the relationships
/// namespace) of the named elements, in document order
fn referenced_ids(content: &[Element], element: (&str, &str), attr: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    fragment_descendants(content)
        .filter(|e| e.is(element.0, element.1))
        .filter_map(|e| e.attr(ns::R, attr))
        .filter(|id| !id.is_empty() && seen.insert(id.to_string()))
        .map(str::to_string)
        .collect()
}

fn relationships_of<'a>(out: &'a mut Package, part: &str) -> BuildResult<&'a mut Relationships> {
    out.relationships_mut(part)
        .ok_or_else(|| BuildError::internal(format!("destination part {} does not exist", part)))
}
