//! Style, latent style and font table merge
//!
//! Styles are matched by name, never by id. A source style whose name is
//! already defined in the output is dropped and its id mapped to the
//! output's id; any other style is copied. The resulting correction table
//! is applied to the copied content and to the parts of the working copy
//! that are copied later (numbering, headers, notes, comments).

use crate::context::BuildContext;
use crate::error::BuildResult;
use crate::numbering::copy_numbering;
use crate::remap::{rewrite_all, IdKind};
use crate::resources::copy_embedded_fonts;
use crate::source::Source;
use std::collections::{HashMap, HashSet};
use store::{ns, relationship_types as rt, Element, Package, PartContent, PartKind};

/// Parts whose style references follow a style rename
const STYLE_REFERENCING_PARTS: &[&str] = &[
    rt::NUMBERING,
    rt::HEADER,
    rt::FOOTER,
    rt::FOOTNOTES,
    rt::ENDNOTES,
    rt::COMMENTS,
];

/// Merge the styles, styles-with-effects and font table of `src` into the
/// parts owned by `out_owner`
pub fn copy_styles_and_fonts(
    src: &mut Package,
    src_main: &str,
    out: &mut Package,
    out_owner: &str,
    content: &mut [Element],
    ctx: &mut BuildContext,
) -> BuildResult<()> {
    copy_styles_part(src, src_main, out, out_owner, content, ctx, rt::STYLES)?;
    copy_styles_part(src, src_main, out, out_owner, content, ctx, rt::STYLES_WITH_EFFECTS)?;
    copy_font_table(src, src_main, out, out_owner)
}

fn copy_styles_part(
    src: &mut Package,
    src_main: &str,
    out: &mut Package,
    out_owner: &str,
    content: &mut [Element],
    ctx: &mut BuildContext,
    rel_type: &str,
) -> BuildResult<()> {
    let Some(src_styles) = src.related_part_by_type(src_main, rel_type) else {
        return Ok(());
    };
    let Some(src_root) = src.xml(&src_styles).cloned() else {
        return Ok(());
    };
    let src_numbering = src.related_part_by_type(src_main, rt::NUMBERING);
    let kind = if rel_type == rt::STYLES {
        PartKind::Styles
    } else {
        PartKind::StylesWithEffects
    };

    let Some(out_styles) = out.related_part_by_type(out_owner, rel_type) else {
        let mut root = src_root;
        copy_numbering(src, src_numbering.as_deref(), out, out_owner, std::slice::from_mut(&mut root), ctx)?;
        out.add_part(out_owner, kind, PartContent::Xml(root))?;
        return Ok(());
    };

    let mut out_root = out
        .take_xml(&out_styles)
        .ok_or_else(|| crate::error::BuildError::internal(format!("styles part {} is not XML", out_styles)))?;
    let (corrections, mut copied) = merge_styles(&src_root, &out_root);

    // The styles part is authoritative for the ids used by content
    if rel_type == rt::STYLES && !corrections.is_empty() {
        tracing::debug!("Style ids remapped: {:?}", corrections);
        rewrite_all(content, IdKind::Style, &corrections);
        rewrite_source_style_ids(src, src_main, STYLE_REFERENCING_PARTS, &corrections);
    }
    rewrite_all(&mut copied, IdKind::Style, &corrections);

    let numbered = copy_numbering(src, src_numbering.as_deref(), out, out_owner, &mut copied, ctx);
    for style in copied {
        out_root.push(style);
    }
    merge_latent_styles(&src_root, &mut out_root);
    out.set_xml(&out_styles, out_root)?;
    numbered
}

/// Decide which source styles to copy. Returns the id corrections and the
/// styles to append, still carrying their source ids.
fn merge_styles(src_root: &Element, out_root: &Element) -> (HashMap<String, String>, Vec<Element>) {
    let mut corrections = HashMap::new();
    let mut copied = Vec::new();
    let mut taken: HashSet<String> = out_root
        .elements_named(ns::W, "style")
        .filter_map(|s| s.attr(ns::W, "styleId"))
        .map(str::to_string)
        .collect();

    for from in src_root.elements_named(ns::W, "style") {
        let from_id = from.attr(ns::W, "styleId").unwrap_or_default();
        let existing = style_name(from).and_then(|name| {
            out_root
                .elements_named(ns::W, "style")
                .find(|s| style_name(s) == Some(name))
        });

        if let Some(existing) = existing {
            let to_id = existing.attr(ns::W, "styleId").unwrap_or_default();
            if from_id != to_id {
                corrections
                    .entry(from_id.to_string())
                    .or_insert_with(|| to_id.to_string());
            }
            continue;
        }

        // A linked style whose partner was matched follows the partner's link
        let partner_link = from
            .element(ns::W, "link")
            .and_then(|l| l.attr(ns::W, "val"))
            .and_then(|link| corrections.get(link))
            .and_then(|partner_id: &String| {
                out_root
                    .elements_named(ns::W, "style")
                    .find(|s| s.attr(ns::W, "styleId") == Some(partner_id.as_str()))
            })
            .and_then(|partner| partner.element(ns::W, "link"))
            .and_then(|l| l.attr(ns::W, "val"))
            .map(str::to_string);
        if let Some(linked) = partner_link {
            corrections.insert(from_id.to_string(), linked);
            continue;
        }

        let mut style = from.clone();
        strip_foreign_markup(&mut style);
        if taken.contains(from_id) {
            let fresh = fresh_style_id(from_id, &taken);
            tracing::debug!("Style id {} is taken, copying as {}", from_id, fresh);
            corrections.insert(from_id.to_string(), fresh.clone());
            taken.insert(fresh);
        } else {
            taken.insert(from_id.to_string());
        }
        copied.push(style);
    }
    (corrections, copied)
}

fn style_name(style: &Element) -> Option<&str> {
    style.element(ns::W, "name").and_then(|n| n.attr(ns::W, "val"))
}

/// Smallest `{base}{n}` not already used
fn fresh_style_id(base: &str, taken: &HashSet<String>) -> String {
    (1u32..)
        .map(|n| format!("{}{}", base, n))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}

/// Drop everything below the style element that is not plain
/// WordprocessingML
fn strip_foreign_markup(style: &mut Element) {
    style.remove_descendants_where(&mut |e| e.name.namespace != ns::W);
    for child in style.elements_mut() {
        child.visit_mut(&mut |e| e.attributes.retain(|a| a.name.namespace == ns::W));
    }
}

/// Union latent style exceptions by name and recompute the count
fn merge_latent_styles(src_root: &Element, out_root: &mut Element) {
    let Some(from) = src_root.element(ns::W, "latentStyles") else {
        return;
    };
    if out_root.element(ns::W, "latentStyles").is_none() {
        let mut latent = Element::new(ns::W, "latentStyles");
        latent.attributes = from.attributes.clone();
        let index = match out_root.child_index(ns::W, "docDefaults") {
            Some(defaults) => defaults + 1,
            None => out_root.child_index(ns::W, "style").unwrap_or(out_root.children.len()),
        };
        out_root.insert(index, latent);
    }
    let Some(to) = out_root.element_mut(ns::W, "latentStyles") else {
        return;
    };
    let mut names: HashSet<String> = to
        .elements_named(ns::W, "lsdException")
        .filter_map(|e| e.attr(ns::W, "name"))
        .map(str::to_string)
        .collect();
    for exception in from.elements_named(ns::W, "lsdException") {
        let name = exception.attr(ns::W, "name").unwrap_or_default();
        if names.insert(name.to_string()) {
            to.push(exception.clone());
        }
    }
    let count = to.elements_named(ns::W, "lsdException").count();
    to.set_attr(ns::W, "count", count.to_string());
}

/// Add the fonts of the source font table that the output lacks
fn copy_font_table(src: &Package, src_main: &str, out: &mut Package, out_owner: &str) -> BuildResult<()> {
    let Some(src_fonts) = src.related_part_by_type(src_main, rt::FONT_TABLE) else {
        return Ok(());
    };
    let Some(src_root) = src.xml(&src_fonts) else {
        return Ok(());
    };
    let Some(out_fonts) = out.related_part_by_type(out_owner, rt::FONT_TABLE) else {
        return copy_whole_font_table(src, &src_fonts, out, out_owner);
    };
    let Some(out_root) = out.xml(&out_fonts) else {
        return Ok(());
    };
    let known: HashSet<&str> = out_root
        .elements_named(ns::W, "font")
        .filter_map(|f| f.attr(ns::W, "name"))
        .collect();
    let mut added: Vec<Element> = src_root
        .elements_named(ns::W, "font")
        .filter(|f| !f.attr(ns::W, "name").is_some_and(|name| known.contains(name)))
        .cloned()
        .collect();
    if added.is_empty() {
        return Ok(());
    }
    copy_embedded_fonts(src, &src_fonts, out, &out_fonts, &mut added)?;
    if let Some(out_root) = out.xml_mut(&out_fonts) {
        for font in added {
            out_root.push(font);
        }
    }
    Ok(())
}

/// Copy a whole font table, with its embedded fonts, under `out_owner`
pub fn copy_whole_font_table(src: &Package, src_fonts: &str, out: &mut Package, out_owner: &str) -> BuildResult<()> {
    let Some(mut root) = src.xml(src_fonts).cloned() else {
        return Ok(());
    };
    let new_part = out.add_part(out_owner, PartKind::FontTable, PartContent::Xml(Element::new("", "")))?;
    copy_embedded_fonts(src, src_fonts, out, &new_part.name, std::slice::from_mut(&mut root))?;
    out.set_xml(&new_part.name, root)?;
    Ok(())
}

/// Apply style id corrections to parts of a package related to its main part
fn rewrite_source_style_ids(package: &mut Package, main: &str, rel_types: &[&str], corrections: &HashMap<String, String>) {
    let mut parts: Vec<String> = Vec::new();
    for rel_type in rel_types {
        for (_, name) in package.related_parts_by_type(main, rel_type) {
            if !parts.contains(&name) {
                parts.push(name);
            }
        }
    }
    for part in parts {
        if let Some(root) = package.xml_mut(&part) {
            rewrite_all(std::slice::from_mut(root), IdKind::Style, corrections);
        }
    }
}

/// Give every style name a single id across all sources. The first source
/// to use a name fixes its id; later sources are rewritten to match, and
/// a style whose id is already taken by another name gets a new one.
pub fn normalize_style_ids(sources: &[Source]) -> Vec<Source> {
    let mut name_map: HashMap<String, String> = HashMap::new();
    let mut used_ids: HashSet<String> = HashSet::new();
    let mut normalized = Vec::with_capacity(sources.len());

    for source in sources {
        let document = source.document();
        let Some(main) = document.main_document_part() else {
            normalized.push(source.clone());
            continue;
        };
        let mut corrections = HashMap::new();
        for (name, id) in style_names(document, &main) {
            match name_map.get(&name) {
                Some(existing) if *existing == id => {}
                Some(existing) => {
                    corrections.insert(id, existing.clone());
                }
                None if used_ids.contains(&id) => {
                    let base: String = name.chars().filter(|c| !matches!(c, ' ' | '_' | '#' | '.')).collect();
                    let fresh = fresh_style_id(&base, &used_ids);
                    corrections.insert(id, fresh.clone());
                    name_map.insert(name, fresh.clone());
                    used_ids.insert(fresh);
                }
                None => {
                    name_map.insert(name, id.clone());
                    used_ids.insert(id);
                }
            }
        }

        if corrections.is_empty() {
            normalized.push(source.clone());
            continue;
        }
        tracing::debug!("Normalizing {} style ids", corrections.len());
        let mut package = document.clone();
        let mut rel_types = vec![rt::STYLES, rt::STYLES_WITH_EFFECTS];
        rel_types.extend_from_slice(STYLE_REFERENCING_PARTS);
        rewrite_source_style_ids(&mut package, &main, &rel_types, &corrections);
        if let Some(root) = package.xml_mut(&main) {
            rewrite_all(std::slice::from_mut(root), IdKind::Style, &corrections);
        }
        normalized.push(source.clone().with_document(package));
    }
    normalized
}

/// (name, id) of every named style, first occurrence of a name only
fn style_names(document: &Package, main: &str) -> Vec<(String, String)> {
    let Some(root) = document
        .related_part_by_type(main, rt::STYLES)
        .and_then(|name| document.xml(&name))
    else {
        return Vec::new();
    };
    let mut seen = HashSet::new();
    root.elements_named(ns::W, "style")
        .filter_map(|s| Some((style_name(s)?.to_string(), s.attr(ns::W, "styleId")?.to_string())))
        .filter(|(name, _)| seen.insert(name.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::wordprocessing_root;

    const MAIN: &str = "/word/document.xml";

    fn style(id: &str, name: &str) -> Element {
        Element::new(ns::W, "style")
            .with_attr(ns::W, "type", "paragraph")
            .with_attr(ns::W, "styleId", id)
            .with_child(Element::new(ns::W, "name").with_attr(ns::W, "val", name))
    }

    fn styles(list: Vec<Element>) -> Element {
        let mut root = wordprocessing_root("styles");
        for s in list {
            root.push(s);
        }
        root
    }

    fn package_with_styles(list: Vec<Element>) -> Package {
        let mut package = Package::new_document();
        package
            .add_part(MAIN, PartKind::Styles, PartContent::Xml(styles(list)))
            .unwrap();
        package
    }

    fn styled_paragraph(id: &str) -> Element {
        Element::new(ns::W, "p")
            .with_child(Element::new(ns::W, "pPr").with_child(Element::new(ns::W, "pStyle").with_attr(ns::W, "val", id)))
    }

    fn p_style(p: &Element) -> &str {
        p.descendants_named(ns::W, "pStyle").next().unwrap().attr(ns::W, "val").unwrap()
    }

    fn output_styles(out: &Package) -> &Element {
        out.xml(&out.related_part_by_type(MAIN, rt::STYLES).unwrap()).unwrap()
    }

    #[test]
    fn test_same_name_maps_to_output_id() {
        let mut out = package_with_styles(vec![style("Heading1", "heading 1")]);
        let mut src = package_with_styles(vec![style("Titre1", "heading 1"), style("Quote", "Quote")]);
        let mut ctx = BuildContext::default();
        let mut content = vec![styled_paragraph("Titre1"), styled_paragraph("Quote")];
        copy_styles_and_fonts(&mut src, MAIN, &mut out, MAIN, &mut content, &mut ctx).unwrap();

        assert_eq!(p_style(&content[0]), "Heading1");
        assert_eq!(p_style(&content[1]), "Quote");
        let ids: Vec<&str> = output_styles(&out)
            .elements_named(ns::W, "style")
            .filter_map(|s| s.attr(ns::W, "styleId"))
            .collect();
        assert_eq!(ids, vec!["Heading1", "Quote"]);
    }

    #[test]
    fn test_colliding_id_gets_fresh_id() {
        let mut out = package_with_styles(vec![style("Note", "Note")]);
        let based_on = style("Note", "Sidebar").with_child(Element::new(ns::W, "basedOn").with_attr(ns::W, "val", "Note"));
        let mut src = package_with_styles(vec![based_on]);
        let mut ctx = BuildContext::default();
        let mut content = vec![styled_paragraph("Note")];
        copy_styles_and_fonts(&mut src, MAIN, &mut out, MAIN, &mut content, &mut ctx).unwrap();

        assert_eq!(p_style(&content[0]), "Note1");
        let copied = output_styles(&out)
            .elements_named(ns::W, "style")
            .find(|s| style_name(s) == Some("Sidebar"))
            .unwrap();
        assert_eq!(copied.attr(ns::W, "styleId"), Some("Note1"));
    }

    #[test]
    fn test_based_on_follows_dropped_style() {
        let mut out = package_with_styles(vec![style("Normal", "Normal")]);
        let child = style("Body", "Body").with_child(Element::new(ns::W, "basedOn").with_attr(ns::W, "val", "Standard"));
        let mut src = package_with_styles(vec![style("Standard", "Normal"), child]);
        let mut ctx = BuildContext::default();
        copy_styles_and_fonts(&mut src, MAIN, &mut out, MAIN, &mut [], &mut ctx).unwrap();

        let body = output_styles(&out)
            .elements_named(ns::W, "style")
            .find(|s| style_name(s) == Some("Body"))
            .unwrap();
        assert_eq!(body.element(ns::W, "basedOn").unwrap().attr(ns::W, "val"), Some("Normal"));
    }

    #[test]
    fn test_linked_style_follows_partner() {
        let out_heading = style("Heading1", "heading 1").with_child(Element::new(ns::W, "link").with_attr(ns::W, "val", "Heading1Char"));
        let out_char = style("Heading1Char", "Heading 1 Char");
        let mut out = package_with_styles(vec![out_heading, out_char]);

        let src_heading = style("H1", "heading 1").with_child(Element::new(ns::W, "link").with_attr(ns::W, "val", "H1Char"));
        let src_char = style("H1Char", "Kop 1 Char").with_child(Element::new(ns::W, "link").with_attr(ns::W, "val", "H1"));
        let mut src = package_with_styles(vec![src_heading, src_char]);
        let mut ctx = BuildContext::default();
        let mut content = vec![Element::new(ns::W, "r").with_child(
            Element::new(ns::W, "rPr").with_child(Element::new(ns::W, "rStyle").with_attr(ns::W, "val", "H1Char")),
        )];
        copy_styles_and_fonts(&mut src, MAIN, &mut out, MAIN, &mut content, &mut ctx).unwrap();

        let r_style = content[0].descendants_named(ns::W, "rStyle").next().unwrap();
        assert_eq!(r_style.attr(ns::W, "val"), Some("Heading1Char"));
        assert_eq!(output_styles(&out).elements_named(ns::W, "style").count(), 2);
    }

    #[test]
    fn test_foreign_markup_is_stripped() {
        let mut out = package_with_styles(vec![]);
        let mut rich = style("Fancy", "Fancy");
        rich.push(
            Element::new(ns::W, "rPr")
                .with_attr(ns::W14, "paraId", "1")
                .with_child(Element::new(ns::W14, "glow")),
        );
        let mut src = package_with_styles(vec![rich]);
        let mut ctx = BuildContext::default();
        copy_styles_and_fonts(&mut src, MAIN, &mut out, MAIN, &mut [], &mut ctx).unwrap();

        let fancy = output_styles(&out).element(ns::W, "style").unwrap();
        let rpr = fancy.element(ns::W, "rPr").unwrap();
        assert!(rpr.attributes.is_empty());
        assert_eq!(rpr.elements().count(), 0);
    }

    #[test]
    fn test_latent_styles_union() {
        let latent = |names: &[&str]| {
            let mut l = Element::new(ns::W, "latentStyles").with_attr(ns::W, "count", "0");
            for name in names {
                l.push(Element::new(ns::W, "lsdException").with_attr(ns::W, "name", *name));
            }
            l
        };
        let mut out_root = styles(vec![latent(&["Normal", "heading 1"])]);
        let src_root = styles(vec![latent(&["heading 1", "Title"])]);
        merge_latent_styles(&src_root, &mut out_root);

        let merged = out_root.element(ns::W, "latentStyles").unwrap();
        assert_eq!(merged.elements().count(), 3);
        assert_eq!(merged.attr(ns::W, "count"), Some("3"));
    }

    #[test]
    fn test_font_tables_merge_by_name() {
        let font = |name: &str| Element::new(ns::W, "font").with_attr(ns::W, "name", name);
        let mut out = Package::new_document();
        out.add_part(MAIN, PartKind::FontTable, PartContent::Xml(wordprocessing_root("fonts").with_child(font("Calibri"))))
            .unwrap();
        let mut src = Package::new_document();
        src.add_part(
            MAIN,
            PartKind::FontTable,
            PartContent::Xml(wordprocessing_root("fonts").with_child(font("Calibri")).with_child(font("Cambria"))),
        )
        .unwrap();
        let mut ctx = BuildContext::default();
        copy_styles_and_fonts(&mut src, MAIN, &mut out, MAIN, &mut [], &mut ctx).unwrap();

        let fonts = out.xml(&out.related_part_by_type(MAIN, rt::FONT_TABLE).unwrap()).unwrap();
        let names: Vec<&str> = fonts.elements().filter_map(|f| f.attr(ns::W, "name")).collect();
        assert_eq!(names, vec!["Calibri", "Cambria"]);
    }

    #[test]
    fn test_normalize_style_ids_across_sources() {
        let first = package_with_styles(vec![style("Heading1", "heading 1"), style("Quote", "Quote")]);
        let mut second = package_with_styles(vec![style("Kop1", "heading 1"), style("Quote", "Intense Quote")]);
        let body = store::wordprocessing_root("document").with_child(
            Element::new(ns::W, "body")
                .with_child(styled_paragraph("Kop1"))
                .with_child(styled_paragraph("Quote")),
        );
        second.set_xml(MAIN, body).unwrap();

        let sources = vec![Source::new(first), Source::new(second)];
        let normalized = normalize_style_ids(&sources);

        let doc = normalized[1].document();
        let paragraphs: Vec<&str> = doc.xml(MAIN).unwrap().descendants_named(ns::W, "pStyle").filter_map(|p| p.attr(ns::W, "val")).collect();
        assert_eq!(paragraphs, vec!["Heading1", "IntenseQuote1"]);
        let ids: Vec<String> = style_names(doc, MAIN).into_iter().map(|(_, id)| id).collect();
        assert_eq!(ids, vec!["Heading1", "IntenseQuote1"]);
    }
}
