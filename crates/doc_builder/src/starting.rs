//! Parts that come from the first source only
//!
//! Document properties, settings, web settings, theme, styles and fonts
//! are package singletons. The output takes them from the first source;
//! later sources only contribute styles and fonts through the merge.

use crate::context::BuildContext;
use crate::error::{BuildError, BuildResult};
use crate::notes::{copy_separator_notes, NoteKind};
use crate::resources::{add_relationships, copy_related_parts, copy_resources};
use crate::styles::copy_styles_and_fonts;
use store::{ns, relationship_types as rt, wordprocessing_root, Element, Package, PartContent, PartKind, PACKAGE_ROOT};

/// Copy the singleton parts of the first source into an empty output
pub fn copy_starting_parts(
    src: &mut Package,
    src_main: &str,
    out: &mut Package,
    out_main: &str,
    ctx: &mut BuildContext,
) -> BuildResult<()> {
    copy_document_properties(src, out)?;
    inherit_root_declarations(src, src_main, out, out_main)?;
    copy_settings(src, src_main, out, out_main, ctx)?;
    copy_web_settings(src, src_main, out, out_main)?;
    copy_theme(src, src_main, out, out_main, ctx)?;
    start_styles(src, src_main, out, out_main)?;
    copy_styles_and_fonts(src, src_main, out, out_main, &mut [], ctx)
}

/// Core, extended and custom properties; none of them has relationships
fn copy_document_properties(src: &Package, out: &mut Package) -> BuildResult<()> {
    let kinds = [
        (rt::CORE_PROPERTIES, PartKind::CoreProperties),
        (rt::EXTENDED_PROPERTIES, PartKind::ExtendedProperties),
        (rt::CUSTOM_PROPERTIES, PartKind::CustomProperties),
    ];
    for (rel_type, kind) in kinds {
        let Some(part) = src.related_part_by_type(PACKAGE_ROOT, rel_type).and_then(|name| src.part(&name)) else {
            continue;
        };
        if out.related_part_by_type(PACKAGE_ROOT, rel_type).is_some() {
            continue;
        }
        out.add_part(PACKAGE_ROOT, kind, part.content.clone())?;
    }
    Ok(())
}

/// The output main root declares what the first source's root declares,
/// and ignores what it ignores
fn inherit_root_declarations(src: &Package, src_main: &str, out: &mut Package, out_main: &str) -> BuildResult<()> {
    let Some(src_root) = src.xml(src_main) else {
        return Ok(());
    };
    let declarations: Vec<(String, String)> = src_root
        .namespace_declarations()
        .filter(|(prefix, _)| !prefix.is_empty())
        .map(|(prefix, uri)| (prefix.to_string(), uri.to_string()))
        .collect();
    let ignorable = src_root.attr(ns::MC, "Ignorable").map(str::to_string);

    let out_root = out
        .xml_mut(out_main)
        .ok_or_else(|| BuildError::internal("output has no main part"))?;
    for (prefix, uri) in declarations {
        if !out_root.namespace_declarations().any(|(_, declared)| declared == uri) {
            out_root.set_attr(ns::XMLNS, &prefix, uri);
        }
    }
    if let Some(ignorable) = ignorable {
        out_root.set_attr(ns::MC, "Ignorable", ignorable);
    }
    Ok(())
}

/// Settings, with the separator notes they name and the parts they link
fn copy_settings(
    src: &Package,
    src_main: &str,
    out: &mut Package,
    out_main: &str,
    ctx: &mut BuildContext,
) -> BuildResult<()> {
    let Some(src_settings) = src.related_part_by_type(src_main, rt::SETTINGS) else {
        return Ok(());
    };
    let Some(mut root) = src.xml(&src_settings).cloned() else {
        return Ok(());
    };
    let created = out.add_part(out_main, PartKind::Settings, PartContent::Xml(Element::new("", "")))?;
    let content = std::slice::from_mut(&mut root);
    add_relationships(src, &src_settings, out, &created.name, content)?;
    copy_separator_notes(NoteKind::Footnote, src, src_main, out, out_main, &mut content[0], ctx)?;
    copy_separator_notes(NoteKind::Endnote, src, src_main, out, out_main, &mut content[0], ctx)?;
    copy_related_parts(src, &src_settings, out, &created.name, content, ctx)?;
    out.set_xml(&created.name, root)?;
    Ok(())
}

fn copy_web_settings(src: &Package, src_main: &str, out: &mut Package, out_main: &str) -> BuildResult<()> {
    let Some(src_web) = src.related_part_by_type(src_main, rt::WEB_SETTINGS) else {
        return Ok(());
    };
    let Some(mut root) = src.xml(&src_web).cloned() else {
        return Ok(());
    };
    let created = out.add_part(out_main, PartKind::WebSettings, PartContent::Xml(Element::new("", "")))?;
    add_relationships(src, &src_web, out, &created.name, std::slice::from_mut(&mut root))?;
    out.set_xml(&created.name, root)?;
    Ok(())
}

fn copy_theme(src: &Package, src_main: &str, out: &mut Package, out_main: &str, ctx: &mut BuildContext) -> BuildResult<()> {
    let Some(src_theme) = src.related_part_by_type(src_main, rt::THEME) else {
        return Ok(());
    };
    let Some(mut root) = src.xml(&src_theme).cloned() else {
        return Ok(());
    };
    let created = out.add_part(out_main, PartKind::Theme, PartContent::Xml(Element::new("", "")))?;
    copy_resources(src, &src_theme, out, &created.name, std::slice::from_mut(&mut root), ctx)?;
    out.set_xml(&created.name, root)?;
    Ok(())
}

/// An output styles part holding only the first source's document
/// defaults; the styles themselves arrive through the merge
fn start_styles(src: &Package, src_main: &str, out: &mut Package, out_main: &str) -> BuildResult<()> {
    let Some(src_styles) = src.related_part_by_type(src_main, rt::STYLES) else {
        return Ok(());
    };
    let mut root = wordprocessing_root("styles");
    if let Some(defaults) = src.xml(&src_styles).and_then(|r| r.element(ns::W, "docDefaults")) {
        root.push(defaults.clone());
    }
    out.add_part(out_main, PartKind::Styles, PartContent::Xml(root))?;
    Ok(())
}

/// Copy the web extension task panes of `src` with their extensions,
/// keeping relationship ids, unless the output already has them
pub fn copy_web_extensions(src: &Package, out: &mut Package) -> BuildResult<()> {
    if out.related_part_by_type(PACKAGE_ROOT, rt::WEB_EXTENSION_TASKPANES).is_some() {
        return Ok(());
    }
    let Some(src_panes) = src.related_part_by_type(PACKAGE_ROOT, rt::WEB_EXTENSION_TASKPANES) else {
        return Ok(());
    };
    let Some(panes) = src.part(&src_panes) else {
        return Ok(());
    };
    let created = out.add_part(PACKAGE_ROOT, PartKind::WebExTaskpanes, panes.content.clone())?;
    for (rel_id, name) in src.related_parts_by_type(&src_panes, rt::WEB_EXTENSION) {
        if let Some(extension) = src.part(&name) {
            out.add_part_with_id(&created.name, PartKind::WebExtension, extension.content.clone(), &rel_id)?;
        }
    }
    tracing::debug!("Copied web extension task panes from {}", src_panes);
    Ok(())
}
