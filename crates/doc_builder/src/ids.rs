//! Bookmark and drawing id renumbering

use crate::context::BuildContext;
use crate::error::{BuildResult, DocumentErrorKind};
use crate::remap::{max_numeric_id, rewrite_all, IdKind};
use std::collections::HashMap;
use store::xml::{fragment_descendants, visit_fragment_mut};
use store::{ns, relationship_types as rt, Element, Package};

/// Give every bookmark in `content` a fresh id from the build counter.
/// Start and end keep sharing an id.
pub fn renumber_bookmarks(content: &mut [Element], ctx: &mut BuildContext) -> BuildResult<()> {
    let mut corrections: HashMap<String, String> = HashMap::new();
    for id in fragment_descendants(content).filter_map(|e| IdKind::Bookmark.id_of(e)) {
        if corrections.contains_key(id) {
            continue;
        }
        if id.trim().parse::<i64>().is_err() {
            return Err(DocumentErrorKind::InvalidBookmarkId(id.to_string()).into());
        }
        ctx.last_bookmark_id += 1;
        corrections.insert(id.to_string(), ctx.last_bookmark_id.to_string());
    }
    rewrite_all(content, IdKind::Bookmark, &corrections);
    Ok(())
}

/// Raise the bookmark counter past every id already in `root`
pub fn seed_bookmark_counter(root: &Element, ctx: &mut BuildContext) {
    if let Some(max) = max_numeric_id(std::slice::from_ref(root), IdKind::Bookmark) {
        ctx.last_bookmark_id = ctx.last_bookmark_id.max(max);
    }
}

/// Number every `wp:docPr` 1..n across the main part, headers, footers,
/// footnotes and endnotes, in that order
pub fn renumber_drawing_ids(out: &mut Package, main: &str) {
    let mut parts = vec![main.to_string()];
    for rel_type in [rt::HEADER, rt::FOOTER, rt::FOOTNOTES, rt::ENDNOTES] {
        parts.extend(out.related_parts_by_type(main, rel_type).into_iter().map(|(_, name)| name));
    }
    let mut next = 0u64;
    for part in parts {
        if let Some(root) = out.xml_mut(&part) {
            root.visit_mut(&mut |e| {
                if e.is(ns::WP, "docPr") {
                    next += 1;
                    e.set_attr("", "id", next.to_string());
                }
            });
        }
    }
    tracing::debug!("Numbered {} drawing objects", next);
}

/// Drop `o:gfxdata` attributes
pub fn remove_legacy_graphics_data(content: &mut [Element]) {
    visit_fragment_mut(content, &mut |e| {
        e.remove_attr(ns::O, "gfxdata");
    });
}
