//! Comments, footnotes and endnotes
//!
//! Each distinct id referenced by copied content is given the next free
//! number in the output part, the definition is copied once and all
//! references are rewritten.

use crate::context::BuildContext;
use crate::error::{BuildResult, DocumentErrorKind};
use crate::ids::renumber_bookmarks;
use crate::numbering::copy_numbering;
use crate::remap::{rewrite_all, IdKind};
use crate::resources::copy_resources;
use std::collections::HashMap;
use store::xml::fragment_descendants;
use store::{ns, relationship_types as rt, wordprocessing_root, Element, Package, PartContent, PartKind};

/// Footnotes or endnotes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteKind {
    Footnote,
    Endnote,
}

impl NoteKind {
    fn reference(self) -> &'static str {
        match self {
            NoteKind::Footnote => "footnoteReference",
            NoteKind::Endnote => "endnoteReference",
        }
    }

    /// Note element, also used as the child of `w:footnotePr`/`w:endnotePr`
    fn note(self) -> &'static str {
        match self {
            NoteKind::Footnote => "footnote",
            NoteKind::Endnote => "endnote",
        }
    }

    fn root(self) -> &'static str {
        match self {
            NoteKind::Footnote => "footnotes",
            NoteKind::Endnote => "endnotes",
        }
    }

    fn properties(self) -> &'static str {
        match self {
            NoteKind::Footnote => "footnotePr",
            NoteKind::Endnote => "endnotePr",
        }
    }

    fn rel_type(self) -> &'static str {
        match self {
            NoteKind::Footnote => rt::FOOTNOTES,
            NoteKind::Endnote => rt::ENDNOTES,
        }
    }

    fn part_kind(self) -> PartKind {
        match self {
            NoteKind::Footnote => PartKind::Footnotes,
            NoteKind::Endnote => PartKind::Endnotes,
        }
    }

    fn id_kind(self) -> IdKind {
        match self {
            NoteKind::Footnote => IdKind::Footnote,
            NoteKind::Endnote => IdKind::Endnote,
        }
    }
}

/// Distinct ids of a kind in document order
fn distinct_ids(content: &[Element], kind: IdKind) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for id in fragment_descendants(content).filter_map(|e| kind.id_of(e)) {
        if !ids.iter().any(|seen| seen == id) {
            ids.push(id.to_string());
        }
    }
    ids
}

fn max_child_id(root: &Element, local: &str) -> Option<i64> {
    root.elements_named(ns::W, local)
        .filter_map(|e| e.attr(ns::W, "id"))
        .filter_map(|id| id.trim().parse::<i64>().ok())
        .max()
}

/// The output part of `rel_type` under `owner`, created empty if missing
fn output_part(out: &mut Package, owner: &str, rel_type: &str, kind: PartKind, root: &str) -> BuildResult<String> {
    if let Some(name) = out.related_part_by_type(owner, rel_type) {
        return Ok(name);
    }
    let created = out.add_part(owner, kind, PartContent::Xml(wordprocessing_root(root)))?;
    tracing::debug!("Created {}", created.name);
    Ok(created.name)
}

/// Copy the comments referenced by `content` and renumber every comment
/// range and reference
pub fn copy_comments(
    src: &Package,
    src_main: &str,
    out: &mut Package,
    out_main: &str,
    content: &mut [Element],
    ctx: &mut BuildContext,
) -> BuildResult<()> {
    let ids = distinct_ids(content, IdKind::Comment);
    if ids.is_empty() {
        return Ok(());
    }
    if let Some(bad) = ids.iter().find(|id| id.trim().parse::<i64>().is_err()) {
        return Err(DocumentErrorKind::InvalidCommentId(bad.clone()).into());
    }
    let referenced: Vec<&str> = fragment_descendants(content)
        .filter(|e| e.is(ns::W, "commentReference"))
        .filter_map(|e| e.attr(ns::W, "id"))
        .collect();

    let src_comments = src.related_part_by_type(src_main, rt::COMMENTS);
    let src_root = src_comments.as_deref().and_then(|name| src.xml(name));
    if let Some(root) = src_root {
        if let Some(bad) = root
            .elements_named(ns::W, "comment")
            .filter_map(|c| c.attr(ns::W, "id"))
            .find(|id| id.trim().parse::<i64>().is_err())
        {
            return Err(DocumentErrorKind::InvalidCommentId(bad.to_string()).into());
        }
    }
    let find_comment = |id: &str| {
        src_root.and_then(|root| {
            root.elements_named(ns::W, "comment")
                .find(|c| c.attr(ns::W, "id").map(str::trim) == Some(id.trim()))
        })
    };
    if let Some(missing) = referenced.iter().find(|id| find_comment(id).is_none()) {
        return Err(DocumentErrorKind::MissingComment(missing.to_string()).into());
    }

    let out_max = out
        .related_part_by_type(out_main, rt::COMMENTS)
        .and_then(|name| out.xml(&name))
        .and_then(|root| max_child_id(root, "comment"));
    let content_max = out
        .xml(out_main)
        .and_then(|root| crate::remap::max_numeric_id(std::slice::from_ref(root), IdKind::Comment));
    let mut next = out_max.max(content_max).map_or(0, |max| max + 1);

    let mut corrections = HashMap::new();
    let mut copied = Vec::new();
    for id in &ids {
        let number = next.to_string();
        next += 1;
        if let Some(comment) = find_comment(id) {
            let mut comment = comment.clone();
            comment.set_attr(ns::W, "id", number.clone());
            copied.push(comment);
        }
        corrections.insert(id.clone(), number);
    }
    rewrite_all(content, IdKind::Comment, &corrections);
    if copied.is_empty() {
        return Ok(());
    }

    let Some(src_comments) = src_comments else {
        return Ok(());
    };
    let out_comments = output_part(out, out_main, rt::COMMENTS, PartKind::Comments, "comments")?;
    let src_numbering = src.related_part_by_type(src_main, rt::NUMBERING);
    copy_resources(src, &src_comments, out, &out_comments, &mut copied, ctx)?;
    copy_numbering(src, src_numbering.as_deref(), out, out_main, &mut copied, ctx)?;
    renumber_bookmarks(&mut copied, ctx)?;
    tracing::debug!("Copied {} comments", copied.len());
    if let Some(root) = out.xml_mut(&out_comments) {
        for comment in copied {
            root.push(comment);
        }
    }
    Ok(())
}

/// Copy the footnotes or endnotes referenced by `content`. References to
/// notes the source does not define are left alone.
pub fn copy_notes(
    kind: NoteKind,
    src: &Package,
    src_main: &str,
    out: &mut Package,
    out_main: &str,
    content: &mut [Element],
    ctx: &mut BuildContext,
) -> BuildResult<()> {
    let ids = distinct_ids(content, kind.id_kind());
    if ids.is_empty() {
        return Ok(());
    }
    if let Some(bad) = ids.iter().find(|id| id.trim().parse::<i64>().is_err()) {
        return Err(DocumentErrorKind::InvalidNoteId(bad.clone()).into());
    }
    let Some(src_notes) = src.related_part_by_type(src_main, kind.rel_type()) else {
        tracing::warn!("{} references without a {} part", kind.reference(), kind.root());
        return Ok(());
    };
    let Some(src_root) = src.xml(&src_notes) else {
        return Ok(());
    };

    let out_notes = output_part(out, out_main, kind.rel_type(), kind.part_kind(), kind.root())?;
    let mut next = out
        .xml(&out_notes)
        .and_then(|root| max_child_id(root, kind.note()))
        .map_or(0, |max| max + 1);

    let mut corrections = HashMap::new();
    let mut copied = Vec::new();
    for id in &ids {
        let Some(note) = src_root
            .elements_named(ns::W, kind.note())
            .find(|n| n.attr(ns::W, "id").map(str::trim) == Some(id.trim()))
        else {
            tracing::warn!("Skipping {} {}: not defined in {}", kind.note(), id, src_notes);
            continue;
        };
        let number = next.to_string();
        next += 1;
        let mut note = note.clone();
        note.set_attr(ns::W, "id", number.clone());
        copied.push(note);
        corrections.insert(id.clone(), number);
    }
    rewrite_all(content, kind.id_kind(), &corrections);
    if copied.is_empty() {
        return Ok(());
    }

    let src_numbering = src.related_part_by_type(src_main, rt::NUMBERING);
    copy_resources(src, &src_notes, out, &out_notes, &mut copied, ctx)?;
    copy_numbering(src, src_numbering.as_deref(), out, out_main, &mut copied, ctx)?;
    renumber_bookmarks(&mut copied, ctx)?;
    tracing::debug!("Copied {} {}s", copied.len(), kind.note());
    if let Some(root) = out.xml_mut(&out_notes) {
        for note in copied {
            root.push(note);
        }
    }
    Ok(())
}

/// Copy the separator notes named by `w:footnotePr` / `w:endnotePr` in a
/// settings root, renumbering them in the settings as well
pub fn copy_separator_notes(
    kind: NoteKind,
    src: &Package,
    src_main: &str,
    out: &mut Package,
    out_main: &str,
    settings: &mut Element,
    ctx: &mut BuildContext,
) -> BuildResult<()> {
    let Some(properties) = settings.element_mut(ns::W, kind.properties()) else {
        return Ok(());
    };
    let Some(src_notes) = src.related_part_by_type(src_main, kind.rel_type()) else {
        return Ok(());
    };
    let Some(src_root) = src.xml(&src_notes) else {
        return Ok(());
    };
    if properties.elements_named(ns::W, kind.note()).next().is_none() {
        return Ok(());
    }

    let out_notes = output_part(out, out_main, kind.rel_type(), kind.part_kind(), kind.root())?;
    let mut next = out
        .xml(&out_notes)
        .and_then(|root| max_child_id(root, kind.note()))
        .map_or(0, |max| max + 1);

    let mut copied = Vec::new();
    for reference in properties.elements_mut().filter(|e| e.is(ns::W, kind.note())) {
        let id = reference.attr(ns::W, "id").unwrap_or_default().to_string();
        let Some(note) = src_root
            .elements_named(ns::W, kind.note())
            .find(|n| n.attr(ns::W, "id") == Some(id.as_str()))
        else {
            continue;
        };
        let number = next.to_string();
        next += 1;
        let mut note = note.clone();
        note.set_attr(ns::W, "id", number.clone());
        reference.set_attr(ns::W, "id", number);
        copied.push(note);
    }

    copy_resources(src, &src_notes, out, &out_notes, &mut copied, ctx)?;
    renumber_bookmarks(&mut copied, ctx)?;
    if let Some(root) = out.xml_mut(&out_notes) {
        for note in copied {
            root.push(note);
        }
    }
    Ok(())
}
