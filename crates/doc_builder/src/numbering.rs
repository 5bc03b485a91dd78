//! Numbering definitions merge
//!
//! Abstract numbering definitions are matched across sources by NSID, so a
//! list that exists in several sources collapses to one definition. Within
//! one source, num instances without level overrides share an output num;
//! nums already in the output from earlier sources are never reused, so
//! every source keeps its own list instances.

use crate::context::BuildContext;
use crate::error::{BuildResult, DocumentErrorKind};
use crate::remap::{rewrite_all, IdKind};
use crate::resources::copy_resources;
use std::collections::{HashMap, HashSet};
use store::xml::fragment_descendants;
use store::{
    content_type_values as ct, ns, relationship_types as rt, wordprocessing_root, Element, Package, PartContent,
    PartKind,
};

/// Bookkeeping that separates numbering added by the current source from
/// numbering that was already in the output
#[derive(Debug, Default)]
pub struct NumberingState {
    /// (output numbering part, numId) of nums present before the current source
    finalized: HashSet<(String, String)>,
    /// (source numbering part, output numbering part, source numId) to
    /// output numId, for the current source
    num_map: HashMap<(String, String, String), String>,
}

impl NumberingState {
    /// Freeze every num in the output before a new source is appended
    pub fn begin_source(&mut self, out: &Package) {
        self.num_map.clear();
        for part in out.part_names_with_content_type(ct::NUMBERING) {
            if let Some(root) = out.xml(&part) {
                for num in root.elements_named(ns::W, "num") {
                    if let Some(id) = num.attr(ns::W, "numId") {
                        self.finalized.insert((part.clone(), id.to_string()));
                    }
                }
            }
        }
    }

    fn is_finalized(&self, part: &str, num_id: &str) -> bool {
        self.finalized.contains(&(part.to_string(), num_id.to_string()))
    }
}

/// Copy the numbering referenced by `content` into the numbering part of
/// `out_owner` (the main document or glossary part), rewriting `numId`s
pub fn copy_numbering(
    src: &Package,
    src_numbering: Option<&str>,
    out: &mut Package,
    out_owner: &str,
    content: &mut [Element],
    ctx: &mut BuildContext,
) -> BuildResult<()> {
    let referenced = referenced_num_ids(content)?;
    if referenced.is_empty() {
        return Ok(());
    }
    let src_numbering = src_numbering.ok_or(DocumentErrorKind::NumberingWithoutPart)?;
    let src_root = src.xml(src_numbering).ok_or(DocumentErrorKind::NumberingWithoutPart)?;

    let out_numbering = match out.related_part_by_type(out_owner, rt::NUMBERING) {
        Some(name) => name,
        None => {
            out.add_part(out_owner, PartKind::Numbering, PartContent::Xml(wordprocessing_root("numbering")))?
                .name
        }
    };
    let mut out_root = out
        .take_xml(&out_numbering)
        .unwrap_or_else(|| wordprocessing_root("numbering"));

    let mut next_num = max_id(&out_root, "num", "numId").map_or(1, |max| max + 1);
    let mut next_abstract = max_id(&out_root, "abstractNum", "abstractNumId").map_or(0, |max| max + 1);
    let mut corrections = HashMap::new();

    for num_id in referenced {
        let key = (src_numbering.to_string(), out_numbering.clone(), num_id.clone());
        if let Some(mapped) = ctx.numbering.num_map.get(&key) {
            corrections.insert(num_id, mapped.clone());
            continue;
        }

        let src_num = find_by_id(src_root, "num", "numId", &num_id)
            .ok_or_else(|| DocumentErrorKind::InvalidNumberingId(num_id.clone()))?;
        let abstract_id = src_num
            .element(ns::W, "abstractNumId")
            .and_then(|a| a.attr(ns::W, "val"))
            .ok_or_else(|| DocumentErrorKind::InvalidAbstractNumId(String::new()))?;
        if abstract_id.parse::<i64>().is_err() {
            return Err(DocumentErrorKind::InvalidAbstractNumId(abstract_id.to_string()).into());
        }
        let src_abstract = find_by_id(src_root, "abstractNum", "abstractNumId", abstract_id)
            .ok_or_else(|| DocumentErrorKind::InvalidAbstractNumId(abstract_id.to_string()))?;

        let out_abstract_id = match matching_abstract(&out_root, src_abstract) {
            Some(id) => id,
            None => {
                let id = next_abstract.to_string();
                next_abstract += 1;
                add_abstract(src_root, &mut out_root, src_abstract, &id);
                tracing::debug!("Abstract numbering {} copied as {}", abstract_id, id);
                id
            }
        };

        let reusable = if src_num.element(ns::W, "lvlOverride").is_none() {
            out_root
                .elements_named(ns::W, "num")
                .filter(|num| num.element(ns::W, "lvlOverride").is_none())
                .filter(|num| {
                    num.element(ns::W, "abstractNumId").and_then(|a| a.attr(ns::W, "val")) == Some(out_abstract_id.as_str())
                })
                .filter_map(|num| num.attr(ns::W, "numId"))
                .find(|id| !ctx.numbering.is_finalized(&out_numbering, id))
                .map(str::to_string)
        } else {
            None
        };

        let out_num_id = match reusable {
            Some(id) => id,
            None => {
                let id = next_num.to_string();
                next_num += 1;
                let mut num = src_num.clone();
                num.set_attr(ns::W, "numId", id.as_str());
                if let Some(abstract_ref) = num.element_mut(ns::W, "abstractNumId") {
                    abstract_ref.set_attr(ns::W, "val", out_abstract_id.as_str());
                }
                insert_num(&mut out_root, num);
                id
            }
        };
        tracing::debug!("Numbering {} mapped to {}", num_id, out_num_id);
        ctx.numbering.num_map.insert(key, out_num_id.clone());
        corrections.insert(num_id, out_num_id);
    }

    rewrite_all(content, IdKind::Num, &corrections);

    let result = copy_resources(src, src_numbering, out, &out_numbering, std::slice::from_mut(&mut out_root), ctx);
    out.set_xml(&out_numbering, out_root)?;
    result
}

/// Distinct non-zero `numId`s of the numbering properties in `content`
fn referenced_num_ids(content: &[Element]) -> BuildResult<Vec<String>> {
    let mut ids = Vec::new();
    for num_pr in fragment_descendants(content).filter(|e| e.is(ns::W, "numPr")) {
        let Some(val) = num_pr.descendants_named(ns::W, "numId").next().and_then(|n| n.attr(ns::W, "val")) else {
            continue;
        };
        let number: i64 = val
            .parse()
            .map_err(|_| DocumentErrorKind::InvalidNumberingId(val.to_string()))?;
        if number != 0 && !ids.iter().any(|id| id == val) {
            ids.push(val.to_string());
        }
    }
    Ok(ids)
}

fn same_number(a: &str, b: &str) -> bool {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

fn find_by_id<'a>(root: &'a Element, local: &'a str, attr: &str, id: &str) -> Option<&'a Element> {
    root.elements_named(ns::W, local)
        .find(|e| e.attr(ns::W, attr).is_some_and(|value| same_number(value, id)))
}

fn max_id(root: &Element, local: &str, attr: &str) -> Option<i64> {
    root.elements_named(ns::W, local)
        .filter_map(|e| e.attr(ns::W, attr))
        .filter_map(|id| id.parse::<i64>().ok())
        .max()
}

fn nsid(abstract_num: &Element) -> Option<&str> {
    abstract_num.element(ns::W, "nsid").and_then(|n| n.attr(ns::W, "val"))
}

/// Output abstract numbering with the same NSID. Definitions without an
/// NSID never match.
fn matching_abstract(out_root: &Element, src_abstract: &Element) -> Option<String> {
    let wanted = nsid(src_abstract)?;
    out_root
        .elements_named(ns::W, "abstractNum")
        .find(|a| nsid(a) == Some(wanted))
        .and_then(|a| a.attr(ns::W, "abstractNumId"))
        .map(str::to_string)
}

fn add_abstract(src_root: &Element, out_root: &mut Element, src_abstract: &Element, id: &str) {
    let mut abstract_num = src_abstract.clone();
    abstract_num.set_attr(ns::W, "abstractNumId", id);

    let mut bullets = Vec::new();
    abstract_num.visit_mut(&mut |e| {
        if !e.is(ns::W, "lvlPicBulletId") {
            return;
        }
        let Some(bullet_id) = e.attr(ns::W, "val").map(str::to_string) else {
            return;
        };
        let Some(bullet) = src_root
            .elements_named(ns::W, "numPicBullet")
            .find(|b| b.attr(ns::W, "numPicBulletId") == Some(bullet_id.as_str()))
        else {
            return;
        };
        let next = max_id(out_root, "numPicBullet", "numPicBulletId")
            .into_iter()
            .chain(bullets.iter().map(|(id, _): &(i64, Element)| *id))
            .max()
            .map_or(0, |max| max + 1);
        let mut bullet = bullet.clone();
        bullet.set_attr(ns::W, "numPicBulletId", next.to_string());
        e.set_attr(ns::W, "val", next.to_string());
        bullets.push((next, bullet));
    });
    for (_, bullet) in bullets {
        out_root.insert(0, bullet);
    }

    let position = out_root
        .children
        .iter()
        .rposition(|n| matches!(n, store::Node::Element(e) if e.is(ns::W, "abstractNum")))
        .map(|i| i + 1)
        .or_else(|| {
            out_root
                .children
                .iter()
                .position(|n| matches!(n, store::Node::Element(e) if e.is(ns::W, "num")))
        });
    match position {
        Some(index) => out_root.children.insert(index, store::Node::Element(abstract_num)),
        None => out_root.push(abstract_num),
    }
}

/// Nums go after the last num, ahead of `numIdMacAtCleanup`
fn insert_num(out_root: &mut Element, num: Element) {
    match out_root.child_index(ns::W, "numIdMacAtCleanup") {
        Some(index) => out_root.insert(index, num),
        None => out_root.push(num),
    }
}
