//! Repair of paired range markup cut by a fragment boundary
//!
//! Bookmarks, comment ranges, permission ranges and move ranges are
//! start/end pairs sharing an id. When a fragment keeps only one half of a
//! pair, the missing half is copied in from the full source tree; move
//! ranges whose counterpart is absent are dropped instead.

use std::collections::HashSet;
use store::ns;
use store::xml::{fragment_descendants, remove_fragment_where, Element};

struct RangeKind {
    start: &'static str,
    end: &'static str,
    /// Reference element synthesized with a copied end marker
    reference: Option<&'static str>,
}

const RANGE_KINDS: &[RangeKind] = &[
    RangeKind {
        start: "commentRangeStart",
        end: "commentRangeEnd",
        reference: Some("commentReference"),
    },
    RangeKind {
        start: "bookmarkStart",
        end: "bookmarkEnd",
        reference: None,
    },
    RangeKind {
        start: "permStart",
        end: "permEnd",
        reference: None,
    },
    RangeKind {
        start: "moveFromRangeStart",
        end: "moveFromRangeEnd",
        reference: None,
    },
    RangeKind {
        start: "moveToRangeStart",
        end: "moveToRangeEnd",
        reference: None,
    },
];

/// Complete or remove every range pair of `content`, which was sliced from
/// the body of `source_root`
pub fn fix_ranges(source_root: &Element, content: &mut Vec<Element>) {
    for kind in RANGE_KINDS {
        complete_range(source_root, content, kind);
    }
    delete_unmatched_moves(content, "moveFromRangeStart", "moveFromRangeEnd", "moveToRangeStart");
    delete_unmatched_moves(content, "moveToRangeStart", "moveToRangeEnd", "moveFromRangeStart");
}

fn complete_range(source_root: &Element, content: &mut Vec<Element>, kind: &RangeKind) {
    let starts = ids_of(content, kind.start);
    let ends = ids_of(content, kind.end);

    for id in starts.iter().filter(|id| !ends.contains(id)) {
        let Some(end) = find_marker(source_root, kind.end, id) else {
            continue;
        };
        let mut markers = vec![end];
        if let Some(reference) = kind.reference {
            markers.push(
                Element::new(ns::W, "r").with_child(Element::new(ns::W, reference).with_attr(ns::W, "id", id.as_str())),
            );
        }
        add_at_end(content, markers);
    }

    for id in ends.iter().filter(|id| !starts.contains(id)) {
        if let Some(start) = find_marker(source_root, kind.start, id) {
            add_at_beginning(content, start);
        }
    }
}

fn delete_unmatched_moves(content: &mut Vec<Element>, start: &str, end: &str, counterpart: &str) {
    let counterpart_names: HashSet<&str> = fragment_descendants(content)
        .filter(|e| e.is(ns::W, counterpart))
        .filter_map(|e| e.attr(ns::W, "name"))
        .collect();
    let orphaned: HashSet<String> = fragment_descendants(content)
        .filter(|e| e.is(ns::W, start))
        .filter(|e| !e.attr(ns::W, "name").is_some_and(|name| counterpart_names.contains(name)))
        .filter_map(|e| e.attr(ns::W, "id"))
        .map(str::to_string)
        .collect();
    if orphaned.is_empty() {
        return;
    }
    tracing::debug!("Dropping {} unmatched {} ranges", orphaned.len(), start);
    remove_fragment_where(content, &mut |e| {
        (e.is(ns::W, start) || e.is(ns::W, end)) && e.attr(ns::W, "id").is_some_and(|id| orphaned.contains(id))
    });
}

/// Distinct ids of a marker in document order
fn ids_of(content: &[Element], local: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    fragment_descendants(content)
        .filter(|e| e.is(ns::W, local))
        .filter_map(|e| e.attr(ns::W, "id"))
        .filter(|id| seen.insert(id.to_string()))
        .map(str::to_string)
        .collect()
}

fn find_marker(root: &Element, local: &str, id: &str) -> Option<Element> {
    root.descendants()
        .find(|e| e.is(ns::W, local) && e.attr(ns::W, "id") == Some(id))
        .cloned()
}

/// Append markers to the final paragraph of the fragment. When the
/// fragment ends in a table or other block, a new paragraph follows it so
/// the markers stay after everything they close.
fn add_at_end(content: &mut Vec<Element>, markers: Vec<Element>) {
    let last = content.iter().rposition(|e| !e.is(ns::W, "sectPr"));
    let index = match last {
        Some(index) if content[index].is(ns::W, "p") => index,
        _ => {
            let index = last.map_or(0, |i| i + 1);
            content.insert(index, Element::new(ns::W, "p"));
            index
        }
    };
    for marker in markers {
        content[index].push(marker);
    }
}

/// Insert a marker into the first paragraph, right after its properties.
/// A fragment that opens with a table gets a new leading paragraph.
fn add_at_beginning(content: &mut Vec<Element>, marker: Element) {
    if !content.first().is_some_and(|e| e.is(ns::W, "p")) {
        content.insert(0, Element::new(ns::W, "p"));
    }
    let paragraph = &mut content[0];
    let index = paragraph.child_index(ns::W, "pPr").map_or(0, |ppr| ppr + 1);
    paragraph.insert(index, marker);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker(local: &str, id: &str) -> Element {
        Element::new(ns::W, local).with_attr(ns::W, "id", id)
    }

    fn paragraph(children: Vec<Element>) -> Element {
        let mut p = Element::new(ns::W, "p").with_child(Element::new(ns::W, "pPr"));
        for child in children {
            p.push(child);
        }
        p
    }

    fn body(children: Vec<Element>) -> Element {
        let mut body = Element::new(ns::W, "body");
        for child in children {
            body.push(child);
        }
        Element::new(ns::W, "document").with_child(body)
    }

    fn count(content: &[Element], local: &str, id: &str) -> usize {
        fragment_descendants(content)
            .filter(|e| e.is(ns::W, local) && e.attr(ns::W, "id") == Some(id))
            .count()
    }

    #[test]
    fn test_copies_missing_bookmark_end() {
        let source = body(vec![
            paragraph(vec![marker("bookmarkStart", "5")]),
            paragraph(vec![]),
            paragraph(vec![marker("bookmarkEnd", "5")]),
        ]);
        let mut content = vec![paragraph(vec![marker("bookmarkStart", "5")]), paragraph(vec![])];
        fix_ranges(&source, &mut content);

        assert_eq!(count(&content, "bookmarkEnd", "5"), 1);
        let last = &content[1];
        assert!(last.elements().last().unwrap().is(ns::W, "bookmarkEnd"));
    }

    #[test]
    fn test_copies_missing_start_to_first_paragraph() {
        let source = body(vec![
            paragraph(vec![marker("bookmarkStart", "2")]),
            paragraph(vec![marker("bookmarkEnd", "2")]),
        ]);
        let mut content = vec![paragraph(vec![marker("bookmarkEnd", "2")])];
        fix_ranges(&source, &mut content);

        let first = &content[0];
        assert!(first.elements().next().unwrap().is(ns::W, "pPr"));
        assert!(first.elements().nth(1).unwrap().is(ns::W, "bookmarkStart"));
    }

    #[test]
    fn test_comment_end_gets_reference() {
        let source = body(vec![
            paragraph(vec![marker("commentRangeStart", "0")]),
            paragraph(vec![marker("commentRangeEnd", "0")]),
        ]);
        let mut content = vec![paragraph(vec![marker("commentRangeStart", "0")])];
        fix_ranges(&source, &mut content);

        assert_eq!(count(&content, "commentRangeEnd", "0"), 1);
        let reference = content[0]
            .elements()
            .find(|e| e.is(ns::W, "r"))
            .and_then(|r| r.element(ns::W, "commentReference"))
            .unwrap();
        assert_eq!(reference.attr(ns::W, "id"), Some("0"));
    }

    #[test]
    fn test_fragment_without_paragraph_gets_one() {
        let source = body(vec![paragraph(vec![marker("permStart", "1")]), paragraph(vec![marker("permEnd", "1")])]);
        let table = Element::new(ns::W, "tbl").with_child(marker("permStart", "1"));
        let mut content = vec![table];
        fix_ranges(&source, &mut content);
        assert_eq!(content.len(), 2);
        assert!(content[1].is(ns::W, "p"));
        assert_eq!(count(&content, "permEnd", "1"), 1);
    }

    #[test]
    fn test_end_follows_start_in_same_paragraph() {
        let source = body(vec![
            paragraph(vec![marker("bookmarkStart", "7"), Element::new(ns::W, "r")]),
            paragraph(vec![marker("bookmarkEnd", "7")]),
        ]);
        let mut content = vec![paragraph(vec![marker("bookmarkStart", "7"), Element::new(ns::W, "r")])];
        fix_ranges(&source, &mut content);
        let names: Vec<&str> = content[0].elements().map(|e| e.name.local.as_str()).collect();
        assert_eq!(names, vec!["pPr", "bookmarkStart", "r", "bookmarkEnd"]);
    }

    #[test]
    fn test_end_after_trailing_table() {
        let source = body(vec![
            paragraph(vec![]),
            Element::new(ns::W, "tbl").with_child(marker("bookmarkStart", "4")),
            paragraph(vec![marker("bookmarkEnd", "4")]),
        ]);
        let mut content = vec![
            paragraph(vec![]),
            Element::new(ns::W, "tbl").with_child(marker("bookmarkStart", "4")),
            Element::new(ns::W, "sectPr"),
        ];
        fix_ranges(&source, &mut content);

        let names: Vec<&str> = content.iter().map(|e| e.name.local.as_str()).collect();
        assert_eq!(names, vec!["p", "tbl", "p", "sectPr"]);
        assert_eq!(count(&content[2..3], "bookmarkEnd", "4"), 1);
        assert_eq!(count(&content[..1], "bookmarkEnd", "4"), 0);
    }

    #[test]
    fn test_start_before_leading_table() {
        let source = body(vec![
            paragraph(vec![marker("bookmarkStart", "8")]),
            Element::new(ns::W, "tbl").with_child(marker("bookmarkEnd", "8")),
        ]);
        let mut content = vec![
            Element::new(ns::W, "tbl").with_child(marker("bookmarkEnd", "8")),
            paragraph(vec![]),
        ];
        fix_ranges(&source, &mut content);

        assert!(content[0].is(ns::W, "p"));
        assert_eq!(count(&content[..1], "bookmarkStart", "8"), 1);
        assert!(content[1].is(ns::W, "tbl"));
    }

    #[test]
    fn test_unmatched_move_is_deleted() {
        let move_from = Element::new(ns::W, "moveFromRangeStart")
            .with_attr(ns::W, "id", "3")
            .with_attr(ns::W, "name", "move1");
        let source = body(vec![paragraph(vec![move_from.clone(), marker("moveFromRangeEnd", "3")])]);
        let mut content = vec![paragraph(vec![move_from, marker("moveFromRangeEnd", "3")])];
        fix_ranges(&source, &mut content);
        assert_eq!(count(&content, "moveFromRangeStart", "3"), 0);
        assert_eq!(count(&content, "moveFromRangeEnd", "3"), 0);
    }

    #[test]
    fn test_matched_move_is_kept() {
        let from = Element::new(ns::W, "moveFromRangeStart")
            .with_attr(ns::W, "id", "3")
            .with_attr(ns::W, "name", "move1");
        let to = Element::new(ns::W, "moveToRangeStart")
            .with_attr(ns::W, "id", "4")
            .with_attr(ns::W, "name", "move1");
        let mut content = vec![
            paragraph(vec![from, marker("moveFromRangeEnd", "3")]),
            paragraph(vec![to, marker("moveToRangeEnd", "4")]),
        ];
        let source = body(content.clone());
        fix_ranges(&source, &mut content);
        assert_eq!(count(&content, "moveFromRangeStart", "3"), 1);
        assert_eq!(count(&content, "moveToRangeEnd", "4"), 1);
    }
}
