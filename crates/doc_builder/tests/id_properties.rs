//! Property tests: ids stay unique however fragments are mixed

mod common;

use common::*;
use doc_builder::{find_dangling_relationships, DocumentBuilder, Source};
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};
use store::{ns, relationship_types as rt, Element, Package};

const RANGE_PAIRS: &[(&str, &str)] = &[
    ("bookmarkStart", "bookmarkEnd"),
    ("commentRangeStart", "commentRangeEnd"),
    ("permStart", "permEnd"),
    ("moveFromRangeStart", "moveFromRangeEnd"),
    ("moveToRangeStart", "moveToRangeEnd"),
];

/// A document whose paragraphs carry bookmarks, comments, two lists, a
/// footnote, a move pair and an image, all with ids that collide with the
/// other documents. `tag` marks the list items so they can be traced back.
/// The header carries a bookmark of its own.
fn rich_document(seed: u8, tag: usize) -> Package {
    let mut fixture = Fixture::new()
        .numbering(&[("1", &format!("0000000{}", seed % 2)), ("2", &format!("1000000{}", seed % 3))])
        .comments(&["0", "1"])
        .footnotes(&["1"]);
    let header = fixture.header_with(bookmarked_paragraph("running", "0"));
    let [moved_from, moved_to] = moved_paragraphs("mv", "5", "6");
    fixture
        .push(bookmarked_paragraph("mark", "0"))
        .push(commented_paragraph("noted", "0"))
        .push(numbered_paragraph(&format!("item-{}", tag), "1"))
        .image(&[seed, 1, 2, 3])
        .push(numbered_paragraph(&format!("item-{}", tag), "2"))
        .push(footnote_paragraph("cited", "1"))
        .push(moved_from)
        .push(commented_paragraph("again", "1"))
        .push(moved_to)
        .push(bookmarked_paragraph("other", "1"))
        .push(
            section_properties().with_child(
                Element::new(ns::W, "headerReference")
                    .with_attr(ns::W, "type", "default")
                    .with_attr(ns::R, "id", header),
            ),
        )
        .build()
}

fn assert_unique<'a>(ids: impl Iterator<Item = &'a str>, what: &str) {
    let mut seen = HashSet::new();
    for id in ids {
        assert!(seen.insert(id), "duplicate {} id {}", what, id);
    }
}

/// Word parts of the saved and reopened package
fn word_parts(package: &Package) -> Vec<(String, Element)> {
    let reopened = Package::from_bytes(&package.to_bytes().unwrap()).unwrap();
    reopened
        .parts()
        .filter(|part| part.name.starts_with("/word/"))
        .filter_map(|part| part.xml().map(|root| (part.name.clone(), root.clone())))
        .collect()
}

fn ids_of<'a>(root: &'a Element, local: &'a str) -> impl Iterator<Item = &'a str> {
    root.descendants_named(ns::W, local).filter_map(|e| e.attr(ns::W, "id"))
}

fn fragment() -> impl Strategy<Value = (u8, usize, usize, bool)> {
    (0u8..3, 0usize..10, 1usize..5, any::<bool>())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_ids_unique_in_package(fragments in prop::collection::vec(fragment(), 1..5)) {
        let sources: Vec<Source> = fragments
            .iter()
            .enumerate()
            .map(|(tag, &(seed, start, count, keep))| Source::range(rich_document(seed, tag), start, count, keep))
            .collect();
        let out = DocumentBuilder::default().build(&sources).unwrap();
        let parts = word_parts(&out);

        let bookmarks: Vec<(&str, &str)> = parts
            .iter()
            .flat_map(|(name, root)| ids_of(root, "bookmarkStart").map(move |id| (name.as_str(), id)))
            .collect();
        let mut seen = HashMap::new();
        for (part, id) in &bookmarks {
            if let Some(other) = seen.insert(*id, *part) {
                prop_assert!(false, "bookmark {} in both {} and {}", id, other, part);
            }
        }
        assert_unique(
            parts.iter().flat_map(|(_, root)| root.descendants_named(ns::WP, "docPr").filter_map(|d| d.attr("", "id"))),
            "drawing",
        );

        for (name, root) in &parts {
            for (start, end) in RANGE_PAIRS {
                let mut balance: HashMap<&str, i64> = HashMap::new();
                for id in ids_of(root, start) {
                    *balance.entry(id).or_default() += 1;
                }
                for id in ids_of(root, end) {
                    *balance.entry(id).or_default() -= 1;
                }
                for (id, diff) in balance {
                    prop_assert_eq!(diff, 0, "{} {}/{} id {} unpaired", name, start, end, id);
                }
            }
        }

        let main = out.main_document_part().unwrap();
        if let Some(comments) = out.related_part_by_type(&main, rt::COMMENTS) {
            let comments = out.xml(&comments).unwrap();
            assert_unique(comments.elements_named(ns::W, "comment").filter_map(|c| c.attr(ns::W, "id")), "comment");
        }
        if let Some(footnotes) = out.related_part_by_type(&main, rt::FOOTNOTES) {
            let footnotes = out.xml(&footnotes).unwrap();
            assert_unique(footnotes.elements_named(ns::W, "footnote").filter_map(|f| f.attr(ns::W, "id")), "footnote");
        }
        prop_assert!(find_dangling_relationships(&out).is_empty());
    }

    #[test]
    fn prop_each_source_keeps_its_lists(seeds in prop::collection::vec(0u8..3, 2..5)) {
        let sources: Vec<Source> = seeds
            .iter()
            .enumerate()
            .map(|(tag, &seed)| Source::new(rich_document(seed, tag)))
            .collect();
        let out = DocumentBuilder::default().build(&sources).unwrap();
        let numbering = numbering_root(&out);

        let abstracts: HashMap<&str, &str> = numbering
            .elements_named(ns::W, "abstractNum")
            .filter_map(|a| Some((a.attr(ns::W, "abstractNumId")?, a.element(ns::W, "nsid")?.attr(ns::W, "val")?)))
            .collect();
        assert_unique(abstracts.values().copied(), "nsid");
        let nums: HashMap<&str, &str> = numbering
            .elements_named(ns::W, "num")
            .filter_map(|n| Some((n.attr(ns::W, "numId")?, n.element(ns::W, "abstractNumId")?.attr(ns::W, "val")?)))
            .collect();
        for abstract_id in nums.values() {
            prop_assert!(abstracts.contains_key(abstract_id));
        }

        let mut owner: HashMap<String, String> = HashMap::new();
        for paragraph in body_elements(&out) {
            let Some(num_id) = paragraph.descendants_named(ns::W, "numId").next().and_then(|n| n.attr(ns::W, "val")) else {
                continue;
            };
            prop_assert!(nums.contains_key(num_id), "numId {} has no num", num_id);
            let text = paragraph.text();
            if let Some(previous) = owner.insert(num_id.to_string(), text.clone()) {
                prop_assert_eq!(previous, text, "numId {} shared across sources", num_id);
            }
        }
    }
}

#[test]
fn test_header_bookmarks_do_not_clash_with_body() {
    let sources: Vec<Source> = (0..2).map(|tag| Source::range(rich_document(0, tag), 0, 11, true)).collect();
    let out = DocumentBuilder::default().build(&sources).unwrap();
    let main = out.main_document_part().unwrap();

    let headers = out.related_parts_by_type(&main, rt::HEADER);
    let mut header_ids = Vec::new();
    for (_, header) in &headers {
        header_ids.extend(ids_of(out.xml(header).unwrap(), "bookmarkStart").map(str::to_string));
    }
    assert_eq!(header_ids.len(), 2);
    let body_ids: HashSet<String> = ids_of(main_root(&out), "bookmarkStart").map(str::to_string).collect();
    for id in &header_ids {
        assert!(!body_ids.contains(id), "header bookmark {} reused in the body", id);
    }
    assert_ne!(header_ids[0], header_ids[1]);
}
