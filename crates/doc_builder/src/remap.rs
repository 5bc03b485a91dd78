//! Identifier rewriting
//!
//! Every identifier namespace that must stay unique in an assembled
//! document is described by the element/attribute sites that carry it.
//! Rewrites are in-place edits of owned fragments.

use std::collections::HashMap;
use store::ns;
use store::xml::{visit_fragment_mut, Element};

/// An identifier namespace and the markup that refers to it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdKind {
    Bookmark,
    Comment,
    Footnote,
    Endnote,
    DocPr,
    AbstractNum,
    Num,
    Style,
}

/// (element namespace, element, attribute namespace, attribute)
type Site = (&'static str, &'static str, &'static str, &'static str);

const BOOKMARK_SITES: &[Site] = &[
    (ns::W, "bookmarkStart", ns::W, "id"),
    (ns::W, "bookmarkEnd", ns::W, "id"),
];

const COMMENT_SITES: &[Site] = &[
    (ns::W, "commentRangeStart", ns::W, "id"),
    (ns::W, "commentRangeEnd", ns::W, "id"),
    (ns::W, "commentReference", ns::W, "id"),
];

const FOOTNOTE_SITES: &[Site] = &[(ns::W, "footnoteReference", ns::W, "id")];

const ENDNOTE_SITES: &[Site] = &[(ns::W, "endnoteReference", ns::W, "id")];

const DOCPR_SITES: &[Site] = &[(ns::WP, "docPr", "", "id")];

const ABSTRACT_NUM_SITES: &[Site] = &[
    (ns::W, "abstractNum", ns::W, "abstractNumId"),
    (ns::W, "abstractNumId", ns::W, "val"),
];

const NUM_SITES: &[Site] = &[(ns::W, "num", ns::W, "numId"), (ns::W, "numId", ns::W, "val")];

const STYLE_SITES: &[Site] = &[
    (ns::W, "style", ns::W, "styleId"),
    (ns::W, "basedOn", ns::W, "val"),
    (ns::W, "next", ns::W, "val"),
    (ns::W, "link", ns::W, "val"),
    (ns::W, "pStyle", ns::W, "val"),
    (ns::W, "rStyle", ns::W, "val"),
    (ns::W, "tblStyle", ns::W, "val"),
    (ns::W, "styleLink", ns::W, "val"),
    (ns::W, "numStyleLink", ns::W, "val"),
];

impl IdKind {
    fn sites(self) -> &'static [Site] {
        match self {
            IdKind::Bookmark => BOOKMARK_SITES,
            IdKind::Comment => COMMENT_SITES,
            IdKind::Footnote => FOOTNOTE_SITES,
            IdKind::Endnote => ENDNOTE_SITES,
            IdKind::DocPr => DOCPR_SITES,
            IdKind::AbstractNum => ABSTRACT_NUM_SITES,
            IdKind::Num => NUM_SITES,
            IdKind::Style => STYLE_SITES,
        }
    }

    /// Whether `element` carries an id of this kind, returning the
    /// attribute that holds it
    pub fn site_of(self, element: &Element) -> Option<(&'static str, &'static str)> {
        self.sites()
            .iter()
            .find(|(ens, elocal, _, _)| element.is(ens, elocal))
            .map(|(_, _, ans, alocal)| (*ans, *alocal))
    }

    /// The id this element carries, if it is a site of this kind
    pub fn id_of(self, element: &Element) -> Option<&str> {
        let (ans, alocal) = self.site_of(element)?;
        element.attr(ans, alocal)
    }
}

/// Replace every occurrence of `old` with `new` in the given namespace.
/// Returns the number of attributes rewritten.
pub fn rewrite(content: &mut [Element], kind: IdKind, old: &str, new: &str) -> usize {
    let mut rewritten = 0;
    visit_fragment_mut(content, &mut |e| {
        if let Some((ans, alocal)) = kind.site_of(e) {
            if e.attr(ans, alocal) == Some(old) {
                e.set_attr(ans, alocal, new);
                rewritten += 1;
            }
        }
    });
    rewritten
}

/// Apply a whole correction table in one pass. Ids are looked up against
/// their original values, so chained entries (a → b, b → c) do not cascade.
pub fn rewrite_all(content: &mut [Element], kind: IdKind, map: &HashMap<String, String>) -> usize {
    if map.is_empty() {
        return 0;
    }
    let mut rewritten = 0;
    visit_fragment_mut(content, &mut |e| {
        if let Some((ans, alocal)) = kind.site_of(e) {
            let replacement = e.attr(ans, alocal).and_then(|id| map.get(id)).cloned();
            if let Some(new) = replacement {
                e.set_attr(ans, alocal, new);
                rewritten += 1;
            }
        }
    });
    rewritten
}

/// Rewrite one relationship-id attribute on every element of a given name
pub fn rewrite_relationship_id(content: &mut [Element], element: (&str, &str), attr: (&str, &str), old: &str, new: &str) {
    visit_fragment_mut(content, &mut |e| {
        if e.is(element.0, element.1) && e.attr(attr.0, attr.1) == Some(old) {
            e.set_attr(attr.0, attr.1, new);
        }
    });
}

/// Largest numeric id of a kind found in the content, if any
pub fn max_numeric_id(content: &[Element], kind: IdKind) -> Option<i64> {
    store::xml::fragment_descendants(content)
        .filter_map(|e| kind.id_of(e))
        .filter_map(|id| id.parse::<i64>().ok())
        .max()
}
