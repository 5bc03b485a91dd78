//! Insertion markers
//!
//! A marker is a `pt14:Insert` element with an unqualified `Id`. Content
//! built for a source with an insert id replaces the marker in place,
//! wherever in the tree the marker sits.

use store::{ns, Element, Node};

const MARKER: &str = "Insert";

fn is_marker(element: &Element, id: &str) -> bool {
    element.is(ns::PT_INSERT, MARKER) && element.attr("", "Id") == Some(id)
}

/// Number of markers with `id` in the tree
pub fn marker_count(root: &Element, id: &str) -> usize {
    std::iter::once(root)
        .chain(root.descendants())
        .filter(|e| is_marker(e, id))
        .count()
}

/// Replace the first marker with `id` (in document order) by `content`.
/// Returns false when the tree has no such marker.
pub fn replace_marker(root: &mut Element, id: &str, content: &[Element]) -> bool {
    let mut content = Some(content);
    splice_first(root, id, &mut content)
}

fn splice_first(parent: &mut Element, id: &str, content: &mut Option<&[Element]>) -> bool {
    for index in 0..parent.children.len() {
        let Node::Element(child) = &mut parent.children[index] else {
            continue;
        };
        if is_marker(child, id) {
            let replacement = content.take().unwrap_or_default();
            parent
                .children
                .splice(index..=index, replacement.iter().cloned().map(Node::Element));
            return true;
        }
        if splice_first(child, id, content) {
            return true;
        }
    }
    false
}

/// When marker-namespace markup is present, declare `pt` and `pt14` on the
/// root and list them as ignorable
pub fn declare_marker_namespaces(root: &mut Element) {
    let uses_markers = std::iter::once(&*root).chain(root.descendants()).any(|e| {
        e.name.namespace == ns::PT
            || e.name.namespace == ns::PT_INSERT
            || e
                .attributes
                .iter()
                .any(|a| a.name.namespace == ns::PT || a.name.namespace == ns::PT_INSERT)
    });
    if !uses_markers {
        return;
    }
    for (prefix, uri) in [("pt", ns::PT), ("pt14", ns::PT_INSERT)] {
        if root.namespace_declarations().any(|(_, declared)| declared == uri) {
            continue;
        }
        root.set_attr(ns::XMLNS, prefix, uri);
        if let Some(ignorable) = root.attr(ns::MC, "Ignorable").map(str::to_string) {
            root.set_attr(ns::MC, "Ignorable", format!("{} {}", ignorable, prefix));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::wordprocessing_root;

    fn marker(id: &str) -> Element {
        Element::new(ns::PT_INSERT, MARKER).with_attr("", "Id", id)
    }

    fn text_paragraph(text: &str) -> Element {
        Element::new(ns::W, "p").with_child(Element::new(ns::W, "r").with_child(Element::new(ns::W, "t").with_text(text)))
    }

    fn body(children: Vec<Element>) -> Element {
        let mut body = Element::new(ns::W, "body");
        for c in children {
            body.push(c);
        }
        wordprocessing_root("document").with_child(body)
    }

    #[test]
    fn test_marker_replaced_by_content() {
        let mut root = body(vec![text_paragraph("before"), marker("Chapter"), text_paragraph("after")]);
        let replaced = replace_marker(&mut root, "Chapter", &[text_paragraph("one"), text_paragraph("two")]);
        assert!(replaced);
        let texts: Vec<String> = root.element(ns::W, "body").unwrap().elements().map(|p| p.text()).collect();
        assert_eq!(texts, vec!["before", "one", "two", "after"]);
    }

    #[test]
    fn test_only_first_marker_replaced() {
        let cell = Element::new(ns::W, "tc").with_child(marker("X"));
        let mut root = body(vec![Element::new(ns::W, "tbl").with_child(Element::new(ns::W, "tr").with_child(cell)), marker("X")]);
        assert_eq!(marker_count(&root, "X"), 2);
        replace_marker(&mut root, "X", &[text_paragraph("filled")]);
        assert_eq!(marker_count(&root, "X"), 1);
        let tc = root.descendants_named(ns::W, "tc").next().unwrap();
        assert_eq!(tc.text(), "filled");
    }

    #[test]
    fn test_other_ids_untouched() {
        let mut root = body(vec![marker("A")]);
        assert!(!replace_marker(&mut root, "B", &[text_paragraph("x")]));
        assert_eq!(marker_count(&root, "A"), 1);
    }

    #[test]
    fn test_marker_namespaces_declared_once() {
        let mut root = body(vec![marker("A")]);
        declare_marker_namespaces(&mut root);
        declare_marker_namespaces(&mut root);
        let ignorable = root.attr(ns::MC, "Ignorable").unwrap();
        assert_eq!(ignorable, "w14 wp14 pt pt14");
        assert!(root.namespace_declarations().any(|(p, u)| p == "pt14" && u == ns::PT_INSERT));
    }

    #[test]
    fn test_no_markers_no_declarations() {
        let mut root = body(vec![text_paragraph("plain")]);
        declare_marker_namespaces(&mut root);
        assert_eq!(root.attr(ns::MC, "Ignorable"), Some("w14 wp14"));
    }
}
