//! Owned XML element tree
//!
//! Package parts are edited as whole trees: fragments are cloned out of one
//! part, rewritten, and spliced into another. Names are resolved to
//! `{namespace}local` on load, so documents written with different prefixes
//! compare equal, and serialization re-declares namespaces where needed.

use crate::error::{StoreError, StoreResult};
use crate::namespaces::{ns, well_known_prefix};
use quick_xml::escape::{escape, partial_escape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fmt;

/// Declaration written at the top of every serialized part
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// A namespace-qualified name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct XName {
    /// Namespace URI, empty for unqualified names
    pub namespace: String,
    /// Local part of the name
    pub local: String,
}

impl XName {
    pub fn new(namespace: &str, local: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            local: local.to_string(),
        }
    }

    /// An unqualified name (no namespace)
    pub fn local(local: &str) -> Self {
        Self::new("", local)
    }

    pub fn is(&self, namespace: &str, local: &str) -> bool {
        self.local == local && self.namespace == namespace
    }
}

impl fmt::Display for XName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.local)
        } else {
            write!(f, "{{{}}}{}", self.namespace, self.local)
        }
    }
}

/// An attribute on an element. Namespace declarations are kept as
/// attributes in the `xmlns` namespace, with the declared prefix as the
/// local name (`xmlns` itself for the default namespace).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: XName,
    pub value: String,
}

impl Attribute {
    pub fn is_namespace_declaration(&self) -> bool {
        self.name.namespace == ns::XMLNS
    }

    fn declared_prefix(&self) -> &str {
        if self.name.local == "xmlns" {
            ""
        } else {
            &self.name.local
        }
    }
}

/// A node in the tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
}

/// An XML element with owned attributes and children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: XName,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Node>,
}

impl Element {
    /// Create an empty element
    pub fn new(namespace: &str, local: &str) -> Self {
        Self::with_name(XName::new(namespace, local))
    }

    pub fn with_name(name: XName) -> Self {
        Self {
            name,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter
    pub fn with_attr(mut self, namespace: &str, local: &str, value: impl Into<String>) -> Self {
        self.set_attr(namespace, local, value);
        self
    }

    /// Builder-style child append
    pub fn with_child(mut self, child: Element) -> Self {
        self.push(child);
        self
    }

    /// Builder-style text append
    pub fn with_text(mut self, text: &str) -> Self {
        self.push_text(text);
        self
    }

    /// Builder-style namespace declaration
    pub fn with_namespace(mut self, prefix: &str, uri: &str) -> Self {
        let local = if prefix.is_empty() { "xmlns" } else { prefix };
        self.set_attr(ns::XMLNS, local, uri);
        self
    }

    pub fn is(&self, namespace: &str, local: &str) -> bool {
        self.name.is(namespace, local)
    }

    // ===== Attributes =====

    /// Get an attribute value
    pub fn attr(&self, namespace: &str, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.is(namespace, local))
            .map(|a| a.value.as_str())
    }

    /// Set (or replace) an attribute value
    pub fn set_attr(&mut self, namespace: &str, local: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|a| a.name.is(namespace, local)) {
            Some(existing) => existing.value = value,
            None => self.attributes.push(Attribute {
                name: XName::new(namespace, local),
                value,
            }),
        }
    }

    /// Remove an attribute, returning its value
    pub fn remove_attr(&mut self, namespace: &str, local: &str) -> Option<String> {
        let index = self.attributes.iter().position(|a| a.name.is(namespace, local))?;
        Some(self.attributes.remove(index).value)
    }

    /// Namespace URIs declared directly on this element, as (prefix, uri)
    pub fn namespace_declarations(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .filter(|a| a.is_namespace_declaration())
            .map(|a| (a.declared_prefix(), a.value.as_str()))
    }

    // ===== Children =====

    /// Iterate over child elements
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    /// Iterate mutably over child elements
    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    /// Iterate over child elements with the given name
    pub fn elements_named<'a>(
        &'a self,
        namespace: &'a str,
        local: &'a str,
    ) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements().filter(move |e| e.is(namespace, local))
    }

    /// First child element with the given name
    pub fn element(&self, namespace: &str, local: &str) -> Option<&Element> {
        self.elements().find(|e| e.is(namespace, local))
    }

    pub fn element_mut(&mut self, namespace: &str, local: &str) -> Option<&mut Element> {
        self.elements_mut().find(|e| e.is(namespace, local))
    }

    /// Index into `children` of the first child element with the given name
    pub fn child_index(&self, namespace: &str, local: &str) -> Option<usize> {
        self.children
            .iter()
            .position(|n| matches!(n, Node::Element(e) if e.is(namespace, local)))
    }

    /// Append a child element
    pub fn push(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    /// Insert a child element at a position in `children`
    pub fn insert(&mut self, index: usize, child: Element) {
        let index = index.min(self.children.len());
        self.children.insert(index, Node::Element(child));
    }

    /// Append text, merging with a trailing text node
    pub fn push_text(&mut self, text: &str) {
        if let Some(Node::Text(existing)) = self.children.last_mut() {
            existing.push_str(text);
        } else {
            self.children.push(Node::Text(text.to_string()));
        }
    }

    /// Remove direct children with the given name
    pub fn remove_elements_named(&mut self, namespace: &str, local: &str) {
        self.children
            .retain(|n| !matches!(n, Node::Element(e) if e.is(namespace, local)));
    }

    /// Concatenated text content of this element and its descendants
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }

    // ===== Traversal =====

    /// Pre-order iterator over all descendant elements (excluding self)
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: vec![self.children.iter()],
        }
    }

    /// Descendant elements with the given name
    pub fn descendants_named<'a>(
        &'a self,
        namespace: &'a str,
        local: &'a str,
    ) -> impl Iterator<Item = &'a Element> + 'a {
        self.descendants().filter(move |e| e.is(namespace, local))
    }

    pub fn has_descendant(&self, namespace: &str, local: &str) -> bool {
        self.descendants().any(|e| e.is(namespace, local))
    }

    /// Visit this element and every descendant, parents before children
    pub fn visit_mut<F: FnMut(&mut Element)>(&mut self, f: &mut F) {
        f(self);
        for child in self.elements_mut() {
            child.visit_mut(f);
        }
    }

    /// Like [`Element::visit_mut`], stopping at the first error
    pub fn try_visit_mut<E, F: FnMut(&mut Element) -> Result<(), E>>(&mut self, f: &mut F) -> Result<(), E> {
        f(self)?;
        for child in self.elements_mut() {
            child.try_visit_mut(f)?;
        }
        Ok(())
    }

    /// Remove every descendant matching the predicate. Removed subtrees are
    /// not searched further.
    pub fn remove_descendants_where<F: FnMut(&Element) -> bool>(&mut self, pred: &mut F) {
        self.children.retain(|n| match n {
            Node::Element(e) => !pred(e),
            _ => true,
        });
        for child in self.elements_mut() {
            child.remove_descendants_where(pred);
        }
    }

    // ===== Parsing & serialization =====

    /// Parse a document and return its root element
    pub fn parse(xml: &str) -> StoreResult<Element> {
        let mut reader = Reader::from_str(xml);
        let mut buf = Vec::new();
        let mut scopes: Vec<Vec<(String, String)>> = Vec::new();
        let mut open: Vec<(Element, bool)> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    let inherited = open.last().map_or(false, |(_, preserve)| *preserve);
                    let opened = open_element(e, &mut scopes, inherited)?;
                    open.push(opened);
                }
                Ok(Event::Empty(ref e)) => {
                    let inherited = open.last().map_or(false, |(_, preserve)| *preserve);
                    let (element, _) = open_element(e, &mut scopes, inherited)?;
                    scopes.pop();
                    attach(&mut open, &mut root, element)?;
                }
                Ok(Event::End(_)) => {
                    let (element, _) = open
                        .pop()
                        .ok_or_else(|| StoreError::XmlParse("unbalanced end tag".into()))?;
                    scopes.pop();
                    attach(&mut open, &mut root, element)?;
                }
                Ok(Event::Text(ref t)) => {
                    if let Some((parent, preserve)) = open.last_mut() {
                        let text = t.unescape().map_err(|e| StoreError::XmlParse(e.to_string()))?;
                        if *preserve || !text.trim().is_empty() {
                            parent.push_text(&text);
                        }
                    }
                }
                Ok(Event::CData(ref c)) => {
                    if let Some((parent, _)) = open.last_mut() {
                        let text = String::from_utf8(c.to_vec())?;
                        parent.push_text(&text);
                    }
                }
                Ok(Event::Comment(ref c)) => {
                    if let Some((parent, _)) = open.last_mut() {
                        let text = String::from_utf8(c.to_vec())?;
                        parent.children.push(Node::Comment(text));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(StoreError::from(e)),
                _ => {}
            }
            buf.clear();
        }

        if !open.is_empty() {
            return Err(StoreError::XmlParse("unexpected end of document".into()));
        }
        root.ok_or_else(|| StoreError::XmlParse("document has no root element".into()))
    }

    /// Parse UTF-8 bytes
    pub fn parse_bytes(bytes: &[u8]) -> StoreResult<Element> {
        let text = std::str::from_utf8(bytes).map_err(|e| StoreError::XmlParse(e.to_string()))?;
        // Tolerate a byte order mark
        Self::parse(text.trim_start_matches('\u{feff}'))
    }

    /// Serialize as a standalone document, declaration included
    pub fn to_xml(&self) -> String {
        let mut out = String::from(XML_DECLARATION);
        out.push_str("\r\n");
        self.write_to(&mut out, &mut Vec::new());
        out
    }

    /// Serialize without the XML declaration
    pub fn to_fragment_string(&self) -> String {
        let mut out = String::new();
        self.write_to(&mut out, &mut Vec::new());
        out
    }

    fn write_to(&self, out: &mut String, scopes: &mut Vec<(String, String)>) {
        let mark = scopes.len();
        for (prefix, uri) in self.namespace_declarations() {
            scopes.push((prefix.to_string(), uri.to_string()));
        }

        let mut extra = Vec::new();
        let tag = qualify(&self.name, true, scopes, &mut extra);
        let mut attrs = String::new();
        for attr in &self.attributes {
            let key = if attr.is_namespace_declaration() {
                match attr.declared_prefix() {
                    "" => "xmlns".to_string(),
                    prefix => format!("xmlns:{}", prefix),
                }
            } else {
                qualify(&attr.name, false, scopes, &mut extra)
            };
            attrs.push_str(&format!(" {}=\"{}\"", key, escape(attr.value.as_str())));
        }

        out.push('<');
        out.push_str(&tag);
        for (prefix, uri) in &extra {
            if prefix.is_empty() {
                out.push_str(&format!(" xmlns=\"{}\"", escape(uri.as_str())));
            } else {
                out.push_str(&format!(" xmlns:{}=\"{}\"", prefix, escape(uri.as_str())));
            }
        }
        out.push_str(&attrs);

        if self.children.is_empty() {
            out.push_str("/>");
        } else {
            out.push('>');
            for child in &self.children {
                match child {
                    Node::Element(e) => e.write_to(out, scopes),
                    Node::Text(t) => out.push_str(&partial_escape(t.as_str())),
                    Node::Comment(c) => {
                        out.push_str("<!--");
                        out.push_str(c);
                        out.push_str("-->");
                    }
                }
            }
            out.push_str("</");
            out.push_str(&tag);
            out.push('>');
        }

        scopes.truncate(mark);
    }
}

/// Pre-order iterator over descendant elements
pub struct Descendants<'a> {
    stack: Vec<std::slice::Iter<'a, Node>>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<&'a Element> {
        loop {
            let top = self.stack.last_mut()?;
            match top.next() {
                Some(Node::Element(e)) => {
                    self.stack.push(e.children.iter());
                    return Some(e);
                }
                Some(_) => {}
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

/// Every element of a fragment together with all of its descendants
pub fn fragment_descendants(content: &[Element]) -> impl Iterator<Item = &Element> {
    content
        .iter()
        .flat_map(|e| std::iter::once(e).chain(e.descendants()))
}

/// Visit every element of a fragment, parents before children
pub fn visit_fragment_mut<F: FnMut(&mut Element)>(content: &mut [Element], f: &mut F) {
    for element in content.iter_mut() {
        element.visit_mut(f);
    }
}

/// Fallible variant of [`visit_fragment_mut`]
pub fn try_visit_fragment_mut<E, F: FnMut(&mut Element) -> Result<(), E>>(
    content: &mut [Element],
    f: &mut F,
) -> Result<(), E> {
    for element in content.iter_mut() {
        element.try_visit_mut(f)?;
    }
    Ok(())
}

/// Remove matching elements from a fragment, both top-level and nested
pub fn remove_fragment_where<F: FnMut(&Element) -> bool>(content: &mut Vec<Element>, pred: &mut F) {
    content.retain(|e| !pred(e));
    for element in content.iter_mut() {
        element.remove_descendants_where(pred);
    }
}

fn collect_text(element: &Element, out: &mut String) {
    for child in &element.children {
        match child {
            Node::Text(t) => out.push_str(t),
            Node::Element(e) => collect_text(e, out),
            Node::Comment(_) => {}
        }
    }
}

fn attach(
    open: &mut [(Element, bool)],
    root: &mut Option<Element>,
    element: Element,
) -> StoreResult<()> {
    match open.last_mut() {
        Some((parent, _)) => parent.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(StoreError::XmlParse("multiple root elements".into())),
    }
    Ok(())
}

fn open_element(
    start: &BytesStart,
    scopes: &mut Vec<Vec<(String, String)>>,
    inherited_preserve: bool,
) -> StoreResult<(Element, bool)> {
    let mut declarations = Vec::new();
    let mut raw = Vec::new();
    for attr in start.attributes() {
        let attr = attr?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|e| StoreError::XmlParse(e.to_string()))?
            .to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| StoreError::XmlParse(e.to_string()))?
            .into_owned();
        if key == "xmlns" {
            declarations.push((String::new(), value));
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            declarations.push((prefix.to_string(), value));
        } else {
            raw.push((key, value));
        }
    }
    scopes.push(declarations.clone());

    let qname = std::str::from_utf8(start.name().as_ref())
        .map_err(|e| StoreError::XmlParse(e.to_string()))?
        .to_string();
    let mut element = Element::with_name(resolve(&qname, scopes, true));

    for (prefix, uri) in declarations {
        let local = if prefix.is_empty() { "xmlns".to_string() } else { prefix };
        element.attributes.push(Attribute {
            name: XName {
                namespace: ns::XMLNS.to_string(),
                local,
            },
            value: uri,
        });
    }

    let mut preserve = inherited_preserve;
    for (key, value) in raw {
        let name = resolve(&key, scopes, false);
        if name.is(ns::XML, "space") {
            preserve = value == "preserve";
        }
        element.attributes.push(Attribute { name, value });
    }

    Ok((element, preserve))
}

fn resolve(qname: &str, scopes: &[Vec<(String, String)>], is_element: bool) -> XName {
    let (prefix, local) = qname.split_once(':').unwrap_or(("", qname));
    if prefix.is_empty() && !is_element {
        return XName::local(local);
    }
    if prefix == "xml" {
        return XName::new(ns::XML, local);
    }
    for scope in scopes.iter().rev() {
        if let Some((_, uri)) = scope.iter().find(|(p, _)| p == prefix) {
            return XName::new(uri, local);
        }
    }
    if prefix.is_empty() {
        XName::local(local)
    } else {
        // Undeclared prefix: keep the raw name rather than failing
        XName::local(qname)
    }
}

fn lookup<'a>(scopes: &'a [(String, String)], prefix: &str) -> Option<&'a str> {
    scopes
        .iter()
        .rev()
        .find(|(p, _)| p == prefix)
        .map(|(_, uri)| uri.as_str())
}

fn qualify(
    name: &XName,
    is_element: bool,
    scopes: &mut Vec<(String, String)>,
    extra: &mut Vec<(String, String)>,
) -> String {
    if name.namespace.is_empty() {
        if is_element && lookup(scopes, "").map_or(false, |uri| !uri.is_empty()) {
            scopes.push((String::new(), String::new()));
            extra.push((String::new(), String::new()));
        }
        return name.local.clone();
    }
    if name.namespace == ns::XML {
        return format!("xml:{}", name.local);
    }

    let bound = scopes
        .iter()
        .rev()
        .find(|(p, uri)| {
            *uri == name.namespace
                && (is_element || !p.is_empty())
                && lookup(scopes, p) == Some(uri.as_str())
        })
        .map(|(p, _)| p.clone());
    if let Some(prefix) = bound {
        return if prefix.is_empty() {
            name.local.clone()
        } else {
            format!("{}:{}", prefix, name.local)
        };
    }

    let prefix = match well_known_prefix(&name.namespace) {
        Some(p) if lookup(scopes, p).is_none() => p.to_string(),
        _ => (0..)
            .map(|n| format!("ns{}", n))
            .find(|p| lookup(scopes, p).is_none())
            .unwrap_or_default(),
    };
    scopes.push((prefix.clone(), name.namespace.clone()));
    extra.push((prefix.clone(), name.namespace.clone()));
    format!("{}:{}", prefix, name.local)
}

#[cfg(test)]
mod tests {
    use super::*;

    const W: &str = ns::W;

    #[test]
    fn test_parse_resolves_namespaces() {
        let xml = r#"<?xml version="1.0"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
    <w:body><w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr></w:p></w:body>
</w:document>"#;
        let root = Element::parse(xml).unwrap();
        assert!(root.is(W, "document"));
        let style = root.descendants_named(W, "pStyle").next().unwrap();
        assert_eq!(style.attr(W, "val"), Some("Heading1"));
    }

    #[test]
    fn test_different_prefixes_compare_equal() {
        let a = Element::parse(r#"<w:p xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"/>"#).unwrap();
        let b = Element::parse(r#"<x:p xmlns:x="http://schemas.openxmlformats.org/wordprocessingml/2006/main"/>"#).unwrap();
        assert_eq!(a.name, b.name);
    }

    #[test]
    fn test_whitespace_handling() {
        let xml = r#"<w:r xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:t xml:space="preserve"> </w:t>
  <w:t>a &amp; b</w:t>
</w:r>"#;
        let root = Element::parse(xml).unwrap();
        let texts: Vec<String> = root.elements_named(W, "t").map(|t| t.text()).collect();
        assert_eq!(texts, vec![" ".to_string(), "a & b".to_string()]);
        assert_eq!(root.elements().count(), 2);
        assert_eq!(root.children.len(), 2);
    }

    #[test]
    fn test_serialize_declares_missing_namespaces() {
        let p = Element::new(W, "p").with_child(
            Element::new(W, "r").with_child(Element::new(W, "t").with_text("x < y")),
        );
        let xml = p.to_fragment_string();
        assert!(xml.starts_with(r#"<w:p xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#));
        assert!(xml.contains("x &lt; y"));

        let reparsed = Element::parse(&xml).unwrap();
        assert_eq!(reparsed.text(), "x < y");
        assert_eq!(reparsed.descendants().count(), 2);
    }

    #[test]
    fn test_serialize_keeps_declared_prefixes() {
        let xml = r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><w:body><w:hyperlink r:id="rId4"/></w:body></w:document>"#;
        let root = Element::parse(xml).unwrap();
        assert_eq!(root.to_fragment_string(), xml);
    }

    #[test]
    fn test_attribute_prefix_conflict_generates_prefix() {
        let el = Element::new("urn:a", "x")
            .with_namespace("w", "urn:other")
            .with_attr(W, "val", "1");
        let xml = el.to_fragment_string();
        let reparsed = Element::parse(&xml).unwrap();
        assert_eq!(reparsed.attr(W, "val"), Some("1"));
        assert!(reparsed.is("urn:a", "x"));
    }

    #[test]
    fn test_unqualified_child_under_default_namespace() {
        let el = Element::new("urn:a", "root").with_child(Element::new("", "plain"));
        let reparsed = Element::parse(&el.to_fragment_string()).unwrap();
        assert!(reparsed.element("", "plain").is_some());
    }

    #[test]
    fn test_descendants_order() {
        let root = Element::new(W, "body")
            .with_child(Element::new(W, "p").with_child(Element::new(W, "r")))
            .with_child(Element::new(W, "tbl"));
        let names: Vec<&str> = root.descendants().map(|e| e.name.local.as_str()).collect();
        assert_eq!(names, vec!["p", "r", "tbl"]);
    }

    #[test]
    fn test_visit_and_remove() {
        let mut root = Element::new(W, "body")
            .with_child(Element::new(W, "p").with_child(Element::new(W, "bookmarkStart").with_attr(W, "id", "1")))
            .with_child(Element::new(W, "sectPr"));
        root.visit_mut(&mut |e| {
            if e.is(W, "bookmarkStart") {
                e.set_attr(W, "id", "7");
            }
        });
        assert_eq!(root.descendants_named(W, "bookmarkStart").next().unwrap().attr(W, "id"), Some("7"));

        root.remove_descendants_where(&mut |e| e.is(W, "sectPr"));
        assert!(!root.has_descendant(W, "sectPr"));
    }

    #[test]
    fn test_parse_errors() {
        assert!(Element::parse("").is_err());
        assert!(Element::parse("<a><b></a>").is_err());
    }
}
