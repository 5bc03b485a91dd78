//! In-memory document fixtures shared by the integration tests

#![allow(dead_code)]

use store::{ns, relationship_types as rt, wordprocessing_root, Element, Package, PartContent, PartKind};

/// Install a subscriber once so `RUST_LOG=doc_builder=debug` shows the trace
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn run(text: &str) -> Element {
    Element::new(ns::W, "r").with_child(Element::new(ns::W, "t").with_text(text))
}

pub fn paragraph(text: &str) -> Element {
    Element::new(ns::W, "p").with_child(run(text))
}

pub fn styled_paragraph(text: &str, style: &str) -> Element {
    Element::new(ns::W, "p")
        .with_child(Element::new(ns::W, "pPr").with_child(Element::new(ns::W, "pStyle").with_attr(ns::W, "val", style)))
        .with_child(run(text))
}

pub fn numbered_paragraph(text: &str, num_id: &str) -> Element {
    Element::new(ns::W, "p")
        .with_child(
            Element::new(ns::W, "pPr").with_child(
                Element::new(ns::W, "numPr")
                    .with_child(Element::new(ns::W, "ilvl").with_attr(ns::W, "val", "0"))
                    .with_child(Element::new(ns::W, "numId").with_attr(ns::W, "val", num_id)),
            ),
        )
        .with_child(run(text))
}

pub fn bookmarked_paragraph(text: &str, id: &str) -> Element {
    Element::new(ns::W, "p")
        .with_child(Element::new(ns::W, "bookmarkStart").with_attr(ns::W, "id", id).with_attr(ns::W, "name", text))
        .with_child(run(text))
        .with_child(Element::new(ns::W, "bookmarkEnd").with_attr(ns::W, "id", id))
}

pub fn section_properties() -> Element {
    Element::new(ns::W, "sectPr")
        .with_child(Element::new(ns::W, "pgSz").with_attr(ns::W, "w", "12240").with_attr(ns::W, "h", "15840"))
}

pub fn image_paragraph(rel_id: &str) -> Element {
    let blip = Element::new(ns::A, "blip").with_attr(ns::R, "embed", rel_id);
    let picture = Element::new(ns::PIC, "pic").with_child(Element::new(ns::PIC, "blipFill").with_child(blip));
    let graphic = Element::new(ns::A, "graphic").with_child(Element::new(ns::A, "graphicData").with_child(picture));
    let inline = Element::new(ns::WP, "inline")
        .with_child(Element::new(ns::WP, "docPr").with_attr("", "id", "1").with_attr("", "name", "Picture"))
        .with_child(graphic);
    Element::new(ns::W, "p").with_child(Element::new(ns::W, "r").with_child(Element::new(ns::W, "drawing").with_child(inline)))
}

/// Builder for small in-memory documents
pub struct Fixture {
    package: Package,
    main: String,
}

impl Fixture {
    pub fn new() -> Self {
        let package = Package::new_document();
        let main = package.main_document_part().unwrap();
        Self { package, main }
    }

    pub fn main(&self) -> &str {
        &self.main
    }

    pub fn push(mut self, element: Element) -> Self {
        self.body().push(element);
        self
    }

    pub fn paragraphs(mut self, texts: &[&str]) -> Self {
        for text in texts {
            self.body().push(paragraph(text));
        }
        self
    }

    /// Styles part with (id, name) paragraph styles
    pub fn styles(mut self, styles: &[(&str, &str)]) -> Self {
        let mut root = wordprocessing_root("styles").with_child(Element::new(ns::W, "docDefaults"));
        for (id, name) in styles {
            root.push(
                Element::new(ns::W, "style")
                    .with_attr(ns::W, "type", "paragraph")
                    .with_attr(ns::W, "styleId", *id)
                    .with_child(Element::new(ns::W, "name").with_attr(ns::W, "val", *name)),
            );
        }
        self.package.add_part(&self.main, PartKind::Styles, PartContent::Xml(root)).unwrap();
        self
    }

    /// Numbering part with one abstract definition per (num id, NSID)
    pub fn numbering(mut self, lists: &[(&str, &str)]) -> Self {
        let mut root = wordprocessing_root("numbering");
        for (index, (_, nsid)) in lists.iter().enumerate() {
            root.push(
                Element::new(ns::W, "abstractNum")
                    .with_attr(ns::W, "abstractNumId", index.to_string())
                    .with_child(Element::new(ns::W, "nsid").with_attr(ns::W, "val", *nsid))
                    .with_child(Element::new(ns::W, "lvl").with_attr(ns::W, "ilvl", "0")),
            );
        }
        for (index, (num_id, _)) in lists.iter().enumerate() {
            root.push(
                Element::new(ns::W, "num")
                    .with_attr(ns::W, "numId", *num_id)
                    .with_child(Element::new(ns::W, "abstractNumId").with_attr(ns::W, "val", index.to_string())),
            );
        }
        self.package.add_part(&self.main, PartKind::Numbering, PartContent::Xml(root)).unwrap();
        self
    }

    /// Add a PNG image part and a paragraph showing it
    pub fn image(mut self, bytes: &[u8]) -> Self {
        let created = self
            .package
            .add_part(&self.main, PartKind::image("image/png", "png"), PartContent::Binary(bytes.to_vec()))
            .unwrap();
        self.body().push(image_paragraph(&created.rel_id));
        self
    }

    /// Add a header part, returning its relationship id
    pub fn header(&mut self, text: &str) -> String {
        self.header_with(paragraph(text))
    }

    /// Add a header part holding `content`, returning its relationship id
    pub fn header_with(&mut self, content: Element) -> String {
        let root = wordprocessing_root("hdr").with_child(content);
        self.package.add_part(&self.main, PartKind::Header, PartContent::Xml(root)).unwrap().rel_id
    }

    /// Footnotes part with one bookmarked footnote per id
    pub fn footnotes(mut self, ids: &[&str]) -> Self {
        let mut root = wordprocessing_root("footnotes");
        for id in ids {
            root.push(Element::new(ns::W, "footnote").with_attr(ns::W, "id", *id).with_child(bookmarked_paragraph("note", "0")));
        }
        self.package.add_part(&self.main, PartKind::Footnotes, PartContent::Xml(root)).unwrap();
        self
    }

    /// Comments part holding one comment per id
    pub fn comments(mut self, ids: &[&str]) -> Self {
        let mut root = wordprocessing_root("comments");
        for id in ids {
            root.push(Element::new(ns::W, "comment").with_attr(ns::W, "id", *id).with_child(paragraph("remark")));
        }
        self.package.add_part(&self.main, PartKind::Comments, PartContent::Xml(root)).unwrap();
        self
    }

    /// Trailing body section
    pub fn section(self) -> Self {
        self.push(section_properties())
    }

    pub fn build(self) -> Package {
        self.package
    }

    fn body(&mut self) -> &mut Element {
        self.package
            .xml_mut(&self.main)
            .and_then(|root| root.element_mut(ns::W, "body"))
            .unwrap()
    }
}

pub fn commented_paragraph(text: &str, id: &str) -> Element {
    Element::new(ns::W, "p")
        .with_child(Element::new(ns::W, "commentRangeStart").with_attr(ns::W, "id", id))
        .with_child(run(text))
        .with_child(Element::new(ns::W, "commentRangeEnd").with_attr(ns::W, "id", id))
        .with_child(Element::new(ns::W, "r").with_child(Element::new(ns::W, "commentReference").with_attr(ns::W, "id", id)))
}

pub fn footnote_paragraph(text: &str, id: &str) -> Element {
    Element::new(ns::W, "p")
        .with_child(run(text))
        .with_child(Element::new(ns::W, "r").with_child(Element::new(ns::W, "footnoteReference").with_attr(ns::W, "id", id)))
}

/// A moved-from paragraph and its moved-to counterpart, linked by name
pub fn moved_paragraphs(name: &str, from_id: &str, to_id: &str) -> [Element; 2] {
    let range = |kind: &str, id: &str| {
        Element::new(ns::W, "p")
            .with_child(
                Element::new(ns::W, &format!("{}RangeStart", kind))
                    .with_attr(ns::W, "id", id)
                    .with_attr(ns::W, "name", name),
            )
            .with_child(run(name))
            .with_child(Element::new(ns::W, &format!("{}RangeEnd", kind)).with_attr(ns::W, "id", id))
    };
    [range("moveFrom", from_id), range("moveTo", to_id)]
}

pub fn main_root(package: &Package) -> &Element {
    let main = package.main_document_part().unwrap();
    package.xml(&main).unwrap()
}

pub fn body_elements(package: &Package) -> Vec<&Element> {
    main_root(package).element(ns::W, "body").unwrap().elements().collect()
}

pub fn styles_root(package: &Package) -> &Element {
    let main = package.main_document_part().unwrap();
    let styles = package.related_part_by_type(&main, rt::STYLES).unwrap();
    package.xml(&styles).unwrap()
}

pub fn numbering_root(package: &Package) -> &Element {
    let main = package.main_document_part().unwrap();
    let numbering = package.related_part_by_type(&main, rt::NUMBERING).unwrap();
    package.xml(&numbering).unwrap()
}
