//! Namespace URIs, relationship types and content types used in
//! WordprocessingML packages.

/// XML namespaces used in DOCX files
pub mod ns {
    /// Main WordprocessingML namespace
    pub const W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
    /// Relationships namespace
    pub const R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
    /// Package relationships namespace
    pub const PKG_REL: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
    /// Content types namespace
    pub const CT: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
    /// DrawingML namespace
    pub const A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
    /// WordprocessingML Drawing namespace
    pub const WP: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
    /// Picture namespace
    pub const PIC: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";
    /// VML namespace
    pub const V: &str = "urn:schemas-microsoft-com:vml";
    /// Office (VML extensions) namespace
    pub const O: &str = "urn:schemas-microsoft-com:office:office";
    /// Chart namespace
    pub const C: &str = "http://schemas.openxmlformats.org/drawingml/2006/chart";
    /// Diagram namespace
    pub const DGM: &str = "http://schemas.openxmlformats.org/drawingml/2006/diagram";
    /// Markup compatibility namespace
    pub const MC: &str = "http://schemas.openxmlformats.org/markup-compatibility/2006";
    /// Custom XML data store namespace
    pub const DS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/customXml";
    /// Word 2006 extensions (toolbars, customizations)
    pub const WNE: &str = "http://schemas.microsoft.com/office/word/2006/wordml";
    pub const M: &str = "http://schemas.openxmlformats.org/officeDocument/2006/math";
    pub const W10: &str = "urn:schemas-microsoft-com:office:word";
    pub const W14: &str = "http://schemas.microsoft.com/office/word/2010/wordml";
    pub const W15: &str = "http://schemas.microsoft.com/office/word/2012/wordml";
    pub const WP14: &str = "http://schemas.microsoft.com/office/word/2010/wordprocessingDrawing";
    pub const WPC: &str = "http://schemas.microsoft.com/office/word/2010/wordprocessingCanvas";
    pub const WPG: &str = "http://schemas.microsoft.com/office/word/2010/wordprocessingGroup";
    pub const WPI: &str = "http://schemas.microsoft.com/office/word/2010/wordprocessingInk";
    pub const WPS: &str = "http://schemas.microsoft.com/office/word/2010/wordprocessingShape";
    /// Strict conformance variant of the main namespace
    pub const W_STRICT: &str = "http://purl.oclc.org/ooxml/wordprocessingml/main";
    /// Namespace of insertion markers
    pub const PT: &str = "http://powertools.codeplex.com/2011";
    pub const PT_INSERT: &str = "http://powertools.codeplex.com/documentbuilder/2011/insert";
    /// Reserved `xml:` namespace
    pub const XML: &str = "http://www.w3.org/XML/1998/namespace";
    /// Reserved namespace of `xmlns` declarations
    pub const XMLNS: &str = "http://www.w3.org/2000/xmlns/";
}

/// Prefixes conventionally bound to well-known namespaces. Used when
/// serializing an element whose namespace is not declared in scope.
pub const WELL_KNOWN_PREFIXES: &[(&str, &str)] = &[
    ("w", ns::W),
    ("r", ns::R),
    ("a", ns::A),
    ("wp", ns::WP),
    ("pic", ns::PIC),
    ("v", ns::V),
    ("o", ns::O),
    ("c", ns::C),
    ("dgm", ns::DGM),
    ("mc", ns::MC),
    ("ds", ns::DS),
    ("wne", ns::WNE),
    ("m", ns::M),
    ("w10", ns::W10),
    ("w14", ns::W14),
    ("w15", ns::W15),
    ("wp14", ns::WP14),
    ("wpc", ns::WPC),
    ("wpg", ns::WPG),
    ("wpi", ns::WPI),
    ("wps", ns::WPS),
    ("pt", ns::PT),
    ("pt14", ns::PT_INSERT),
];

/// Look up the conventional prefix for a namespace
pub fn well_known_prefix(namespace: &str) -> Option<&'static str> {
    WELL_KNOWN_PREFIXES
        .iter()
        .find(|(_, uri)| *uri == namespace)
        .map(|(prefix, _)| *prefix)
}

/// Relationship types used in DOCX
pub mod relationship_types {
    pub const DOCUMENT: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
    pub const STYLES: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
    pub const STYLES_WITH_EFFECTS: &str = "http://schemas.microsoft.com/office/2007/relationships/stylesWithEffects";
    pub const NUMBERING: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/numbering";
    pub const IMAGE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
    pub const HYPERLINK: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";
    pub const SETTINGS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/settings";
    pub const HEADER: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/header";
    pub const FOOTER: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/footer";
    pub const FOOTNOTES: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/footnotes";
    pub const ENDNOTES: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/endnotes";
    pub const COMMENTS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/comments";
    pub const THEME: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";
    pub const FONT_TABLE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/fontTable";
    pub const FONT: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/font";
    pub const WEB_SETTINGS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/webSettings";
    pub const GLOSSARY: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/glossaryDocument";
    pub const CORE_PROPERTIES: &str = "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
    pub const EXTENDED_PROPERTIES: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties";
    pub const CUSTOM_PROPERTIES: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/custom-properties";
    pub const CUSTOM_XML: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/customXml";
    pub const CUSTOM_XML_PROPS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/customXmlProps";
    pub const CHART: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/chart";
    pub const CHART_USER_SHAPES: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/chartUserShapes";
    pub const DIAGRAM_DATA: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/diagramData";
    pub const DIAGRAM_LAYOUT: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/diagramLayout";
    pub const DIAGRAM_STYLE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/diagramQuickStyle";
    pub const DIAGRAM_COLORS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/diagramColors";
    pub const OLE_OBJECT: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/oleObject";
    pub const PACKAGE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/package";
    pub const ATTACHED_TEMPLATE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/attachedTemplate";
    pub const TRANSFORM: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/transform";
    pub const WEB_EXTENSION_TASKPANES: &str = "http://schemas.microsoft.com/office/2011/relationships/webextensiontaskpanes";
    pub const WEB_EXTENSION: &str = "http://schemas.microsoft.com/office/2011/relationships/webextension";
}

/// Content types for DOCX parts
pub mod content_type_values {
    pub const DOCUMENT: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";
    pub const TEMPLATE: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.template.main+xml";
    pub const MACRO_DOCUMENT: &str = "application/vnd.ms-word.document.macroEnabled.main+xml";
    pub const GLOSSARY: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document.glossary+xml";
    pub const STYLES: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml";
    pub const STYLES_WITH_EFFECTS: &str = "application/vnd.ms-word.stylesWithEffects+xml";
    pub const NUMBERING: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml";
    pub const SETTINGS: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.settings+xml";
    pub const RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";
    pub const HEADER: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.header+xml";
    pub const FOOTER: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.footer+xml";
    pub const FOOTNOTES: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.footnotes+xml";
    pub const ENDNOTES: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.endnotes+xml";
    pub const COMMENTS: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.comments+xml";
    pub const THEME: &str = "application/vnd.openxmlformats-officedocument.theme+xml";
    pub const FONT_TABLE: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.fontTable+xml";
    pub const WEB_SETTINGS: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.webSettings+xml";
    pub const CORE_PROPERTIES: &str = "application/vnd.openxmlformats-package.core-properties+xml";
    pub const EXTENDED_PROPERTIES: &str = "application/vnd.openxmlformats-officedocument.extended-properties+xml";
    pub const CUSTOM_PROPERTIES: &str = "application/vnd.openxmlformats-officedocument.custom-properties+xml";
    pub const CUSTOM_XML: &str = "application/xml";
    pub const CUSTOM_XML_PROPERTIES: &str = "application/vnd.openxmlformats-officedocument.customXmlProperties+xml";
    pub const CHART: &str = "application/vnd.openxmlformats-officedocument.drawingml.chart+xml";
    pub const CHART_DRAWING: &str = "application/vnd.openxmlformats-officedocument.drawingml.chartshapes+xml";
    pub const DIAGRAM_DATA: &str = "application/vnd.openxmlformats-officedocument.drawingml.diagramData+xml";
    pub const DIAGRAM_LAYOUT: &str = "application/vnd.openxmlformats-officedocument.drawingml.diagramLayout+xml";
    pub const DIAGRAM_STYLE: &str = "application/vnd.openxmlformats-officedocument.drawingml.diagramStyle+xml";
    pub const DIAGRAM_COLORS: &str = "application/vnd.openxmlformats-officedocument.drawingml.diagramColors+xml";
    pub const WEB_EXTENSION_TASKPANES: &str = "application/vnd.ms-office.webextensiontaskpanes+xml";
    pub const WEB_EXTENSION: &str = "application/vnd.ms-office.webextension+xml";
    pub const OLE_OBJECT: &str = "application/vnd.openxmlformats-officedocument.oleObject";
}
