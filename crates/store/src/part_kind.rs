//! Kinds of parts that can be created in a package
//!
//! The set of destination part kinds is closed: each variant knows its
//! relationship type, content type and canonical location.

use crate::namespaces::{content_type_values as ct, relationship_types as rt};

/// A kind of part to create under a parent part
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartKind {
    MainDocument,
    Glossary,
    Styles,
    StylesWithEffects,
    Numbering,
    FontTable,
    Settings,
    WebSettings,
    Theme,
    Header,
    Footer,
    Footnotes,
    Endnotes,
    Comments,
    CoreProperties,
    ExtendedProperties,
    CustomProperties,
    CustomXml,
    CustomXmlProperties,
    Chart,
    ChartDrawing,
    DiagramData,
    DiagramLayout,
    DiagramStyle,
    DiagramColors,
    WebExTaskpanes,
    WebExtension,
    /// Binary image; content type and extension come from the source part
    Image { content_type: String, extension: String },
    /// Embedded (obfuscated) font
    Font { content_type: String, extension: String },
    /// Legacy OLE object storage
    EmbeddedObject { content_type: String, extension: String },
    /// Embedded OPC package (workbook, presentation, ...)
    EmbeddedPackage { content_type: String, extension: String },
}

impl PartKind {
    /// Image part with the content type and extension of a source image
    pub fn image(content_type: &str, extension: &str) -> Self {
        Self::Image {
            content_type: content_type.to_string(),
            extension: extension.to_string(),
        }
    }

    pub fn font(content_type: &str, extension: &str) -> Self {
        Self::Font {
            content_type: content_type.to_string(),
            extension: extension.to_string(),
        }
    }

    pub fn embedded_object(content_type: &str, extension: &str) -> Self {
        Self::EmbeddedObject {
            content_type: content_type.to_string(),
            extension: extension.to_string(),
        }
    }

    pub fn embedded_package(content_type: &str, extension: &str) -> Self {
        Self::EmbeddedPackage {
            content_type: content_type.to_string(),
            extension: extension.to_string(),
        }
    }

    /// Relationship type used to bind a part of this kind to its parent
    pub fn relationship_type(&self) -> &'static str {
        match self {
            Self::MainDocument => rt::DOCUMENT,
            Self::Glossary => rt::GLOSSARY,
            Self::Styles => rt::STYLES,
            Self::StylesWithEffects => rt::STYLES_WITH_EFFECTS,
            Self::Numbering => rt::NUMBERING,
            Self::FontTable => rt::FONT_TABLE,
            Self::Settings => rt::SETTINGS,
            Self::WebSettings => rt::WEB_SETTINGS,
            Self::Theme => rt::THEME,
            Self::Header => rt::HEADER,
            Self::Footer => rt::FOOTER,
            Self::Footnotes => rt::FOOTNOTES,
            Self::Endnotes => rt::ENDNOTES,
            Self::Comments => rt::COMMENTS,
            Self::CoreProperties => rt::CORE_PROPERTIES,
            Self::ExtendedProperties => rt::EXTENDED_PROPERTIES,
            Self::CustomProperties => rt::CUSTOM_PROPERTIES,
            Self::CustomXml => rt::CUSTOM_XML,
            Self::CustomXmlProperties => rt::CUSTOM_XML_PROPS,
            Self::Chart => rt::CHART,
            Self::ChartDrawing => rt::CHART_USER_SHAPES,
            Self::DiagramData => rt::DIAGRAM_DATA,
            Self::DiagramLayout => rt::DIAGRAM_LAYOUT,
            Self::DiagramStyle => rt::DIAGRAM_STYLE,
            Self::DiagramColors => rt::DIAGRAM_COLORS,
            Self::WebExTaskpanes => rt::WEB_EXTENSION_TASKPANES,
            Self::WebExtension => rt::WEB_EXTENSION,
            Self::Image { .. } => rt::IMAGE,
            Self::Font { .. } => rt::FONT,
            Self::EmbeddedObject { .. } => rt::OLE_OBJECT,
            Self::EmbeddedPackage { .. } => rt::PACKAGE,
        }
    }

    /// Content type registered for a part of this kind
    pub fn content_type(&self) -> &str {
        match self {
            Self::MainDocument => ct::DOCUMENT,
            Self::Glossary => ct::GLOSSARY,
            Self::Styles => ct::STYLES,
            Self::StylesWithEffects => ct::STYLES_WITH_EFFECTS,
            Self::Numbering => ct::NUMBERING,
            Self::FontTable => ct::FONT_TABLE,
            Self::Settings => ct::SETTINGS,
            Self::WebSettings => ct::WEB_SETTINGS,
            Self::Theme => ct::THEME,
            Self::Header => ct::HEADER,
            Self::Footer => ct::FOOTER,
            Self::Footnotes => ct::FOOTNOTES,
            Self::Endnotes => ct::ENDNOTES,
            Self::Comments => ct::COMMENTS,
            Self::CoreProperties => ct::CORE_PROPERTIES,
            Self::ExtendedProperties => ct::EXTENDED_PROPERTIES,
            Self::CustomProperties => ct::CUSTOM_PROPERTIES,
            Self::CustomXml => ct::CUSTOM_XML,
            Self::CustomXmlProperties => ct::CUSTOM_XML_PROPERTIES,
            Self::Chart => ct::CHART,
            Self::ChartDrawing => ct::CHART_DRAWING,
            Self::DiagramData => ct::DIAGRAM_DATA,
            Self::DiagramLayout => ct::DIAGRAM_LAYOUT,
            Self::DiagramStyle => ct::DIAGRAM_STYLE,
            Self::DiagramColors => ct::DIAGRAM_COLORS,
            Self::WebExTaskpanes => ct::WEB_EXTENSION_TASKPANES,
            Self::WebExtension => ct::WEB_EXTENSION,
            Self::Image { content_type, .. }
            | Self::Font { content_type, .. }
            | Self::EmbeddedObject { content_type, .. }
            | Self::EmbeddedPackage { content_type, .. } => content_type,
        }
    }

    /// Whether parts of this kind hold an XML tree (as opposed to bytes)
    pub fn is_xml(&self) -> bool {
        !matches!(
            self,
            Self::Image { .. } | Self::Font { .. } | Self::EmbeddedObject { .. } | Self::EmbeddedPackage { .. }
        )
    }

    /// Whether new part names always carry a sequence number
    /// (`header1.xml`) rather than starting from the plain stem.
    pub(crate) fn is_numbered(&self) -> bool {
        !matches!(
            self,
            Self::MainDocument
                | Self::Glossary
                | Self::Styles
                | Self::StylesWithEffects
                | Self::Numbering
                | Self::FontTable
                | Self::Settings
                | Self::WebSettings
                | Self::Footnotes
                | Self::Endnotes
                | Self::Comments
                | Self::CoreProperties
                | Self::ExtendedProperties
                | Self::CustomProperties
                | Self::WebExTaskpanes
        )
    }

    /// Folder, file stem and extension for new parts of this kind
    pub(crate) fn location(&self) -> (&str, &str, &str) {
        match self {
            Self::MainDocument => ("/word", "document", "xml"),
            Self::Glossary => ("/word/glossary", "document", "xml"),
            Self::Styles => ("/word", "styles", "xml"),
            Self::StylesWithEffects => ("/word", "stylesWithEffects", "xml"),
            Self::Numbering => ("/word", "numbering", "xml"),
            Self::FontTable => ("/word", "fontTable", "xml"),
            Self::Settings => ("/word", "settings", "xml"),
            Self::WebSettings => ("/word", "webSettings", "xml"),
            Self::Theme => ("/word/theme", "theme", "xml"),
            Self::Header => ("/word", "header", "xml"),
            Self::Footer => ("/word", "footer", "xml"),
            Self::Footnotes => ("/word", "footnotes", "xml"),
            Self::Endnotes => ("/word", "endnotes", "xml"),
            Self::Comments => ("/word", "comments", "xml"),
            Self::CoreProperties => ("/docProps", "core", "xml"),
            Self::ExtendedProperties => ("/docProps", "app", "xml"),
            Self::CustomProperties => ("/docProps", "custom", "xml"),
            Self::CustomXml => ("/customXml", "item", "xml"),
            Self::CustomXmlProperties => ("/customXml", "itemProps", "xml"),
            Self::Chart => ("/word/charts", "chart", "xml"),
            Self::ChartDrawing => ("/word/drawings", "drawing", "xml"),
            Self::DiagramData => ("/word/diagrams", "data", "xml"),
            Self::DiagramLayout => ("/word/diagrams", "layout", "xml"),
            Self::DiagramStyle => ("/word/diagrams", "quickStyle", "xml"),
            Self::DiagramColors => ("/word/diagrams", "colors", "xml"),
            Self::WebExTaskpanes => ("/word/webextensions", "taskpanes", "xml"),
            Self::WebExtension => ("/word/webextensions", "webextension", "xml"),
            Self::Image { extension, .. } => ("/word/media", "image", extension),
            Self::Font { extension, .. } => ("/word/fonts", "font", extension),
            Self::EmbeddedObject { extension, .. } => ("/word/embeddings", "oleObject", extension),
            Self::EmbeddedPackage { extension, .. } => ("/word/embeddings", "package", extension),
        }
    }
}
