//! Annotation constructs

use serde::{Deserialize, Serialize};

/// An `xs:annotation` element
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Optional id attribute
    pub id: Option<String>,
    /// Documentation and appinfo children, in document order
    pub items: Vec<AnnotationItem>,
}

/// A child of an annotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AnnotationItem {
    /// Human-readable documentation
    Documentation(Documentation),
    /// Machine-readable application information
    AppInfo(AppInfo),
}

/// An `xs:documentation` element
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Documentation {
    /// Optional source URI
    pub source: Option<String>,
    /// xml:lang value
    pub lang: Option<String>,
    /// Text content
    pub content: String,
}

/// An `xs:appinfo` element
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppInfo {
    /// Optional source URI
    pub source: Option<String>,
    /// Text content
    pub content: String,
}

impl Annotation {
    /// First documentation text, if any
    pub fn documentation(&self) -> Option<&str> {
        self.items.iter().find_map(|item| match item {
            AnnotationItem::Documentation(doc) => Some(doc.content.as_str()),
            AnnotationItem::AppInfo(_) => None,
        })
    }
}
