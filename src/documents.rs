//! XML document handling
//!
//! An owned element tree decoupled from the parser input's lifetime.
//! Parsing is delegated to roxmltree; the tree preserves document order,
//! every attribute (including ones no schema construct knows about), and
//! the namespace declarations introduced on each element.

use indexmap::IndexMap;

use crate::error::{Error, Result};

/// An owned XML document
#[derive(Debug, Clone)]
pub struct Document {
    root: Option<Element>,
}

/// An owned XML element
#[derive(Debug, Clone, Default)]
pub struct Element {
    /// Namespace URI of the element, if any
    pub namespace: Option<String>,
    /// Local name
    pub name: String,
    /// Prefix as written in the source document
    pub prefix: Option<String>,
    /// Attributes in document order, by unqualified name
    pub attributes: IndexMap<String, String>,
    /// Namespace declarations introduced on this element (prefix → URI,
    /// empty prefix for the default namespace)
    pub namespaces: IndexMap<String, String>,
    /// Child elements in document order
    pub children: Vec<Element>,
    /// Concatenated direct text content, if non-blank
    pub text: Option<String>,
}

impl Document {
    /// Parse a document from a string
    pub fn from_string(xml: &str) -> Result<Self> {
        let doc = roxmltree::Document::parse(xml)?;
        let root = convert(doc.root_element(), None);
        Ok(Self { root: Some(root) })
    }

    /// Parse a document from UTF-8 bytes
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let xml = std::str::from_utf8(bytes)
            .map_err(|e| Error::Xml(format!("input is not valid UTF-8: {}", e)))?;
        Self::from_string(xml)
    }

    /// The root element, if the document has one
    pub fn root(&self) -> Option<&Element> {
        self.root.as_ref()
    }
}

impl Element {
    /// Local name of the element
    pub fn local_name(&self) -> &str {
        &self.name
    }

    /// Get an attribute value by unqualified name
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }

    /// First child element with the given local name
    pub fn find_child(&self, local_name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == local_name)
    }

    /// All child elements with the given local name
    pub fn children_named<'a>(&'a self, local_name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.name == local_name)
    }

    /// Whether any descendant (or self) satisfies the predicate
    pub fn any_descendant(&self, pred: &dyn Fn(&Element) -> bool) -> bool {
        if pred(self) {
            return true;
        }
        self.children.iter().any(|c| c.any_descendant(pred))
    }
}

fn convert(node: roxmltree::Node<'_, '_>, parent: Option<roxmltree::Node<'_, '_>>) -> Element {
    let tag = node.tag_name();
    let namespace = tag.namespace().map(|s| s.to_string());
    let prefix = namespace
        .as_deref()
        .and_then(|ns| node.lookup_prefix(ns))
        .filter(|p| !p.is_empty())
        .map(|s| s.to_string());

    let mut attributes = IndexMap::new();
    for attr in node.attributes() {
        attributes.insert(attr.name().to_string(), attr.value().to_string());
    }

    // Only the declarations introduced on this element; roxmltree reports
    // all in-scope namespaces, so subtract the parent's set.
    let mut namespaces = IndexMap::new();
    for ns in node.namespaces() {
        let prefix = ns.name().unwrap_or("");
        let inherited = parent
            .map(|p| {
                p.namespaces()
                    .any(|pn| pn.name().unwrap_or("") == prefix && pn.uri() == ns.uri())
            })
            .unwrap_or(false);
        if !inherited && ns.uri() != crate::XML_NAMESPACE {
            namespaces.insert(prefix.to_string(), ns.uri().to_string());
        }
    }

    let mut children = Vec::new();
    let mut text = String::new();
    for child in node.children() {
        if child.is_element() {
            children.push(convert(child, Some(node)));
        } else if child.is_text() {
            if let Some(t) = child.text() {
                text.push_str(t);
            }
        }
    }

    let text = if text.trim().is_empty() {
        None
    } else {
        Some(text)
    };

    Element {
        namespace,
        name: tag.name().to_string(),
        prefix,
        attributes,
        namespaces,
        children,
        text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_document() {
        let doc = Document::from_string(r#"<root a="1"><child>text</child></root>"#).unwrap();
        let root = doc.root().unwrap();

        assert_eq!(root.local_name(), "root");
        assert_eq!(root.get_attribute("a"), Some("1"));
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].text.as_deref(), Some("text"));
    }

    #[test]
    fn test_namespace_declarations_on_root() {
        let doc = Document::from_string(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                          xmlns:p="urn:person" targetNamespace="urn:person"/>"#,
        )
        .unwrap();
        let root = doc.root().unwrap();

        assert_eq!(root.local_name(), "schema");
        assert_eq!(
            root.namespace.as_deref(),
            Some("http://www.w3.org/2001/XMLSchema")
        );
        assert_eq!(root.prefix.as_deref(), Some("xs"));
        assert_eq!(
            root.namespaces.get("xs").map(|s| s.as_str()),
            Some("http://www.w3.org/2001/XMLSchema")
        );
        assert_eq!(root.namespaces.get("p").map(|s| s.as_str()), Some("urn:person"));
    }

    #[test]
    fn test_nested_declarations_not_repeated() {
        let doc = Document::from_string(
            r#"<a xmlns:x="urn:x"><b xmlns:y="urn:y"/></a>"#,
        )
        .unwrap();
        let root = doc.root().unwrap();

        assert!(root.namespaces.contains_key("x"));
        let b = &root.children[0];
        assert!(b.namespaces.contains_key("y"));
        assert!(!b.namespaces.contains_key("x"));
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        let result = Document::parse(&[0xff, 0xfe, 0x00]);
        assert!(result.is_err());
    }

    #[test]
    fn test_find_child() {
        let doc =
            Document::from_string(r#"<root><a/><b i="1"/><b i="2"/></root>"#).unwrap();
        let root = doc.root().unwrap();

        assert!(root.find_child("a").is_some());
        assert_eq!(root.children_named("b").count(), 2);
        assert!(root.find_child("c").is_none());
    }
}
