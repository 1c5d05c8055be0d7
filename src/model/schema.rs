//! The schema entity and its top-level children

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::model::annotations::Annotation;
use crate::model::attributes::{AttributeDecl, AttributeGroup};
use crate::model::elements::ElementDecl;
use crate::model::imports::{Import, Include, Redefine};
use crate::model::particles::Particle;
use crate::model::types::{ComplexType, SimpleType};
use crate::model::version::XsdVersion;

/// Form value for elements and attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Form {
    /// Unqualified (the XSD default)
    #[default]
    Unqualified,
    /// Qualified
    Qualified,
}

impl Form {
    /// Parse from the attribute value
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "qualified" => Some(Self::Qualified),
            "unqualified" => Some(Self::Unqualified),
            _ => None,
        }
    }

    /// The attribute value for this form
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Qualified => "qualified",
            Self::Unqualified => "unqualified",
        }
    }
}

/// An `xs:group` definition (a named model group)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupDef {
    /// Optional id attribute
    pub id: Option<String>,
    /// Group name
    pub name: String,
    /// The wrapped sequence/choice/all particle
    pub particle: Option<Particle>,
    /// Optional annotation
    pub annotation: Option<Annotation>,
}

/// An `xs:notation` declaration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Notation {
    /// Optional id attribute
    pub id: Option<String>,
    /// Notation name
    pub name: String,
    /// Public identifier
    pub public: Option<String>,
    /// System identifier
    pub system: Option<String>,
    /// Optional annotation
    pub annotation: Option<Annotation>,
}

/// A top-level child of a schema, in document order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SchemaItem {
    /// `xs:annotation`
    Annotation(Annotation),
    /// `xs:import`
    Import(Import),
    /// `xs:include`
    Include(Include),
    /// `xs:redefine`
    Redefine(Redefine),
    /// `xs:element`
    Element(ElementDecl),
    /// `xs:complexType`
    ComplexType(ComplexType),
    /// `xs:simpleType`
    SimpleType(SimpleType),
    /// `xs:attribute`
    Attribute(AttributeDecl),
    /// `xs:attributeGroup`
    AttributeGroup(AttributeGroup),
    /// `xs:group`
    Group(GroupDef),
    /// `xs:notation`
    Notation(Notation),
}

impl SchemaItem {
    /// The name of the declared component, if it has one
    pub fn name(&self) -> Option<&str> {
        match self {
            SchemaItem::Element(e) => e.name.as_deref(),
            SchemaItem::ComplexType(t) => t.name.as_deref(),
            SchemaItem::SimpleType(t) => t.name.as_deref(),
            SchemaItem::Attribute(a) => a.name.as_deref(),
            SchemaItem::AttributeGroup(g) => g.name.as_deref(),
            SchemaItem::Group(g) => Some(&g.name),
            SchemaItem::Notation(n) => Some(&n.name),
            _ => None,
        }
    }

    /// Whether this item is an import or include reference
    pub fn is_schema_reference(&self) -> bool {
        matches!(
            self,
            SchemaItem::Import(_) | SchemaItem::Include(_) | SchemaItem::Redefine(_)
        )
    }
}

/// A parsed schema document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Optional id attribute
    pub id: Option<String>,
    /// xml:lang of the schema element
    pub lang: Option<String>,
    /// version attribute
    pub version: Option<String>,
    /// Target namespace; empty string is normalized to None
    pub target_namespace: Option<String>,
    /// elementFormDefault
    pub element_form_default: Form,
    /// attributeFormDefault
    pub attribute_form_default: Form,
    /// blockDefault, as written
    pub block_default: Option<String>,
    /// finalDefault, as written
    pub final_default: Option<String>,
    /// Namespace declarations of the root element (empty prefix = default)
    pub namespaces: IndexMap<String, String>,
    /// Top-level children, in document order
    pub items: Vec<SchemaItem>,
    /// Schema location string as given to the parser
    pub location: Option<String>,
    /// Concrete path or URL the bytes were read from
    pub source_url: Option<String>,
    /// Detected XSD version
    pub xsd_version: XsdVersion,
    /// Attributes this construct does not model, preserved as written
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub other_attributes: IndexMap<String, String>,
}

impl Schema {
    /// Whether this schema is usable as a namespace contributor
    ///
    /// A schema without a target namespace still parses but downstream
    /// consumers warn about it.
    pub fn is_valid_for_use(&self) -> bool {
        self.target_namespace
            .as_deref()
            .map(|ns| !ns.is_empty())
            .unwrap_or(false)
    }

    /// Document order of children excluding import/include/redefine
    pub fn resolved_element_order(&self) -> Vec<&SchemaItem> {
        self.items
            .iter()
            .filter(|item| !item.is_schema_reference())
            .collect()
    }

    /// All import references
    pub fn imports(&self) -> impl Iterator<Item = &Import> {
        self.items.iter().filter_map(|item| match item {
            SchemaItem::Import(i) => Some(i),
            _ => None,
        })
    }

    /// All include references
    pub fn includes(&self) -> impl Iterator<Item = &Include> {
        self.items.iter().filter_map(|item| match item {
            SchemaItem::Include(i) => Some(i),
            _ => None,
        })
    }

    /// All redefine references
    pub fn redefines(&self) -> impl Iterator<Item = &Redefine> {
        self.items.iter().filter_map(|item| match item {
            SchemaItem::Redefine(r) => Some(r),
            _ => None,
        })
    }

    /// The URI a prefix is bound to in this schema's root scope
    pub fn uri_for_prefix(&self, prefix: &str) -> Option<&str> {
        self.namespaces.get(prefix).map(|s| s.as_str())
    }

    /// A prefix bound to the given URI in this schema's root scope
    pub fn prefix_for(&self, uri: &str) -> Option<&str> {
        self.namespaces
            .iter()
            .find(|(p, u)| !p.is_empty() && u.as_str() == uri)
            .map(|(p, _)| p.as_str())
    }

    /// The default namespace declared on the root, if any
    pub fn default_namespace(&self) -> Option<&str> {
        self.namespaces.get("").map(|s| s.as_str())
    }

    /// Resolve a reference string written inside this schema to a
    /// (namespace, local name) pair using the schema's own declarations
    ///
    /// A bare name takes the default namespace when one is declared and
    /// the target namespace otherwise.
    pub fn resolve_reference(&self, reference: &str) -> (Option<String>, String) {
        if let Some((prefix, local)) = reference.split_once(':') {
            let ns = self.uri_for_prefix(prefix).map(|s| s.to_string());
            return (ns, local.to_string());
        }
        let ns = self
            .default_namespace()
            .map(|s| s.to_string())
            .or_else(|| self.target_namespace.clone());
        (ns, reference.to_string())
    }

    /// Count of top-level named declarations
    pub fn declaration_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| item.name().is_some())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_schema() -> Schema {
        let mut namespaces = IndexMap::new();
        namespaces.insert("xs".to_string(), crate::XSD_NAMESPACE.to_string());
        namespaces.insert("p".to_string(), "urn:person".to_string());

        Schema {
            target_namespace: Some("urn:person".to_string()),
            namespaces,
            items: vec![
                SchemaItem::Import(Import::default()),
                SchemaItem::Element(ElementDecl::named("Person")),
                SchemaItem::ComplexType(ComplexType {
                    name: Some("PersonType".to_string()),
                    ..ComplexType::default()
                }),
            ],
            ..Schema::default()
        }
    }

    #[test]
    fn test_valid_for_use() {
        let schema = sample_schema();
        assert!(schema.is_valid_for_use());

        let mut no_ns = schema.clone();
        no_ns.target_namespace = None;
        assert!(!no_ns.is_valid_for_use());
    }

    #[test]
    fn test_resolved_element_order_excludes_references() {
        let schema = sample_schema();
        let order = schema.resolved_element_order();
        assert_eq!(order.len(), 2);
        assert!(matches!(order[0], SchemaItem::Element(_)));
        assert!(matches!(order[1], SchemaItem::ComplexType(_)));
    }

    #[test]
    fn test_resolve_reference() {
        let schema = sample_schema();

        let (ns, local) = schema.resolve_reference("p:PersonType");
        assert_eq!(ns.as_deref(), Some("urn:person"));
        assert_eq!(local, "PersonType");

        // Bare names fall back to the target namespace
        let (ns, local) = schema.resolve_reference("PersonType");
        assert_eq!(ns.as_deref(), Some("urn:person"));
        assert_eq!(local, "PersonType");

        let (ns, _) = schema.resolve_reference("unknown:X");
        assert!(ns.is_none());
    }

    #[test]
    fn test_form_parse() {
        assert_eq!(Form::parse("qualified"), Some(Form::Qualified));
        assert_eq!(Form::parse("unqualified"), Some(Form::Unqualified));
        assert_eq!(Form::parse("bogus"), None);
        assert_eq!(Form::default(), Form::Unqualified);
    }
}
