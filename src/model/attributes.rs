//! Attribute declarations and attribute groups

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::model::annotations::Annotation;
use crate::model::particles::ProcessContents;
use crate::model::types::SimpleType;

/// The `use` attribute of an attribute declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AttributeUse {
    /// May appear (the XSD default)
    #[default]
    Optional,
    /// Must appear
    Required,
    /// Must not appear
    Prohibited,
}

impl AttributeUse {
    /// Parse from the attribute value
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "optional" => Some(Self::Optional),
            "required" => Some(Self::Required),
            "prohibited" => Some(Self::Prohibited),
            _ => None,
        }
    }

    /// The attribute value for this use
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Optional => "optional",
            Self::Required => "required",
            Self::Prohibited => "prohibited",
        }
    }
}

/// An `xs:attribute` declaration, global or local
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeDecl {
    /// Optional id attribute
    pub id: Option<String>,
    /// Name (absent on pure references)
    pub name: Option<String>,
    /// Reference to a global attribute, as a qualified-name string
    pub ref_name: Option<String>,
    /// Type reference, as a qualified-name string
    pub type_name: Option<String>,
    /// Use mode
    pub usage: AttributeUse,
    /// Default value
    pub default: Option<String>,
    /// Fixed value
    pub fixed: Option<String>,
    /// form attribute
    pub form: Option<crate::model::schema::Form>,
    /// Inline anonymous simple type
    pub simple_type: Option<Box<SimpleType>>,
    /// Optional annotation
    pub annotation: Option<Annotation>,
    /// Attributes this construct does not model, preserved as written
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub other_attributes: IndexMap<String, String>,
}

/// An `xs:anyAttribute` wildcard
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnyAttribute {
    /// Optional id attribute
    pub id: Option<String>,
    /// Namespace constraint
    pub namespace: Option<String>,
    /// processContents mode
    pub process_contents: ProcessContents,
    /// Optional annotation
    pub annotation: Option<Annotation>,
}

/// A member of an attribute list: a declaration or a group reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrItem {
    /// An attribute declaration
    Attribute(AttributeDecl),
    /// A reference to a named attribute group
    GroupRef {
        /// Optional id attribute
        id: Option<String>,
        /// Qualified name of the referenced group
        ref_name: String,
    },
}

/// An `xs:attributeGroup` definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeGroup {
    /// Optional id attribute
    pub id: Option<String>,
    /// Group name (top-level definitions only)
    pub name: Option<String>,
    /// Attribute declarations and nested group references, in order
    pub attributes: Vec<AttrItem>,
    /// Optional attribute wildcard
    pub any_attribute: Option<AnyAttribute>,
    /// Optional annotation
    pub annotation: Option<Annotation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_use_default() {
        assert_eq!(AttributeUse::default(), AttributeUse::Optional);
        assert_eq!(AttributeUse::parse("required"), Some(AttributeUse::Required));
        assert_eq!(AttributeUse::parse("bogus"), None);
    }

    #[test]
    fn test_attribute_decl_defaults() {
        let attr = AttributeDecl::default();
        assert_eq!(attr.usage, AttributeUse::Optional);
        assert!(attr.name.is_none());
        assert!(attr.other_attributes.is_empty());
    }
}
