//! Complex and simple type definitions

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::model::annotations::Annotation;
use crate::model::attributes::{AnyAttribute, AttrItem};
use crate::model::facets::Facet;
use crate::model::particles::Particle;

/// An `xs:complexType` definition, named or anonymous
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplexType {
    /// Optional id attribute
    pub id: Option<String>,
    /// Type name (absent on anonymous types)
    pub name: Option<String>,
    /// mixed content flag
    pub mixed: bool,
    /// abstract attribute
    pub is_abstract: bool,
    /// block attribute, as written
    pub block: Option<String>,
    /// final attribute, as written
    pub final_value: Option<String>,
    /// Content model
    pub content: TypeContent,
    /// Attribute declarations and group references, in document order
    pub attributes: Vec<AttrItem>,
    /// Optional attribute wildcard
    pub any_attribute: Option<AnyAttribute>,
    /// Optional annotation
    pub annotation: Option<Annotation>,
    /// Attributes this construct does not model, preserved as written
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub other_attributes: IndexMap<String, String>,
}

impl ComplexType {
    /// The base type this type derives from, if any
    pub fn base_type(&self) -> Option<&str> {
        match &self.content {
            TypeContent::SimpleContent(derivation) => Some(derivation.base()),
            TypeContent::ComplexContent { derivation, .. } => Some(derivation.base()),
            _ => None,
        }
    }

    /// The derivation body, if this type derives from a base
    pub fn derivation(&self) -> Option<&ContentDerivation> {
        match &self.content {
            TypeContent::SimpleContent(derivation) => Some(derivation),
            TypeContent::ComplexContent { derivation, .. } => Some(derivation),
            _ => None,
        }
    }

    /// The effective content-model particle, if any
    pub fn particle(&self) -> Option<&Particle> {
        match &self.content {
            TypeContent::Particle(p) => Some(p),
            TypeContent::ComplexContent { derivation, .. }
            | TypeContent::SimpleContent(derivation) => match derivation {
                ContentDerivation::Extension(e) => e.particle.as_ref(),
                ContentDerivation::Restriction(r) => r.particle.as_ref(),
            },
            TypeContent::Empty => None,
        }
    }
}

/// Content model of a complex type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum TypeContent {
    /// No children
    #[default]
    Empty,
    /// A direct sequence/choice/all/group particle
    Particle(Particle),
    /// `xs:simpleContent`
    SimpleContent(ContentDerivation),
    /// `xs:complexContent`
    ComplexContent {
        /// mixed override on the complexContent element
        mixed: Option<bool>,
        /// Extension or restriction body
        derivation: ContentDerivation,
    },
}

/// Extension or restriction of a base type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ContentDerivation {
    /// `xs:extension`
    Extension(Extension),
    /// `xs:restriction`
    Restriction(Restriction),
}

impl ContentDerivation {
    /// The base type reference, as a qualified-name string
    pub fn base(&self) -> &str {
        match self {
            ContentDerivation::Extension(e) => &e.base,
            ContentDerivation::Restriction(r) => &r.base,
        }
    }
}

/// An `xs:extension` body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extension {
    /// Optional id attribute
    pub id: Option<String>,
    /// Base type reference, as a qualified-name string
    pub base: String,
    /// Added content model, if any
    pub particle: Option<Particle>,
    /// Added attributes
    pub attributes: Vec<AttrItem>,
    /// Optional attribute wildcard
    pub any_attribute: Option<AnyAttribute>,
    /// Optional annotation
    pub annotation: Option<Annotation>,
}

/// An `xs:restriction` body (complex or simple content)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Restriction {
    /// Optional id attribute
    pub id: Option<String>,
    /// Base type reference, as a qualified-name string
    pub base: String,
    /// Restricted content model, if any
    pub particle: Option<Particle>,
    /// Restricted attributes
    pub attributes: Vec<AttrItem>,
    /// Optional attribute wildcard
    pub any_attribute: Option<AnyAttribute>,
    /// Constraining facets (simple-content restrictions)
    pub facets: Vec<Facet>,
    /// Inline simple type (simple-content restrictions)
    pub simple_type: Option<Box<SimpleType>>,
    /// Optional annotation
    pub annotation: Option<Annotation>,
}

/// An `xs:simpleType` definition, named or anonymous
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleType {
    /// Optional id attribute
    pub id: Option<String>,
    /// Type name (absent on anonymous types)
    pub name: Option<String>,
    /// final attribute, as written
    pub final_value: Option<String>,
    /// Derivation variety
    pub variety: SimpleVariety,
    /// Optional annotation
    pub annotation: Option<Annotation>,
    /// Attributes this construct does not model, preserved as written
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub other_attributes: IndexMap<String, String>,
}

impl SimpleType {
    /// The base type this type restricts, if it is a restriction
    pub fn base_type(&self) -> Option<&str> {
        match &self.variety {
            SimpleVariety::Restriction(r) => r.base.as_deref(),
            _ => None,
        }
    }
}

/// The three simple-type varieties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimpleVariety {
    /// Restriction of a base simple type
    Restriction(SimpleRestriction),
    /// List of an item type
    List {
        /// itemType reference, as a qualified-name string
        item_type: Option<String>,
        /// Inline anonymous item type
        simple_type: Option<Box<SimpleType>>,
    },
    /// Union of member types
    Union {
        /// memberTypes references, as qualified-name strings
        member_types: Vec<String>,
        /// Inline anonymous member types
        simple_types: Vec<SimpleType>,
    },
}

impl Default for SimpleVariety {
    fn default() -> Self {
        SimpleVariety::Restriction(SimpleRestriction::default())
    }
}

/// A simple-type restriction body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimpleRestriction {
    /// Base type reference, as a qualified-name string
    pub base: Option<String>,
    /// Inline anonymous base type
    pub simple_type: Option<Box<SimpleType>>,
    /// Constraining facets, in document order
    pub facets: Vec<Facet>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complex_type_base() {
        let ct = ComplexType {
            name: Some("Derived".to_string()),
            content: TypeContent::ComplexContent {
                mixed: None,
                derivation: ContentDerivation::Extension(Extension {
                    base: "p:Base".to_string(),
                    ..Extension::default()
                }),
            },
            ..ComplexType::default()
        };

        assert_eq!(ct.base_type(), Some("p:Base"));
    }

    #[test]
    fn test_simple_type_base() {
        let st = SimpleType {
            id: None,
            name: Some("Code".to_string()),
            final_value: None,
            variety: SimpleVariety::Restriction(SimpleRestriction {
                base: Some("xs:string".to_string()),
                ..SimpleRestriction::default()
            }),
            annotation: None,
            other_attributes: IndexMap::new(),
        };

        assert_eq!(st.base_type(), Some("xs:string"));
    }

    #[test]
    fn test_empty_content_has_no_base() {
        let ct = ComplexType::default();
        assert!(ct.base_type().is_none());
        assert!(ct.particle().is_none());
    }
}
