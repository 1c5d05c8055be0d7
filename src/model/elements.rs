//! Element declarations

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::model::annotations::Annotation;
use crate::model::identities::IdentityConstraint;
use crate::model::particles::Occurs;
use crate::model::schema::Form;
use crate::model::types::{ComplexType, SimpleType};

/// An `xs:element` declaration, global or local
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementDecl {
    /// Optional id attribute
    pub id: Option<String>,
    /// Name (absent on pure references)
    pub name: Option<String>,
    /// Reference to a global element, as a qualified-name string
    pub ref_name: Option<String>,
    /// Type reference, as a qualified-name string
    pub type_name: Option<String>,
    /// Occurrence range (local declarations)
    pub occurs: Occurs,
    /// nillable attribute
    pub nillable: bool,
    /// abstract attribute
    pub is_abstract: bool,
    /// Default value
    pub default: Option<String>,
    /// Fixed value
    pub fixed: Option<String>,
    /// form attribute
    pub form: Option<Form>,
    /// substitutionGroup head, as a qualified-name string
    pub substitution_group: Option<String>,
    /// block attribute, as written
    pub block: Option<String>,
    /// final attribute, as written
    pub final_value: Option<String>,
    /// Inline anonymous complex type
    pub complex_type: Option<Box<ComplexType>>,
    /// Inline anonymous simple type
    pub simple_type: Option<Box<SimpleType>>,
    /// key/keyref/unique constraints declared on this element
    pub identities: Vec<IdentityConstraint>,
    /// Optional annotation
    pub annotation: Option<Annotation>,
    /// Attributes this construct does not model, preserved as written
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub other_attributes: IndexMap<String, String>,
}

impl ElementDecl {
    /// Create a named element declaration
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Whether this declaration is a reference to a global element
    pub fn is_reference(&self) -> bool {
        self.ref_name.is_some()
    }

    /// Whether the element carries an inline anonymous type
    pub fn has_inline_type(&self) -> bool {
        self.complex_type.is_some() || self.simple_type.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_defaults() {
        let elem = ElementDecl::named("Person");
        assert_eq!(elem.name.as_deref(), Some("Person"));
        assert!(elem.occurs.is_default());
        assert!(!elem.nillable);
        assert!(!elem.is_abstract);
        assert!(!elem.is_reference());
    }
}
