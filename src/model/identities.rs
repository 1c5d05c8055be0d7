//! Identity constraints: key, keyref and unique
//!
//! Selector and field XPaths are stored verbatim; the engine does not
//! evaluate them.

use serde::{Deserialize, Serialize};

use crate::model::annotations::Annotation;

/// The kind of an identity constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentityKind {
    /// `xs:key`
    Key,
    /// `xs:keyref`
    Keyref,
    /// `xs:unique`
    Unique,
}

impl IdentityKind {
    /// The XSD element name of this kind
    pub fn xml_name(&self) -> &'static str {
        match self {
            Self::Key => "key",
            Self::Keyref => "keyref",
            Self::Unique => "unique",
        }
    }
}

/// An `xs:selector` child
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selector {
    /// Optional id attribute
    pub id: Option<String>,
    /// XPath expression, as written
    pub xpath: String,
}

/// An `xs:field` child
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldRef {
    /// Optional id attribute
    pub id: Option<String>,
    /// XPath expression, as written
    pub xpath: String,
}

/// A key/keyref/unique constraint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityConstraint {
    /// Constraint kind
    pub kind: IdentityKind,
    /// Optional id attribute
    pub id: Option<String>,
    /// Constraint name
    pub name: String,
    /// Referenced key (keyref only), as a qualified-name string
    pub refer: Option<String>,
    /// Selector
    pub selector: Selector,
    /// Fields, in document order
    pub fields: Vec<FieldRef>,
    /// Optional annotation
    pub annotation: Option<Annotation>,
}
