//! Import, include and redefine references
//!
//! On parse each reference is resolved through the location resolver; the
//! resolved schema is registered in the repository's processed-schemas map
//! under its location string as given, and the reference records that key.
//! When resolution fails the reference remains with a null resolved link
//! and closure validation reports it.

use serde::{Deserialize, Serialize};

use crate::model::annotations::Annotation;
use crate::model::schema::SchemaItem;

/// An `xs:import` reference to a schema in another namespace
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Import {
    /// Optional id attribute
    pub id: Option<String>,
    /// Imported namespace
    pub namespace: Option<String>,
    /// schemaLocation, as written
    pub schema_location: Option<String>,
    /// Processed-schemas key of the resolved schema, when resolution
    /// succeeded
    pub resolved_location: Option<String>,
    /// Optional annotation
    pub annotation: Option<Annotation>,
}

/// An `xs:include` reference to a schema in the same namespace
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Include {
    /// Optional id attribute
    pub id: Option<String>,
    /// schemaLocation, as written
    pub schema_location: Option<String>,
    /// Processed-schemas key of the resolved schema, when resolution
    /// succeeded
    pub resolved_location: Option<String>,
    /// Optional annotation
    pub annotation: Option<Annotation>,
}

/// An `xs:redefine` reference
///
/// Carries the redefining components; only simpleType, complexType, group
/// and attributeGroup children occur here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Redefine {
    /// Optional id attribute
    pub id: Option<String>,
    /// schemaLocation, as written
    pub schema_location: Option<String>,
    /// Processed-schemas key of the resolved schema, when resolution
    /// succeeded
    pub resolved_location: Option<String>,
    /// Redefining components, in document order
    pub items: Vec<SchemaItem>,
    /// Optional annotation
    pub annotation: Option<Annotation>,
}
