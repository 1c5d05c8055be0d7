//! Typed in-memory representation of XSD constructs
//!
//! Schemas own their immediate children; every cross-schema or cross-type
//! edge is a qualified-name string resolved later through the type index.
//! All model types are plain owned data so the package serialization
//! formats stay lossless.

pub mod annotations;
pub mod attributes;
pub mod elements;
pub mod facets;
pub mod identities;
pub mod imports;
pub mod particles;
pub mod parser;
pub mod schema;
pub mod types;
pub mod version;
pub mod writer;

pub use annotations::{Annotation, AnnotationItem, AppInfo, Documentation};
pub use attributes::{AnyAttribute, AttrItem, AttributeDecl, AttributeGroup, AttributeUse};
pub use elements::ElementDecl;
pub use facets::{Facet, FacetValue};
pub use identities::{FieldRef, IdentityConstraint, IdentityKind, Selector};
pub use imports::{Import, Include, Redefine};
pub use particles::{AnyElement, GroupRef, MaxOccurs, ModelGroup, Occurs, Particle, ProcessContents};
pub use parser::parse_schema_document;
pub use schema::{Form, GroupDef, Notation, Schema, SchemaItem};
pub use types::{
    ComplexType, ContentDerivation, Extension, Restriction, SimpleRestriction, SimpleType,
    SimpleVariety, TypeContent,
};
pub use version::{detect_version, XsdVersion};
pub use writer::{schema_to_xml, EmitState};
