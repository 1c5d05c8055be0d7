//! XSD document parsing
//!
//! Binds XML elements to the typed model: one parse function per XSD
//! construct, dispatched from the schema root. Unknown attributes are
//! preserved on each construct; unknown child elements are skipped with a
//! warning.

use indexmap::IndexMap;

use crate::documents::{Document, Element};
use crate::error::{Error, Result, SchemaError};
use crate::model::annotations::{Annotation, AnnotationItem, AppInfo, Documentation};
use crate::model::attributes::{AnyAttribute, AttrItem, AttributeDecl, AttributeGroup, AttributeUse};
use crate::model::elements::ElementDecl;
use crate::model::facets::{Facet, FacetValue};
use crate::model::identities::{FieldRef, IdentityConstraint, IdentityKind, Selector};
use crate::model::imports::{Import, Include, Redefine};
use crate::model::particles::{
    AnyElement, GroupRef, MaxOccurs, ModelGroup, Occurs, Particle, ProcessContents,
};
use crate::model::schema::{Form, GroupDef, Notation, Schema, SchemaItem};
use crate::model::types::{
    ComplexType, ContentDerivation, Extension, Restriction, SimpleRestriction, SimpleType,
    SimpleVariety, TypeContent,
};
use crate::model::version::detect_version;

/// XSD element local names
mod xsd_elements {
    pub const SCHEMA: &str = "schema";
    pub const ELEMENT: &str = "element";
    pub const COMPLEX_TYPE: &str = "complexType";
    pub const SIMPLE_TYPE: &str = "simpleType";
    pub const ATTRIBUTE: &str = "attribute";
    pub const ATTRIBUTE_GROUP: &str = "attributeGroup";
    pub const GROUP: &str = "group";
    pub const SEQUENCE: &str = "sequence";
    pub const CHOICE: &str = "choice";
    pub const ALL: &str = "all";
    pub const ANY: &str = "any";
    pub const ANY_ATTRIBUTE: &str = "anyAttribute";
    pub const ANNOTATION: &str = "annotation";
    pub const DOCUMENTATION: &str = "documentation";
    pub const APPINFO: &str = "appinfo";
    pub const IMPORT: &str = "import";
    pub const INCLUDE: &str = "include";
    pub const REDEFINE: &str = "redefine";
    pub const NOTATION: &str = "notation";
    pub const RESTRICTION: &str = "restriction";
    pub const EXTENSION: &str = "extension";
    pub const SIMPLE_CONTENT: &str = "simpleContent";
    pub const COMPLEX_CONTENT: &str = "complexContent";
    pub const LIST: &str = "list";
    pub const UNION: &str = "union";
    pub const KEY: &str = "key";
    pub const KEYREF: &str = "keyref";
    pub const UNIQUE: &str = "unique";
    pub const SELECTOR: &str = "selector";
    pub const FIELD: &str = "field";
}

/// XSD attribute names
mod xsd_attrs {
    pub const ID: &str = "id";
    pub const NAME: &str = "name";
    pub const REF: &str = "ref";
    pub const TYPE: &str = "type";
    pub const BASE: &str = "base";
    pub const VALUE: &str = "value";
    pub const FIXED: &str = "fixed";
    pub const DEFAULT: &str = "default";
    pub const FORM: &str = "form";
    pub const USE: &str = "use";
    pub const MIXED: &str = "mixed";
    pub const ABSTRACT: &str = "abstract";
    pub const BLOCK: &str = "block";
    pub const FINAL: &str = "final";
    pub const NILLABLE: &str = "nillable";
    pub const MIN_OCCURS: &str = "minOccurs";
    pub const MAX_OCCURS: &str = "maxOccurs";
    pub const NAMESPACE: &str = "namespace";
    pub const SCHEMA_LOCATION: &str = "schemaLocation";
    pub const PROCESS_CONTENTS: &str = "processContents";
    pub const TARGET_NAMESPACE: &str = "targetNamespace";
    pub const VERSION: &str = "version";
    pub const LANG: &str = "lang";
    pub const ELEMENT_FORM_DEFAULT: &str = "elementFormDefault";
    pub const ATTRIBUTE_FORM_DEFAULT: &str = "attributeFormDefault";
    pub const BLOCK_DEFAULT: &str = "blockDefault";
    pub const FINAL_DEFAULT: &str = "finalDefault";
    pub const SUBSTITUTION_GROUP: &str = "substitutionGroup";
    pub const ITEM_TYPE: &str = "itemType";
    pub const MEMBER_TYPES: &str = "memberTypes";
    pub const PUBLIC: &str = "public";
    pub const SYSTEM: &str = "system";
    pub const REFER: &str = "refer";
    pub const XPATH: &str = "xpath";
    pub const SOURCE: &str = "source";
}

/// Parse a schema document into the typed model
///
/// `location` is the schema-location string as given; it is recorded on
/// the schema for diagnostics and indexing.
pub fn parse_schema_document(doc: &Document, location: Option<&str>) -> Result<Schema> {
    let root = doc
        .root()
        .ok_or_else(|| Error::Schema(SchemaError::new("empty document")))?;

    if root.local_name() != xsd_elements::SCHEMA {
        return Err(Error::Schema(
            SchemaError::new(format!(
                "expected xs:schema root element, got '{}'",
                root.local_name()
            ))
            .with_location(location.unwrap_or("<memory>")),
        ));
    }

    if root.namespace.as_deref() != Some(crate::XSD_NAMESPACE) {
        return Err(Error::Schema(
            SchemaError::new(format!(
                "schema root is not in the XML Schema namespace (found '{}')",
                root.namespace.as_deref().unwrap_or("")
            ))
            .with_location(location.unwrap_or("<memory>")),
        ));
    }

    let mut schema = Schema {
        id: attr(root, xsd_attrs::ID),
        lang: attr(root, xsd_attrs::LANG),
        version: attr(root, xsd_attrs::VERSION),
        element_form_default: attr(root, xsd_attrs::ELEMENT_FORM_DEFAULT)
            .and_then(|v| Form::parse(&v))
            .unwrap_or_default(),
        attribute_form_default: attr(root, xsd_attrs::ATTRIBUTE_FORM_DEFAULT)
            .and_then(|v| Form::parse(&v))
            .unwrap_or_default(),
        block_default: attr(root, xsd_attrs::BLOCK_DEFAULT),
        final_default: attr(root, xsd_attrs::FINAL_DEFAULT),
        namespaces: root.namespaces.clone(),
        location: location.map(|s| s.to_string()),
        xsd_version: detect_version(root),
        ..Schema::default()
    };

    // Empty and missing targetNamespace are treated identically
    match attr(root, xsd_attrs::TARGET_NAMESPACE) {
        Some(ns) if ns.is_empty() => {
            tracing::warn!(
                location = location.unwrap_or("<memory>"),
                "empty targetNamespace treated as no target namespace"
            );
        }
        Some(ns) => schema.target_namespace = Some(ns),
        None => {}
    }

    schema.other_attributes = other_attrs(
        root,
        &[
            xsd_attrs::ID,
            xsd_attrs::LANG,
            xsd_attrs::VERSION,
            xsd_attrs::TARGET_NAMESPACE,
            xsd_attrs::ELEMENT_FORM_DEFAULT,
            xsd_attrs::ATTRIBUTE_FORM_DEFAULT,
            xsd_attrs::BLOCK_DEFAULT,
            xsd_attrs::FINAL_DEFAULT,
        ],
    );

    for child in &root.children {
        if let Some(item) = parse_schema_child(child)? {
            schema.items.push(item);
        }
    }

    Ok(schema)
}

fn parse_schema_child(elem: &Element) -> Result<Option<SchemaItem>> {
    let item = match elem.local_name() {
        xsd_elements::ANNOTATION => SchemaItem::Annotation(parse_annotation(elem)),
        xsd_elements::IMPORT => SchemaItem::Import(parse_import(elem)),
        xsd_elements::INCLUDE => SchemaItem::Include(parse_include(elem)),
        xsd_elements::REDEFINE => SchemaItem::Redefine(parse_redefine(elem)?),
        xsd_elements::ELEMENT => SchemaItem::Element(parse_element(elem)?),
        xsd_elements::COMPLEX_TYPE => SchemaItem::ComplexType(parse_complex_type(elem)?),
        xsd_elements::SIMPLE_TYPE => SchemaItem::SimpleType(parse_simple_type(elem)?),
        xsd_elements::ATTRIBUTE => SchemaItem::Attribute(parse_attribute(elem)?),
        xsd_elements::ATTRIBUTE_GROUP => SchemaItem::AttributeGroup(parse_attribute_group(elem)?),
        xsd_elements::GROUP => SchemaItem::Group(parse_group_def(elem)?),
        xsd_elements::NOTATION => SchemaItem::Notation(parse_notation(elem)),
        other => {
            tracing::warn!(element = other, "skipping unknown schema child");
            return Ok(None);
        }
    };
    Ok(Some(item))
}

// ========== Leaf helpers ==========

fn attr(elem: &Element, name: &str) -> Option<String> {
    elem.get_attribute(name).map(|s| s.to_string())
}

fn bool_attr(elem: &Element, name: &str) -> bool {
    matches!(elem.get_attribute(name), Some("true") | Some("1"))
}

fn other_attrs(elem: &Element, known: &[&str]) -> IndexMap<String, String> {
    elem.attributes
        .iter()
        .filter(|(name, _)| !known.contains(&name.as_str()))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

fn parse_occurs(elem: &Element) -> Result<Occurs> {
    let mut occurs = Occurs::default();

    if let Some(min) = elem.get_attribute(xsd_attrs::MIN_OCCURS) {
        occurs.min = min.parse().map_err(|_| {
            Error::Schema(SchemaError::new(format!("invalid minOccurs '{}'", min)))
        })?;
    }

    if let Some(max) = elem.get_attribute(xsd_attrs::MAX_OCCURS) {
        occurs.max = if max == "unbounded" {
            MaxOccurs::Unbounded
        } else {
            MaxOccurs::Bounded(max.parse().map_err(|_| {
                Error::Schema(SchemaError::new(format!("invalid maxOccurs '{}'", max)))
            })?)
        };
    }

    Ok(occurs)
}

fn child_annotation(elem: &Element) -> Option<Annotation> {
    elem.find_child(xsd_elements::ANNOTATION).map(parse_annotation)
}

// ========== Annotations ==========

fn parse_annotation(elem: &Element) -> Annotation {
    let mut annotation = Annotation {
        id: attr(elem, xsd_attrs::ID),
        items: Vec::new(),
    };

    for child in &elem.children {
        match child.local_name() {
            xsd_elements::DOCUMENTATION => {
                annotation.items.push(AnnotationItem::Documentation(Documentation {
                    source: attr(child, xsd_attrs::SOURCE),
                    lang: attr(child, xsd_attrs::LANG),
                    content: child.text.clone().unwrap_or_default(),
                }));
            }
            xsd_elements::APPINFO => {
                annotation.items.push(AnnotationItem::AppInfo(AppInfo {
                    source: attr(child, xsd_attrs::SOURCE),
                    content: child.text.clone().unwrap_or_default(),
                }));
            }
            _ => {}
        }
    }

    annotation
}

// ========== Imports, includes, redefines ==========

fn parse_import(elem: &Element) -> Import {
    Import {
        id: attr(elem, xsd_attrs::ID),
        namespace: attr(elem, xsd_attrs::NAMESPACE),
        schema_location: attr(elem, xsd_attrs::SCHEMA_LOCATION),
        resolved_location: None,
        annotation: child_annotation(elem),
    }
}

fn parse_include(elem: &Element) -> Include {
    Include {
        id: attr(elem, xsd_attrs::ID),
        schema_location: attr(elem, xsd_attrs::SCHEMA_LOCATION),
        resolved_location: None,
        annotation: child_annotation(elem),
    }
}

fn parse_redefine(elem: &Element) -> Result<Redefine> {
    let mut redefine = Redefine {
        id: attr(elem, xsd_attrs::ID),
        schema_location: attr(elem, xsd_attrs::SCHEMA_LOCATION),
        resolved_location: None,
        annotation: child_annotation(elem),
        items: Vec::new(),
    };

    for child in &elem.children {
        match child.local_name() {
            xsd_elements::SIMPLE_TYPE => redefine
                .items
                .push(SchemaItem::SimpleType(parse_simple_type(child)?)),
            xsd_elements::COMPLEX_TYPE => redefine
                .items
                .push(SchemaItem::ComplexType(parse_complex_type(child)?)),
            xsd_elements::GROUP => redefine.items.push(SchemaItem::Group(parse_group_def(child)?)),
            xsd_elements::ATTRIBUTE_GROUP => redefine
                .items
                .push(SchemaItem::AttributeGroup(parse_attribute_group(child)?)),
            _ => {}
        }
    }

    Ok(redefine)
}

fn parse_notation(elem: &Element) -> Notation {
    Notation {
        id: attr(elem, xsd_attrs::ID),
        name: attr(elem, xsd_attrs::NAME).unwrap_or_default(),
        public: attr(elem, xsd_attrs::PUBLIC),
        system: attr(elem, xsd_attrs::SYSTEM),
        annotation: child_annotation(elem),
    }
}

// ========== Elements ==========

fn parse_element(elem: &Element) -> Result<ElementDecl> {
    let mut decl = ElementDecl {
        id: attr(elem, xsd_attrs::ID),
        name: attr(elem, xsd_attrs::NAME),
        ref_name: attr(elem, xsd_attrs::REF),
        type_name: attr(elem, xsd_attrs::TYPE),
        occurs: parse_occurs(elem)?,
        nillable: bool_attr(elem, xsd_attrs::NILLABLE),
        is_abstract: bool_attr(elem, xsd_attrs::ABSTRACT),
        default: attr(elem, xsd_attrs::DEFAULT),
        fixed: attr(elem, xsd_attrs::FIXED),
        form: attr(elem, xsd_attrs::FORM).and_then(|v| Form::parse(&v)),
        substitution_group: attr(elem, xsd_attrs::SUBSTITUTION_GROUP),
        block: attr(elem, xsd_attrs::BLOCK),
        final_value: attr(elem, xsd_attrs::FINAL),
        annotation: child_annotation(elem),
        ..ElementDecl::default()
    };

    if decl.name.is_none() && decl.ref_name.is_none() {
        return Err(Error::Schema(SchemaError::new(
            "element declaration has neither 'name' nor 'ref'",
        )));
    }

    decl.other_attributes = other_attrs(
        elem,
        &[
            xsd_attrs::ID,
            xsd_attrs::NAME,
            xsd_attrs::REF,
            xsd_attrs::TYPE,
            xsd_attrs::MIN_OCCURS,
            xsd_attrs::MAX_OCCURS,
            xsd_attrs::NILLABLE,
            xsd_attrs::ABSTRACT,
            xsd_attrs::DEFAULT,
            xsd_attrs::FIXED,
            xsd_attrs::FORM,
            xsd_attrs::SUBSTITUTION_GROUP,
            xsd_attrs::BLOCK,
            xsd_attrs::FINAL,
        ],
    );

    for child in &elem.children {
        match child.local_name() {
            xsd_elements::COMPLEX_TYPE => {
                decl.complex_type = Some(Box::new(parse_complex_type(child)?));
            }
            xsd_elements::SIMPLE_TYPE => {
                decl.simple_type = Some(Box::new(parse_simple_type(child)?));
            }
            xsd_elements::KEY => decl.identities.push(parse_identity(child, IdentityKind::Key)?),
            xsd_elements::KEYREF => {
                decl.identities.push(parse_identity(child, IdentityKind::Keyref)?)
            }
            xsd_elements::UNIQUE => {
                decl.identities.push(parse_identity(child, IdentityKind::Unique)?)
            }
            _ => {}
        }
    }

    Ok(decl)
}

fn parse_identity(elem: &Element, kind: IdentityKind) -> Result<IdentityConstraint> {
    let name = attr(elem, xsd_attrs::NAME).ok_or_else(|| {
        Error::Schema(SchemaError::new(format!(
            "{} constraint missing 'name'",
            kind.xml_name()
        )))
    })?;

    let selector = elem
        .find_child(xsd_elements::SELECTOR)
        .map(|s| Selector {
            id: attr(s, xsd_attrs::ID),
            xpath: attr(s, xsd_attrs::XPATH).unwrap_or_default(),
        })
        .ok_or_else(|| {
            Error::Schema(SchemaError::new(format!(
                "{} constraint '{}' missing selector",
                kind.xml_name(),
                name
            )))
        })?;

    let fields = elem
        .children_named(xsd_elements::FIELD)
        .map(|f| FieldRef {
            id: attr(f, xsd_attrs::ID),
            xpath: attr(f, xsd_attrs::XPATH).unwrap_or_default(),
        })
        .collect();

    Ok(IdentityConstraint {
        kind,
        id: attr(elem, xsd_attrs::ID),
        name,
        refer: attr(elem, xsd_attrs::REFER),
        selector,
        fields,
        annotation: child_annotation(elem),
    })
}

// ========== Attributes ==========

fn parse_attribute(elem: &Element) -> Result<AttributeDecl> {
    let mut decl = AttributeDecl {
        id: attr(elem, xsd_attrs::ID),
        name: attr(elem, xsd_attrs::NAME),
        ref_name: attr(elem, xsd_attrs::REF),
        type_name: attr(elem, xsd_attrs::TYPE),
        usage: attr(elem, xsd_attrs::USE)
            .and_then(|v| AttributeUse::parse(&v))
            .unwrap_or_default(),
        default: attr(elem, xsd_attrs::DEFAULT),
        fixed: attr(elem, xsd_attrs::FIXED),
        form: attr(elem, xsd_attrs::FORM).and_then(|v| Form::parse(&v)),
        annotation: child_annotation(elem),
        ..AttributeDecl::default()
    };

    if decl.name.is_none() && decl.ref_name.is_none() {
        return Err(Error::Schema(SchemaError::new(
            "attribute declaration has neither 'name' nor 'ref'",
        )));
    }

    decl.other_attributes = other_attrs(
        elem,
        &[
            xsd_attrs::ID,
            xsd_attrs::NAME,
            xsd_attrs::REF,
            xsd_attrs::TYPE,
            xsd_attrs::USE,
            xsd_attrs::DEFAULT,
            xsd_attrs::FIXED,
            xsd_attrs::FORM,
        ],
    );

    if let Some(child) = elem.find_child(xsd_elements::SIMPLE_TYPE) {
        decl.simple_type = Some(Box::new(parse_simple_type(child)?));
    }

    Ok(decl)
}

fn parse_any_attribute(elem: &Element) -> AnyAttribute {
    AnyAttribute {
        id: attr(elem, xsd_attrs::ID),
        namespace: attr(elem, xsd_attrs::NAMESPACE),
        process_contents: attr(elem, xsd_attrs::PROCESS_CONTENTS)
            .and_then(|v| ProcessContents::parse(&v))
            .unwrap_or_default(),
        annotation: child_annotation(elem),
    }
}

fn parse_attribute_group(elem: &Element) -> Result<AttributeGroup> {
    let mut group = AttributeGroup {
        id: attr(elem, xsd_attrs::ID),
        name: attr(elem, xsd_attrs::NAME),
        annotation: child_annotation(elem),
        ..AttributeGroup::default()
    };

    // A reference form (attributeGroup ref="…") inside another group is
    // handled by parse_attr_items; here ref becomes a single member.
    if let Some(ref_name) = attr(elem, xsd_attrs::REF) {
        group.attributes.push(AttrItem::GroupRef {
            id: None,
            ref_name,
        });
        return Ok(group);
    }

    let (attributes, any_attribute) = parse_attr_items(elem)?;
    group.attributes = attributes;
    group.any_attribute = any_attribute;

    Ok(group)
}

/// Collect attribute/attributeGroup/anyAttribute children of a construct
fn parse_attr_items(elem: &Element) -> Result<(Vec<AttrItem>, Option<AnyAttribute>)> {
    let mut items = Vec::new();
    let mut any_attribute = None;

    for child in &elem.children {
        match child.local_name() {
            xsd_elements::ATTRIBUTE => {
                items.push(AttrItem::Attribute(parse_attribute(child)?));
            }
            xsd_elements::ATTRIBUTE_GROUP => {
                if let Some(ref_name) = attr(child, xsd_attrs::REF) {
                    items.push(AttrItem::GroupRef {
                        id: attr(child, xsd_attrs::ID),
                        ref_name,
                    });
                }
            }
            xsd_elements::ANY_ATTRIBUTE => {
                any_attribute = Some(parse_any_attribute(child));
            }
            _ => {}
        }
    }

    Ok((items, any_attribute))
}

// ========== Groups and particles ==========

fn parse_group_def(elem: &Element) -> Result<GroupDef> {
    let name = attr(elem, xsd_attrs::NAME).ok_or_else(|| {
        Error::Schema(SchemaError::new("group definition missing 'name'"))
    })?;

    let mut group = GroupDef {
        id: attr(elem, xsd_attrs::ID),
        name,
        particle: None,
        annotation: child_annotation(elem),
    };

    for child in &elem.children {
        if let Some(particle) = parse_particle(child)? {
            group.particle = Some(particle);
            break;
        }
    }

    Ok(group)
}

/// Parse a single content-model particle, if the element is one
fn parse_particle(elem: &Element) -> Result<Option<Particle>> {
    let particle = match elem.local_name() {
        xsd_elements::SEQUENCE => Particle::Sequence(parse_model_group(elem)?),
        xsd_elements::CHOICE => Particle::Choice(parse_model_group(elem)?),
        xsd_elements::ALL => Particle::All(parse_model_group(elem)?),
        xsd_elements::ELEMENT => Particle::Element(Box::new(parse_element(elem)?)),
        xsd_elements::ANY => Particle::Any(AnyElement {
            id: attr(elem, xsd_attrs::ID),
            namespace: attr(elem, xsd_attrs::NAMESPACE),
            process_contents: attr(elem, xsd_attrs::PROCESS_CONTENTS)
                .and_then(|v| ProcessContents::parse(&v))
                .unwrap_or_default(),
            occurs: parse_occurs(elem)?,
            annotation: child_annotation(elem),
        }),
        xsd_elements::GROUP => {
            let ref_name = attr(elem, xsd_attrs::REF).ok_or_else(|| {
                Error::Schema(SchemaError::new("group particle missing 'ref'"))
            })?;
            Particle::GroupRef(GroupRef {
                id: attr(elem, xsd_attrs::ID),
                ref_name,
                occurs: parse_occurs(elem)?,
                annotation: child_annotation(elem),
            })
        }
        _ => return Ok(None),
    };
    Ok(Some(particle))
}

fn parse_model_group(elem: &Element) -> Result<ModelGroup> {
    let mut group = ModelGroup {
        id: attr(elem, xsd_attrs::ID),
        occurs: parse_occurs(elem)?,
        annotation: child_annotation(elem),
        particles: Vec::new(),
    };

    for child in &elem.children {
        if let Some(particle) = parse_particle(child)? {
            group.particles.push(particle);
        }
    }

    Ok(group)
}

// ========== Complex types ==========

fn parse_complex_type(elem: &Element) -> Result<ComplexType> {
    let mut ct = ComplexType {
        id: attr(elem, xsd_attrs::ID),
        name: attr(elem, xsd_attrs::NAME),
        mixed: bool_attr(elem, xsd_attrs::MIXED),
        is_abstract: bool_attr(elem, xsd_attrs::ABSTRACT),
        block: attr(elem, xsd_attrs::BLOCK),
        final_value: attr(elem, xsd_attrs::FINAL),
        annotation: child_annotation(elem),
        ..ComplexType::default()
    };

    ct.other_attributes = other_attrs(
        elem,
        &[
            xsd_attrs::ID,
            xsd_attrs::NAME,
            xsd_attrs::MIXED,
            xsd_attrs::ABSTRACT,
            xsd_attrs::BLOCK,
            xsd_attrs::FINAL,
        ],
    );

    for child in &elem.children {
        match child.local_name() {
            xsd_elements::SIMPLE_CONTENT => {
                ct.content = TypeContent::SimpleContent(parse_content_derivation(child, true)?);
            }
            xsd_elements::COMPLEX_CONTENT => {
                let mixed = child
                    .get_attribute(xsd_attrs::MIXED)
                    .map(|v| v == "true" || v == "1");
                ct.content = TypeContent::ComplexContent {
                    mixed,
                    derivation: parse_content_derivation(child, false)?,
                };
            }
            _ => {
                if let Some(particle) = parse_particle(child)? {
                    ct.content = TypeContent::Particle(particle);
                }
            }
        }
    }

    let (attributes, any_attribute) = parse_attr_items(elem)?;
    ct.attributes = attributes;
    ct.any_attribute = any_attribute;

    Ok(ct)
}

fn parse_content_derivation(elem: &Element, simple: bool) -> Result<ContentDerivation> {
    for child in &elem.children {
        match child.local_name() {
            xsd_elements::EXTENSION => {
                let base = require_base(child)?;
                let mut extension = Extension {
                    id: attr(child, xsd_attrs::ID),
                    base,
                    annotation: child_annotation(child),
                    ..Extension::default()
                };
                for grandchild in &child.children {
                    if let Some(particle) = parse_particle(grandchild)? {
                        extension.particle = Some(particle);
                        break;
                    }
                }
                let (attributes, any_attribute) = parse_attr_items(child)?;
                extension.attributes = attributes;
                extension.any_attribute = any_attribute;
                return Ok(ContentDerivation::Extension(extension));
            }
            xsd_elements::RESTRICTION => {
                let base = require_base(child)?;
                let mut restriction = Restriction {
                    id: attr(child, xsd_attrs::ID),
                    base,
                    annotation: child_annotation(child),
                    ..Restriction::default()
                };
                for grandchild in &child.children {
                    if let Some(particle) = parse_particle(grandchild)? {
                        restriction.particle = Some(particle);
                        break;
                    }
                }
                if simple {
                    restriction.facets = parse_facets(child);
                    if let Some(st) = child.find_child(xsd_elements::SIMPLE_TYPE) {
                        restriction.simple_type = Some(Box::new(parse_simple_type(st)?));
                    }
                }
                let (attributes, any_attribute) = parse_attr_items(child)?;
                restriction.attributes = attributes;
                restriction.any_attribute = any_attribute;
                return Ok(ContentDerivation::Restriction(restriction));
            }
            _ => {}
        }
    }

    Err(Error::Schema(SchemaError::new(format!(
        "{} without extension or restriction",
        elem.local_name()
    ))))
}

fn require_base(elem: &Element) -> Result<String> {
    attr(elem, xsd_attrs::BASE).ok_or_else(|| {
        Error::Schema(SchemaError::new(format!(
            "{} missing 'base' attribute",
            elem.local_name()
        )))
    })
}

// ========== Simple types ==========

fn parse_simple_type(elem: &Element) -> Result<SimpleType> {
    let mut st = SimpleType {
        id: attr(elem, xsd_attrs::ID),
        name: attr(elem, xsd_attrs::NAME),
        final_value: attr(elem, xsd_attrs::FINAL),
        variety: SimpleVariety::default(),
        annotation: child_annotation(elem),
        other_attributes: other_attrs(
            elem,
            &[xsd_attrs::ID, xsd_attrs::NAME, xsd_attrs::FINAL],
        ),
    };

    for child in &elem.children {
        match child.local_name() {
            xsd_elements::RESTRICTION => {
                let mut restriction = SimpleRestriction {
                    base: attr(child, xsd_attrs::BASE),
                    simple_type: None,
                    facets: parse_facets(child),
                };
                if let Some(inner) = child.find_child(xsd_elements::SIMPLE_TYPE) {
                    restriction.simple_type = Some(Box::new(parse_simple_type(inner)?));
                }
                st.variety = SimpleVariety::Restriction(restriction);
            }
            xsd_elements::LIST => {
                let simple_type = match child.find_child(xsd_elements::SIMPLE_TYPE) {
                    Some(inner) => Some(Box::new(parse_simple_type(inner)?)),
                    None => None,
                };
                st.variety = SimpleVariety::List {
                    item_type: attr(child, xsd_attrs::ITEM_TYPE),
                    simple_type,
                };
            }
            xsd_elements::UNION => {
                let member_types = attr(child, xsd_attrs::MEMBER_TYPES)
                    .map(|v| v.split_whitespace().map(|s| s.to_string()).collect())
                    .unwrap_or_default();
                let mut simple_types = Vec::new();
                for inner in child.children_named(xsd_elements::SIMPLE_TYPE) {
                    simple_types.push(parse_simple_type(inner)?);
                }
                st.variety = SimpleVariety::Union {
                    member_types,
                    simple_types,
                };
            }
            _ => {}
        }
    }

    Ok(st)
}

fn parse_facets(elem: &Element) -> Vec<Facet> {
    let mut facets = Vec::new();

    for child in &elem.children {
        let value = FacetValue {
            id: attr(child, xsd_attrs::ID),
            value: attr(child, xsd_attrs::VALUE).unwrap_or_default(),
            fixed: bool_attr(child, xsd_attrs::FIXED),
            annotation: child_annotation(child),
        };
        if let Some(facet) = Facet::from_xml_name(child.local_name(), value) {
            facets.push(facet);
        }
    }

    facets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(xml: &str) -> Schema {
        let doc = Document::from_string(xml).unwrap();
        parse_schema_document(&doc, Some("test.xsd")).unwrap()
    }

    const PERSON_XSD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           xmlns:p="http://example.com/person"
           targetNamespace="http://example.com/person"
           elementFormDefault="qualified">
  <xs:element name="Person" type="p:PersonType"/>
  <xs:complexType name="PersonType">
    <xs:sequence>
      <xs:element name="Name" type="xs:string"/>
      <xs:element name="Age" type="xs:int" minOccurs="0"/>
    </xs:sequence>
    <xs:attribute name="id" type="xs:ID" use="required"/>
  </xs:complexType>
</xs:schema>"#;

    #[test]
    fn test_parse_schema_attributes() {
        let schema = parse(PERSON_XSD);

        assert_eq!(
            schema.target_namespace.as_deref(),
            Some("http://example.com/person")
        );
        assert_eq!(schema.element_form_default, Form::Qualified);
        assert_eq!(schema.attribute_form_default, Form::Unqualified);
        assert_eq!(schema.location.as_deref(), Some("test.xsd"));
        assert_eq!(schema.items.len(), 2);
    }

    #[test]
    fn test_parse_element_and_complex_type() {
        let schema = parse(PERSON_XSD);

        let SchemaItem::Element(element) = &schema.items[0] else {
            panic!("expected element");
        };
        assert_eq!(element.name.as_deref(), Some("Person"));
        assert_eq!(element.type_name.as_deref(), Some("p:PersonType"));

        let SchemaItem::ComplexType(ct) = &schema.items[1] else {
            panic!("expected complexType");
        };
        assert_eq!(ct.name.as_deref(), Some("PersonType"));

        let Some(Particle::Sequence(seq)) = ct.particle() else {
            panic!("expected sequence");
        };
        assert_eq!(seq.particles.len(), 2);

        let Particle::Element(age) = &seq.particles[1] else {
            panic!("expected element particle");
        };
        assert_eq!(age.occurs.min, 0);

        assert_eq!(ct.attributes.len(), 1);
        let AttrItem::Attribute(id_attr) = &ct.attributes[0] else {
            panic!("expected attribute");
        };
        assert_eq!(id_attr.usage, AttributeUse::Required);
    }

    #[test]
    fn test_parse_simple_type_with_facets() {
        let schema = parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:a">
  <xs:simpleType name="Code">
    <xs:restriction base="xs:string">
      <xs:pattern value="[A-Z]{2}"/>
      <xs:enumeration value="AB"/>
      <xs:enumeration value="CD"/>
    </xs:restriction>
  </xs:simpleType>
</xs:schema>"#,
        );

        let SchemaItem::SimpleType(st) = &schema.items[0] else {
            panic!("expected simpleType");
        };
        assert_eq!(st.base_type(), Some("xs:string"));

        let SimpleVariety::Restriction(r) = &st.variety else {
            panic!("expected restriction");
        };
        assert_eq!(r.facets.len(), 3);
        assert!(matches!(r.facets[0], Facet::Pattern(_)));
    }

    #[test]
    fn test_parse_extension() {
        let schema = parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           xmlns:a="urn:a" targetNamespace="urn:a">
  <xs:complexType name="Derived">
    <xs:complexContent>
      <xs:extension base="a:Base">
        <xs:sequence>
          <xs:element name="Extra" type="xs:string"/>
        </xs:sequence>
      </xs:extension>
    </xs:complexContent>
  </xs:complexType>
</xs:schema>"#,
        );

        let SchemaItem::ComplexType(ct) = &schema.items[0] else {
            panic!("expected complexType");
        };
        assert_eq!(ct.base_type(), Some("a:Base"));
        assert!(ct.particle().is_some());
    }

    #[test]
    fn test_parse_import_include() {
        let schema = parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:a">
  <xs:import namespace="urn:b" schemaLocation="b.xsd"/>
  <xs:include schemaLocation="a2.xsd"/>
</xs:schema>"#,
        );

        let import = schema.imports().next().unwrap();
        assert_eq!(import.namespace.as_deref(), Some("urn:b"));
        assert_eq!(import.schema_location.as_deref(), Some("b.xsd"));
        assert!(import.resolved_location.is_none());

        let include = schema.includes().next().unwrap();
        assert_eq!(include.schema_location.as_deref(), Some("a2.xsd"));
    }

    #[test]
    fn test_empty_target_namespace_normalized() {
        let schema = parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace=""/>"#,
        );
        assert!(schema.target_namespace.is_none());
        assert!(!schema.is_valid_for_use());
    }

    #[test]
    fn test_unknown_attributes_preserved() {
        let schema = parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                targetNamespace="urn:a" custom="kept"/>"#,
        );
        assert_eq!(
            schema.other_attributes.get("custom").map(|s| s.as_str()),
            Some("kept")
        );
    }

    #[test]
    fn test_wrong_root_rejected() {
        let doc = Document::from_string("<root/>").unwrap();
        let result = parse_schema_document(&doc, None);
        assert!(matches!(result, Err(Error::Schema(_))));
    }

    #[test]
    fn test_wrong_namespace_rejected() {
        let doc = Document::from_string(
            r#"<schema xmlns="http://wrong.example.com/ns"/>"#,
        )
        .unwrap();
        let result = parse_schema_document(&doc, None);
        assert!(matches!(result, Err(Error::Schema(_))));
    }

    #[test]
    fn test_parse_identity_constraints() {
        let schema = parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:a">
  <xs:element name="items">
    <xs:complexType>
      <xs:sequence>
        <xs:element name="item" maxOccurs="unbounded"/>
      </xs:sequence>
    </xs:complexType>
    <xs:key name="itemKey">
      <xs:selector xpath=".//item"/>
      <xs:field xpath="@id"/>
    </xs:key>
  </xs:element>
</xs:schema>"#,
        );

        let SchemaItem::Element(element) = &schema.items[0] else {
            panic!("expected element");
        };
        assert_eq!(element.identities.len(), 1);
        assert_eq!(element.identities[0].kind, IdentityKind::Key);
        assert_eq!(element.identities[0].selector.xpath, ".//item");
        assert_eq!(element.identities[0].fields.len(), 1);
    }
}
