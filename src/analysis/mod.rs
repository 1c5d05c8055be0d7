//! Schema analyzers
//!
//! Read-only analyses over a resolved repository: type hierarchies,
//! dependency graphs and coverage from entry points. All cross-type edges
//! are qualified-name strings resolved through the type index; cycles in
//! ill-formed schemas are broken with visited sets.

pub mod coverage;
pub mod dependencies;
pub mod hierarchy;

pub use coverage::{coverage, CoverageReport, NamespaceCoverage};
pub use dependencies::{dependencies, dependents, DependencyGraph, DEFAULT_DEPENDENCY_DEPTH};
pub use hierarchy::{type_hierarchy, TypeHierarchy, DEFAULT_HIERARCHY_DEPTH};

use crate::model::{
    AttrItem, AttributeDecl, ComplexType, ContentDerivation, ElementDecl, Particle, SchemaItem,
    SimpleType, SimpleVariety, TypeContent,
};

/// All type references written inside a definition, in document order
///
/// Covers element and attribute types and refs, group and attributeGroup
/// refs, derivation bases, list item types and union member types.
pub fn collect_references(item: &SchemaItem) -> Vec<String> {
    let mut refs = Vec::new();
    match item {
        SchemaItem::Element(element) => collect_element(element, &mut refs),
        SchemaItem::ComplexType(ct) => collect_complex_type(ct, &mut refs),
        SchemaItem::SimpleType(st) => collect_simple_type(st, &mut refs),
        SchemaItem::Attribute(attribute) => collect_attribute(attribute, &mut refs),
        SchemaItem::AttributeGroup(group) => {
            collect_attr_items(&group.attributes, &mut refs);
        }
        SchemaItem::Group(group) => {
            if let Some(particle) = &group.particle {
                collect_particle(particle, &mut refs);
            }
        }
        _ => {}
    }
    refs.dedup();
    refs
}

/// The derivation base written on a type definition, if any
pub fn base_reference(item: &SchemaItem) -> Option<String> {
    match item {
        SchemaItem::ComplexType(ct) => ct.base_type().map(|s| s.to_string()),
        SchemaItem::SimpleType(st) => st.base_type().map(|s| s.to_string()),
        _ => None,
    }
}

fn collect_element(element: &ElementDecl, refs: &mut Vec<String>) {
    if let Some(type_name) = &element.type_name {
        refs.push(type_name.clone());
    }
    if let Some(ref_name) = &element.ref_name {
        refs.push(ref_name.clone());
    }
    if let Some(ct) = &element.complex_type {
        collect_complex_type(ct, refs);
    }
    if let Some(st) = &element.simple_type {
        collect_simple_type(st, refs);
    }
}

fn collect_attribute(attribute: &AttributeDecl, refs: &mut Vec<String>) {
    if let Some(type_name) = &attribute.type_name {
        refs.push(type_name.clone());
    }
    if let Some(ref_name) = &attribute.ref_name {
        refs.push(ref_name.clone());
    }
    if let Some(st) = &attribute.simple_type {
        collect_simple_type(st, refs);
    }
}

fn collect_complex_type(ct: &ComplexType, refs: &mut Vec<String>) {
    match &ct.content {
        TypeContent::Particle(particle) => collect_particle(particle, refs),
        TypeContent::SimpleContent(derivation) | TypeContent::ComplexContent { derivation, .. } => {
            refs.push(derivation.base().to_string());
            let (particle, attributes) = match derivation {
                ContentDerivation::Extension(e) => (e.particle.as_ref(), &e.attributes),
                ContentDerivation::Restriction(r) => (r.particle.as_ref(), &r.attributes),
            };
            if let Some(particle) = particle {
                collect_particle(particle, refs);
            }
            collect_attr_items(attributes, refs);
        }
        TypeContent::Empty => {}
    }
    collect_attr_items(&ct.attributes, refs);
}

fn collect_simple_type(st: &SimpleType, refs: &mut Vec<String>) {
    match &st.variety {
        SimpleVariety::Restriction(restriction) => {
            if let Some(base) = &restriction.base {
                refs.push(base.clone());
            }
            if let Some(inner) = &restriction.simple_type {
                collect_simple_type(inner, refs);
            }
        }
        SimpleVariety::List {
            item_type,
            simple_type,
        } => {
            if let Some(item_type) = item_type {
                refs.push(item_type.clone());
            }
            if let Some(inner) = simple_type {
                collect_simple_type(inner, refs);
            }
        }
        SimpleVariety::Union {
            member_types,
            simple_types,
        } => {
            refs.extend(member_types.iter().cloned());
            for inner in simple_types {
                collect_simple_type(inner, refs);
            }
        }
    }
}

fn collect_particle(particle: &Particle, refs: &mut Vec<String>) {
    match particle {
        Particle::Element(element) => collect_element(element, refs),
        Particle::GroupRef(group) => refs.push(group.ref_name.clone()),
        Particle::Sequence(group) | Particle::Choice(group) | Particle::All(group) => {
            for member in &group.particles {
                collect_particle(member, refs);
            }
        }
        Particle::Any(_) => {}
    }
}

fn collect_attr_items(items: &[AttrItem], refs: &mut Vec<String>) {
    for item in items {
        match item {
            AttrItem::Attribute(attribute) => collect_attribute(attribute, refs),
            AttrItem::GroupRef { ref_name, .. } => refs.push(ref_name.clone()),
        }
    }
}

/// Whether a reference uses an XSD built-in prefix
pub(crate) fn is_builtin_reference(reference: &str) -> bool {
    reference
        .split_once(':')
        .map(|(prefix, _)| crate::repository::closure::BUILTIN_PREFIXES.contains(&prefix))
        .unwrap_or(false)
}
