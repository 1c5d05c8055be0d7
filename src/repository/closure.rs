//! Reference-closure validation
//!
//! Walks every reference in every processed schema and reports the ones
//! that do not resolve through the type index: element/attribute type
//! references, derivation bases, element/attribute/group/attributeGroup
//! refs, import namespaces and include targets. Built-in types are
//! identified solely by prefix (`xs:`, `xsd:`, `xsi:`).

use serde::{Deserialize, Serialize};

use crate::model::{
    AttrItem, AttributeDecl, ComplexType, ContentDerivation, ElementDecl, Particle, Schema,
    SchemaItem, SimpleType, SimpleVariety, TypeContent,
};
use crate::repository::index::{TypeCategory, TypeIndex};
use crate::repository::loader::ProcessedSchemas;

/// Prefixes that denote XSD built-in namespaces
pub const BUILTIN_PREFIXES: &[&str] = &["xs", "xsd", "xsi"];

/// Severity of a closure issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Must be fixed
    Error,
    /// Degraded but tolerated
    Warning,
}

/// The kind of a closure issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// A type reference did not resolve
    UnresolvedType,
    /// An element ref did not resolve
    UnresolvedElementRef,
    /// An attribute ref did not resolve
    UnresolvedAttributeRef,
    /// A group ref did not resolve
    UnresolvedGroupRef,
    /// An attributeGroup ref did not resolve
    UnresolvedAttributeGroupRef,
    /// A derivation base did not resolve
    UnresolvedBase,
    /// An imported namespace is not covered by any processed schema
    MissingImport,
    /// An include target was not resolved
    MissingInclude,
    /// Two declarations under one (category, Clark key)
    DuplicateDefinition,
}

/// One closure issue with its context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosureIssue {
    /// Issue kind
    pub kind: IssueKind,
    /// Severity
    pub severity: Severity,
    /// The qualified name that failed, as written
    pub qname: Option<String>,
    /// Location key of the schema the reference came from
    pub schema: Option<String>,
    /// Containing construct
    pub construct: Option<String>,
    /// Human-readable message
    pub message: String,
}

/// Result of a closure validation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosureReport {
    /// Whether no errors were found
    pub valid: bool,
    /// Errors
    pub errors: Vec<ClosureIssue>,
    /// Warnings
    pub warnings: Vec<ClosureIssue>,
}

impl ClosureReport {
    /// Total number of issues
    pub fn issue_count(&self) -> usize {
        self.errors.len() + self.warnings.len()
    }
}

/// Validate reference closure over all processed schemas
///
/// With `allow_external` set, missing import/include targets are reported
/// as warnings instead of errors.
pub fn validate_closure(
    processed: &ProcessedSchemas,
    index: &TypeIndex,
    allow_external: bool,
) -> ClosureReport {
    let mut walker = Walker {
        index,
        processed,
        allow_external,
        issues: Vec::new(),
        schema: None,
    };

    for (key, schema) in processed.iter() {
        walker.schema = Some(key.to_string());
        walker.walk_schema(schema);
    }

    for duplicate in index.duplicates() {
        walker.issues.push(ClosureIssue {
            kind: IssueKind::DuplicateDefinition,
            severity: Severity::Error,
            qname: Some(duplicate.clark_key.clone()),
            schema: duplicate.duplicate_location.clone(),
            construct: Some(duplicate.category.to_string()),
            message: format!(
                "duplicate {} definition '{}' (first defined in {})",
                duplicate.category,
                duplicate.clark_key,
                duplicate.first_location.as_deref().unwrap_or("<unknown>")
            ),
        });
    }

    let (errors, warnings): (Vec<_>, Vec<_>) = walker
        .issues
        .into_iter()
        .partition(|issue| issue.severity == Severity::Error);

    ClosureReport {
        valid: errors.is_empty(),
        errors,
        warnings,
    }
}

struct Walker<'a> {
    index: &'a TypeIndex,
    processed: &'a ProcessedSchemas,
    allow_external: bool,
    issues: Vec<ClosureIssue>,
    schema: Option<String>,
}

impl Walker<'_> {
    fn walk_schema(&mut self, schema: &Schema) {
        for item in &schema.items {
            match item {
                SchemaItem::Element(element) => {
                    self.walk_element(schema, element);
                }
                SchemaItem::ComplexType(ct) => {
                    self.walk_complex_type(schema, ct);
                }
                SchemaItem::SimpleType(st) => {
                    self.walk_simple_type(schema, st);
                }
                SchemaItem::Attribute(attribute) => {
                    self.walk_attribute(schema, attribute);
                }
                SchemaItem::AttributeGroup(group) => {
                    let construct = format!(
                        "attributeGroup '{}'",
                        group.name.as_deref().unwrap_or("<anonymous>")
                    );
                    self.walk_attr_items(schema, &group.attributes, &construct);
                }
                SchemaItem::Group(group) => {
                    if let Some(particle) = &group.particle {
                        let construct = format!("group '{}'", group.name);
                        self.walk_particle(schema, particle, &construct);
                    }
                }
                SchemaItem::Import(import) => {
                    self.check_import(import);
                }
                SchemaItem::Include(include) => {
                    self.check_include(include);
                }
                _ => {}
            }
        }
    }

    fn walk_element(&mut self, schema: &Schema, element: &ElementDecl) {
        let construct = format!(
            "element '{}'",
            element
                .name
                .as_deref()
                .or(element.ref_name.as_deref())
                .unwrap_or("<anonymous>")
        );

        if let Some(type_name) = &element.type_name {
            self.check_reference(
                schema,
                type_name,
                &TypeCategory::TYPES,
                IssueKind::UnresolvedType,
                &construct,
            );
        }
        if let Some(ref_name) = &element.ref_name {
            self.check_reference(
                schema,
                ref_name,
                &[TypeCategory::Element],
                IssueKind::UnresolvedElementRef,
                &construct,
            );
        }
        if let Some(ct) = &element.complex_type {
            self.walk_complex_type(schema, ct);
        }
        if let Some(st) = &element.simple_type {
            self.walk_simple_type(schema, st);
        }
    }

    fn walk_attribute(&mut self, schema: &Schema, attribute: &AttributeDecl) {
        let construct = format!(
            "attribute '{}'",
            attribute
                .name
                .as_deref()
                .or(attribute.ref_name.as_deref())
                .unwrap_or("<anonymous>")
        );

        if let Some(type_name) = &attribute.type_name {
            self.check_reference(
                schema,
                type_name,
                &TypeCategory::TYPES,
                IssueKind::UnresolvedType,
                &construct,
            );
        }
        if let Some(ref_name) = &attribute.ref_name {
            self.check_reference(
                schema,
                ref_name,
                &[TypeCategory::Attribute],
                IssueKind::UnresolvedAttributeRef,
                &construct,
            );
        }
        if let Some(st) = &attribute.simple_type {
            self.walk_simple_type(schema, st);
        }
    }

    fn walk_complex_type(&mut self, schema: &Schema, ct: &ComplexType) {
        let construct = format!(
            "complexType '{}'",
            ct.name.as_deref().unwrap_or("<anonymous>")
        );

        match &ct.content {
            TypeContent::Particle(particle) => self.walk_particle(schema, particle, &construct),
            TypeContent::SimpleContent(derivation)
            | TypeContent::ComplexContent { derivation, .. } => {
                self.check_reference(
                    schema,
                    derivation.base(),
                    &TypeCategory::TYPES,
                    IssueKind::UnresolvedBase,
                    &construct,
                );
                let (particle, attributes) = match derivation {
                    ContentDerivation::Extension(e) => (e.particle.as_ref(), &e.attributes),
                    ContentDerivation::Restriction(r) => (r.particle.as_ref(), &r.attributes),
                };
                if let Some(particle) = particle {
                    self.walk_particle(schema, particle, &construct);
                }
                self.walk_attr_items(schema, attributes, &construct);
            }
            TypeContent::Empty => {}
        }

        self.walk_attr_items(schema, &ct.attributes, &construct);
    }

    fn walk_simple_type(&mut self, schema: &Schema, st: &SimpleType) {
        let construct = format!(
            "simpleType '{}'",
            st.name.as_deref().unwrap_or("<anonymous>")
        );

        match &st.variety {
            SimpleVariety::Restriction(restriction) => {
                if let Some(base) = &restriction.base {
                    self.check_reference(
                        schema,
                        base,
                        &TypeCategory::TYPES,
                        IssueKind::UnresolvedBase,
                        &construct,
                    );
                }
                if let Some(inner) = &restriction.simple_type {
                    self.walk_simple_type(schema, inner);
                }
            }
            SimpleVariety::List {
                item_type,
                simple_type,
            } => {
                if let Some(item_type) = item_type {
                    self.check_reference(
                        schema,
                        item_type,
                        &TypeCategory::TYPES,
                        IssueKind::UnresolvedType,
                        &construct,
                    );
                }
                if let Some(inner) = simple_type {
                    self.walk_simple_type(schema, inner);
                }
            }
            SimpleVariety::Union {
                member_types,
                simple_types,
            } => {
                for member in member_types {
                    self.check_reference(
                        schema,
                        member,
                        &TypeCategory::TYPES,
                        IssueKind::UnresolvedType,
                        &construct,
                    );
                }
                for inner in simple_types {
                    self.walk_simple_type(schema, inner);
                }
            }
        }
    }

    fn walk_particle(&mut self, schema: &Schema, particle: &Particle, construct: &str) {
        match particle {
            Particle::Element(element) => self.walk_element(schema, element),
            Particle::GroupRef(group) => {
                self.check_reference(
                    schema,
                    &group.ref_name,
                    &[TypeCategory::Group],
                    IssueKind::UnresolvedGroupRef,
                    construct,
                );
            }
            Particle::Sequence(group) | Particle::Choice(group) | Particle::All(group) => {
                for member in &group.particles {
                    self.walk_particle(schema, member, construct);
                }
            }
            Particle::Any(_) => {}
        }
    }

    fn walk_attr_items(&mut self, schema: &Schema, items: &[AttrItem], construct: &str) {
        for item in items {
            match item {
                AttrItem::Attribute(attribute) => self.walk_attribute(schema, attribute),
                AttrItem::GroupRef { ref_name, .. } => {
                    self.check_reference(
                        schema,
                        ref_name,
                        &[TypeCategory::AttributeGroup],
                        IssueKind::UnresolvedAttributeGroupRef,
                        construct,
                    );
                }
            }
        }
    }

    fn check_import(&mut self, import: &crate::model::Import) {
        let Some(namespace) = import.namespace.as_deref() else {
            return;
        };

        let covered = self
            .processed
            .schemas()
            .any(|s| s.target_namespace.as_deref() == Some(namespace));
        if covered {
            return;
        }

        let severity = if self.allow_external {
            Severity::Warning
        } else {
            Severity::Error
        };
        self.issues.push(ClosureIssue {
            kind: IssueKind::MissingImport,
            severity,
            qname: None,
            schema: self.schema.clone(),
            construct: Some(format!(
                "import of '{}'",
                import.schema_location.as_deref().unwrap_or(namespace)
            )),
            message: format!("imported namespace '{}' is not covered by any processed schema", namespace),
        });
    }

    fn check_include(&mut self, include: &crate::model::Include) {
        let resolved = include
            .resolved_location
            .as_deref()
            .map(|key| self.processed.contains_key(key))
            .unwrap_or(false);
        if resolved {
            return;
        }

        let severity = if self.allow_external {
            Severity::Warning
        } else {
            Severity::Error
        };
        self.issues.push(ClosureIssue {
            kind: IssueKind::MissingInclude,
            severity,
            qname: None,
            schema: self.schema.clone(),
            construct: Some(format!(
                "include of '{}'",
                include.schema_location.as_deref().unwrap_or("<blank>")
            )),
            message: "included schema was not resolved".to_string(),
        });
    }

    /// Check one qualified-name reference against the index
    fn check_reference(
        &mut self,
        schema: &Schema,
        reference: &str,
        categories: &[TypeCategory],
        kind: IssueKind,
        construct: &str,
    ) {
        if let Some((prefix, _)) = reference.split_once(':') {
            if BUILTIN_PREFIXES.contains(&prefix) {
                return;
            }
        }

        let (namespace, local_name) = schema.resolve_reference(reference);
        let found = categories
            .iter()
            .any(|category| self.index.find(*category, namespace.as_deref(), &local_name).is_some());
        if found {
            return;
        }

        self.issues.push(ClosureIssue {
            kind,
            severity: Severity::Error,
            qname: Some(reference.to_string()),
            schema: self.schema.clone(),
            construct: Some(construct.to_string()),
            message: match namespace {
                Some(ns) => format!("'{}' not found in namespace '{}'", local_name, ns),
                None => format!("cannot resolve prefix of '{}'", reference),
            },
        });
    }
}
