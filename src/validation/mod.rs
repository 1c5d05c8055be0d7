//! XML instance validation
//!
//! Validates an XML document against a resolved repository: element
//! lookup through the type index, content-model matching for
//! sequence/choice/all groups with occurrence ranges, attribute-use
//! checks, and simple-value checks against built-in types and
//! constraining facets.
//!
//! The matcher is greedy and matches child elements by local name; it
//! favors actionable diagnostics over exhaustive XSD content-model
//! semantics.

pub mod builtins;
pub mod facets;

use serde::{Deserialize, Serialize};

use crate::documents::{Document, Element};
use crate::error::Result;
use crate::model::{
    AnyElement, AttrItem, AttributeDecl, AttributeUse, ComplexType, ContentDerivation,
    ElementDecl, Particle, Schema, SchemaItem, SimpleType, SimpleVariety, XsdVersion,
};
use crate::repository::index::TypeCategory;
use crate::repository::SchemaRepository;

use builtins::check_builtin_value;
use facets::check_facets;

/// Attributes the XML Schema Instance namespace contributes
const XSI_ATTRIBUTES: &[&str] = &["schemaLocation", "noNamespaceSchemaLocation", "nil", "type"];

/// Bound on derivation-chain walks
const MAX_DERIVATION_DEPTH: usize = 16;

/// One instance validation error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceError {
    /// Element path the error occurred at
    pub path: String,
    /// Human-readable message
    pub message: String,
}

/// Result of validating one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Whether the document conforms
    pub valid: bool,
    /// Errors, in document order
    pub errors: Vec<InstanceError>,
}

/// Validator over a resolved repository
#[derive(Debug)]
pub struct InstanceValidator<'a> {
    repo: &'a SchemaRepository,
    target_version: XsdVersion,
}

impl<'a> InstanceValidator<'a> {
    /// Create a validator targeting XSD 1.0
    pub fn new(repo: &'a SchemaRepository) -> Self {
        Self {
            repo,
            target_version: XsdVersion::V10,
        }
    }

    /// Set the targeted XSD version (1.1 accepts 1.0 schemas)
    pub fn with_version(mut self, version: XsdVersion) -> Self {
        self.target_version = version;
        self
    }

    /// Validate an XML file
    pub fn validate_file(&self, path: impl AsRef<std::path::Path>) -> Result<ValidationReport> {
        let bytes = std::fs::read(path.as_ref())?;
        self.validate_bytes(&bytes)
    }

    /// Validate XML text
    pub fn validate_str(&self, xml: &str) -> Result<ValidationReport> {
        self.validate_bytes(xml.as_bytes())
    }

    /// Validate XML bytes
    pub fn validate_bytes(&self, bytes: &[u8]) -> Result<ValidationReport> {
        let doc = Document::parse(bytes)?;

        let mut walk = Walk {
            repo: self.repo,
            errors: Vec::new(),
        };

        // Version gate before touching the instance
        for (key, schema) in self.repo.processed_schemas().iter() {
            if !self.target_version.accepts(schema.xsd_version) {
                walk.error(
                    "/",
                    format!(
                        "schema '{}' uses XSD {} features but the validator targets XSD {}",
                        key, schema.xsd_version, self.target_version
                    ),
                );
            }
        }

        if walk.errors.is_empty() {
            match doc.root() {
                None => walk.error("/", "document has no root element".to_string()),
                Some(root) => walk.validate_root(root),
            }
        }

        Ok(ValidationReport {
            valid: walk.errors.is_empty(),
            errors: walk.errors,
        })
    }
}

struct Walk<'a> {
    repo: &'a SchemaRepository,
    errors: Vec<InstanceError>,
}

impl<'a> Walk<'a> {
    fn error(&mut self, path: &str, message: String) {
        self.errors.push(InstanceError {
            path: path.to_string(),
            message,
        });
    }

    fn validate_root(&mut self, root: &Element) {
        let path = format!("/{}", root.name);
        let entry = self
            .repo
            .type_index()
            .find(TypeCategory::Element, root.namespace.as_deref(), &root.name);

        let Some(entry) = entry else {
            self.error(
                &path,
                format!(
                    "no global element declaration for '{}'",
                    crate::names::clark(root.namespace.as_deref(), &root.name)
                ),
            );
            return;
        };

        let Some((SchemaItem::Element(decl), schema)) = self.fetch_entry(entry) else {
            return;
        };
        self.validate_element(root, decl, schema, &path);
    }

    /// The definition and owning schema behind an index entry
    fn fetch_entry(
        &self,
        entry: &crate::repository::index::IndexEntry,
    ) -> Option<(&'a SchemaItem, &'a Schema)> {
        let schema = self.repo.processed_schemas().get(entry.schema_location.as_deref()?)?;
        let item = schema.items.iter().find(|item| {
            crate::repository::item_category(item) == Some(entry.category)
                && item.name() == Some(entry.local_name.as_str())
        })?;
        Some((item, schema))
    }

    /// Resolve a reference written in `schema` against the index
    fn fetch(
        &self,
        schema: &Schema,
        reference: &str,
        categories: &[TypeCategory],
    ) -> Option<(&'a SchemaItem, &'a Schema)> {
        let (namespace, local_name) = schema.resolve_reference(reference);
        for category in categories {
            if let Some(entry) =
                self.repo
                    .type_index()
                    .find(*category, namespace.as_deref(), &local_name)
            {
                return self.fetch_entry(entry);
            }
        }
        None
    }

    fn validate_element(
        &mut self,
        elem: &Element,
        decl: &ElementDecl,
        schema: &Schema,
        path: &str,
    ) {
        // References delegate to the global declaration
        if let Some(ref_name) = &decl.ref_name {
            match self.fetch(schema, ref_name, &[TypeCategory::Element]) {
                Some((SchemaItem::Element(target), target_schema)) => {
                    self.validate_element(elem, target, target_schema, path)
                }
                _ => self.error(path, format!("unresolved element ref '{}'", ref_name)),
            }
            return;
        }

        if let Some(type_name) = &decl.type_name {
            if let Some((prefix, local)) = type_name.split_once(':') {
                if crate::repository::closure::BUILTIN_PREFIXES.contains(&prefix) {
                    self.validate_builtin_content(elem, local, path);
                    return;
                }
            }
            match self.fetch(schema, type_name, &TypeCategory::TYPES) {
                Some((SchemaItem::ComplexType(ct), owner)) => {
                    self.validate_complex(elem, ct, owner, path)
                }
                Some((SchemaItem::SimpleType(st), owner)) => {
                    let text = elem.text.clone().unwrap_or_default();
                    self.validate_simple(&text, st, owner, path, 0);
                }
                _ => self.error(path, format!("unresolved type '{}'", type_name)),
            }
            return;
        }

        if let Some(ct) = &decl.complex_type {
            self.validate_complex(elem, ct, schema, path);
            return;
        }
        if let Some(st) = &decl.simple_type {
            let text = elem.text.clone().unwrap_or_default();
            self.validate_simple(&text, st, schema, path, 0);
            return;
        }

        // No type: anyType, everything conforms
    }

    fn validate_builtin_content(&mut self, elem: &Element, type_local: &str, path: &str) {
        if !elem.children.is_empty() {
            self.error(
                path,
                format!(
                    "element has child elements but its type is the simple type '{}'",
                    type_local
                ),
            );
            return;
        }
        let text = elem.text.clone().unwrap_or_default();
        if let Err(message) = check_builtin_value(type_local, &text) {
            self.error(path, message);
        }
    }

    // ========== Complex content ==========

    fn validate_complex(&mut self, elem: &Element, ct: &ComplexType, schema: &Schema, path: &str) {
        if let crate::model::TypeContent::SimpleContent(derivation) = &ct.content {
            self.validate_simple_content(elem, ct, derivation, schema, path);
            return;
        }

        self.validate_attributes(elem, ct, schema, path);

        let particles = self.content_particles(ct, schema);
        let has_particles = !particles.is_empty();
        let mixed = self.is_mixed(ct, schema);
        if !mixed && elem.text.is_some() && has_particles {
            self.error(path, "character content is not allowed here".to_string());
        }

        let mut pos = 0usize;
        for (particle, owner) in particles {
            match self.match_particle(&elem.children, pos, &particle, owner, path) {
                Ok(next) => pos = next,
                Err(message) => {
                    self.error(path, message);
                    return;
                }
            }
        }

        if pos < elem.children.len() {
            self.error(
                path,
                format!("unexpected element '{}'", elem.children[pos].name),
            );
        }
    }

    fn validate_simple_content(
        &mut self,
        elem: &Element,
        ct: &ComplexType,
        derivation: &ContentDerivation,
        schema: &Schema,
        path: &str,
    ) {
        if !elem.children.is_empty() {
            self.error(
                path,
                format!("element '{}' with simple content has child elements", elem.name),
            );
        }

        self.validate_attributes(elem, ct, schema, path);

        let text = elem.text.clone().unwrap_or_default();
        match derivation {
            ContentDerivation::Restriction(restriction) => {
                for violation in check_facets(&restriction.facets, &text) {
                    self.error(path, violation);
                }
                self.check_simple_base(&restriction.base, &text, schema, path);
            }
            ContentDerivation::Extension(extension) => {
                self.check_simple_base(&extension.base, &text, schema, path);
            }
        }
    }

    fn check_simple_base(&mut self, base: &str, text: &str, schema: &Schema, path: &str) {
        if let Some((prefix, local)) = base.split_once(':') {
            if crate::repository::closure::BUILTIN_PREFIXES.contains(&prefix) {
                if let Err(message) = check_builtin_value(local, text) {
                    self.error(path, message);
                }
                return;
            }
        }
        if let Some((SchemaItem::SimpleType(st), owner)) =
            self.fetch(schema, base, &[TypeCategory::SimpleType])
        {
            self.validate_simple(text, st, owner, path, 0);
        }
    }

    /// Effective content particles: base chain first, then this type's
    fn content_particles(&self, ct: &ComplexType, schema: &Schema) -> Vec<(Particle, &'a Schema)> {
        let mut chain: Vec<(Particle, &'a Schema)> = Vec::new();
        self.collect_particles(ct, schema, &mut chain, 0);
        chain
    }

    fn collect_particles(
        &self,
        ct: &ComplexType,
        schema: &Schema,
        into: &mut Vec<(Particle, &'a Schema)>,
        depth: usize,
    ) {
        if depth >= MAX_DERIVATION_DEPTH {
            return;
        }

        match &ct.content {
            crate::model::TypeContent::Particle(particle) => {
                // Local particles borrow from a caller-scoped clone; own them
                if let Some(owner) = self.owned_schema(schema) {
                    into.push((particle.clone(), owner));
                }
            }
            crate::model::TypeContent::ComplexContent { derivation, .. } => match derivation {
                ContentDerivation::Extension(extension) => {
                    if let Some((SchemaItem::ComplexType(base), owner)) =
                        self.fetch(schema, &extension.base, &[TypeCategory::ComplexType])
                    {
                        self.collect_particles(base, owner, into, depth + 1);
                    }
                    if let (Some(particle), Some(owner)) =
                        (&extension.particle, self.owned_schema(schema))
                    {
                        into.push((particle.clone(), owner));
                    }
                }
                ContentDerivation::Restriction(restriction) => {
                    // A restriction replaces the base content model
                    if let (Some(particle), Some(owner)) =
                        (&restriction.particle, self.owned_schema(schema))
                    {
                        into.push((particle.clone(), owner));
                    }
                }
            },
            _ => {}
        }
    }

    /// Map a possibly-transient schema reference to the repository-owned one
    fn owned_schema(&self, schema: &Schema) -> Option<&'a Schema> {
        self.repo.processed_schemas().get(schema.location.as_deref()?)
    }

    fn is_mixed(&self, ct: &ComplexType, schema: &Schema) -> bool {
        if ct.mixed {
            return true;
        }
        if let crate::model::TypeContent::ComplexContent { mixed, derivation } = &ct.content {
            if mixed.unwrap_or(false) {
                return true;
            }
            if let ContentDerivation::Extension(extension) = derivation {
                if let Some((SchemaItem::ComplexType(base), owner)) =
                    self.fetch(schema, &extension.base, &[TypeCategory::ComplexType])
                {
                    return self.is_mixed(base, owner);
                }
            }
        }
        false
    }

    // ========== Attribute uses ==========

    fn validate_attributes(
        &mut self,
        elem: &Element,
        ct: &ComplexType,
        schema: &Schema,
        path: &str,
    ) {
        let mut uses: Vec<(AttributeDecl, &'a Schema)> = Vec::new();
        let mut has_wildcard = ct.any_attribute.is_some();
        self.collect_attribute_uses(ct, schema, &mut uses, &mut has_wildcard, 0);

        for (decl, owner) in &uses {
            let Some(name) = decl.name.as_deref() else {
                continue;
            };
            let present = elem.get_attribute(name);

            match decl.usage {
                AttributeUse::Required if present.is_none() => {
                    self.error(path, format!("required attribute '{}' is missing", name));
                }
                AttributeUse::Prohibited if present.is_some() => {
                    self.error(path, format!("attribute '{}' is prohibited", name));
                }
                _ => {}
            }

            if let Some(value) = present {
                if let Some(fixed) = &decl.fixed {
                    if value != fixed {
                        self.error(
                            path,
                            format!("attribute '{}' must have the fixed value '{}'", name, fixed),
                        );
                    }
                }
                self.validate_attribute_value(value, decl, owner, path, name);
            }
        }

        if !has_wildcard {
            for attr_name in elem.attributes.keys() {
                let declared = uses
                    .iter()
                    .any(|(decl, _)| decl.name.as_deref() == Some(attr_name.as_str()));
                if !declared && !XSI_ATTRIBUTES.contains(&attr_name.as_str()) {
                    self.error(path, format!("undeclared attribute '{}'", attr_name));
                }
            }
        }
    }

    fn collect_attribute_uses(
        &self,
        ct: &ComplexType,
        schema: &Schema,
        into: &mut Vec<(AttributeDecl, &'a Schema)>,
        has_wildcard: &mut bool,
        depth: usize,
    ) {
        if depth >= MAX_DERIVATION_DEPTH {
            return;
        }

        self.collect_attr_items(&ct.attributes, schema, into, has_wildcard);

        if let Some(derivation) = ct.derivation() {
            let (attributes, any_attribute) = match derivation {
                ContentDerivation::Extension(e) => (&e.attributes, e.any_attribute.as_ref()),
                ContentDerivation::Restriction(r) => (&r.attributes, r.any_attribute.as_ref()),
            };
            *has_wildcard |= any_attribute.is_some();
            self.collect_attr_items(attributes, schema, into, has_wildcard);

            if let Some((SchemaItem::ComplexType(base), owner)) =
                self.fetch(schema, derivation.base(), &[TypeCategory::ComplexType])
            {
                self.collect_attribute_uses(base, owner, into, has_wildcard, depth + 1);
            }
        }
    }

    fn collect_attr_items(
        &self,
        items: &[AttrItem],
        schema: &Schema,
        into: &mut Vec<(AttributeDecl, &'a Schema)>,
        has_wildcard: &mut bool,
    ) {
        for item in items {
            match item {
                AttrItem::Attribute(decl) => {
                    if let Some(ref_name) = &decl.ref_name {
                        if let Some((SchemaItem::Attribute(target), owner)) =
                            self.fetch(schema, ref_name, &[TypeCategory::Attribute])
                        {
                            let mut target = target.clone();
                            // The reference site controls the use mode
                            target.usage = decl.usage;
                            into.push((target, owner));
                        }
                    } else if let Some(owner) = self.owned_schema(schema) {
                        into.push((decl.clone(), owner));
                    }
                }
                AttrItem::GroupRef { ref_name, .. } => {
                    if let Some((SchemaItem::AttributeGroup(group), owner)) =
                        self.fetch(schema, ref_name, &[TypeCategory::AttributeGroup])
                    {
                        *has_wildcard |= group.any_attribute.is_some();
                        self.collect_attr_items(&group.attributes, owner, into, has_wildcard);
                    }
                }
            }
        }
    }

    fn validate_attribute_value(
        &mut self,
        value: &str,
        decl: &AttributeDecl,
        schema: &Schema,
        path: &str,
        name: &str,
    ) {
        if let Some(type_name) = &decl.type_name {
            if let Some((prefix, local)) = type_name.split_once(':') {
                if crate::repository::closure::BUILTIN_PREFIXES.contains(&prefix) {
                    if let Err(message) = check_builtin_value(local, value) {
                        self.error(path, format!("attribute '{}': {}", name, message));
                    }
                    return;
                }
            }
            if let Some((SchemaItem::SimpleType(st), owner)) =
                self.fetch(schema, type_name, &[TypeCategory::SimpleType])
            {
                self.validate_simple(value, st, owner, &format!("{}/@{}", path, name), 0);
            }
            return;
        }
        if let Some(st) = &decl.simple_type {
            self.validate_simple(value, st, schema, &format!("{}/@{}", path, name), 0);
        }
    }

    // ========== Simple values ==========

    fn validate_simple(
        &mut self,
        value: &str,
        st: &SimpleType,
        schema: &Schema,
        path: &str,
        depth: usize,
    ) {
        if depth >= MAX_DERIVATION_DEPTH {
            return;
        }

        match &st.variety {
            SimpleVariety::Restriction(restriction) => {
                for violation in check_facets(&restriction.facets, value) {
                    self.error(path, violation);
                }
                if let Some(base) = &restriction.base {
                    self.check_simple_base_at_depth(base, value, schema, path, depth);
                }
                if let Some(inner) = &restriction.simple_type {
                    self.validate_simple(value, inner, schema, path, depth + 1);
                }
            }
            SimpleVariety::List {
                item_type,
                simple_type,
            } => {
                for token in value.split_whitespace() {
                    if let Some(item_type) = item_type {
                        self.check_simple_base_at_depth(item_type, token, schema, path, depth);
                    }
                    if let Some(inner) = simple_type {
                        self.validate_simple(token, inner, schema, path, depth + 1);
                    }
                }
            }
            SimpleVariety::Union {
                member_types,
                simple_types,
            } => {
                // A union value is valid when any member accepts it
                let mut any_ok = member_types.is_empty() && simple_types.is_empty();
                for member in member_types {
                    let before = self.errors.len();
                    self.check_simple_base_at_depth(member, value, schema, path, depth);
                    if self.errors.len() == before {
                        any_ok = true;
                    }
                    self.errors.truncate(before);
                }
                for inner in simple_types {
                    let before = self.errors.len();
                    self.validate_simple(value, inner, schema, path, depth + 1);
                    if self.errors.len() == before {
                        any_ok = true;
                    }
                    self.errors.truncate(before);
                }
                if !any_ok {
                    self.error(
                        path,
                        format!("'{}' matches no member type of the union", value),
                    );
                }
            }
        }
    }

    fn check_simple_base_at_depth(
        &mut self,
        base: &str,
        value: &str,
        schema: &Schema,
        path: &str,
        depth: usize,
    ) {
        if let Some((prefix, local)) = base.split_once(':') {
            if crate::repository::closure::BUILTIN_PREFIXES.contains(&prefix) {
                if let Err(message) = check_builtin_value(local, value) {
                    self.error(path, message);
                }
                return;
            }
        }
        if let Some((SchemaItem::SimpleType(st), owner)) =
            self.fetch(schema, base, &[TypeCategory::SimpleType])
        {
            self.validate_simple(value, st, owner, path, depth + 1);
        }
    }

    // ========== Content-model matching ==========

    /// Match children starting at `pos`; returns the new position
    fn match_particle(
        &mut self,
        children: &[Element],
        pos: usize,
        particle: &Particle,
        schema: &Schema,
        path: &str,
    ) -> std::result::Result<usize, String> {
        match particle {
            Particle::Element(decl) => self.match_element(children, pos, decl, schema, path),
            Particle::Sequence(group) => {
                self.match_group(children, pos, &group.particles, group.occurs, schema, path)
            }
            Particle::Choice(group) => self.match_choice(children, pos, group, schema, path),
            Particle::All(group) => self.match_all(children, pos, group, schema, path),
            Particle::Any(any) => Ok(self.match_wildcard(children, pos, any, schema, path)),
            Particle::GroupRef(group_ref) => {
                let Some((SchemaItem::Group(def), owner)) =
                    self.fetch(schema, &group_ref.ref_name, &[TypeCategory::Group])
                else {
                    return Err(format!("unresolved group ref '{}'", group_ref.ref_name));
                };
                let Some(particle) = &def.particle else {
                    return Ok(pos);
                };
                // The reference's occurrence range wraps the group body
                let particles = std::slice::from_ref(particle);
                self.match_group(children, pos, particles, group_ref.occurs, owner, path)
            }
        }
    }

    fn match_element(
        &mut self,
        children: &[Element],
        pos: usize,
        decl: &ElementDecl,
        schema: &Schema,
        path: &str,
    ) -> std::result::Result<usize, String> {
        let expected = match (&decl.name, &decl.ref_name) {
            (Some(name), _) => name.clone(),
            (None, Some(ref_name)) => {
                let (_, local) = schema.resolve_reference(ref_name);
                local
            }
            (None, None) => return Ok(pos),
        };

        let mut count = 0u32;
        let mut cursor = pos;
        while cursor < children.len() && children[cursor].name == expected {
            let child_path = format!("{}/{}[{}]", path, expected, count + 1);
            let child = &children[cursor];
            self.validate_element(child, decl, schema, &child_path);
            cursor += 1;
            count += 1;
            if let crate::model::MaxOccurs::Bounded(max) = decl.occurs.max {
                if count >= max {
                    break;
                }
            }
        }

        if count < decl.occurs.min {
            return Err(format!(
                "element '{}' occurs {} time(s) but at least {} required",
                expected, count, decl.occurs.min
            ));
        }
        Ok(cursor)
    }

    /// Match a particle list as one iteration unit with an occurrence range
    fn match_group(
        &mut self,
        children: &[Element],
        pos: usize,
        particles: &[Particle],
        occurs: crate::model::Occurs,
        schema: &Schema,
        path: &str,
    ) -> std::result::Result<usize, String> {
        let mut count = 0u32;
        let mut cursor = pos;
        let mut last_error = None;

        loop {
            let start = cursor;
            let mut attempt = cursor;
            let mut ok = true;
            let error_mark = self.errors.len();

            for particle in particles {
                match self.match_particle(children, attempt, particle, schema, path) {
                    Ok(next) => attempt = next,
                    Err(message) => {
                        ok = false;
                        last_error = Some(message);
                        break;
                    }
                }
            }

            if ok && attempt > start {
                cursor = attempt;
                count += 1;
                if let crate::model::MaxOccurs::Bounded(max) = occurs.max {
                    if count >= max {
                        break;
                    }
                }
            } else {
                if !ok {
                    // Roll back diagnostics from the failed attempt
                    self.errors.truncate(error_mark);
                }
                if ok && attempt == start && count < occurs.min {
                    // Zero-width match of an all-optional body satisfies it
                    count = occurs.min;
                }
                break;
            }
        }

        if count < occurs.min {
            return Err(last_error.unwrap_or_else(|| {
                format!(
                    "group occurs {} time(s) but at least {} required",
                    count, occurs.min
                )
            }));
        }
        Ok(cursor)
    }

    fn match_choice(
        &mut self,
        children: &[Element],
        pos: usize,
        group: &crate::model::ModelGroup,
        schema: &Schema,
        path: &str,
    ) -> std::result::Result<usize, String> {
        let mut count = 0u32;
        let mut cursor = pos;

        loop {
            let mut advanced = false;
            for branch in &group.particles {
                let error_mark = self.errors.len();
                match self.match_particle(children, cursor, branch, schema, path) {
                    Ok(next) if next > cursor => {
                        cursor = next;
                        advanced = true;
                        break;
                    }
                    Ok(_) => {}
                    Err(_) => self.errors.truncate(error_mark),
                }
            }

            if !advanced {
                break;
            }
            count += 1;
            if let crate::model::MaxOccurs::Bounded(max) = group.occurs.max {
                if count >= max {
                    break;
                }
            }
        }

        if count < group.occurs.min {
            let names: Vec<&str> = group
                .particles
                .iter()
                .filter_map(|p| match p {
                    Particle::Element(e) => e.name.as_deref(),
                    _ => None,
                })
                .collect();
            return Err(format!(
                "none of the choice alternatives [{}] matched",
                names.join(", ")
            ));
        }
        Ok(cursor)
    }

    fn match_all(
        &mut self,
        children: &[Element],
        pos: usize,
        group: &crate::model::ModelGroup,
        schema: &Schema,
        path: &str,
    ) -> std::result::Result<usize, String> {
        let members: Vec<&ElementDecl> = group
            .particles
            .iter()
            .filter_map(|p| match p {
                Particle::Element(e) => Some(e.as_ref()),
                _ => None,
            })
            .collect();

        let mut matched = vec![0u32; members.len()];
        let mut cursor = pos;

        'outer: while cursor < children.len() {
            for (index, member) in members.iter().enumerate() {
                let name = member.name.as_deref().unwrap_or_default();
                if children[cursor].name == name {
                    let allowed = match member.occurs.max {
                        crate::model::MaxOccurs::Bounded(max) => matched[index] < max,
                        crate::model::MaxOccurs::Unbounded => true,
                    };
                    if !allowed {
                        return Err(format!("element '{}' occurs too often in all group", name));
                    }
                    let child_path = format!("{}/{}", path, name);
                    self.validate_element(&children[cursor], member, schema, &child_path);
                    matched[index] += 1;
                    cursor += 1;
                    continue 'outer;
                }
            }
            break;
        }

        for (index, member) in members.iter().enumerate() {
            if matched[index] < member.occurs.min {
                return Err(format!(
                    "required element '{}' is missing from all group",
                    member.name.as_deref().unwrap_or_default()
                ));
            }
        }
        Ok(cursor)
    }

    fn match_wildcard(
        &mut self,
        children: &[Element],
        pos: usize,
        any: &AnyElement,
        schema: &Schema,
        path: &str,
    ) -> usize {
        let mut count = 0u32;
        let mut cursor = pos;

        while cursor < children.len() {
            let child = &children[cursor];
            if !wildcard_admits(any, child.namespace.as_deref(), schema) {
                break;
            }
            if let crate::model::MaxOccurs::Bounded(max) = any.occurs.max {
                if count >= max {
                    break;
                }
            }

            // Lax processing: validate when a declaration is available
            if any.process_contents != crate::model::ProcessContents::Skip {
                if let Some(entry) = self.repo.type_index().find(
                    TypeCategory::Element,
                    child.namespace.as_deref(),
                    &child.name,
                ) {
                    if let Some((SchemaItem::Element(decl), owner)) = self.fetch_entry(entry) {
                        let child_path = format!("{}/{}", path, child.name);
                        self.validate_element(child, decl, owner, &child_path);
                    }
                }
            }

            cursor += 1;
            count += 1;
        }

        cursor
    }
}

/// Whether a wildcard's namespace constraint admits an element namespace
fn wildcard_admits(any: &AnyElement, namespace: Option<&str>, schema: &Schema) -> bool {
    let constraint = any.namespace.as_deref().unwrap_or("##any");
    match constraint {
        "##any" => true,
        "##other" => namespace != schema.target_namespace.as_deref(),
        "##targetNamespace" => namespace == schema.target_namespace.as_deref(),
        "##local" => namespace.is_none(),
        list => list.split_whitespace().any(|token| match token {
            "##targetNamespace" => namespace == schema.target_namespace.as_deref(),
            "##local" => namespace.is_none(),
            uri => namespace == Some(uri),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RepositoryConfig;
    use std::fs;
    use tempfile::TempDir;

    const SCHEMA: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           xmlns:p="urn:people" targetNamespace="urn:people">
  <xs:element name="person" type="p:PersonType"/>
  <xs:complexType name="PersonType">
    <xs:sequence>
      <xs:element name="name" type="xs:string"/>
      <xs:element name="age" type="xs:int" minOccurs="0"/>
      <xs:element name="code" type="p:CodeType" minOccurs="0"/>
    </xs:sequence>
    <xs:attribute name="id" type="xs:ID" use="required"/>
  </xs:complexType>
  <xs:simpleType name="CodeType">
    <xs:restriction base="xs:string">
      <xs:pattern value="[A-Z]{2}"/>
    </xs:restriction>
  </xs:simpleType>
</xs:schema>"#;

    fn build_repo(dir: &TempDir) -> SchemaRepository {
        fs::write(dir.path().join("people.xsd"), SCHEMA).unwrap();
        let config = RepositoryConfig::with_files(vec![dir
            .path()
            .join("people.xsd")
            .to_string_lossy()
            .to_string()]);
        let mut repo = SchemaRepository::new(config).unwrap();
        repo.parse().unwrap();
        repo.resolve().unwrap();
        repo
    }

    #[test]
    fn test_valid_document() {
        let dir = TempDir::new().unwrap();
        let repo = build_repo(&dir);
        let validator = InstanceValidator::new(&repo);

        let report = validator
            .validate_str(
                r#"<person xmlns="urn:people" id="p1">
                     <name>Ada</name>
                     <age>36</age>
                     <code>AB</code>
                   </person>"#,
            )
            .unwrap();
        assert!(report.valid, "errors: {:?}", report.errors);
    }

    #[test]
    fn test_missing_required_element() {
        let dir = TempDir::new().unwrap();
        let repo = build_repo(&dir);
        let validator = InstanceValidator::new(&repo);

        let report = validator
            .validate_str(r#"<person xmlns="urn:people" id="p1"><age>36</age></person>"#)
            .unwrap();
        assert!(!report.valid);
        assert!(report.errors[0].message.contains("name"));
    }

    #[test]
    fn test_missing_required_attribute() {
        let dir = TempDir::new().unwrap();
        let repo = build_repo(&dir);
        let validator = InstanceValidator::new(&repo);

        let report = validator
            .validate_str(r#"<person xmlns="urn:people"><name>Ada</name></person>"#)
            .unwrap();
        assert!(!report.valid);
        assert!(report
            .errors
            .iter()
            .any(|e| e.message.contains("required attribute 'id'")));
    }

    #[test]
    fn test_builtin_value_violation() {
        let dir = TempDir::new().unwrap();
        let repo = build_repo(&dir);
        let validator = InstanceValidator::new(&repo);

        let report = validator
            .validate_str(
                r#"<person xmlns="urn:people" id="p1">
                     <name>Ada</name>
                     <age>not-a-number</age>
                   </person>"#,
            )
            .unwrap();
        assert!(!report.valid);
        assert!(report.errors.iter().any(|e| e.message.contains("int")));
    }

    #[test]
    fn test_facet_violation() {
        let dir = TempDir::new().unwrap();
        let repo = build_repo(&dir);
        let validator = InstanceValidator::new(&repo);

        let report = validator
            .validate_str(
                r#"<person xmlns="urn:people" id="p1">
                     <name>Ada</name>
                     <code>toolong</code>
                   </person>"#,
            )
            .unwrap();
        assert!(!report.valid);
        assert!(report.errors.iter().any(|e| e.message.contains("pattern")));
    }

    #[test]
    fn test_unexpected_element() {
        let dir = TempDir::new().unwrap();
        let repo = build_repo(&dir);
        let validator = InstanceValidator::new(&repo);

        let report = validator
            .validate_str(
                r#"<person xmlns="urn:people" id="p1">
                     <name>Ada</name>
                     <intruder/>
                   </person>"#,
            )
            .unwrap();
        assert!(!report.valid);
        assert!(report
            .errors
            .iter()
            .any(|e| e.message.contains("unexpected element 'intruder'")));
    }

    #[test]
    fn test_unknown_root() {
        let dir = TempDir::new().unwrap();
        let repo = build_repo(&dir);
        let validator = InstanceValidator::new(&repo);

        let report = validator
            .validate_str(r#"<stranger xmlns="urn:people"/>"#)
            .unwrap();
        assert!(!report.valid);
        assert!(report.errors[0].message.contains("no global element declaration"));
    }

    #[test]
    fn test_version_gate() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("v11.xsd"),
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:v11">
                 <xs:element name="e" type="xs:dateTimeStamp"/>
               </xs:schema>"#,
        )
        .unwrap();
        let config = RepositoryConfig::with_files(vec![dir
            .path()
            .join("v11.xsd")
            .to_string_lossy()
            .to_string()]);
        let mut repo = SchemaRepository::new(config).unwrap();
        repo.parse().unwrap();
        repo.resolve().unwrap();

        let strict_10 = InstanceValidator::new(&repo);
        let report = strict_10
            .validate_str(r#"<e xmlns="urn:v11">2024-01-01T00:00:00Z</e>"#)
            .unwrap();
        assert!(!report.valid);
        assert!(report.errors[0].message.contains("XSD 1.1"));

        let lenient_11 = InstanceValidator::new(&repo).with_version(XsdVersion::V11);
        let report = lenient_11
            .validate_str(r#"<e xmlns="urn:v11">2024-01-01T00:00:00Z</e>"#)
            .unwrap();
        assert!(report.valid, "errors: {:?}", report.errors);
    }
}
