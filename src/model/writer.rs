//! XSD serialization back to XML
//!
//! Emission of import/include references is deduplicated through an
//! explicit [`EmitState`] visited set passed by the caller; model nodes
//! are never mutated during serialization.

use std::collections::HashSet;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::Result;
use crate::model::annotations::{Annotation, AnnotationItem};
use crate::model::attributes::{AnyAttribute, AttrItem, AttributeDecl, AttributeGroup, AttributeUse};
use crate::model::elements::ElementDecl;
use crate::model::facets::Facet;
use crate::model::identities::IdentityConstraint;
use crate::model::imports::{Import, Include, Redefine};
use crate::model::particles::{AnyElement, GroupRef, MaxOccurs, ModelGroup, Occurs, Particle, ProcessContents};
use crate::model::schema::{GroupDef, Notation, Schema, SchemaItem};
use crate::model::types::{
    ComplexType, ContentDerivation, Extension, Restriction, SimpleType, SimpleVariety, TypeContent,
};

/// Serialization state threaded through one emission session
#[derive(Debug, Default)]
pub struct EmitState {
    visited: HashSet<String>,
}

impl EmitState {
    /// Create a fresh emission state
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a reference; returns false when it was already emitted
    fn mark(&mut self, key: String) -> bool {
        self.visited.insert(key)
    }
}

/// Serialize a schema back to an XML string
pub fn schema_to_xml(schema: &Schema, state: &mut EmitState) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let emitter = Emitter {
        xs: xsd_prefix(schema),
        source: schema.location.clone().unwrap_or_default(),
    };
    emitter.write_schema(&mut writer, schema, state)?;

    let bytes = writer.into_inner();
    String::from_utf8(bytes).map_err(|e| crate::error::Error::Xml(e.to_string()))
}

/// The prefix bound to the XSD namespace on the schema root, `xs` otherwise
fn xsd_prefix(schema: &Schema) -> String {
    schema
        .namespaces
        .iter()
        .find(|(p, u)| !p.is_empty() && u.as_str() == crate::XSD_NAMESPACE)
        .map(|(p, _)| p.clone())
        .unwrap_or_else(|| "xs".to_string())
}

struct Emitter {
    xs: String,
    source: String,
}

type W = Writer<Vec<u8>>;

impl Emitter {
    fn tag(&self, local: &str) -> String {
        format!("{}:{}", self.xs, local)
    }

    fn write_schema(&self, w: &mut W, schema: &Schema, state: &mut EmitState) -> Result<()> {
        let name = self.tag("schema");
        let mut start = BytesStart::new(name.as_str());

        let mut declared_xsd = false;
        for (prefix, uri) in &schema.namespaces {
            if prefix.is_empty() {
                start.push_attribute(("xmlns", uri.as_str()));
            } else {
                let attr = format!("xmlns:{}", prefix);
                start.push_attribute((attr.as_str(), uri.as_str()));
            }
            if uri == crate::XSD_NAMESPACE {
                declared_xsd = true;
            }
        }
        if !declared_xsd {
            let attr = format!("xmlns:{}", self.xs);
            start.push_attribute((attr.as_str(), crate::XSD_NAMESPACE));
        }

        push_opt(&mut start, "id", schema.id.as_deref());
        push_opt(&mut start, "targetNamespace", schema.target_namespace.as_deref());
        push_opt(&mut start, "version", schema.version.as_deref());
        push_opt(&mut start, "xml:lang", schema.lang.as_deref());
        if schema.element_form_default != Default::default() {
            start.push_attribute(("elementFormDefault", schema.element_form_default.as_str()));
        }
        if schema.attribute_form_default != Default::default() {
            start.push_attribute(("attributeFormDefault", schema.attribute_form_default.as_str()));
        }
        push_opt(&mut start, "blockDefault", schema.block_default.as_deref());
        push_opt(&mut start, "finalDefault", schema.final_default.as_deref());
        push_other(&mut start, &schema.other_attributes);

        w.write_event(Event::Start(start))?;
        for item in &schema.items {
            self.write_item(w, item, state)?;
        }
        w.write_event(Event::End(BytesEnd::new(name.as_str())))?;
        Ok(())
    }

    fn write_item(&self, w: &mut W, item: &SchemaItem, state: &mut EmitState) -> Result<()> {
        match item {
            SchemaItem::Annotation(a) => self.write_annotation(w, a),
            SchemaItem::Import(i) => self.write_import(w, i, state),
            SchemaItem::Include(i) => self.write_include(w, i, state),
            SchemaItem::Redefine(r) => self.write_redefine(w, r, state),
            SchemaItem::Element(e) => self.write_element(w, e),
            SchemaItem::ComplexType(t) => self.write_complex_type(w, t),
            SchemaItem::SimpleType(t) => self.write_simple_type(w, t),
            SchemaItem::Attribute(a) => self.write_attribute(w, a),
            SchemaItem::AttributeGroup(g) => self.write_attribute_group(w, g),
            SchemaItem::Group(g) => self.write_group_def(w, g),
            SchemaItem::Notation(n) => self.write_notation(w, n),
        }
    }

    // ========== Schema references ==========

    fn write_import(&self, w: &mut W, import: &Import, state: &mut EmitState) -> Result<()> {
        let key = format!(
            "{}#import:{}",
            self.source,
            import.schema_location.as_deref().unwrap_or("")
        );
        if !state.mark(key) {
            return Ok(());
        }

        let name = self.tag("import");
        let mut start = BytesStart::new(name.as_str());
        push_opt(&mut start, "id", import.id.as_deref());
        push_opt(&mut start, "namespace", import.namespace.as_deref());
        push_opt(&mut start, "schemaLocation", import.schema_location.as_deref());
        w.write_event(Event::Empty(start))?;
        Ok(())
    }

    fn write_include(&self, w: &mut W, include: &Include, state: &mut EmitState) -> Result<()> {
        let key = format!(
            "{}#include:{}",
            self.source,
            include.schema_location.as_deref().unwrap_or("")
        );
        if !state.mark(key) {
            return Ok(());
        }

        let name = self.tag("include");
        let mut start = BytesStart::new(name.as_str());
        push_opt(&mut start, "id", include.id.as_deref());
        push_opt(&mut start, "schemaLocation", include.schema_location.as_deref());
        w.write_event(Event::Empty(start))?;
        Ok(())
    }

    fn write_redefine(&self, w: &mut W, redefine: &Redefine, state: &mut EmitState) -> Result<()> {
        let name = self.tag("redefine");
        let mut start = BytesStart::new(name.as_str());
        push_opt(&mut start, "id", redefine.id.as_deref());
        push_opt(&mut start, "schemaLocation", redefine.schema_location.as_deref());

        if redefine.items.is_empty() {
            w.write_event(Event::Empty(start))?;
            return Ok(());
        }

        w.write_event(Event::Start(start))?;
        for item in &redefine.items {
            self.write_item(w, item, state)?;
        }
        w.write_event(Event::End(BytesEnd::new(name.as_str())))?;
        Ok(())
    }

    fn write_notation(&self, w: &mut W, notation: &Notation) -> Result<()> {
        let name = self.tag("notation");
        let mut start = BytesStart::new(name.as_str());
        push_opt(&mut start, "id", notation.id.as_deref());
        start.push_attribute(("name", notation.name.as_str()));
        push_opt(&mut start, "public", notation.public.as_deref());
        push_opt(&mut start, "system", notation.system.as_deref());
        w.write_event(Event::Empty(start))?;
        Ok(())
    }

    // ========== Annotations ==========

    fn write_annotation(&self, w: &mut W, annotation: &Annotation) -> Result<()> {
        let name = self.tag("annotation");
        let mut start = BytesStart::new(name.as_str());
        push_opt(&mut start, "id", annotation.id.as_deref());

        if annotation.items.is_empty() {
            w.write_event(Event::Empty(start))?;
            return Ok(());
        }

        w.write_event(Event::Start(start))?;
        for item in &annotation.items {
            match item {
                AnnotationItem::Documentation(doc) => {
                    let tag = self.tag("documentation");
                    let mut start = BytesStart::new(tag.as_str());
                    push_opt(&mut start, "source", doc.source.as_deref());
                    push_opt(&mut start, "xml:lang", doc.lang.as_deref());
                    w.write_event(Event::Start(start))?;
                    w.write_event(Event::Text(BytesText::new(&doc.content)))?;
                    w.write_event(Event::End(BytesEnd::new(tag.as_str())))?;
                }
                AnnotationItem::AppInfo(info) => {
                    let tag = self.tag("appinfo");
                    let mut start = BytesStart::new(tag.as_str());
                    push_opt(&mut start, "source", info.source.as_deref());
                    w.write_event(Event::Start(start))?;
                    w.write_event(Event::Text(BytesText::new(&info.content)))?;
                    w.write_event(Event::End(BytesEnd::new(tag.as_str())))?;
                }
            }
        }
        w.write_event(Event::End(BytesEnd::new(name.as_str())))?;
        Ok(())
    }

    // ========== Elements ==========

    fn write_element(&self, w: &mut W, element: &ElementDecl) -> Result<()> {
        let name = self.tag("element");
        let mut start = BytesStart::new(name.as_str());
        push_opt(&mut start, "id", element.id.as_deref());
        push_opt(&mut start, "name", element.name.as_deref());
        push_opt(&mut start, "ref", element.ref_name.as_deref());
        push_opt(&mut start, "type", element.type_name.as_deref());
        push_occurs(&mut start, element.occurs);
        if element.nillable {
            start.push_attribute(("nillable", "true"));
        }
        if element.is_abstract {
            start.push_attribute(("abstract", "true"));
        }
        push_opt(&mut start, "default", element.default.as_deref());
        push_opt(&mut start, "fixed", element.fixed.as_deref());
        if let Some(form) = element.form {
            start.push_attribute(("form", form.as_str()));
        }
        push_opt(&mut start, "substitutionGroup", element.substitution_group.as_deref());
        push_opt(&mut start, "block", element.block.as_deref());
        push_opt(&mut start, "final", element.final_value.as_deref());
        push_other(&mut start, &element.other_attributes);

        let empty = element.annotation.is_none()
            && element.complex_type.is_none()
            && element.simple_type.is_none()
            && element.identities.is_empty();
        if empty {
            w.write_event(Event::Empty(start))?;
            return Ok(());
        }

        w.write_event(Event::Start(start))?;
        if let Some(annotation) = &element.annotation {
            self.write_annotation(w, annotation)?;
        }
        if let Some(ct) = &element.complex_type {
            self.write_complex_type(w, ct)?;
        }
        if let Some(st) = &element.simple_type {
            self.write_simple_type(w, st)?;
        }
        for identity in &element.identities {
            self.write_identity(w, identity)?;
        }
        w.write_event(Event::End(BytesEnd::new(name.as_str())))?;
        Ok(())
    }

    fn write_identity(&self, w: &mut W, identity: &IdentityConstraint) -> Result<()> {
        let name = self.tag(identity.kind.xml_name());
        let mut start = BytesStart::new(name.as_str());
        push_opt(&mut start, "id", identity.id.as_deref());
        start.push_attribute(("name", identity.name.as_str()));
        push_opt(&mut start, "refer", identity.refer.as_deref());
        w.write_event(Event::Start(start))?;

        let selector_tag = self.tag("selector");
        let mut selector = BytesStart::new(selector_tag.as_str());
        push_opt(&mut selector, "id", identity.selector.id.as_deref());
        selector.push_attribute(("xpath", identity.selector.xpath.as_str()));
        w.write_event(Event::Empty(selector))?;

        for field in &identity.fields {
            let field_tag = self.tag("field");
            let mut field_start = BytesStart::new(field_tag.as_str());
            push_opt(&mut field_start, "id", field.id.as_deref());
            field_start.push_attribute(("xpath", field.xpath.as_str()));
            w.write_event(Event::Empty(field_start))?;
        }

        w.write_event(Event::End(BytesEnd::new(name.as_str())))?;
        Ok(())
    }

    // ========== Attributes ==========

    fn write_attribute(&self, w: &mut W, attribute: &AttributeDecl) -> Result<()> {
        let name = self.tag("attribute");
        let mut start = BytesStart::new(name.as_str());
        push_opt(&mut start, "id", attribute.id.as_deref());
        push_opt(&mut start, "name", attribute.name.as_deref());
        push_opt(&mut start, "ref", attribute.ref_name.as_deref());
        push_opt(&mut start, "type", attribute.type_name.as_deref());
        if attribute.usage != AttributeUse::Optional {
            start.push_attribute(("use", attribute.usage.as_str()));
        }
        push_opt(&mut start, "default", attribute.default.as_deref());
        push_opt(&mut start, "fixed", attribute.fixed.as_deref());
        if let Some(form) = attribute.form {
            start.push_attribute(("form", form.as_str()));
        }
        push_other(&mut start, &attribute.other_attributes);

        if attribute.annotation.is_none() && attribute.simple_type.is_none() {
            w.write_event(Event::Empty(start))?;
            return Ok(());
        }

        w.write_event(Event::Start(start))?;
        if let Some(annotation) = &attribute.annotation {
            self.write_annotation(w, annotation)?;
        }
        if let Some(st) = &attribute.simple_type {
            self.write_simple_type(w, st)?;
        }
        w.write_event(Event::End(BytesEnd::new(name.as_str())))?;
        Ok(())
    }

    fn write_any_attribute(&self, w: &mut W, any: &AnyAttribute) -> Result<()> {
        let name = self.tag("anyAttribute");
        let mut start = BytesStart::new(name.as_str());
        push_opt(&mut start, "id", any.id.as_deref());
        push_opt(&mut start, "namespace", any.namespace.as_deref());
        if any.process_contents != ProcessContents::Strict {
            start.push_attribute(("processContents", any.process_contents.as_str()));
        }
        w.write_event(Event::Empty(start))?;
        Ok(())
    }

    fn write_attr_items(
        &self,
        w: &mut W,
        items: &[AttrItem],
        any_attribute: Option<&AnyAttribute>,
    ) -> Result<()> {
        for item in items {
            match item {
                AttrItem::Attribute(a) => self.write_attribute(w, a)?,
                AttrItem::GroupRef { id, ref_name } => {
                    let name = self.tag("attributeGroup");
                    let mut start = BytesStart::new(name.as_str());
                    push_opt(&mut start, "id", id.as_deref());
                    start.push_attribute(("ref", ref_name.as_str()));
                    w.write_event(Event::Empty(start))?;
                }
            }
        }
        if let Some(any) = any_attribute {
            self.write_any_attribute(w, any)?;
        }
        Ok(())
    }

    fn write_attribute_group(&self, w: &mut W, group: &AttributeGroup) -> Result<()> {
        let name = self.tag("attributeGroup");
        let mut start = BytesStart::new(name.as_str());
        push_opt(&mut start, "id", group.id.as_deref());
        push_opt(&mut start, "name", group.name.as_deref());

        if group.annotation.is_none() && group.attributes.is_empty() && group.any_attribute.is_none()
        {
            w.write_event(Event::Empty(start))?;
            return Ok(());
        }

        w.write_event(Event::Start(start))?;
        if let Some(annotation) = &group.annotation {
            self.write_annotation(w, annotation)?;
        }
        self.write_attr_items(w, &group.attributes, group.any_attribute.as_ref())?;
        w.write_event(Event::End(BytesEnd::new(name.as_str())))?;
        Ok(())
    }

    // ========== Groups and particles ==========

    fn write_group_def(&self, w: &mut W, group: &GroupDef) -> Result<()> {
        let name = self.tag("group");
        let mut start = BytesStart::new(name.as_str());
        push_opt(&mut start, "id", group.id.as_deref());
        start.push_attribute(("name", group.name.as_str()));

        if group.annotation.is_none() && group.particle.is_none() {
            w.write_event(Event::Empty(start))?;
            return Ok(());
        }

        w.write_event(Event::Start(start))?;
        if let Some(annotation) = &group.annotation {
            self.write_annotation(w, annotation)?;
        }
        if let Some(particle) = &group.particle {
            self.write_particle(w, particle)?;
        }
        w.write_event(Event::End(BytesEnd::new(name.as_str())))?;
        Ok(())
    }

    fn write_particle(&self, w: &mut W, particle: &Particle) -> Result<()> {
        match particle {
            Particle::Element(e) => self.write_element(w, e),
            Particle::GroupRef(g) => self.write_group_ref(w, g),
            Particle::Sequence(g) => self.write_model_group(w, "sequence", g),
            Particle::Choice(g) => self.write_model_group(w, "choice", g),
            Particle::All(g) => self.write_model_group(w, "all", g),
            Particle::Any(a) => self.write_any(w, a),
        }
    }

    fn write_group_ref(&self, w: &mut W, group: &GroupRef) -> Result<()> {
        let name = self.tag("group");
        let mut start = BytesStart::new(name.as_str());
        push_opt(&mut start, "id", group.id.as_deref());
        start.push_attribute(("ref", group.ref_name.as_str()));
        push_occurs(&mut start, group.occurs);
        w.write_event(Event::Empty(start))?;
        Ok(())
    }

    fn write_model_group(&self, w: &mut W, local: &str, group: &ModelGroup) -> Result<()> {
        let name = self.tag(local);
        let mut start = BytesStart::new(name.as_str());
        push_opt(&mut start, "id", group.id.as_deref());
        push_occurs(&mut start, group.occurs);

        if group.annotation.is_none() && group.particles.is_empty() {
            w.write_event(Event::Empty(start))?;
            return Ok(());
        }

        w.write_event(Event::Start(start))?;
        if let Some(annotation) = &group.annotation {
            self.write_annotation(w, annotation)?;
        }
        for particle in &group.particles {
            self.write_particle(w, particle)?;
        }
        w.write_event(Event::End(BytesEnd::new(name.as_str())))?;
        Ok(())
    }

    fn write_any(&self, w: &mut W, any: &AnyElement) -> Result<()> {
        let name = self.tag("any");
        let mut start = BytesStart::new(name.as_str());
        push_opt(&mut start, "id", any.id.as_deref());
        push_opt(&mut start, "namespace", any.namespace.as_deref());
        if any.process_contents != ProcessContents::Strict {
            start.push_attribute(("processContents", any.process_contents.as_str()));
        }
        push_occurs(&mut start, any.occurs);
        w.write_event(Event::Empty(start))?;
        Ok(())
    }

    // ========== Types ==========

    fn write_complex_type(&self, w: &mut W, ct: &ComplexType) -> Result<()> {
        let name = self.tag("complexType");
        let mut start = BytesStart::new(name.as_str());
        push_opt(&mut start, "id", ct.id.as_deref());
        push_opt(&mut start, "name", ct.name.as_deref());
        if ct.mixed {
            start.push_attribute(("mixed", "true"));
        }
        if ct.is_abstract {
            start.push_attribute(("abstract", "true"));
        }
        push_opt(&mut start, "block", ct.block.as_deref());
        push_opt(&mut start, "final", ct.final_value.as_deref());
        push_other(&mut start, &ct.other_attributes);

        let empty = ct.annotation.is_none()
            && matches!(ct.content, TypeContent::Empty)
            && ct.attributes.is_empty()
            && ct.any_attribute.is_none();
        if empty {
            w.write_event(Event::Empty(start))?;
            return Ok(());
        }

        w.write_event(Event::Start(start))?;
        if let Some(annotation) = &ct.annotation {
            self.write_annotation(w, annotation)?;
        }
        match &ct.content {
            TypeContent::Empty => {}
            TypeContent::Particle(particle) => self.write_particle(w, particle)?,
            TypeContent::SimpleContent(derivation) => {
                let tag = self.tag("simpleContent");
                w.write_event(Event::Start(BytesStart::new(tag.as_str())))?;
                self.write_derivation(w, derivation, true)?;
                w.write_event(Event::End(BytesEnd::new(tag.as_str())))?;
            }
            TypeContent::ComplexContent { mixed, derivation } => {
                let tag = self.tag("complexContent");
                let mut cc = BytesStart::new(tag.as_str());
                if let Some(mixed) = mixed {
                    start_bool(&mut cc, "mixed", *mixed);
                }
                w.write_event(Event::Start(cc))?;
                self.write_derivation(w, derivation, false)?;
                w.write_event(Event::End(BytesEnd::new(tag.as_str())))?;
            }
        }
        self.write_attr_items(w, &ct.attributes, ct.any_attribute.as_ref())?;
        w.write_event(Event::End(BytesEnd::new(name.as_str())))?;
        Ok(())
    }

    fn write_derivation(&self, w: &mut W, derivation: &ContentDerivation, simple: bool) -> Result<()> {
        match derivation {
            ContentDerivation::Extension(e) => self.write_extension(w, e),
            ContentDerivation::Restriction(r) => self.write_restriction(w, r, simple),
        }
    }

    fn write_extension(&self, w: &mut W, extension: &Extension) -> Result<()> {
        let name = self.tag("extension");
        let mut start = BytesStart::new(name.as_str());
        push_opt(&mut start, "id", extension.id.as_deref());
        start.push_attribute(("base", extension.base.as_str()));

        let empty = extension.annotation.is_none()
            && extension.particle.is_none()
            && extension.attributes.is_empty()
            && extension.any_attribute.is_none();
        if empty {
            w.write_event(Event::Empty(start))?;
            return Ok(());
        }

        w.write_event(Event::Start(start))?;
        if let Some(annotation) = &extension.annotation {
            self.write_annotation(w, annotation)?;
        }
        if let Some(particle) = &extension.particle {
            self.write_particle(w, particle)?;
        }
        self.write_attr_items(w, &extension.attributes, extension.any_attribute.as_ref())?;
        w.write_event(Event::End(BytesEnd::new(name.as_str())))?;
        Ok(())
    }

    fn write_restriction(&self, w: &mut W, restriction: &Restriction, simple: bool) -> Result<()> {
        let name = self.tag("restriction");
        let mut start = BytesStart::new(name.as_str());
        push_opt(&mut start, "id", restriction.id.as_deref());
        start.push_attribute(("base", restriction.base.as_str()));

        let empty = restriction.annotation.is_none()
            && restriction.particle.is_none()
            && restriction.attributes.is_empty()
            && restriction.any_attribute.is_none()
            && restriction.facets.is_empty()
            && restriction.simple_type.is_none();
        if empty {
            w.write_event(Event::Empty(start))?;
            return Ok(());
        }

        w.write_event(Event::Start(start))?;
        if let Some(annotation) = &restriction.annotation {
            self.write_annotation(w, annotation)?;
        }
        if simple {
            if let Some(st) = &restriction.simple_type {
                self.write_simple_type(w, st)?;
            }
            self.write_facets(w, &restriction.facets)?;
        }
        if let Some(particle) = &restriction.particle {
            self.write_particle(w, particle)?;
        }
        self.write_attr_items(w, &restriction.attributes, restriction.any_attribute.as_ref())?;
        w.write_event(Event::End(BytesEnd::new(name.as_str())))?;
        Ok(())
    }

    fn write_simple_type(&self, w: &mut W, st: &SimpleType) -> Result<()> {
        let name = self.tag("simpleType");
        let mut start = BytesStart::new(name.as_str());
        push_opt(&mut start, "id", st.id.as_deref());
        push_opt(&mut start, "name", st.name.as_deref());
        push_opt(&mut start, "final", st.final_value.as_deref());
        push_other(&mut start, &st.other_attributes);

        w.write_event(Event::Start(start))?;
        if let Some(annotation) = &st.annotation {
            self.write_annotation(w, annotation)?;
        }
        match &st.variety {
            SimpleVariety::Restriction(r) => {
                let tag = self.tag("restriction");
                let mut rs = BytesStart::new(tag.as_str());
                push_opt(&mut rs, "base", r.base.as_deref());

                if r.simple_type.is_none() && r.facets.is_empty() {
                    w.write_event(Event::Empty(rs))?;
                } else {
                    w.write_event(Event::Start(rs))?;
                    if let Some(inner) = &r.simple_type {
                        self.write_simple_type(w, inner)?;
                    }
                    self.write_facets(w, &r.facets)?;
                    w.write_event(Event::End(BytesEnd::new(tag.as_str())))?;
                }
            }
            SimpleVariety::List {
                item_type,
                simple_type,
            } => {
                let tag = self.tag("list");
                let mut ls = BytesStart::new(tag.as_str());
                push_opt(&mut ls, "itemType", item_type.as_deref());
                if let Some(inner) = simple_type {
                    w.write_event(Event::Start(ls))?;
                    self.write_simple_type(w, inner)?;
                    w.write_event(Event::End(BytesEnd::new(tag.as_str())))?;
                } else {
                    w.write_event(Event::Empty(ls))?;
                }
            }
            SimpleVariety::Union {
                member_types,
                simple_types,
            } => {
                let tag = self.tag("union");
                let mut us = BytesStart::new(tag.as_str());
                if !member_types.is_empty() {
                    let joined = member_types.join(" ");
                    us.push_attribute(("memberTypes", joined.as_str()));
                }
                if simple_types.is_empty() {
                    w.write_event(Event::Empty(us))?;
                } else {
                    w.write_event(Event::Start(us))?;
                    for inner in simple_types {
                        self.write_simple_type(w, inner)?;
                    }
                    w.write_event(Event::End(BytesEnd::new(tag.as_str())))?;
                }
            }
        }
        w.write_event(Event::End(BytesEnd::new(name.as_str())))?;
        Ok(())
    }

    fn write_facets(&self, w: &mut W, facets: &[Facet]) -> Result<()> {
        for facet in facets {
            let name = self.tag(facet.xml_name());
            let mut start = BytesStart::new(name.as_str());
            let payload = facet.value();
            push_opt(&mut start, "id", payload.id.as_deref());
            start.push_attribute(("value", payload.value.as_str()));
            if payload.fixed {
                start.push_attribute(("fixed", "true"));
            }
            w.write_event(Event::Empty(start))?;
        }
        Ok(())
    }
}

fn push_opt(start: &mut BytesStart, name: &str, value: Option<&str>) {
    if let Some(value) = value {
        start.push_attribute((name, value));
    }
}

fn push_other(start: &mut BytesStart, other: &indexmap::IndexMap<String, String>) {
    for (name, value) in other {
        start.push_attribute((name.as_str(), value.as_str()));
    }
}

fn start_bool(start: &mut BytesStart, name: &str, value: bool) {
    start.push_attribute((name, if value { "true" } else { "false" }));
}

fn push_occurs(start: &mut BytesStart, occurs: Occurs) {
    if occurs.min != 1 {
        let min = occurs.min.to_string();
        start.push_attribute(("minOccurs", min.as_str()));
    }
    match occurs.max {
        MaxOccurs::Unbounded => start.push_attribute(("maxOccurs", "unbounded")),
        MaxOccurs::Bounded(1) => {}
        MaxOccurs::Bounded(n) => {
            let max = n.to_string();
            start.push_attribute(("maxOccurs", max.as_str()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::Document;
    use crate::model::parser::parse_schema_document;

    const ROUND_TRIP_XSD: &str = r###"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           xmlns:p="http://example.com/person"
           targetNamespace="http://example.com/person"
           elementFormDefault="qualified">
  <xs:import namespace="urn:other" schemaLocation="other.xsd"/>
  <xs:element name="Person" type="p:PersonType"/>
  <xs:complexType name="PersonType">
    <xs:sequence>
      <xs:element name="Name" type="xs:string"/>
      <xs:element name="Age" type="xs:int" minOccurs="0" maxOccurs="3"/>
      <xs:any namespace="##other" processContents="lax" minOccurs="0"/>
    </xs:sequence>
    <xs:attribute name="id" type="xs:ID" use="required"/>
  </xs:complexType>
  <xs:simpleType name="Code">
    <xs:restriction base="xs:string">
      <xs:pattern value="[A-Z]{2}"/>
      <xs:enumeration value="AB"/>
    </xs:restriction>
  </xs:simpleType>
</xs:schema>"###;

    fn parse(xml: &str) -> crate::model::Schema {
        let doc = Document::from_string(xml).unwrap();
        parse_schema_document(&doc, Some("round.xsd")).unwrap()
    }

    #[test]
    fn test_round_trip_structural_equality() {
        let schema = parse(ROUND_TRIP_XSD);

        let mut state = EmitState::new();
        let xml = schema_to_xml(&schema, &mut state).unwrap();

        let doc = Document::from_string(&xml).unwrap();
        let reparsed = parse_schema_document(&doc, Some("round.xsd")).unwrap();

        assert_eq!(schema, reparsed);
    }

    #[test]
    fn test_imports_emitted_once_per_source_schema() {
        let schema = parse(ROUND_TRIP_XSD);

        let mut state = EmitState::new();
        let first = schema_to_xml(&schema, &mut state).unwrap();
        assert!(first.contains("schemaLocation=\"other.xsd\""));

        // Second emission of the same schema in the same session skips it
        let second = schema_to_xml(&schema, &mut state).unwrap();
        assert!(!second.contains("schemaLocation=\"other.xsd\""));
    }

    #[test]
    fn test_default_occurs_not_emitted() {
        let schema = parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:a">
  <xs:complexType name="T">
    <xs:sequence>
      <xs:element name="e" type="xs:string"/>
    </xs:sequence>
  </xs:complexType>
</xs:schema>"#,
        );

        let mut state = EmitState::new();
        let xml = schema_to_xml(&schema, &mut state).unwrap();
        assert!(!xml.contains("minOccurs"));
        assert!(!xml.contains("maxOccurs"));
    }
}
