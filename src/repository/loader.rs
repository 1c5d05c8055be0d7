//! Recursive schema loading
//!
//! Parses one document, then resolves its import/include/redefine
//! references through the location resolver, recursing into dependencies.
//! Every parsed schema is registered in the repository-scoped
//! processed-schemas map under its location string as given. An in-progress
//! set over concrete locations detects cycles: a reference to a schema
//! still being parsed becomes a forward declaration instead of a
//! recursion.
//!
//! A parse failure in a dependency never aborts the parent; the reference
//! keeps a null resolved link and closure validation reports it later. A
//! failure in the entry schema aborts the call.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::documents::Document;
use crate::error::Result;
use crate::limits::Limits;
use crate::loaders::Loader;
use crate::locations::LocationResolver;
use crate::model::{parse_schema_document, Schema, SchemaItem};

/// Repository-scoped cache of parsed schemas
///
/// At most one schema per location key; insertion order is preserved.
#[derive(Debug, Default)]
pub struct ProcessedSchemas {
    schemas: IndexMap<String, Schema>,
    by_resolved: HashMap<String, String>,
    in_progress: HashMap<String, String>,
}

impl ProcessedSchemas {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of processed schemas
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Whether a location key has been processed
    pub fn contains_key(&self, key: &str) -> bool {
        self.schemas.contains_key(key)
    }

    /// The schema registered under a location key
    pub fn get(&self, key: &str) -> Option<&Schema> {
        self.schemas.get(key)
    }

    /// The location key a concrete location was registered under
    pub fn key_for_resolved(&self, concrete: &str) -> Option<&str> {
        self.by_resolved.get(concrete).map(|s| s.as_str())
    }

    /// Iterate over (location key, schema) pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Schema)> {
        self.schemas.iter().map(|(k, s)| (k.as_str(), s))
    }

    /// Iterate over schemas in insertion order
    pub fn schemas(&self) -> impl Iterator<Item = &Schema> {
        self.schemas.values()
    }

    /// All location keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(|s| s.as_str())
    }

    /// Register a schema under its location key
    pub fn insert(&mut self, key: String, concrete: Option<String>, schema: Schema) {
        if let Some(concrete) = concrete {
            self.by_resolved.insert(concrete, key.clone());
        }
        self.schemas.entry(key).or_insert(schema);
    }

    /// Drop everything, including the in-progress set
    pub fn clear(&mut self) {
        self.schemas.clear();
        self.by_resolved.clear();
        self.in_progress.clear();
    }

    /// Clear only the in-progress set (start of a top-level parse)
    pub fn clear_in_progress(&mut self) {
        self.in_progress.clear();
    }

    fn begin(&mut self, concrete: String, key: String) {
        self.in_progress.insert(concrete, key);
    }

    fn finish(&mut self, concrete: &str) {
        self.in_progress.remove(concrete);
    }

    /// The pending location key for a concrete location being parsed
    pub fn in_progress_key(&self, concrete: &str) -> Option<&str> {
        self.in_progress.get(concrete).map(|s| s.as_str())
    }
}

/// One-document parser wired to a resolver, loader and limits
#[derive(Debug)]
pub struct SchemaLoader<'a> {
    resolver: &'a LocationResolver,
    loader: &'a Loader,
    limits: &'a Limits,
}

impl<'a> SchemaLoader<'a> {
    /// Create a loader over borrowed collaborators
    pub fn new(resolver: &'a LocationResolver, loader: &'a Loader, limits: &'a Limits) -> Self {
        Self {
            resolver,
            loader,
            limits,
        }
    }

    /// Parse an entry-point location
    ///
    /// Clears the in-progress set but not the processed-schemas cache, so
    /// repeated calls deduplicate across entries. Returns the location key
    /// the entry was registered under.
    pub fn parse_entry(&self, location: &str, processed: &mut ProcessedSchemas) -> Result<String> {
        processed.clear_in_progress();
        self.parse_location(location, processed, 0)
    }

    fn parse_location(
        &self,
        location: &str,
        processed: &mut ProcessedSchemas,
        depth: usize,
    ) -> Result<String> {
        self.limits.check_schema_depth(depth)?;

        if processed.contains_key(location) {
            return Ok(location.to_string());
        }

        let concrete = self.resolver.resolve(location)?;
        if let Some(key) = processed.key_for_resolved(&concrete) {
            return Ok(key.to_string());
        }

        processed.begin(concrete.clone(), location.to_string());
        let result = self.parse_and_register(location, &concrete, processed, depth);
        processed.finish(&concrete);
        result
    }

    fn parse_and_register(
        &self,
        location: &str,
        concrete: &str,
        processed: &mut ProcessedSchemas,
        depth: usize,
    ) -> Result<String> {
        tracing::debug!(location = %location, concrete = %concrete, depth, "parsing schema");

        let bytes = self.loader.load_location(concrete)?;
        let doc = Document::parse(&bytes)?;
        let mut schema = parse_schema_document(&doc, Some(location))?;
        schema.source_url = Some(concrete.to_string());

        for index in 0..schema.items.len() {
            let Some(child_location) = reference_location(&schema.items[index]) else {
                continue;
            };

            if child_location.trim().is_empty() {
                tracing::warn!(schema = %location, "schema reference with blank location");
                continue;
            }

            let resolved_key = self.resolve_child(&child_location, processed, depth);
            if let Some(key) = resolved_key {
                set_resolved_location(&mut schema.items[index], key);
            }
        }

        processed.insert(location.to_string(), Some(concrete.to_string()), schema);
        Ok(location.to_string())
    }

    /// Resolve one dependency reference; failures degrade to a warning
    fn resolve_child(
        &self,
        child_location: &str,
        processed: &mut ProcessedSchemas,
        depth: usize,
    ) -> Option<String> {
        let concrete = match self.resolver.resolve(child_location) {
            Ok(concrete) => concrete,
            Err(e) => {
                tracing::warn!(location = %child_location, error = %e, "cannot resolve schema reference");
                return None;
            }
        };

        // Already being parsed higher up the stack: forward declaration
        if let Some(pending_key) = processed.in_progress_key(&concrete) {
            return Some(pending_key.to_string());
        }

        if let Some(key) = processed.key_for_resolved(&concrete) {
            return Some(key.to_string());
        }
        if processed.contains_key(child_location) {
            return Some(child_location.to_string());
        }

        match self.parse_location(child_location, processed, depth + 1) {
            Ok(key) => Some(key),
            Err(e) => {
                tracing::warn!(location = %child_location, error = %e, "dependency schema failed to parse");
                None
            }
        }
    }
}

fn reference_location(item: &SchemaItem) -> Option<String> {
    match item {
        SchemaItem::Import(i) => i.schema_location.clone(),
        SchemaItem::Include(i) => i.schema_location.clone(),
        SchemaItem::Redefine(r) => r.schema_location.clone(),
        _ => None,
    }
}

fn set_resolved_location(item: &mut SchemaItem, key: String) {
    match item {
        SchemaItem::Import(i) => i.resolved_location = Some(key),
        SchemaItem::Include(i) => i.resolved_location = Some(key),
        SchemaItem::Redefine(r) => r.resolved_location = Some(key),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_schema(dir: &TempDir, name: &str, body: &str) {
        fs::write(dir.path().join(name), body).unwrap();
    }

    fn loader_parts() -> (Loader, Limits) {
        (Loader::new(), Limits::default())
    }

    #[test]
    fn test_chained_include() {
        let dir = TempDir::new().unwrap();
        write_schema(
            &dir,
            "a.xsd",
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:a">
                 <xs:include schemaLocation="b.xsd"/>
                 <xs:element name="A" type="xs:string"/>
               </xs:schema>"#,
        );
        write_schema(
            &dir,
            "b.xsd",
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:a">
                 <xs:include schemaLocation="c.xsd"/>
                 <xs:element name="B" type="xs:string"/>
               </xs:schema>"#,
        );
        write_schema(
            &dir,
            "c.xsd",
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:a">
                 <xs:element name="C" type="xs:string"/>
               </xs:schema>"#,
        );

        let mut resolver = LocationResolver::new();
        resolver.set_base(Some(dir.path().to_string_lossy().to_string()));
        let (loader, limits) = loader_parts();
        let schema_loader = SchemaLoader::new(&resolver, &loader, &limits);

        let mut processed = ProcessedSchemas::new();
        let entry = dir.path().join("a.xsd").to_string_lossy().to_string();
        schema_loader.parse_entry(&entry, &mut processed).unwrap();

        assert_eq!(processed.len(), 3);
        let a = processed.get(&entry).unwrap();
        let include = a.includes().next().unwrap();
        assert_eq!(include.resolved_location.as_deref(), Some("b.xsd"));
    }

    #[test]
    fn test_circular_import_terminates() {
        let dir = TempDir::new().unwrap();
        write_schema(
            &dir,
            "x.xsd",
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:x">
                 <xs:import namespace="urn:y" schemaLocation="y.xsd"/>
                 <xs:element name="X" type="xs:string"/>
               </xs:schema>"#,
        );
        write_schema(
            &dir,
            "y.xsd",
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:y">
                 <xs:import namespace="urn:x" schemaLocation="x.xsd"/>
                 <xs:element name="Y" type="xs:string"/>
               </xs:schema>"#,
        );

        let mut resolver = LocationResolver::new();
        resolver.set_base(Some(dir.path().to_string_lossy().to_string()));
        let (loader, limits) = loader_parts();
        let schema_loader = SchemaLoader::new(&resolver, &loader, &limits);

        let mut processed = ProcessedSchemas::new();
        let entry = dir.path().join("x.xsd").to_string_lossy().to_string();
        schema_loader.parse_entry(&entry, &mut processed).unwrap();

        assert_eq!(processed.len(), 2);

        // The back edge resolved as a forward declaration to the entry key
        let y = processed.get("y.xsd").unwrap();
        let back = y.imports().next().unwrap();
        assert_eq!(back.resolved_location.as_deref(), Some(entry.as_str()));
    }

    #[test]
    fn test_missing_dependency_degrades() {
        let dir = TempDir::new().unwrap();
        write_schema(
            &dir,
            "a.xsd",
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:a">
                 <xs:import namespace="urn:gone" schemaLocation="gone.xsd"/>
                 <xs:element name="A" type="xs:string"/>
               </xs:schema>"#,
        );

        let mut resolver = LocationResolver::new();
        resolver.set_base(Some(dir.path().to_string_lossy().to_string()));
        let (loader, limits) = loader_parts();
        let schema_loader = SchemaLoader::new(&resolver, &loader, &limits);

        let mut processed = ProcessedSchemas::new();
        let entry = dir.path().join("a.xsd").to_string_lossy().to_string();

        // Parent still parses
        schema_loader.parse_entry(&entry, &mut processed).unwrap();
        assert_eq!(processed.len(), 1);

        let a = processed.get(&entry).unwrap();
        assert!(a.imports().next().unwrap().resolved_location.is_none());
    }

    #[test]
    fn test_missing_entry_is_error() {
        let resolver = LocationResolver::new();
        let (loader, limits) = loader_parts();
        let schema_loader = SchemaLoader::new(&resolver, &loader, &limits);

        let mut processed = ProcessedSchemas::new();
        let result = schema_loader.parse_entry("/nonexistent/entry.xsd", &mut processed);
        assert!(result.is_err());
        assert!(processed.is_empty());
    }

    #[test]
    fn test_reparse_is_idempotent() {
        let dir = TempDir::new().unwrap();
        write_schema(
            &dir,
            "a.xsd",
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:a"/>"#,
        );

        let mut resolver = LocationResolver::new();
        resolver.set_base(Some(dir.path().to_string_lossy().to_string()));
        let (loader, limits) = loader_parts();
        let schema_loader = SchemaLoader::new(&resolver, &loader, &limits);

        let mut processed = ProcessedSchemas::new();
        let entry = dir.path().join("a.xsd").to_string_lossy().to_string();
        schema_loader.parse_entry(&entry, &mut processed).unwrap();
        schema_loader.parse_entry(&entry, &mut processed).unwrap();

        assert_eq!(processed.len(), 1);
    }
}
