//! The schema repository
//!
//! Aggregates parsed schemas over a configuration, builds the namespace
//! registry and the global type index, answers qualified-name lookups,
//! validates structure and reference closure, and round-trips through the
//! LXR package format. All state is scoped to the repository instance;
//! independent repositories can be used from different threads.

pub mod closure;
pub mod index;
pub mod loader;

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::RepositoryConfig;
use crate::error::{Error, Result, SchemaError};
use crate::limits::Limits;
use crate::loaders::Loader;
use crate::locations::LocationResolver;
use crate::model::{Schema, SchemaItem};
use crate::names;
use crate::namespaces::NamespaceRegistry;
use crate::package::{PackageConfig, PackageMetadata, XsdMode};

use closure::ClosureReport;
use index::{TypeCategory, TypeIndex};
use loader::{ProcessedSchemas, SchemaLoader};

/// Progress callback: `(current, total, label)`
pub type ProgressFn<'a> = &'a dyn Fn(usize, usize, &str);

/// One step taken while resolving a qualified name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionStep {
    /// What this step records (`qname`, `clark`, `schema`)
    pub stage: String,
    /// The value at this step
    pub value: String,
}

impl ResolutionStep {
    fn new(stage: &str, value: impl Into<String>) -> Self {
        Self {
            stage: stage.to_string(),
            value: value.into(),
        }
    }
}

/// Outcome of a type lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeResolution {
    /// Whether the lookup succeeded
    pub resolved: bool,
    /// The qualified name as queried
    pub qname: String,
    /// Namespace the query resolved to
    pub namespace: Option<String>,
    /// Local name of the query
    pub local_name: Option<String>,
    /// Snapshot of the definition, on success
    pub definition: Option<SchemaItem>,
    /// Category of the definition, on success
    pub category: Option<TypeCategory>,
    /// Location key of the declaring schema, on success
    pub schema_file: Option<String>,
    /// Steps taken, for diagnostics
    pub resolution_path: Vec<ResolutionStep>,
    /// Failure message
    pub error_message: Option<String>,
    /// Similar names in the queried namespace, on failure (at most three)
    pub suggestions: Vec<String>,
}

impl TypeResolution {
    fn failure(qname: &str, message: impl Into<String>) -> Self {
        Self {
            resolved: false,
            qname: qname.to_string(),
            namespace: None,
            local_name: None,
            definition: None,
            category: None,
            schema_file: None,
            resolution_path: vec![ResolutionStep::new("qname", qname)],
            error_message: Some(message.into()),
            suggestions: Vec::new(),
        }
    }
}

/// Repository counters, stable across runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    /// Number of processed schemas
    pub total_schemas: usize,
    /// complexType + simpleType definitions
    pub total_types: usize,
    /// Top-level elements
    pub total_elements: usize,
    /// Top-level attributes
    pub total_attributes: usize,
    /// Top-level groups
    pub total_groups: usize,
    /// Top-level attribute groups
    pub total_attribute_groups: usize,
    /// Notation declarations
    pub total_notations: usize,
    /// Distinct namespaces with declarations
    pub total_namespaces: usize,
    /// Whether `resolve()` has run
    pub resolved: bool,
    /// Whether `validate()` has run
    pub validated: bool,
}

/// Kind of a structural validation issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructuralIssueKind {
    /// A configured entry file does not exist
    MissingFile,
    /// An import/include kept a null resolved link
    UnresolvedReference,
    /// A namespace mapping conflicts with another
    InvalidNamespaceMapping,
    /// The dependency graph contains a cycle
    CircularImport,
    /// A schema has no usable target namespace
    MissingTargetNamespace,
}

/// One structural validation issue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuralIssue {
    /// Issue kind
    pub kind: StructuralIssueKind,
    /// Whether this fails validation
    pub is_error: bool,
    /// Affected schema or file
    pub schema: Option<String>,
    /// Human-readable message
    pub message: String,
}

/// Multi-schema aggregator and query surface
#[derive(Debug)]
pub struct SchemaRepository {
    config: RepositoryConfig,
    resolver: LocationResolver,
    loader: Loader,
    limits: Limits,
    processed: ProcessedSchemas,
    registry: NamespaceRegistry,
    index: TypeIndex,
    resolved: bool,
    validated: bool,
    allow_external: bool,
    package_metadata: Option<PackageMetadata>,
    // Keeps an extracted package directory alive as long as the repository
    extract_dir: Option<tempfile::TempDir>,
}

impl SchemaRepository {
    /// Create a repository over a configuration
    pub fn new(config: RepositoryConfig) -> Result<Self> {
        let resolver = LocationResolver::with_mappings(config.schema_location_mappings.clone())?;
        Ok(Self {
            config,
            resolver,
            loader: Loader::new(),
            limits: Limits::default(),
            processed: ProcessedSchemas::new(),
            registry: NamespaceRegistry::new(),
            index: TypeIndex::new(),
            resolved: false,
            validated: false,
            allow_external: false,
            package_metadata: None,
            extract_dir: None,
        })
    }

    /// Create a repository from a YAML configuration file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let config = RepositoryConfig::from_yaml_file(path)?;
        Self::new(config)
    }

    /// Create a repository over a single schema file
    pub fn from_xsd_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_string_lossy().to_string();
        Self::new(RepositoryConfig::with_files(vec![path]))
    }

    /// Build a fully resolved repository from a file, dispatching on its
    /// extension: `.xsd`, `.yml`/`.yaml` or `.lxr`
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        let mut repo = match extension.as_str() {
            "xsd" => Self::from_xsd_file(path)?,
            "yml" | "yaml" => Self::from_yaml_file(path)?,
            "lxr" => return Self::from_package(path),
            other => {
                return Err(Error::Configuration(format!(
                    "unsupported input extension '{}' for '{}'",
                    other,
                    path.display()
                )))
            }
        };
        repo.parse()?;
        repo.resolve()?;
        Ok(repo)
    }

    /// Build from `source`, reusing `package` when it is at least as fresh
    ///
    /// The cached package is used iff it exists and its modification time
    /// is not older than the source's. On a miss the repository is rebuilt
    /// and the package rewritten.
    pub fn from_file_cached(
        source: impl AsRef<Path>,
        package: Option<&Path>,
    ) -> Result<Self> {
        let source = source.as_ref();
        let default_package = source.with_extension("lxr");
        let package = package.unwrap_or(&default_package);

        if package.exists() {
            let fresh = match (mtime(package), mtime(source)) {
                (Some(pkg), Some(src)) => pkg >= src,
                _ => false,
            };
            if fresh {
                tracing::debug!(package = %package.display(), "using cached package");
                return Self::from_package(package);
            }
        }

        let repo = Self::from_file(source)?;
        repo.to_package(package, &PackageConfig::default(), None)?;
        Ok(repo)
    }

    /// Load a repository from an LXR package
    pub fn from_package(path: impl AsRef<Path>) -> Result<Self> {
        crate::package::read_package(path.as_ref())
    }

    // ========== Building ==========

    /// Parse every configured entry file into the processed-schemas map
    ///
    /// Idempotent: already-processed locations are skipped.
    pub fn parse(&mut self) -> Result<()> {
        self.parse_with_progress(None)
    }

    /// Override the schema-location mappings before parsing
    ///
    /// The overrides are consulted before the configured mappings.
    pub fn add_location_mappings(
        &mut self,
        mut mappings: Vec<crate::locations::LocationMapping>,
    ) -> Result<()> {
        mappings.extend(self.config.schema_location_mappings.clone());
        self.config.schema_location_mappings = mappings;
        self.resolver =
            LocationResolver::with_mappings(self.config.schema_location_mappings.clone())?;
        Ok(())
    }

    /// Parse with an optional progress callback
    pub fn parse_with_progress(&mut self, progress: Option<ProgressFn>) -> Result<()> {
        let files = self.config.files.clone();
        let total = files.len();

        for (current, file) in files.iter().enumerate() {
            if let Some(progress) = progress {
                progress(current + 1, total, file);
            }

            let base = Path::new(file)
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(|p| p.to_string_lossy().to_string());
            self.resolver.set_base(base);

            let schema_loader = SchemaLoader::new(&self.resolver, &self.loader, &self.limits);
            schema_loader.parse_entry(file, &mut self.processed)?;
        }

        self.resolved = false;
        Ok(())
    }

    /// Extract namespaces and build the type index
    ///
    /// Idempotent and deterministic: buckets are keyed by Clark key in
    /// ascending order, so repeated calls produce identical state.
    pub fn resolve(&mut self) -> Result<()> {
        self.registry = NamespaceRegistry::new();
        for mapping in &self.config.namespace_mappings {
            self.registry.register(mapping.prefix.clone(), mapping.uri.clone());
        }
        self.registry.extract_from_schemas(self.processed.schemas());

        self.index.clear();
        for (key, schema) in self.processed.iter() {
            if !schema.is_valid_for_use() {
                tracing::warn!(schema = key, "schema has no target namespace");
            }
            let namespace = schema.target_namespace.as_deref();
            for item in &schema.items {
                let (Some(category), Some(name)) = (item_category(item), item.name()) else {
                    continue;
                };
                self.index.insert(category, namespace, name, Some(key));
            }
        }

        self.limits.check_schema_components(self.index.len())?;
        self.resolved = true;
        Ok(())
    }

    // ========== Structural validation ==========

    /// Check structural consistency of the repository
    ///
    /// Reports missing entry files, unresolved imports/includes, invalid
    /// namespace mappings and circular imports. With `strict` the first
    /// error is raised instead of collected.
    pub fn validate(&mut self, strict: bool) -> Result<Vec<StructuralIssue>> {
        let mut issues = Vec::new();

        for file in &self.config.files {
            if !file.starts_with("http://")
                && !file.starts_with("https://")
                && !Path::new(file).exists()
                && !self.processed.contains_key(file)
            {
                issues.push(StructuralIssue {
                    kind: StructuralIssueKind::MissingFile,
                    is_error: true,
                    schema: Some(file.clone()),
                    message: format!("configured schema file '{}' does not exist", file),
                });
            }
        }

        let mut seen_prefixes: HashMap<&str, &str> = HashMap::new();
        for mapping in &self.config.namespace_mappings {
            if let Some(existing) = seen_prefixes.get(mapping.prefix.as_str()) {
                if *existing != mapping.uri {
                    issues.push(StructuralIssue {
                        kind: StructuralIssueKind::InvalidNamespaceMapping,
                        is_error: true,
                        schema: None,
                        message: format!(
                            "prefix '{}' is mapped to both '{}' and '{}'",
                            mapping.prefix, existing, mapping.uri
                        ),
                    });
                }
            }
            seen_prefixes.insert(&mapping.prefix, &mapping.uri);
        }

        for (key, schema) in self.processed.iter() {
            if !schema.is_valid_for_use() {
                issues.push(StructuralIssue {
                    kind: StructuralIssueKind::MissingTargetNamespace,
                    is_error: false,
                    schema: Some(key.to_string()),
                    message: "schema has no target namespace".to_string(),
                });
            }

            for import in schema.imports() {
                if import.schema_location.is_some() && import.resolved_location.is_none() {
                    issues.push(StructuralIssue {
                        kind: StructuralIssueKind::UnresolvedReference,
                        is_error: true,
                        schema: Some(key.to_string()),
                        message: format!(
                            "import '{}' was not resolved",
                            import.schema_location.as_deref().unwrap_or_default()
                        ),
                    });
                }
            }
            for include in schema.includes() {
                if include.schema_location.is_some() && include.resolved_location.is_none() {
                    issues.push(StructuralIssue {
                        kind: StructuralIssueKind::UnresolvedReference,
                        is_error: true,
                        schema: Some(key.to_string()),
                        message: format!(
                            "include '{}' was not resolved",
                            include.schema_location.as_deref().unwrap_or_default()
                        ),
                    });
                }
            }
        }

        if let Some(cycle) = self.find_import_cycle() {
            issues.push(StructuralIssue {
                kind: StructuralIssueKind::CircularImport,
                is_error: true,
                schema: cycle.first().cloned(),
                message: format!("circular import chain: {}", cycle.join(" -> ")),
            });
        }

        if strict {
            if let Some(first_error) = issues.iter().find(|issue| issue.is_error) {
                return Err(Error::Schema(
                    SchemaError::new(first_error.message.clone())
                        .with_location(first_error.schema.clone().unwrap_or_default()),
                ));
            }
        }

        self.validated = true;
        Ok(issues)
    }

    /// Depth-first search for a cycle in the import/include graph
    fn find_import_cycle(&self) -> Option<Vec<String>> {
        let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
        for (key, schema) in self.processed.iter() {
            let mut edges = Vec::new();
            for import in schema.imports() {
                if let Some(target) = import.resolved_location.as_deref() {
                    edges.push(target);
                }
            }
            for include in schema.includes() {
                if let Some(target) = include.resolved_location.as_deref() {
                    edges.push(target);
                }
            }
            adjacency.insert(key, edges);
        }

        let mut visited: HashSet<&str> = HashSet::new();
        let mut stack: Vec<&str> = Vec::new();
        let mut on_stack: HashSet<&str> = HashSet::new();

        fn dfs<'a>(
            node: &'a str,
            adjacency: &HashMap<&'a str, Vec<&'a str>>,
            visited: &mut HashSet<&'a str>,
            stack: &mut Vec<&'a str>,
            on_stack: &mut HashSet<&'a str>,
        ) -> Option<Vec<String>> {
            visited.insert(node);
            stack.push(node);
            on_stack.insert(node);

            for next in adjacency.get(node).into_iter().flatten() {
                if on_stack.contains(next) {
                    let start = stack.iter().position(|n| n == next).unwrap_or(0);
                    let mut cycle: Vec<String> =
                        stack[start..].iter().map(|s| s.to_string()).collect();
                    cycle.push(next.to_string());
                    return Some(cycle);
                }
                if !visited.contains(next) {
                    if let Some(cycle) = dfs(*next, adjacency, visited, stack, on_stack) {
                        return Some(cycle);
                    }
                }
            }

            stack.pop();
            on_stack.remove(node);
            None
        }

        for node in adjacency.keys() {
            if !visited.contains(node) {
                if let Some(cycle) = dfs(*node, &adjacency, &mut visited, &mut stack, &mut on_stack)
                {
                    return Some(cycle);
                }
            }
        }
        None
    }

    /// Validate reference closure over every processed schema
    pub fn validate_full_resolution(&self) -> ClosureReport {
        closure::validate_closure(&self.processed, &self.index, self.allow_external)
    }

    // ========== Queries ==========

    /// Look up a type definition (complexType or simpleType) by qualified
    /// name: `prefix:local`, `{uri}local` or a bare local name
    pub fn find_type(&self, qname: &str) -> TypeResolution {
        let parsed = match self.registry.parse_qname(qname) {
            Ok(parsed) => parsed,
            Err(e) => return TypeResolution::failure(qname, e.to_string()),
        };

        if let (Some(prefix), None) = (&parsed.prefix, &parsed.namespace) {
            return TypeResolution::failure(qname, format!("prefix '{}' not registered", prefix));
        }

        let mut path = vec![
            ResolutionStep::new("qname", qname),
            ResolutionStep::new("clark", parsed.clark()),
        ];

        let entry = TypeCategory::TYPES
            .iter()
            .find_map(|category| {
                self.index
                    .find(*category, parsed.namespace.as_deref(), &parsed.local_name)
            });

        match entry {
            Some(entry) => {
                if let Some(schema_file) = entry.schema_location.as_deref() {
                    path.push(ResolutionStep::new("schema", schema_file));
                }
                TypeResolution {
                    resolved: true,
                    qname: qname.to_string(),
                    namespace: entry.namespace.clone(),
                    local_name: Some(entry.local_name.clone()),
                    definition: self.fetch_definition(entry),
                    category: Some(entry.category),
                    schema_file: entry.schema_location.clone(),
                    resolution_path: path,
                    error_message: None,
                    suggestions: Vec::new(),
                }
            }
            None => {
                let suggestions = self.index.suggestions(
                    &TypeCategory::TYPES,
                    parsed.namespace.as_deref(),
                    &parsed.local_name,
                );
                TypeResolution {
                    resolved: false,
                    qname: qname.to_string(),
                    namespace: parsed.namespace.clone(),
                    local_name: Some(parsed.local_name.clone()),
                    definition: None,
                    category: None,
                    schema_file: None,
                    resolution_path: path,
                    error_message: Some(match &parsed.namespace {
                        Some(ns) => {
                            format!("type '{}' not found in namespace '{}'", parsed.local_name, ns)
                        }
                        None => format!("type '{}' not found in any namespace", parsed.local_name),
                    }),
                    suggestions,
                }
            }
        }
    }

    /// Look up a top-level element declaration
    pub fn find_element(&self, qname: &str) -> Option<SchemaItem> {
        self.find_in_category(qname, TypeCategory::Element)
    }

    /// Look up a top-level attribute declaration
    pub fn find_attribute(&self, qname: &str) -> Option<SchemaItem> {
        self.find_in_category(qname, TypeCategory::Attribute)
    }

    /// Look up a named model group
    pub fn find_group(&self, qname: &str) -> Option<SchemaItem> {
        self.find_in_category(qname, TypeCategory::Group)
    }

    /// Look up a named attribute group
    pub fn find_attribute_group(&self, qname: &str) -> Option<SchemaItem> {
        self.find_in_category(qname, TypeCategory::AttributeGroup)
    }

    fn find_in_category(&self, qname: &str, category: TypeCategory) -> Option<SchemaItem> {
        let parsed = self.registry.parse_qname(qname).ok()?;
        if parsed.prefix.is_some() && parsed.namespace.is_none() {
            return None;
        }
        let entry = self
            .index
            .find(category, parsed.namespace.as_deref(), &parsed.local_name)?;
        self.fetch_definition(entry)
    }

    /// Fetch the definition behind an index entry from its owning schema
    fn fetch_definition(&self, entry: &index::IndexEntry) -> Option<SchemaItem> {
        let schema = self.processed.get(entry.schema_location.as_deref()?)?;
        schema
            .items
            .iter()
            .find(|item| {
                item_category(item) == Some(entry.category)
                    && item.name() == Some(entry.local_name.as_str())
            })
            .cloned()
    }

    /// Sorted qualified names, optionally filtered by namespace and category
    pub fn all_type_names(
        &self,
        namespace: Option<&str>,
        category: Option<TypeCategory>,
    ) -> Vec<String> {
        self.index.all_keys(namespace, category)
    }

    /// Rewrite an unprefixed reference to a prefixed one when a prefix is
    /// registered for the schema's target namespace
    pub fn qualify_reference(&self, schema: &Schema, reference: &str) -> String {
        if reference.contains(':') || names::is_clark(reference) {
            return reference.to_string();
        }
        let Some(namespace) = schema.target_namespace.as_deref() else {
            return reference.to_string();
        };
        match self.registry.primary_prefix(namespace) {
            Some(prefix) => format!("{}:{}", prefix, reference),
            None => reference.to_string(),
        }
    }

    /// Repository counters
    pub fn statistics(&self) -> Statistics {
        Statistics {
            total_schemas: self.processed.len(),
            total_types: self.index.category_count(TypeCategory::ComplexType)
                + self.index.category_count(TypeCategory::SimpleType),
            total_elements: self.index.category_count(TypeCategory::Element),
            total_attributes: self.index.category_count(TypeCategory::Attribute),
            total_groups: self.index.category_count(TypeCategory::Group),
            total_attribute_groups: self.index.category_count(TypeCategory::AttributeGroup),
            total_notations: self.index.category_count(TypeCategory::Notation),
            total_namespaces: self.index.namespaces().len(),
            resolved: self.resolved,
            validated: self.validated,
        }
    }

    // ========== Packaging ==========

    /// Write this repository as an LXR package
    pub fn to_package(
        &self,
        path: impl AsRef<Path>,
        config: &PackageConfig,
        progress: Option<ProgressFn>,
    ) -> Result<()> {
        crate::package::write_package(self, path.as_ref(), config, progress)
    }

    // ========== Accessors ==========

    /// The configuration this repository was built from
    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// The processed-schemas map
    pub fn processed_schemas(&self) -> &ProcessedSchemas {
        &self.processed
    }

    /// The namespace registry
    pub fn namespace_registry(&self) -> &NamespaceRegistry {
        &self.registry
    }

    /// The type index
    pub fn type_index(&self) -> &TypeIndex {
        &self.index
    }

    /// Whether `resolve()` has run
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Metadata of the package this repository was loaded from, if any
    pub fn package_metadata(&self) -> Option<&PackageMetadata> {
        self.package_metadata.as_ref()
    }

    // ========== Internal wiring for the package reader ==========

    pub(crate) fn register_schema(&mut self, key: String, schema: Schema) {
        let concrete = schema.source_url.clone();
        self.processed.insert(key, concrete, schema);
    }

    pub(crate) fn adopt_package(
        &mut self,
        metadata: PackageMetadata,
        extract_dir: tempfile::TempDir,
    ) {
        self.allow_external = metadata.xsd_mode == XsdMode::AllowExternal;
        self.package_metadata = Some(metadata);
        self.extract_dir = Some(extract_dir);
    }
}

/// The index category of a top-level schema item, if it is indexable
pub fn item_category(item: &SchemaItem) -> Option<TypeCategory> {
    Some(match item {
        SchemaItem::ComplexType(_) => TypeCategory::ComplexType,
        SchemaItem::SimpleType(_) => TypeCategory::SimpleType,
        SchemaItem::Element(_) => TypeCategory::Element,
        SchemaItem::Attribute(_) => TypeCategory::Attribute,
        SchemaItem::AttributeGroup(_) => TypeCategory::AttributeGroup,
        SchemaItem::Group(_) => TypeCategory::Group,
        SchemaItem::Notation(_) => TypeCategory::Notation,
        _ => return None,
    })
}

fn mtime(path: &Path) -> Option<std::time::SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}
