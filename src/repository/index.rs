//! Global type index
//!
//! Maps Clark-notation keys (`{uri}local`), partitioned by declaration
//! category, to the schema that declared them. Bucket contents are ordered
//! by Clark key so queries and statistics are deterministic. The index
//! never owns definitions; it records where to fetch them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::names;

/// Declaration category of an index entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TypeCategory {
    /// Top-level complexType
    ComplexType,
    /// Top-level simpleType
    SimpleType,
    /// Top-level element
    Element,
    /// Top-level attribute
    Attribute,
    /// Top-level attributeGroup
    AttributeGroup,
    /// Top-level group
    Group,
    /// Top-level notation
    Notation,
}

impl TypeCategory {
    /// All categories, in bucket order
    pub const ALL: [TypeCategory; 7] = [
        TypeCategory::ComplexType,
        TypeCategory::SimpleType,
        TypeCategory::Element,
        TypeCategory::Attribute,
        TypeCategory::AttributeGroup,
        TypeCategory::Group,
        TypeCategory::Notation,
    ];

    /// The two type-definition categories
    pub const TYPES: [TypeCategory; 2] = [TypeCategory::ComplexType, TypeCategory::SimpleType];

    /// Snake-case name of this category
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ComplexType => "complex_type",
            Self::SimpleType => "simple_type",
            Self::Element => "element",
            Self::Attribute => "attribute",
            Self::AttributeGroup => "attribute_group",
            Self::Group => "group",
            Self::Notation => "notation",
        }
    }

    /// Parse a snake-case category name
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "complex_type" => Self::ComplexType,
            "simple_type" => Self::SimpleType,
            "element" => Self::Element,
            "attribute" => Self::Attribute,
            "attribute_group" => Self::AttributeGroup,
            "group" => Self::Group,
            "notation" => Self::Notation,
            _ => return None,
        })
    }
}

impl std::fmt::Display for TypeCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One entry of the type index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Namespace of the declaration
    pub namespace: Option<String>,
    /// Local name
    pub local_name: String,
    /// Declaration category
    pub category: TypeCategory,
    /// Location key of the declaring schema
    pub schema_location: Option<String>,
}

/// A duplicate registration under one (category, Clark key)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateDefinition {
    /// The contested Clark key
    pub clark_key: String,
    /// Declaration category
    pub category: TypeCategory,
    /// Schema that registered first (and wins)
    pub first_location: Option<String>,
    /// Schema whose registration was rejected
    pub duplicate_location: Option<String>,
}

/// Maximum number of similarity suggestions returned
pub const MAX_SUGGESTIONS: usize = 3;

/// Maximum Damerau-Levenshtein distance for a suggestion
pub const MAX_SUGGESTION_DISTANCE: usize = 3;

/// The global, namespace-aware index over all processed schemas
#[derive(Debug, Clone, Default)]
pub struct TypeIndex {
    buckets: BTreeMap<TypeCategory, BTreeMap<String, IndexEntry>>,
    duplicates: Vec<DuplicateDefinition>,
}

impl TypeIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all entries and duplicate records
    pub fn clear(&mut self) {
        self.buckets.clear();
        self.duplicates.clear();
    }

    /// Register a declaration; the first registration of a key wins
    pub fn insert(
        &mut self,
        category: TypeCategory,
        namespace: Option<&str>,
        local_name: &str,
        schema_location: Option<&str>,
    ) {
        let key = names::clark(namespace, local_name);
        let bucket = self.buckets.entry(category).or_default();

        if let Some(existing) = bucket.get(&key) {
            self.duplicates.push(DuplicateDefinition {
                clark_key: key,
                category,
                first_location: existing.schema_location.clone(),
                duplicate_location: schema_location.map(|s| s.to_string()),
            });
            return;
        }

        bucket.insert(
            key,
            IndexEntry {
                namespace: namespace.map(|s| s.to_string()),
                local_name: local_name.to_string(),
                category,
                schema_location: schema_location.map(|s| s.to_string()),
            },
        );
    }

    /// Strict lookup by category and Clark key
    pub fn get(&self, category: TypeCategory, clark_key: &str) -> Option<&IndexEntry> {
        self.buckets.get(&category)?.get(clark_key)
    }

    /// Lookup by category, namespace and local name
    ///
    /// With a null namespace every namespace is searched and the first hit
    /// (in Clark-key order) is returned.
    pub fn find(
        &self,
        category: TypeCategory,
        namespace: Option<&str>,
        local_name: &str,
    ) -> Option<&IndexEntry> {
        match namespace {
            Some(_) => self.get(category, &names::clark(namespace, local_name)),
            None => self
                .buckets
                .get(&category)?
                .values()
                .find(|entry| entry.local_name == local_name),
        }
    }

    /// All entries in a category, in Clark-key order
    pub fn entries(&self, category: TypeCategory) -> impl Iterator<Item = &IndexEntry> {
        self.buckets.get(&category).into_iter().flat_map(|b| b.values())
    }

    /// All Clark keys, optionally filtered by namespace and category
    pub fn all_keys(
        &self,
        namespace: Option<&str>,
        category: Option<TypeCategory>,
    ) -> Vec<String> {
        let categories: Vec<TypeCategory> = match category {
            Some(c) => vec![c],
            None => TypeCategory::ALL.to_vec(),
        };

        let mut keys: Vec<String> = categories
            .iter()
            .flat_map(|c| self.entries(*c))
            .filter(|entry| match namespace {
                Some(ns) => entry.namespace.as_deref() == Some(ns),
                None => true,
            })
            .map(|entry| names::clark(entry.namespace.as_deref(), &entry.local_name))
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }

    /// Entry count for one category
    pub fn category_count(&self, category: TypeCategory) -> usize {
        self.buckets.get(&category).map(|b| b.len()).unwrap_or(0)
    }

    /// Total entry count
    pub fn len(&self) -> usize {
        self.buckets.values().map(|b| b.len()).sum()
    }

    /// Whether the index has no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All distinct namespaces with at least one entry, sorted
    pub fn namespaces(&self) -> Vec<String> {
        let mut namespaces: Vec<String> = self
            .buckets
            .values()
            .flat_map(|b| b.values())
            .filter_map(|entry| entry.namespace.clone())
            .collect();
        namespaces.sort();
        namespaces.dedup();
        namespaces
    }

    /// Duplicate registrations observed so far
    pub fn duplicates(&self) -> &[DuplicateDefinition] {
        &self.duplicates
    }

    /// Similar local names in the queried namespace, for failed lookups
    ///
    /// At most [`MAX_SUGGESTIONS`] names, each within
    /// [`MAX_SUGGESTION_DISTANCE`] of the query.
    pub fn suggestions(
        &self,
        categories: &[TypeCategory],
        namespace: Option<&str>,
        local_name: &str,
    ) -> Vec<String> {
        let mut candidates: Vec<(usize, String)> = categories
            .iter()
            .flat_map(|c| self.entries(*c))
            .filter(|entry| match namespace {
                Some(ns) => entry.namespace.as_deref() == Some(ns),
                None => true,
            })
            .filter_map(|entry| {
                let distance = strsim::damerau_levenshtein(&entry.local_name, local_name);
                (distance <= MAX_SUGGESTION_DISTANCE).then(|| (distance, entry.local_name.clone()))
            })
            .collect();

        candidates.sort();
        candidates.dedup_by(|a, b| a.1 == b.1);
        candidates
            .into_iter()
            .take(MAX_SUGGESTIONS)
            .map(|(_, name)| name)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_index() -> TypeIndex {
        let mut index = TypeIndex::new();
        index.insert(
            TypeCategory::ComplexType,
            Some("urn:person"),
            "PersonType",
            Some("person.xsd"),
        );
        index.insert(
            TypeCategory::ComplexType,
            Some("urn:company"),
            "CompanyType",
            Some("company.xsd"),
        );
        index.insert(
            TypeCategory::Element,
            Some("urn:person"),
            "Person",
            Some("person.xsd"),
        );
        index
    }

    #[test]
    fn test_insert_and_get() {
        let index = sample_index();

        let entry = index
            .get(TypeCategory::ComplexType, "{urn:person}PersonType")
            .unwrap();
        assert_eq!(entry.local_name, "PersonType");
        assert_eq!(entry.schema_location.as_deref(), Some("person.xsd"));

        assert!(index.get(TypeCategory::SimpleType, "{urn:person}PersonType").is_none());
    }

    #[test]
    fn test_find_without_namespace_scans_all() {
        let index = sample_index();

        let entry = index
            .find(TypeCategory::ComplexType, None, "CompanyType")
            .unwrap();
        assert_eq!(entry.namespace.as_deref(), Some("urn:company"));
    }

    #[test]
    fn test_duplicate_first_wins() {
        let mut index = sample_index();
        index.insert(
            TypeCategory::ComplexType,
            Some("urn:person"),
            "PersonType",
            Some("copy.xsd"),
        );

        assert_eq!(index.duplicates().len(), 1);
        assert_eq!(
            index.duplicates()[0].first_location.as_deref(),
            Some("person.xsd")
        );
        // Original entry kept
        let entry = index
            .get(TypeCategory::ComplexType, "{urn:person}PersonType")
            .unwrap();
        assert_eq!(entry.schema_location.as_deref(), Some("person.xsd"));
    }

    #[test]
    fn test_all_keys_sorted_and_filtered() {
        let index = sample_index();

        let all = index.all_keys(None, None);
        assert_eq!(all.len(), 3);
        let mut sorted = all.clone();
        sorted.sort();
        assert_eq!(all, sorted);

        let person_only = index.all_keys(Some("urn:person"), None);
        assert_eq!(person_only.len(), 2);

        let types_only = index.all_keys(None, Some(TypeCategory::ComplexType));
        assert_eq!(types_only.len(), 2);
    }

    #[test]
    fn test_suggestions_bounded() {
        let index = sample_index();

        let suggestions = index.suggestions(
            &TypeCategory::TYPES,
            Some("urn:person"),
            "PersonTyp",
        );
        assert_eq!(suggestions, vec!["PersonType".to_string()]);

        // Too far away
        let none = index.suggestions(
            &TypeCategory::TYPES,
            Some("urn:person"),
            "Zzzzzzzzzz",
        );
        assert!(none.is_empty());

        // Wrong namespace
        let none = index.suggestions(
            &TypeCategory::TYPES,
            Some("urn:other"),
            "PersonTyp",
        );
        assert!(none.is_empty());
    }

    #[test]
    fn test_namespaces() {
        let index = sample_index();
        assert_eq!(
            index.namespaces(),
            vec!["urn:company".to_string(), "urn:person".to_string()]
        );
    }
}
