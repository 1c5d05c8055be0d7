//! Dependency analysis
//!
//! Forward dependencies follow every type reference inside a definition up
//! to a depth bound; reverse dependents scan the type index for
//! definitions whose references resolve to the target.

use std::collections::{BTreeMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::error::{Error, ReferenceError, Result};
use crate::names;
use crate::repository::index::TypeCategory;
use crate::repository::SchemaRepository;

use super::{collect_references, is_builtin_reference};

/// Default bound on forward dependency depth
pub const DEFAULT_DEPENDENCY_DEPTH: usize = 8;

/// Forward dependency graph of one type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyGraph {
    /// Clark key of the root type
    pub root: String,
    /// Outgoing edges per node, in Clark-key order
    pub edges: BTreeMap<String, Vec<String>>,
    /// Depth bound the walk used
    pub max_depth: usize,
}

impl DependencyGraph {
    /// All distinct nodes reachable from the root
    pub fn nodes(&self) -> Vec<String> {
        let mut nodes: Vec<String> = self
            .edges
            .iter()
            .flat_map(|(from, to)| std::iter::once(from.clone()).chain(to.iter().cloned()))
            .collect();
        nodes.sort();
        nodes.dedup();
        nodes
    }
}

/// Collect forward dependencies of a type up to `max_depth`
pub fn dependencies(
    repo: &SchemaRepository,
    qname: &str,
    max_depth: usize,
) -> Result<DependencyGraph> {
    let root = repo.find_type(qname);
    if !root.resolved {
        return Err(Error::Reference(
            ReferenceError::new(qname, root.error_message.unwrap_or_default())
                .with_suggestions(root.suggestions),
        ));
    }

    let root_clark = names::clark(
        root.namespace.as_deref(),
        root.local_name.as_deref().unwrap_or_default(),
    );

    let mut edges: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut visited: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<(String, usize)> = VecDeque::new();

    visited.insert(root_clark.clone());
    queue.push_back((root_clark.clone(), 0));

    while let Some((clark, depth)) = queue.pop_front() {
        if depth >= max_depth {
            continue;
        }

        let targets = resolved_references(repo, &clark);
        if targets.is_empty() {
            continue;
        }

        for target in &targets {
            if !is_builtin_reference(target) && visited.insert(target.clone()) {
                queue.push_back((target.clone(), depth + 1));
            }
        }
        edges.insert(clark, targets);
    }

    Ok(DependencyGraph {
        root: root_clark,
        edges,
        max_depth,
    })
}

/// Types whose definitions reference the target, in Clark-key order
pub fn dependents(repo: &SchemaRepository, qname: &str) -> Result<Vec<String>> {
    let target = repo.find_type(qname);
    if !target.resolved {
        return Err(Error::Reference(
            ReferenceError::new(qname, target.error_message.unwrap_or_default())
                .with_suggestions(target.suggestions),
        ));
    }

    let target_clark = names::clark(
        target.namespace.as_deref(),
        target.local_name.as_deref().unwrap_or_default(),
    );

    let mut dependents = Vec::new();
    for category in TypeCategory::ALL {
        for entry in repo.type_index().entries(category) {
            let clark = names::clark(entry.namespace.as_deref(), &entry.local_name);
            if clark == target_clark {
                continue;
            }
            if resolved_references(repo, &clark).contains(&target_clark) {
                dependents.push(clark);
            }
        }
    }

    dependents.sort();
    dependents.dedup();
    Ok(dependents)
}

/// References of the definition behind a Clark key, resolved to Clark keys
/// through the owning schema's declarations (built-ins kept as written)
fn resolved_references(repo: &SchemaRepository, clark: &str) -> Vec<String> {
    let Ok((namespace, local_name)) = names::split_clark(clark) else {
        return Vec::new();
    };

    let Some(entry) = TypeCategory::ALL.iter().find_map(|category| {
        repo.type_index()
            .find(*category, namespace.as_deref(), &local_name)
    }) else {
        return Vec::new();
    };

    let Some(schema) = entry
        .schema_location
        .as_deref()
        .and_then(|key| repo.processed_schemas().get(key))
    else {
        return Vec::new();
    };

    let Some(definition) = schema.items.iter().find(|item| {
        crate::repository::item_category(item) == Some(entry.category)
            && item.name() == Some(entry.local_name.as_str())
    }) else {
        return Vec::new();
    };

    let mut resolved = Vec::new();
    for raw in collect_references(definition) {
        let reference = if is_builtin_reference(&raw) {
            raw
        } else {
            let (ns, local) = schema.resolve_reference(&raw);
            names::clark(ns.as_deref(), &local)
        };
        if !resolved.contains(&reference) {
            resolved.push(reference);
        }
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RepositoryConfig;
    use std::fs;
    use tempfile::TempDir;

    const DEPS_XSD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           xmlns:o="urn:orders" targetNamespace="urn:orders">
  <xs:complexType name="Order">
    <xs:sequence>
      <xs:element name="Customer" type="o:Customer"/>
      <xs:element name="Line" type="o:OrderLine" maxOccurs="unbounded"/>
    </xs:sequence>
  </xs:complexType>
  <xs:complexType name="Customer">
    <xs:sequence>
      <xs:element name="Name" type="xs:string"/>
    </xs:sequence>
  </xs:complexType>
  <xs:complexType name="OrderLine">
    <xs:sequence>
      <xs:element name="Item" type="o:Item"/>
    </xs:sequence>
  </xs:complexType>
  <xs:complexType name="Item">
    <xs:sequence>
      <xs:element name="Sku" type="xs:string"/>
    </xs:sequence>
  </xs:complexType>
</xs:schema>"#;

    fn build_repo(dir: &TempDir) -> SchemaRepository {
        fs::write(dir.path().join("orders.xsd"), DEPS_XSD).unwrap();
        let config = RepositoryConfig::with_files(vec![dir
            .path()
            .join("orders.xsd")
            .to_string_lossy()
            .to_string()]);
        let mut repo = SchemaRepository::new(config).unwrap();
        repo.parse().unwrap();
        repo.resolve().unwrap();
        repo
    }

    #[test]
    fn test_forward_dependencies() {
        let dir = TempDir::new().unwrap();
        let repo = build_repo(&dir);

        let graph = dependencies(&repo, "{urn:orders}Order", DEFAULT_DEPENDENCY_DEPTH).unwrap();

        let direct = graph.edges.get("{urn:orders}Order").unwrap();
        assert!(direct.contains(&"{urn:orders}Customer".to_string()));
        assert!(direct.contains(&"{urn:orders}OrderLine".to_string()));

        // Transitive edge reached through OrderLine
        assert!(graph.edges.contains_key("{urn:orders}OrderLine"));
        assert!(graph.nodes().contains(&"{urn:orders}Item".to_string()));
    }

    #[test]
    fn test_depth_bound() {
        let dir = TempDir::new().unwrap();
        let repo = build_repo(&dir);

        let graph = dependencies(&repo, "{urn:orders}Order", 1).unwrap();
        // Order itself expanded, OrderLine not (depth bound)
        assert!(graph.edges.contains_key("{urn:orders}Order"));
        assert!(!graph.edges.contains_key("{urn:orders}OrderLine"));
    }

    #[test]
    fn test_dependents() {
        let dir = TempDir::new().unwrap();
        let repo = build_repo(&dir);

        let result = dependents(&repo, "{urn:orders}Item").unwrap();
        assert_eq!(result, vec!["{urn:orders}OrderLine".to_string()]);
    }

    #[test]
    fn test_unknown_root_is_error() {
        let dir = TempDir::new().unwrap();
        let repo = build_repo(&dir);

        assert!(dependencies(&repo, "{urn:orders}Nothing", 3).is_err());
    }
}
