//! Type-hierarchy analysis
//!
//! Ancestor chains follow derivation bases upward; descendants are found
//! by scanning the type index for types whose base resolves to the target.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{Error, ReferenceError, Result};
use crate::names;
use crate::repository::index::TypeCategory;
use crate::repository::SchemaRepository;

use super::{base_reference, is_builtin_reference};

/// Default bound on ancestor-chain depth
pub const DEFAULT_HIERARCHY_DEPTH: usize = 32;

/// Ancestors and descendants of one type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeHierarchy {
    /// The queried qualified name
    pub qname: String,
    /// Clark key of the queried type
    pub clark_key: String,
    /// Base chain upward, nearest first; built-in bases end the chain
    pub ancestors: Vec<String>,
    /// Types whose base resolves to the queried type, in Clark-key order
    pub descendants: Vec<String>,
}

/// Compute the hierarchy of a type, bounded by `max_depth` ancestor steps
pub fn type_hierarchy(
    repo: &SchemaRepository,
    qname: &str,
    max_depth: usize,
) -> Result<TypeHierarchy> {
    let root = repo.find_type(qname);
    if !root.resolved {
        return Err(Error::Reference(
            ReferenceError::new(qname, root.error_message.unwrap_or_default())
                .with_suggestions(root.suggestions),
        ));
    }

    let root_clark = names::clark(root.namespace.as_deref(), root.local_name.as_deref().unwrap_or_default());

    // Walk bases upward; a visited set breaks cycles in ill-formed schemas
    let mut ancestors = Vec::new();
    let mut visited: HashSet<String> = HashSet::new();
    visited.insert(root_clark.clone());

    let mut current = root;
    for _ in 0..max_depth {
        let Some(definition) = current.definition.as_ref() else {
            break;
        };
        let Some(base) = base_reference(definition) else {
            break;
        };

        if is_builtin_reference(&base) {
            ancestors.push(base);
            break;
        }

        let schema = current
            .schema_file
            .as_deref()
            .and_then(|key| repo.processed_schemas().get(key));
        let clark = match schema {
            Some(schema) => {
                let (ns, local) = schema.resolve_reference(&base);
                names::clark(ns.as_deref(), &local)
            }
            None => base.clone(),
        };

        if !visited.insert(clark.clone()) {
            break;
        }
        ancestors.push(clark.clone());

        let next = repo.find_type(&clark);
        if !next.resolved {
            break;
        }
        current = next;
    }

    Ok(TypeHierarchy {
        qname: qname.to_string(),
        descendants: find_descendants(repo, &root_clark),
        clark_key: root_clark,
        ancestors,
    })
}

/// Scan the type index for types whose base resolves to `target_clark`
fn find_descendants(repo: &SchemaRepository, target_clark: &str) -> Vec<String> {
    let mut descendants = Vec::new();

    for category in TypeCategory::TYPES {
        for entry in repo.type_index().entries(category) {
            let clark = names::clark(entry.namespace.as_deref(), &entry.local_name);
            if clark == target_clark {
                continue;
            }

            let resolution = repo.find_type(&clark);
            let Some(definition) = resolution.definition.as_ref() else {
                continue;
            };
            let Some(base) = base_reference(definition) else {
                continue;
            };

            let base_clark = entry
                .schema_location
                .as_deref()
                .and_then(|key| repo.processed_schemas().get(key))
                .map(|schema| {
                    let (ns, local) = schema.resolve_reference(&base);
                    names::clark(ns.as_deref(), &local)
                })
                .unwrap_or(base);

            if base_clark == target_clark {
                descendants.push(clark);
            }
        }
    }

    descendants.sort();
    descendants
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RepositoryConfig;
    use std::fs;
    use tempfile::TempDir;

    const HIERARCHY_XSD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           xmlns:a="urn:animals" targetNamespace="urn:animals">
  <xs:complexType name="Animal">
    <xs:sequence>
      <xs:element name="Name" type="xs:string"/>
    </xs:sequence>
  </xs:complexType>
  <xs:complexType name="Mammal">
    <xs:complexContent>
      <xs:extension base="a:Animal"/>
    </xs:complexContent>
  </xs:complexType>
  <xs:complexType name="Dog">
    <xs:complexContent>
      <xs:extension base="a:Mammal"/>
    </xs:complexContent>
  </xs:complexType>
  <xs:simpleType name="Tag">
    <xs:restriction base="xs:string"/>
  </xs:simpleType>
</xs:schema>"#;

    fn build_repo(dir: &TempDir) -> SchemaRepository {
        fs::write(dir.path().join("animals.xsd"), HIERARCHY_XSD).unwrap();
        let config = RepositoryConfig::with_files(vec![dir
            .path()
            .join("animals.xsd")
            .to_string_lossy()
            .to_string()]);
        let mut repo = SchemaRepository::new(config).unwrap();
        repo.parse().unwrap();
        repo.resolve().unwrap();
        repo
    }

    #[test]
    fn test_ancestor_chain() {
        let dir = TempDir::new().unwrap();
        let repo = build_repo(&dir);

        let hierarchy =
            type_hierarchy(&repo, "{urn:animals}Dog", DEFAULT_HIERARCHY_DEPTH).unwrap();
        assert_eq!(
            hierarchy.ancestors,
            vec!["{urn:animals}Mammal".to_string(), "{urn:animals}Animal".to_string()]
        );
    }

    #[test]
    fn test_descendants() {
        let dir = TempDir::new().unwrap();
        let repo = build_repo(&dir);

        let hierarchy =
            type_hierarchy(&repo, "{urn:animals}Animal", DEFAULT_HIERARCHY_DEPTH).unwrap();
        assert_eq!(hierarchy.descendants, vec!["{urn:animals}Mammal".to_string()]);
    }

    #[test]
    fn test_builtin_base_ends_chain() {
        let dir = TempDir::new().unwrap();
        let repo = build_repo(&dir);

        let hierarchy =
            type_hierarchy(&repo, "{urn:animals}Tag", DEFAULT_HIERARCHY_DEPTH).unwrap();
        assert_eq!(hierarchy.ancestors, vec!["xs:string".to_string()]);
    }

    #[test]
    fn test_unknown_type_is_reference_error() {
        let dir = TempDir::new().unwrap();
        let repo = build_repo(&dir);

        let result = type_hierarchy(&repo, "{urn:animals}Nothing", DEFAULT_HIERARCHY_DEPTH);
        assert!(matches!(result, Err(Error::Reference(_))));
    }
}
