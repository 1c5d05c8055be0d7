//! Coverage analysis
//!
//! Computes the transitive closure of type references from a list of
//! entry-point qualified names and reports which indexed types are used.

use std::collections::{BTreeMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::error::{Error, ReferenceError, Result};
use crate::names;
use crate::repository::index::TypeCategory;
use crate::repository::SchemaRepository;

use super::{collect_references, is_builtin_reference};

/// Per-namespace usage counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NamespaceCoverage {
    /// Indexed types in this namespace
    pub total: usize,
    /// Types reachable from the entry points
    pub used: usize,
}

/// Result of a coverage run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageReport {
    /// Indexed type definitions
    pub total: usize,
    /// Types reachable from the entry points
    pub used: usize,
    /// Unreached types, in Clark-key order
    pub unused: Vec<String>,
    /// used / total, in percent
    pub coverage_percent: f64,
    /// Per-namespace breakdown
    pub by_namespace: BTreeMap<String, NamespaceCoverage>,
}

/// Compute type coverage from entry-point qualified type names
pub fn coverage(repo: &SchemaRepository, entry_points: &[String]) -> Result<CoverageReport> {
    let mut used: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<String> = VecDeque::new();

    for entry_point in entry_points {
        let resolution = repo.find_type(entry_point);
        if !resolution.resolved {
            return Err(Error::Reference(
                ReferenceError::new(
                    entry_point.clone(),
                    resolution.error_message.unwrap_or_default(),
                )
                .with_suggestions(resolution.suggestions),
            ));
        }
        let clark = names::clark(
            resolution.namespace.as_deref(),
            resolution.local_name.as_deref().unwrap_or_default(),
        );
        if used.insert(clark.clone()) {
            queue.push_back(clark);
        }
    }

    // Transitive closure over type references
    while let Some(clark) = queue.pop_front() {
        let resolution = repo.find_type(&clark);
        let Some(definition) = resolution.definition.as_ref() else {
            continue;
        };
        let schema = resolution
            .schema_file
            .as_deref()
            .and_then(|key| repo.processed_schemas().get(key));

        for raw in collect_references(definition) {
            if is_builtin_reference(&raw) {
                continue;
            }
            let target = match schema {
                Some(schema) => {
                    let (ns, local) = schema.resolve_reference(&raw);
                    names::clark(ns.as_deref(), &local)
                }
                None => raw,
            };
            if used.insert(target.clone()) {
                queue.push_back(target);
            }
        }
    }

    // Compare against the indexed type definitions
    let mut total = 0usize;
    let mut used_count = 0usize;
    let mut unused = Vec::new();
    let mut by_namespace: BTreeMap<String, NamespaceCoverage> = BTreeMap::new();

    for category in TypeCategory::TYPES {
        for entry in repo.type_index().entries(category) {
            let clark = names::clark(entry.namespace.as_deref(), &entry.local_name);
            let namespace = entry.namespace.clone().unwrap_or_default();
            let counters = by_namespace.entry(namespace).or_default();

            total += 1;
            counters.total += 1;
            if used.contains(&clark) {
                used_count += 1;
                counters.used += 1;
            } else {
                unused.push(clark);
            }
        }
    }

    unused.sort();

    let coverage_percent = if total == 0 {
        0.0
    } else {
        (used_count as f64 / total as f64) * 100.0
    };

    Ok(CoverageReport {
        total,
        used: used_count,
        unused,
        coverage_percent,
        by_namespace,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RepositoryConfig;
    use std::fs;
    use tempfile::TempDir;

    const COVERAGE_XSD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           xmlns:o="urn:orders" targetNamespace="urn:orders">
  <xs:complexType name="Order">
    <xs:sequence>
      <xs:element name="Line" type="o:OrderLine"/>
    </xs:sequence>
  </xs:complexType>
  <xs:complexType name="OrderLine">
    <xs:sequence>
      <xs:element name="Note" type="xs:string"/>
    </xs:sequence>
  </xs:complexType>
  <xs:complexType name="Orphan">
    <xs:sequence>
      <xs:element name="X" type="xs:string"/>
    </xs:sequence>
  </xs:complexType>
</xs:schema>"#;

    fn build_repo(dir: &TempDir) -> SchemaRepository {
        fs::write(dir.path().join("orders.xsd"), COVERAGE_XSD).unwrap();
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
    fn test_coverage_from_entry_point() {
        let dir = TempDir::new().unwrap();
        let repo = build_repo(&dir);

        let report = coverage(&repo, &["{urn:orders}Order".to_string()]).unwrap();
        assert_eq!(report.total, 3);
        assert_eq!(report.used, 2);
        assert_eq!(report.unused, vec!["{urn:orders}Orphan".to_string()]);
        assert!((report.coverage_percent - 66.666).abs() < 0.1);

        let ns = report.by_namespace.get("urn:orders").unwrap();
        assert_eq!(ns.total, 3);
        assert_eq!(ns.used, 2);
    }

    #[test]
    fn test_full_coverage() {
        let dir = TempDir::new().unwrap();
        let repo = build_repo(&dir);

        let report = coverage(
            &repo,
            &[
                "{urn:orders}Order".to_string(),
                "{urn:orders}Orphan".to_string(),
            ],
        )
        .unwrap();
        assert_eq!(report.used, 3);
        assert!(report.unused.is_empty());
        assert!((report.coverage_percent - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unknown_entry_point_is_error() {
        let dir = TempDir::new().unwrap();
        let repo = build_repo(&dir);

        assert!(coverage(&repo, &["{urn:orders}Nothing".to_string()]).is_err());
    }
}
