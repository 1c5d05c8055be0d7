//! Repository configuration
//!
//! YAML configuration naming the entry-point schema files plus the
//! schema-location and namespace mappings. Relative `files` and mapping
//! `to` paths are resolved against the directory of the YAML file they
//! came from.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::locations::{self, LocationMapping};
use crate::namespaces::NamespaceMapping;

/// Configuration for building a schema repository
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Entry-point schema files
    pub files: Vec<String>,
    /// Ordered schema-location mappings
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schema_location_mappings: Vec<LocationMapping>,
    /// Configured prefix↔URI mappings
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub namespace_mappings: Vec<NamespaceMapping>,
}

impl RepositoryConfig {
    /// Create a configuration for a list of schema files
    pub fn with_files(files: Vec<String>) -> Self {
        Self {
            files,
            ..Self::default()
        }
    }

    /// Parse a configuration from YAML text
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| Error::Configuration(format!("invalid configuration: {}", e)))?;
        config.check()?;
        Ok(config)
    }

    /// Load a configuration from a YAML file, resolving relative paths
    /// against the file's directory
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!(
                "cannot read configuration '{}': {}",
                path.display(),
                e
            ))
        })?;

        let mut config = Self::from_yaml_str(&text)?;
        if let Some(dir) = path.parent() {
            config.rebase(dir);
        }
        Ok(config)
    }

    /// Resolve relative `files` and mapping `to` paths against a directory
    pub fn rebase(&mut self, dir: &Path) {
        for file in &mut self.files {
            if !locations::is_absolute(file) {
                *file = dir.join(&*file).to_string_lossy().to_string();
            }
        }
        for mapping in &mut self.schema_location_mappings {
            if !locations::is_absolute(&mapping.to) {
                mapping.to = dir.join(&mapping.to).to_string_lossy().to_string();
            }
        }
    }

    fn check(&self) -> Result<()> {
        if self.files.is_empty() {
            return Err(Error::Configuration(
                "configuration lists no schema files".to_string(),
            ));
        }
        for mapping in &self.namespace_mappings {
            if mapping.prefix.is_empty() || mapping.uri.is_empty() {
                return Err(Error::Configuration(format!(
                    "namespace mapping '{}' → '{}' has an empty side",
                    mapping.prefix, mapping.uri
                )));
            }
        }
        Ok(())
    }
}
