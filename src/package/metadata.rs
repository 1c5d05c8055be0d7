//! LXR package metadata
//!
//! The `metadata.yaml` document at the root of every package. The
//! `lutaml_xsd_version` key is the format's versioning key on the wire and
//! is kept verbatim for interoperability with packages produced by other
//! tooling.

use serde::{Deserialize, Serialize};

use crate::locations::LocationMapping;
use crate::namespaces::NamespaceMapping;

/// How bundled XSD files relate to external references
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum XsdMode {
    /// Every referenced schema is bundled; the package is self-contained
    #[default]
    IncludeAll,
    /// External references may stay outside the package
    AllowExternal,
}

impl XsdMode {
    /// Parse a mode name
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "include_all" => Some(Self::IncludeAll),
            "allow_external" => Some(Self::AllowExternal),
            _ => None,
        }
    }

    /// The wire name of this mode
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IncludeAll => "include_all",
            Self::AllowExternal => "allow_external",
        }
    }
}

/// Whether pre-serialized schema models are stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMode {
    /// XSD bytes only; reload re-parses
    Bare,
    /// Serialized schema models accompany the XSD bytes
    #[default]
    Resolved,
}

impl ResolutionMode {
    /// Parse a mode name
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "bare" => Some(Self::Bare),
            "resolved" => Some(Self::Resolved),
            _ => None,
        }
    }

    /// The wire name of this mode
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bare => "bare",
            Self::Resolved => "resolved",
        }
    }
}

/// Serialization format of the stored schema models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SerializationFormat {
    /// Fast binary form
    #[default]
    Marshal,
    /// Portable JSON
    Json,
    /// Portable YAML
    Yaml,
    /// Store nothing; re-parse on load
    Parse,
}

impl SerializationFormat {
    /// Parse a format name
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "marshal" => Some(Self::Marshal),
            "json" => Some(Self::Json),
            "yaml" => Some(Self::Yaml),
            "parse" => Some(Self::Parse),
            _ => None,
        }
    }

    /// The wire name of this format
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Marshal => "marshal",
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Parse => "parse",
        }
    }

    /// File extension under `schemas_data/`, if this format stores data
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            Self::Marshal => Some("marshal"),
            Self::Json => Some("json"),
            Self::Yaml => Some("yaml"),
            Self::Parse => None,
        }
    }
}

/// The `metadata.yaml` document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageMetadata {
    /// Schema paths as they appeared originally
    pub files: Vec<String>,
    /// Location mappings still needed after bundling
    #[serde(default)]
    pub schema_location_mappings: Vec<LocationMapping>,
    /// Prefix↔URI mappings
    #[serde(default)]
    pub namespace_mappings: Vec<NamespaceMapping>,
    /// Bundling mode
    pub xsd_mode: XsdMode,
    /// Resolution mode
    pub resolution_mode: ResolutionMode,
    /// Serialization format of `schemas_data/`
    pub serialization_format: SerializationFormat,
    /// Format version the package was written with
    #[serde(rename = "lutaml_xsd_version")]
    pub format_version: String,
    /// ISO-8601 creation timestamp
    pub created_at: String,
    /// Package name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Package version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Package description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Structured result of a package validation pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageValidation {
    /// Whether the package can be loaded
    pub valid: bool,
    /// Fatal problems
    pub errors: Vec<String>,
    /// Non-fatal problems
    pub warnings: Vec<String>,
    /// The parsed metadata, when it could be read
    pub metadata: Option<PackageMetadata>,
}

impl PackageValidation {
    /// A failed validation with one error
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            errors: vec![message.into()],
            warnings: Vec::new(),
            metadata: None,
        }
    }
}

/// Compare two dotted version strings numerically, component-wise
pub fn compare_versions(a: &str, b: &str) -> std::cmp::Ordering {
    let parse = |s: &str| -> Vec<u64> {
        s.split('.')
            .map(|part| part.trim().parse().unwrap_or(0))
            .collect()
    };
    let left = parse(a);
    let right = parse(b);
    let len = left.len().max(right.len());
    for index in 0..len {
        let l = left.get(index).copied().unwrap_or(0);
        let r = right.get(index).copied().unwrap_or(0);
        match l.cmp(&r) {
            std::cmp::Ordering::Equal => continue,
            other => return other,
        }
    }
    std::cmp::Ordering::Equal
}

/// Self-containment issues of a mapping target
///
/// Absolute URLs are errors; other escapes of the package root are
/// warnings.
pub fn check_self_containment(
    mappings: &[LocationMapping],
    errors: &mut Vec<String>,
    warnings: &mut Vec<String>,
) {
    for mapping in mappings {
        let to = mapping.to.as_str();
        if to.starts_with("http://") || to.starts_with("https://") {
            errors.push(format!(
                "mapping target '{}' is an absolute URL; the package is not self-contained",
                to
            ));
        } else if to.starts_with('/') || to.starts_with("../") {
            warnings.push(format!(
                "mapping target '{}' points outside the package",
                to
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cmp::Ordering;

    #[test]
    fn test_metadata_yaml_round_trip() {
        let metadata = PackageMetadata {
            files: vec!["person.xsd".to_string()],
            schema_location_mappings: Vec::new(),
            namespace_mappings: vec![NamespaceMapping {
                prefix: "p".to_string(),
                uri: "urn:person".to_string(),
            }],
            xsd_mode: XsdMode::IncludeAll,
            resolution_mode: ResolutionMode::Resolved,
            serialization_format: SerializationFormat::Marshal,
            format_version: "0.1.0".to_string(),
            created_at: "2024-01-01T00:00:00Z".to_string(),
            name: Some("people".to_string()),
            version: None,
            description: None,
        };

        let yaml = serde_yaml::to_string(&metadata).unwrap();
        assert!(yaml.contains("lutaml_xsd_version"));
        assert!(yaml.contains("include_all"));

        let back: PackageMetadata = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, metadata);
    }

    #[test]
    fn test_compare_versions() {
        assert_eq!(compare_versions("0.1.0", "0.1.0"), Ordering::Equal);
        assert_eq!(compare_versions("0.2.0", "0.1.9"), Ordering::Greater);
        assert_eq!(compare_versions("0.1", "0.1.0"), Ordering::Equal);
        assert_eq!(compare_versions("1.0.0", "2"), Ordering::Less);
    }

    #[test]
    fn test_self_containment() {
        let mappings = vec![
            LocationMapping::exact("a", "vendor/a.xsd"),
            LocationMapping::exact("b", "../outside.xsd"),
            LocationMapping::exact("c", "https://example.com/c.xsd"),
        ];

        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        check_self_containment(&mappings, &mut errors, &mut warnings);

        assert_eq!(errors.len(), 1);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!(XsdMode::parse("allow_external"), Some(XsdMode::AllowExternal));
        assert_eq!(ResolutionMode::parse("bare"), Some(ResolutionMode::Bare));
        assert_eq!(
            SerializationFormat::parse("yaml"),
            Some(SerializationFormat::Yaml)
        );
        assert_eq!(SerializationFormat::Parse.extension(), None);
        assert!(XsdMode::parse("bogus").is_none());
    }
}
