//! Schema location resolution
//!
//! Maps logical `schemaLocation` strings to concrete locations using an
//! ordered mapping table (exact entries and regex pattern entries with
//! numbered-capture substitution), falling back to absolute locations and
//! base-location concatenation.

use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, LocationError, Result};

/// A resolved resource location
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// File system path
    Path(PathBuf),
    /// URL (http or https)
    Url(Url),
    /// In-memory content keyed by an identifier
    Memory(String),
}

impl Location {
    /// Classify a concrete location string
    pub fn from_str(s: &str) -> Result<Self> {
        if s.starts_with("http://") || s.starts_with("https://") {
            return Ok(Location::Url(Url::parse(s)?));
        }
        Ok(Location::Path(PathBuf::from(s)))
    }

    /// The location as a string
    pub fn as_str(&self) -> String {
        match self {
            Location::Path(p) => p.to_string_lossy().to_string(),
            Location::Url(u) => u.to_string(),
            Location::Memory(s) => s.clone(),
        }
    }

    /// Check if this is a remote location
    pub fn is_remote(&self) -> bool {
        matches!(self, Location::Url(_))
    }
}

/// One entry of the schema-location mapping table
///
/// Non-pattern entries require exact string equality on `from`. Pattern
/// entries match `from` as a regex and substitute numbered captures
/// (`\1`, `\2`, …) into `to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationMapping {
    /// Logical location, or a regex when `pattern` is set
    pub from: String,
    /// Replacement location
    pub to: String,
    /// Whether `from` is a regex pattern
    #[serde(default, skip_serializing_if = "is_false")]
    pub pattern: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl LocationMapping {
    /// Create an exact-match mapping
    pub fn exact(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            pattern: false,
        }
    }

    /// Create a regex pattern mapping
    pub fn regex(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            pattern: true,
        }
    }
}

/// Resolver from logical schema locations to concrete ones
///
/// First match wins: the mapping table is walked in order, then absolute
/// locations pass through unchanged, then the base location is prepended.
#[derive(Debug, Default)]
pub struct LocationResolver {
    base: Option<String>,
    mappings: Vec<LocationMapping>,
    compiled: Vec<Option<Regex>>,
}

impl LocationResolver {
    /// Create a resolver with no base and no mappings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a resolver, compiling any pattern mappings
    pub fn with_mappings(mappings: Vec<LocationMapping>) -> Result<Self> {
        let mut compiled = Vec::with_capacity(mappings.len());
        for mapping in &mappings {
            if mapping.pattern {
                let re = Regex::new(&mapping.from).map_err(|e| {
                    Error::Configuration(format!(
                        "invalid location mapping pattern '{}': {}",
                        mapping.from, e
                    ))
                })?;
                compiled.push(Some(re));
            } else {
                compiled.push(None);
            }
        }
        Ok(Self {
            base: None,
            mappings,
            compiled,
        })
    }

    /// Set the base location (a directory path or URL prefix)
    pub fn set_base(&mut self, base: Option<String>) {
        self.base = base;
    }

    /// The configured base location
    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    /// The configured mappings
    pub fn mappings(&self) -> &[LocationMapping] {
        &self.mappings
    }

    /// Resolve a logical location to a concrete one
    pub fn resolve(&self, logical: &str) -> Result<String> {
        if logical.trim().is_empty() {
            return Err(Error::Location(LocationError::new(
                logical,
                "blank schema location",
            )));
        }

        if let Some(mapped) = self.apply_mappings(logical) {
            tracing::debug!(logical = %logical, mapped = %mapped, "location mapped");
            return Ok(mapped);
        }

        if is_absolute(logical) {
            return Ok(logical.to_string());
        }

        match self.base.as_deref() {
            Some(base) => Ok(join(base, logical)),
            None => Ok(logical.to_string()),
        }
    }

    /// Walk the mapping table in order; first match wins
    fn apply_mappings(&self, logical: &str) -> Option<String> {
        for (mapping, compiled) in self.mappings.iter().zip(&self.compiled) {
            match compiled {
                None => {
                    if mapping.from == logical {
                        return Some(mapping.to.clone());
                    }
                }
                Some(re) => {
                    if re.is_match(logical) {
                        let replacement = to_replacement(&mapping.to);
                        return Some(re.replace(logical, replacement.as_str()).into_owned());
                    }
                }
            }
        }
        None
    }
}

/// Convert backslash-numbered captures (`\1`) to the `${1}` form the regex
/// crate substitutes, escaping any literal `$`.
fn to_replacement(to: &str) -> String {
    let mut out = String::with_capacity(to.len());
    let mut chars = to.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '$' => out.push_str("$$"),
            '\\' => {
                let mut digits = String::new();
                while let Some(d) = chars.peek().filter(|d| d.is_ascii_digit()) {
                    digits.push(*d);
                    chars.next();
                }
                if digits.is_empty() {
                    out.push('\\');
                } else {
                    out.push_str("${");
                    out.push_str(&digits);
                    out.push('}');
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Whether a location string is absolute (URL or absolute path)
pub fn is_absolute(location: &str) -> bool {
    location.starts_with("http://")
        || location.starts_with("https://")
        || location.starts_with("file://")
        || Path::new(location).is_absolute()
}

/// Concatenate a base location with a relative one
pub fn join(base: &str, relative: &str) -> String {
    if base.starts_with("http://") || base.starts_with("https://") {
        let trimmed = base.trim_end_matches('/');
        return format!("{}/{}", trimmed, relative);
    }
    Path::new(base).join(relative).to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_mapping() {
        let resolver = LocationResolver::with_mappings(vec![LocationMapping::exact(
            "../../common.xsd",
            "vendor/common.xsd",
        )])
        .unwrap();

        assert_eq!(
            resolver.resolve("../../common.xsd").unwrap(),
            "vendor/common.xsd"
        );
    }

    #[test]
    fn test_pattern_mapping_with_capture() {
        let resolver = LocationResolver::with_mappings(vec![LocationMapping::regex(
            r"(?:\.\./)+gml/(.+\.xsd)$",
            r"vendor/gml/\1",
        )])
        .unwrap();

        assert_eq!(
            resolver.resolve("../../../gml/geometry.xsd").unwrap(),
            "vendor/gml/geometry.xsd"
        );
    }

    #[test]
    fn test_first_match_wins() {
        let resolver = LocationResolver::with_mappings(vec![
            LocationMapping::exact("a.xsd", "first/a.xsd"),
            LocationMapping::exact("a.xsd", "second/a.xsd"),
        ])
        .unwrap();

        assert_eq!(resolver.resolve("a.xsd").unwrap(), "first/a.xsd");
    }

    #[test]
    fn test_absolute_passes_through() {
        let resolver = LocationResolver::new();
        assert_eq!(
            resolver.resolve("http://example.com/a.xsd").unwrap(),
            "http://example.com/a.xsd"
        );
        assert_eq!(resolver.resolve("/tmp/a.xsd").unwrap(), "/tmp/a.xsd");
    }

    #[test]
    fn test_base_concatenation() {
        let mut resolver = LocationResolver::new();
        resolver.set_base(Some("schemas".to_string()));
        assert_eq!(resolver.resolve("a.xsd").unwrap(), "schemas/a.xsd");

        resolver.set_base(Some("http://example.com/xsd/".to_string()));
        assert_eq!(
            resolver.resolve("a.xsd").unwrap(),
            "http://example.com/xsd/a.xsd"
        );
    }

    #[test]
    fn test_blank_location_is_error() {
        let resolver = LocationResolver::new();
        assert!(resolver.resolve("").is_err());
        assert!(resolver.resolve("  ").is_err());
    }

    #[test]
    fn test_invalid_pattern_is_configuration_error() {
        let result =
            LocationResolver::with_mappings(vec![LocationMapping::regex("([unclosed", "x")]);
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_to_replacement() {
        assert_eq!(to_replacement(r"vendor/gml/\1"), "vendor/gml/${1}");
        assert_eq!(to_replacement(r"a\12b"), "a${12}b");
        assert_eq!(to_replacement("plain"), "plain");
        assert_eq!(to_replacement("cost$"), "cost$$");
    }

    #[test]
    fn test_location_from_str() {
        let loc = Location::from_str("http://example.com/schema.xsd").unwrap();
        assert!(loc.is_remote());

        let loc = Location::from_str("/tmp/schema.xsd").unwrap();
        assert!(matches!(loc, Location::Path(_)));
    }
}
