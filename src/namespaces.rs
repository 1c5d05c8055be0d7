//! Namespace registry and qualified-name parsing
//!
//! A bidirectional prefix↔URI registry with a default namespace, plus the
//! parser that turns user-supplied qualified names (prefixed, Clark notation
//! or bare) into `(prefix, namespace, local name)` triples.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::Schema;
use crate::names;

/// A parsed qualified name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    /// Prefix as written, if any
    pub prefix: Option<String>,
    /// Namespace URI, if it could be determined
    pub namespace: Option<String>,
    /// Local name
    pub local_name: String,
}

impl ParsedName {
    /// Clark-notation form of this name
    pub fn clark(&self) -> String {
        names::clark(self.namespace.as_deref(), &self.local_name)
    }
}

/// A configured prefix↔URI mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceMapping {
    /// Namespace prefix
    pub prefix: String,
    /// Namespace URI
    pub uri: String,
}

/// Bidirectional namespace registry
///
/// A prefix maps to exactly one URI at a time; a URI may have several
/// prefixes, the first registered being the primary one.
#[derive(Debug, Clone, Default)]
pub struct NamespaceRegistry {
    prefix_to_uri: IndexMap<String, String>,
    uri_to_prefixes: IndexMap<String, Vec<String>>,
    default_namespace: Option<String>,
}

impl NamespaceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a prefix→URI mapping; idempotent
    ///
    /// Re-registering a prefix with a different URI replaces the old
    /// mapping.
    pub fn register(&mut self, prefix: impl Into<String>, uri: impl Into<String>) {
        let prefix = prefix.into();
        let uri = uri.into();

        if let Some(existing) = self.prefix_to_uri.get(&prefix) {
            if *existing == uri {
                return;
            }
            // Remove the prefix from its previous URI's list
            let old = existing.clone();
            if let Some(prefixes) = self.uri_to_prefixes.get_mut(&old) {
                prefixes.retain(|p| p != &prefix);
            }
            tracing::debug!(prefix = %prefix, old = %old, new = %uri, "prefix remapped");
        }

        self.prefix_to_uri.insert(prefix.clone(), uri.clone());
        let prefixes = self.uri_to_prefixes.entry(uri).or_default();
        if !prefixes.contains(&prefix) {
            prefixes.push(prefix);
        }
    }

    /// Get the URI registered for a prefix
    pub fn uri(&self, prefix: &str) -> Option<&str> {
        self.prefix_to_uri.get(prefix).map(|s| s.as_str())
    }

    /// Get the first prefix registered for a URI
    pub fn primary_prefix(&self, uri: &str) -> Option<&str> {
        self.uri_to_prefixes
            .get(uri)
            .and_then(|prefixes| prefixes.first())
            .map(|s| s.as_str())
    }

    /// Get all prefixes registered for a URI
    pub fn prefixes(&self, uri: &str) -> &[String] {
        self.uri_to_prefixes
            .get(uri)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Set the default namespace
    pub fn set_default_namespace(&mut self, uri: impl Into<String>) {
        self.default_namespace = Some(uri.into());
    }

    /// Get the default namespace
    pub fn default_namespace(&self) -> Option<&str> {
        self.default_namespace.as_deref()
    }

    /// Number of registered prefixes
    pub fn len(&self) -> usize {
        self.prefix_to_uri.len()
    }

    /// Whether the registry has no mappings
    pub fn is_empty(&self) -> bool {
        self.prefix_to_uri.is_empty()
    }

    /// Iterate over (prefix, uri) pairs in registration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.prefix_to_uri
            .iter()
            .map(|(p, u)| (p.as_str(), u.as_str()))
    }

    /// All distinct registered namespace URIs, in registration order
    pub fn uris(&self) -> impl Iterator<Item = &str> {
        self.uri_to_prefixes.keys().map(|s| s.as_str())
    }

    /// Fill in mappings the user did not configure by scanning schemas
    ///
    /// Each schema contributes its root namespace declarations, and its
    /// target namespace gets a generated `ns<N>` prefix if no declaration
    /// covers it.
    pub fn extract_from_schemas<'a>(&mut self, schemas: impl Iterator<Item = &'a Schema>) {
        let mut generated = 0usize;

        for schema in schemas {
            for (prefix, uri) in &schema.namespaces {
                if prefix.is_empty() {
                    if self.default_namespace.is_none() {
                        self.default_namespace = Some(uri.clone());
                    }
                } else if self.uri(prefix).is_none() {
                    self.register(prefix.clone(), uri.clone());
                }
            }

            if let Some(tns) = schema.target_namespace.as_deref() {
                if self.primary_prefix(tns).is_none() {
                    generated += 1;
                    let mut prefix = format!("ns{}", generated);
                    while self.uri(&prefix).is_some() {
                        generated += 1;
                        prefix = format!("ns{}", generated);
                    }
                    self.register(prefix, tns);
                }
            }
        }
    }

    /// Parse a user-supplied qualified name against this registry
    ///
    /// Accepts `{uri}local` (Clark notation), `prefix:local`, or a bare
    /// local name. An unregistered prefix yields `namespace: None` with the
    /// prefix preserved so the caller can decide how to degrade. A bare
    /// name takes the default namespace.
    pub fn parse_qname(&self, qname: &str) -> Result<ParsedName> {
        if qname.is_empty() {
            return Err(Error::Other("empty qualified name".to_string()));
        }

        if names::is_clark(qname) {
            let (namespace, local_name) = names::split_clark(qname)?;
            return Ok(ParsedName {
                prefix: None,
                namespace,
                local_name,
            });
        }

        if let Some((prefix, local)) = qname.split_once(':') {
            if prefix.is_empty() || local.is_empty() {
                return Err(Error::Other(format!(
                    "malformed qualified name: '{}'",
                    qname
                )));
            }
            let namespace = self.uri(prefix).map(|s| s.to_string());
            return Ok(ParsedName {
                prefix: Some(prefix.to_string()),
                namespace,
                local_name: local.to_string(),
            });
        }

        Ok(ParsedName {
            prefix: None,
            namespace: self.default_namespace.clone(),
            local_name: qname.to_string(),
        })
    }
}
