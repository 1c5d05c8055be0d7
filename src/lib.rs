//! # xsdrepo
//!
//! An XSD schema repository engine for Rust.
//!
//! From a set of entry-point XSD files plus a configuration, this library
//! parses the schemas, resolves their imports and includes transitively,
//! builds a global namespace-aware index of type/element/attribute/group
//! declarations, answers qualified-name lookups, analyzes inheritance and
//! dependency graphs, validates internal reference closure, and serializes
//! the resolved state as a self-contained, reloadable package (the LXR
//! package). A validation sub-system checks XML instances against the
//! repository.
//!
//! ## Example
//!
//! ```rust,ignore
//! use xsdrepo::SchemaRepository;
//!
//! // Build a repository from a YAML configuration
//! let mut repo = SchemaRepository::from_yaml_file("schemas.yml")?;
//! repo.parse()?;
//! repo.resolve()?;
//!
//! // Look up a type by qualified name
//! let result = repo.find_type("p:PersonType");
//! assert!(result.resolved);
//!
//! // Write a self-contained package and reload it
//! repo.to_package("schemas.lxr", &Default::default(), None)?;
//! let reloaded = SchemaRepository::from_package("schemas.lxr")?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Foundation
pub mod error;
pub mod limits;

// Utilities
pub mod names;
pub mod namespaces;
pub mod locations;

// Resource loading
pub mod loaders;
pub mod documents;

// XSD model and XML binding
pub mod model;

// Configuration
pub mod config;

// Repository: aggregation, indexing, closure validation
pub mod repository;

// Analyzers: hierarchy, dependencies, coverage
pub mod analysis;

// LXR package codec
pub mod package;

// Instance validation
pub mod validation;

// CLI argument types (only with the `cli` feature)
#[cfg(feature = "cli")]
pub mod cli;

// Re-exports for convenience
pub use config::RepositoryConfig;
pub use error::{Error, Result};
pub use repository::SchemaRepository;

/// Version of the xsdrepo library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// XSD 1.0 namespace
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// XML Schema Instance namespace
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// XML namespace
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// XMLNS namespace
pub const XMLNS_NAMESPACE: &str = "http://www.w3.org/2000/xmlns/";
