//! Error types for xsdrepo
//!
//! This module defines all error types used throughout the library.

use std::fmt;
use thiserror::Error;

/// Result type alias using xsdrepo Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for repository operations
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed configuration, unknown mode, conflicting options
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Structural schema error: non-XML input, wrong root, wrong namespace
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// A schemaLocation could not be resolved
    #[error("location error: {0}")]
    Location(#[from] LocationError),

    /// A qualified name is not present in the type index
    #[error("reference error: {0}")]
    Reference(#[from] ReferenceError),

    /// Invalid archive, missing metadata, wrong field types
    #[error("package error: {0}")]
    Package(#[from] PackageError),

    /// Instance validation failure
    #[error("validation error: {0}")]
    Validation(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// XML parsing error
    #[error("XML error: {0}")]
    Xml(String),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// URL parsing error
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<roxmltree::Error> for Error {
    fn from(e: roxmltree::Error) -> Self {
        Error::Xml(e.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(e: quick_xml::Error) -> Self {
        Error::Xml(e.to_string())
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(e: zip::result::ZipError) -> Self {
        Error::Package(PackageError::new(e.to_string()))
    }
}

/// Structural schema error with context
#[derive(Debug, Clone)]
pub struct SchemaError {
    /// Error message
    pub message: String,
    /// Schema location that caused the error
    pub location: Option<String>,
    /// Containing construct name
    pub construct: Option<String>,
}

impl SchemaError {
    /// Create a new schema error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
            construct: None,
        }
    }

    /// Set the schema location
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Set the containing construct
    pub fn with_construct(mut self, construct: impl Into<String>) -> Self {
        self.construct = Some(construct.into());
        self
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(ref location) = self.location {
            write!(f, " (schema: {})", location)?;
        }

        if let Some(ref construct) = self.construct {
            write!(f, " (in: {})", construct)?;
        }

        Ok(())
    }
}

impl std::error::Error for SchemaError {}

/// Location resolution error
#[derive(Debug, Clone)]
pub struct LocationError {
    /// Error message
    pub message: String,
    /// The logical location that failed to resolve
    pub location: String,
}

impl LocationError {
    /// Create a new location error
    pub fn new(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: location.into(),
        }
    }
}

impl fmt::Display for LocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}': {}", self.location, self.message)
    }
}

impl std::error::Error for LocationError {}

/// Qualified-name lookup failure, with suggestions
#[derive(Debug, Clone)]
pub struct ReferenceError {
    /// The qualified name that was attempted
    pub qname: String,
    /// Error message
    pub message: String,
    /// Schema location the reference came from, if known
    pub schema: Option<String>,
    /// Similar names in the queried namespace (at most three)
    pub suggestions: Vec<String>,
}

impl ReferenceError {
    /// Create a new reference error
    pub fn new(qname: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            qname: qname.into(),
            message: message.into(),
            schema: None,
            suggestions: Vec::new(),
        }
    }

    /// Set the originating schema location
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Set the similarity suggestions
    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = suggestions;
        self
    }
}

impl fmt::Display for ReferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}': {}", self.qname, self.message)?;

        if let Some(ref schema) = self.schema {
            write!(f, " (schema: {})", schema)?;
        }

        if !self.suggestions.is_empty() {
            write!(f, "; did you mean: {}?", self.suggestions.join(", "))?;
        }

        Ok(())
    }
}

impl std::error::Error for ReferenceError {}

/// Package archive error
#[derive(Debug, Clone)]
pub struct PackageError {
    /// Error message
    pub message: String,
    /// Archive path, if known
    pub path: Option<String>,
}

impl PackageError {
    /// Create a new package error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: None,
        }
    }

    /// Set the archive path
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl fmt::Display for PackageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(ref path) = self.path {
            write!(f, " (package: {})", path)?;
        }

        Ok(())
    }
}

impl std::error::Error for PackageError {}
