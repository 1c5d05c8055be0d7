//! The LXR package codec
//!
//! A package is a ZIP archive bundling `metadata.yaml`, the schema bytes
//! under `schemas/`, and optionally pre-serialized schema models under
//! `schemas_data/` for fast reload:
//!
//! ```text
//! metadata.yaml
//! schemas/<basename>.xsd
//! schemas_data/<basename>.<marshal|json|yaml>
//! ```

pub mod metadata;
pub mod reader;
pub mod writer;

pub use metadata::{
    compare_versions, PackageMetadata, PackageValidation, ResolutionMode, SerializationFormat,
    XsdMode,
};
pub use reader::{read_package, validate_package};
pub use writer::write_package;

/// Name of the metadata document inside the archive
pub const METADATA_NAME: &str = "metadata.yaml";

/// Directory of bundled XSD files inside the archive
pub const SCHEMAS_DIR: &str = "schemas";

/// Directory of serialized schema models inside the archive
pub const SCHEMAS_DATA_DIR: &str = "schemas_data";

/// Package file extension
pub const PACKAGE_EXTENSION: &str = "lxr";

/// Options for writing a package
#[derive(Debug, Clone, Default)]
pub struct PackageConfig {
    /// Bundling mode
    pub xsd_mode: XsdMode,
    /// Resolution mode
    pub resolution_mode: ResolutionMode,
    /// Serialization format for `schemas_data/`
    pub serialization_format: SerializationFormat,
    /// Package name
    pub name: Option<String>,
    /// Package version
    pub version: Option<String>,
    /// Package description
    pub description: Option<String>,
}

impl PackageConfig {
    /// Set the bundling mode
    pub fn with_xsd_mode(mut self, mode: XsdMode) -> Self {
        self.xsd_mode = mode;
        self
    }

    /// Set the resolution mode
    pub fn with_resolution_mode(mut self, mode: ResolutionMode) -> Self {
        self.resolution_mode = mode;
        self
    }

    /// Set the serialization format
    pub fn with_serialization_format(mut self, format: SerializationFormat) -> Self {
        self.serialization_format = format;
        self
    }

    /// Set the package name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the package version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Set the package description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
