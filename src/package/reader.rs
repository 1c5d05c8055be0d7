//! Package reading

use std::fs::File;
use std::path::{Path, PathBuf};

use zip::ZipArchive;

use crate::config::RepositoryConfig;
use crate::error::{Error, PackageError, Result};
use crate::model::Schema;
use crate::package::{
    compare_versions, metadata::check_self_containment, PackageMetadata, PackageValidation,
    ResolutionMode, SerializationFormat, METADATA_NAME, SCHEMAS_DATA_DIR, SCHEMAS_DIR,
};
use crate::repository::SchemaRepository;

/// Validate the structure of a package without loading it
///
/// Returns a structured result instead of failing on the first problem so
/// tooling can present complete information.
pub fn validate_package(path: impl AsRef<Path>) -> PackageValidation {
    let path = path.as_ref();

    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => return PackageValidation::error(format!("cannot open package: {}", e)),
    };
    let mut archive = match ZipArchive::new(file) {
        Ok(archive) => archive,
        Err(e) => return PackageValidation::error(format!("not a valid archive: {}", e)),
    };

    let names: Vec<String> = archive.file_names().map(|n| n.to_string()).collect();

    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let xsd_count = names
        .iter()
        .filter(|n| n.starts_with(&format!("{}/", SCHEMAS_DIR)) && n.ends_with(".xsd"))
        .count();
    if xsd_count == 0 {
        errors.push(format!("package contains no {}/*.xsd entries", SCHEMAS_DIR));
    }

    let metadata = match read_metadata(&mut archive) {
        Ok(metadata) => Some(metadata),
        Err(e) => {
            errors.push(e.to_string());
            None
        }
    };

    if let Some(metadata) = &metadata {
        if compare_versions(&metadata.format_version, crate::VERSION)
            == std::cmp::Ordering::Greater
        {
            warnings.push(format!(
                "package was written by version {} which is newer than this reader ({})",
                metadata.format_version,
                crate::VERSION
            ));
        }

        check_self_containment(&metadata.schema_location_mappings, &mut errors, &mut warnings);
    }

    PackageValidation {
        valid: errors.is_empty(),
        errors,
        warnings,
        metadata,
    }
}

fn read_metadata(archive: &mut ZipArchive<File>) -> Result<PackageMetadata> {
    let mut entry = archive.by_name(METADATA_NAME).map_err(|_| {
        Error::Package(PackageError::new(format!("{} is missing", METADATA_NAME)))
    })?;
    let mut text = String::new();
    std::io::Read::read_to_string(&mut entry, &mut text)
        .map_err(|e| Error::Package(PackageError::new(format!("cannot read metadata: {}", e))))?;

    // Check field shapes first so type mismatches are reported clearly
    let value: serde_yaml::Value = serde_yaml::from_str(&text)
        .map_err(|e| Error::Package(PackageError::new(format!("invalid metadata YAML: {}", e))))?;
    for array_key in ["files", "schema_location_mappings", "namespace_mappings"] {
        if let Some(field) = value.get(array_key) {
            if !field.is_sequence() {
                return Err(Error::Package(PackageError::new(format!(
                    "metadata field '{}' must be an array",
                    array_key
                ))));
            }
        }
    }

    serde_yaml::from_value(value)
        .map_err(|e| Error::Package(PackageError::new(format!("invalid metadata: {}", e))))
}

/// Load a repository from an LXR package
///
/// The archive is extracted into a temporary directory owned by the
/// returned repository; it is removed when the repository is dropped.
pub fn read_package(path: &Path) -> Result<SchemaRepository> {
    let validation = validate_package(path);
    for warning in &validation.warnings {
        tracing::warn!(package = %path.display(), "{}", warning);
    }
    if !validation.valid {
        return Err(Error::Package(
            PackageError::new(validation.errors.join("; ")).with_path(path.to_string_lossy()),
        ));
    }
    let Some(metadata) = validation.metadata else {
        return Err(Error::Package(
            PackageError::new("package metadata could not be read")
                .with_path(path.to_string_lossy()),
        ));
    };

    let extract_dir = tempfile::TempDir::new()?;
    let file = File::open(path)?;
    let mut archive = ZipArchive::new(file)?;
    archive.extract(extract_dir.path())?;

    let xsd_paths = list_extracted_schemas(extract_dir.path())?;
    if xsd_paths.is_empty() {
        return Err(Error::Package(
            PackageError::new("no schemas were extracted").with_path(path.to_string_lossy()),
        ));
    }

    let config = RepositoryConfig {
        files: xsd_paths
            .iter()
            .map(|p| p.to_string_lossy().to_string())
            .collect(),
        schema_location_mappings: metadata.schema_location_mappings.clone(),
        namespace_mappings: metadata.namespace_mappings.clone(),
    };
    let mut repo = SchemaRepository::new(config)?;

    if metadata.resolution_mode == ResolutionMode::Resolved {
        if let Some(extension) = metadata.serialization_format.extension() {
            register_serialized(&mut repo, extract_dir.path(), &xsd_paths, &metadata, extension)?;
        }
    }

    // Parse whatever was not pre-registered (everything, in parse mode)
    repo.parse()?;
    repo.adopt_package(metadata, extract_dir);
    repo.resolve()?;
    Ok(repo)
}

/// Register `schemas_data/*` models keyed by their extracted XSD paths
fn register_serialized(
    repo: &mut SchemaRepository,
    root: &Path,
    xsd_paths: &[PathBuf],
    metadata: &PackageMetadata,
    extension: &str,
) -> Result<()> {
    let data_dir = root.join(SCHEMAS_DATA_DIR);
    if !data_dir.is_dir() {
        tracing::warn!("package declares serialized models but has no schemas_data directory");
        return Ok(());
    }

    // Bundled schemas reference each other by their original location
    // keys; remap them onto the extracted paths by basename
    let basename_to_key: std::collections::HashMap<String, String> = xsd_paths
        .iter()
        .filter_map(|p| {
            let name = p.file_name()?.to_string_lossy().to_string();
            Some((name, p.to_string_lossy().to_string()))
        })
        .collect();

    for xsd_path in xsd_paths {
        let stem = xsd_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let data_path = data_dir.join(format!("{}.{}", stem, extension));
        if !data_path.is_file() {
            tracing::warn!(schema = %xsd_path.display(), "no serialized model; will re-parse");
            continue;
        }

        let bytes = std::fs::read(&data_path)?;
        let mut schema = deserialize_schema(&bytes, metadata.serialization_format)?;

        let key = xsd_path.to_string_lossy().to_string();
        schema.location = Some(key.clone());
        schema.source_url = Some(key.clone());
        rekey_references(&mut schema, &basename_to_key);
        repo.register_schema(key, schema);
    }

    Ok(())
}

/// Point import/include/redefine resolved links at the extracted paths
fn rekey_references(
    schema: &mut Schema,
    basename_to_key: &std::collections::HashMap<String, String>,
) {
    let remap = |resolved: &mut Option<String>, location: Option<&str>| {
        let old = resolved.as_deref().or(location);
        let Some(old) = old else {
            return;
        };
        let basename = Path::new(old)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| old.to_string());
        if let Some(key) = basename_to_key.get(&basename) {
            *resolved = Some(key.clone());
        }
    };

    for item in &mut schema.items {
        match item {
            crate::model::SchemaItem::Import(import) => {
                remap(&mut import.resolved_location, import.schema_location.as_deref());
            }
            crate::model::SchemaItem::Include(include) => {
                remap(&mut include.resolved_location, include.schema_location.as_deref());
            }
            crate::model::SchemaItem::Redefine(redefine) => {
                remap(&mut redefine.resolved_location, redefine.schema_location.as_deref());
            }
            _ => {}
        }
    }
}

fn deserialize_schema(bytes: &[u8], format: SerializationFormat) -> Result<Schema> {
    match format {
        SerializationFormat::Marshal => bincode::deserialize(bytes).map_err(|e| {
            Error::Package(PackageError::new(format!("cannot deserialize schema: {}", e)))
        }),
        SerializationFormat::Json => serde_json::from_slice(bytes).map_err(|e| {
            Error::Package(PackageError::new(format!("cannot deserialize schema: {}", e)))
        }),
        SerializationFormat::Yaml => serde_yaml::from_slice(bytes).map_err(|e| {
            Error::Package(PackageError::new(format!("cannot deserialize schema: {}", e)))
        }),
        SerializationFormat::Parse => Err(Error::Package(PackageError::new(
            "the parse format stores no serialized schemas",
        ))),
    }
}

fn list_extracted_schemas(root: &Path) -> Result<Vec<PathBuf>> {
    let schemas_dir = root.join(SCHEMAS_DIR);
    let mut paths = Vec::new();
    if schemas_dir.is_dir() {
        for entry in std::fs::read_dir(&schemas_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("xsd") {
                paths.push(path);
            }
        }
    }
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::{write_package, PackageConfig, XsdMode};
    use std::fs;
    use std::io::Write;
    use tempfile::TempDir;

    const A_XSD: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
  xmlns:a="urn:a" targetNamespace="urn:a">
  <xs:element name="Root" type="a:T"/>
  <xs:complexType name="T">
    <xs:sequence>
      <xs:element name="e" type="xs:string"/>
    </xs:sequence>
  </xs:complexType>
</xs:schema>"#;

    fn build_and_write(dir: &TempDir, config: &PackageConfig) -> PathBuf {
        fs::write(dir.path().join("a.xsd"), A_XSD).unwrap();
        let repo_config = RepositoryConfig::with_files(vec![dir
            .path()
            .join("a.xsd")
            .to_string_lossy()
            .to_string()]);
        let mut repo = SchemaRepository::new(repo_config).unwrap();
        repo.parse().unwrap();
        repo.resolve().unwrap();

        let package_path = dir.path().join("a.lxr");
        write_package(&repo, &package_path, config, None).unwrap();
        package_path
    }

    #[test]
    fn test_round_trip_marshal() {
        let dir = TempDir::new().unwrap();
        let package_path = build_and_write(&dir, &PackageConfig::default());

        let repo = read_package(&package_path).unwrap();
        assert_eq!(repo.processed_schemas().len(), 1);
        assert!(repo.is_resolved());
        assert!(repo.find_type("{urn:a}T").resolved);
        assert!(repo.package_metadata().is_some());
    }

    #[test]
    fn test_round_trip_parse_format() {
        let dir = TempDir::new().unwrap();
        let config =
            PackageConfig::default().with_serialization_format(SerializationFormat::Parse);
        let package_path = build_and_write(&dir, &config);

        let repo = read_package(&package_path).unwrap();
        assert!(repo.find_type("{urn:a}T").resolved);
    }

    #[test]
    fn test_validate_package_reports_structure() {
        let dir = TempDir::new().unwrap();
        let package_path = build_and_write(&dir, &PackageConfig::default());

        let validation = validate_package(&package_path);
        assert!(validation.valid, "errors: {:?}", validation.errors);
        assert!(validation.metadata.is_some());
        assert_eq!(
            validation.metadata.unwrap().xsd_mode,
            XsdMode::IncludeAll
        );
    }

    #[test]
    fn test_invalid_archive_rejected() {
        let dir = TempDir::new().unwrap();
        let bogus = dir.path().join("bogus.lxr");
        fs::write(&bogus, b"definitely not a zip").unwrap();

        let validation = validate_package(&bogus);
        assert!(!validation.valid);
        assert!(read_package(&bogus).is_err());
    }

    #[test]
    fn test_missing_metadata_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.lxr");

        let mut cursor = std::io::Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut cursor);
            zip.start_file("schemas/a.xsd", zip::write::FileOptions::default())
                .unwrap();
            zip.write_all(A_XSD.as_bytes()).unwrap();
            zip.finish().unwrap();
        }
        fs::write(&path, cursor.into_inner()).unwrap();

        let validation = validate_package(&path);
        assert!(!validation.valid);
        assert!(validation.errors.iter().any(|e| e.contains("metadata.yaml")));
    }

    #[test]
    fn test_newer_package_version_warns() {
        let dir = TempDir::new().unwrap();
        let package_path = build_and_write(&dir, &PackageConfig::default());

        // Rewrite the archive with a bumped format version
        let file = fs::File::open(&package_path).unwrap();
        let mut archive = ZipArchive::new(file).unwrap();
        let extract = TempDir::new().unwrap();
        archive.extract(extract.path()).unwrap();

        let metadata_path = extract.path().join(METADATA_NAME);
        let text = fs::read_to_string(&metadata_path).unwrap();
        let bumped = text.replace(
            &format!("lutaml_xsd_version: {}", crate::VERSION),
            "lutaml_xsd_version: 99.0.0",
        );
        fs::write(&metadata_path, bumped).unwrap();

        let mut cursor = std::io::Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut cursor);
            let options = zip::write::FileOptions::default();
            for name in ["metadata.yaml", "schemas/a.xsd"] {
                zip.start_file(name, options).unwrap();
                let bytes = fs::read(extract.path().join(name)).unwrap();
                zip.write_all(&bytes).unwrap();
            }
            zip.finish().unwrap();
        }
        fs::write(&package_path, cursor.into_inner()).unwrap();

        let validation = validate_package(&package_path);
        assert!(validation.valid);
        assert!(validation
            .warnings
            .iter()
            .any(|w| w.contains("newer than this reader")));
    }
}
