//! Package writing

use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::io::Write;
use std::path::Path;

use zip::write::FileOptions;
use zip::ZipWriter;

use crate::error::{Error, PackageError, Result};
use crate::loaders::Loader;
use crate::model::Schema;
use crate::package::{
    PackageConfig, PackageMetadata, ResolutionMode, SerializationFormat, XsdMode, METADATA_NAME,
    SCHEMAS_DATA_DIR, SCHEMAS_DIR,
};
use crate::repository::{ProgressFn, SchemaRepository};

/// Write a repository as an LXR package
///
/// The archive is written to a temporary file next to the target and
/// moved into place, overwriting an existing package.
pub fn write_package(
    repo: &SchemaRepository,
    path: &Path,
    config: &PackageConfig,
    progress: Option<ProgressFn>,
) -> Result<()> {
    let bundle = collect_bundle(repo, config, progress)?;
    let metadata = build_metadata(repo, config);
    let yaml = serde_yaml::to_string(&metadata)?;

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut zip = ZipWriter::new(&mut cursor);
        let options = FileOptions::default();

        zip.start_file(METADATA_NAME, options)?;
        zip.write_all(yaml.as_bytes())?;

        for entry in &bundle {
            zip.start_file(format!("{}/{}", SCHEMAS_DIR, entry.basename), options)?;
            zip.write_all(&entry.bytes)?;
        }

        if config.resolution_mode == ResolutionMode::Resolved {
            if let Some(extension) = config.serialization_format.extension() {
                for entry in &bundle {
                    let stem = entry.basename.trim_end_matches(".xsd");
                    zip.start_file(
                        format!("{}/{}.{}", SCHEMAS_DATA_DIR, stem, extension),
                        options,
                    )?;
                    let data = serialize_schema(&entry.schema, config.serialization_format)?;
                    zip.write_all(&data)?;
                }
            }
        }

        zip.finish()?;
    }

    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    let mut staged = match parent {
        Some(parent) => tempfile::NamedTempFile::new_in(parent)?,
        None => tempfile::NamedTempFile::new()?,
    };
    staged.write_all(&cursor.into_inner())?;
    staged.persist(path).map_err(|e| {
        Error::Package(
            PackageError::new(format!("cannot write archive: {}", e))
                .with_path(path.to_string_lossy()),
        )
    })?;

    tracing::debug!(path = %path.display(), schemas = bundle.len(), "package written");
    Ok(())
}

struct BundledSchema {
    basename: String,
    bytes: Vec<u8>,
    schema: Schema,
}

/// Resolve every bundled schema's bytes and assign unique basenames
fn collect_bundle(
    repo: &SchemaRepository,
    config: &PackageConfig,
    progress: Option<ProgressFn>,
) -> Result<Vec<BundledSchema>> {
    let loader = Loader::new();
    let mut bundle = Vec::new();
    let mut used: HashSet<String> = HashSet::new();

    let entries: Vec<(&str, &Schema)> = repo
        .processed_schemas()
        .iter()
        .filter(|(key, _)| {
            config.xsd_mode == XsdMode::IncludeAll || repo.config().files.iter().any(|f| f == key)
        })
        .collect();

    let total = entries.len();
    for (current, (key, schema)) in entries.into_iter().enumerate() {
        if let Some(progress) = progress {
            progress(current + 1, total, key);
        }

        let source = schema.source_url.as_deref().ok_or_else(|| {
            Error::Package(PackageError::new(format!(
                "schema '{}' has no source to bundle",
                key
            )))
        })?;
        let bytes = loader.load_location(source)?;

        let basename = unique_basename(repo, schema, source, &bytes, &mut used);
        bundle.push(BundledSchema {
            basename,
            bytes,
            schema: schema.clone(),
        });
    }

    Ok(bundle)
}

/// Pick a basename that is unique within the archive
///
/// On a collision a namespace-derived suffix is appended; if that still
/// collides, a short content hash is used.
fn unique_basename(
    repo: &SchemaRepository,
    schema: &Schema,
    source: &str,
    bytes: &[u8],
    used: &mut HashSet<String>,
) -> String {
    let base = Path::new(source)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "schema.xsd".to_string());

    if used.insert(base.clone()) {
        return base;
    }

    let stem = base.trim_end_matches(".xsd");
    if let Some(prefix) = schema
        .target_namespace
        .as_deref()
        .and_then(|ns| repo.namespace_registry().primary_prefix(ns))
    {
        let candidate = format!("{}_{}.xsd", stem, prefix);
        if used.insert(candidate.clone()) {
            return candidate;
        }
    }

    let mut hasher = DefaultHasher::new();
    bytes.hash(&mut hasher);
    let candidate = format!("{}_{:08x}.xsd", stem, hasher.finish() as u32);
    used.insert(candidate.clone());
    candidate
}

fn build_metadata(repo: &SchemaRepository, config: &PackageConfig) -> PackageMetadata {
    // Bundled XSDs no longer need location mappings
    let schema_location_mappings = if config.xsd_mode == XsdMode::IncludeAll {
        Vec::new()
    } else {
        repo.config().schema_location_mappings.clone()
    };

    PackageMetadata {
        files: repo.config().files.clone(),
        schema_location_mappings,
        namespace_mappings: repo.config().namespace_mappings.clone(),
        xsd_mode: config.xsd_mode,
        resolution_mode: config.resolution_mode,
        serialization_format: config.serialization_format,
        format_version: crate::VERSION.to_string(),
        created_at: chrono::Utc::now().to_rfc3339(),
        name: config.name.clone(),
        version: config.version.clone(),
        description: config.description.clone(),
    }
}

fn serialize_schema(schema: &Schema, format: SerializationFormat) -> Result<Vec<u8>> {
    match format {
        SerializationFormat::Marshal => bincode::serialize(schema).map_err(|e| {
            Error::Package(PackageError::new(format!("cannot serialize schema: {}", e)))
        }),
        SerializationFormat::Json => serde_json::to_vec_pretty(schema).map_err(|e| {
            Error::Package(PackageError::new(format!("cannot serialize schema: {}", e)))
        }),
        SerializationFormat::Yaml => Ok(serde_yaml::to_string(schema)?.into_bytes()),
        SerializationFormat::Parse => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RepositoryConfig;
    use std::fs;
    use tempfile::TempDir;
    use zip::ZipArchive;

    const SIMPLE_XSD: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
  xmlns:a="urn:a" targetNamespace="urn:a">
  <xs:complexType name="T">
    <xs:sequence>
      <xs:element name="e" type="xs:string"/>
    </xs:sequence>
  </xs:complexType>
</xs:schema>"#;

    fn build_repo(dir: &TempDir) -> SchemaRepository {
        fs::write(dir.path().join("a.xsd"), SIMPLE_XSD).unwrap();
        let config = RepositoryConfig::with_files(vec![dir
            .path()
            .join("a.xsd")
            .to_string_lossy()
            .to_string()]);
        let mut repo = SchemaRepository::new(config).unwrap();
        repo.parse().unwrap();
        repo.resolve().unwrap();
        repo
    }

    #[test]
    fn test_archive_layout() {
        let dir = TempDir::new().unwrap();
        let repo = build_repo(&dir);

        let package_path = dir.path().join("a.lxr");
        write_package(&repo, &package_path, &PackageConfig::default(), None).unwrap();

        let file = fs::File::open(&package_path).unwrap();
        let archive = ZipArchive::new(file).unwrap();
        let names: Vec<&str> = archive.file_names().collect();

        assert!(names.contains(&"metadata.yaml"));
        assert!(names.contains(&"schemas/a.xsd"));
        assert!(names.contains(&"schemas_data/a.marshal"));
    }

    #[test]
    fn test_bare_mode_skips_schemas_data() {
        let dir = TempDir::new().unwrap();
        let repo = build_repo(&dir);

        let package_path = dir.path().join("a.lxr");
        let config = PackageConfig::default().with_resolution_mode(ResolutionMode::Bare);
        write_package(&repo, &package_path, &config, None).unwrap();

        let file = fs::File::open(&package_path).unwrap();
        let archive = ZipArchive::new(file).unwrap();
        assert!(!archive.file_names().any(|n| n.starts_with("schemas_data/")));
    }

    #[test]
    fn test_overwrite_existing_package() {
        let dir = TempDir::new().unwrap();
        let repo = build_repo(&dir);

        let package_path = dir.path().join("a.lxr");
        fs::write(&package_path, b"not a zip").unwrap();

        write_package(&repo, &package_path, &PackageConfig::default(), None).unwrap();
        let file = fs::File::open(&package_path).unwrap();
        assert!(ZipArchive::new(file).is_ok());
    }

    #[test]
    fn test_progress_callback_invoked() {
        let dir = TempDir::new().unwrap();
        let repo = build_repo(&dir);

        let package_path = dir.path().join("a.lxr");
        let calls = std::cell::RefCell::new(Vec::new());
        let progress = |current: usize, total: usize, label: &str| {
            calls.borrow_mut().push((current, total, label.to_string()));
        };
        write_package(&repo, &package_path, &PackageConfig::default(), Some(&progress)).unwrap();

        assert_eq!(calls.borrow().len(), 1);
        assert_eq!(calls.borrow()[0].0, 1);
    }

    #[test]
    fn test_unique_basename_collision() {
        let dir = TempDir::new().unwrap();
        let repo = build_repo(&dir);
        let schema = repo.processed_schemas().schemas().next().unwrap();

        let mut used = HashSet::new();
        let first = unique_basename(&repo, schema, "x/a.xsd", b"one", &mut used);
        let second = unique_basename(&repo, schema, "y/a.xsd", b"two", &mut used);
        let third = unique_basename(&repo, schema, "z/a.xsd", b"three", &mut used);

        assert_eq!(first, "a.xsd");
        assert_ne!(second, first);
        assert_ne!(third, second);
        assert!(second.starts_with("a_"));
    }
}
