//! Package round-trip, self-containment and cache scenarios

use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use xsdrepo::package::{PackageConfig, ResolutionMode, SerializationFormat, XsdMode};
use xsdrepo::SchemaRepository;

const PERSON_XSD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           xmlns:p="http://example.com/person"
           targetNamespace="http://example.com/person">
  <xs:element name="Person" type="p:PersonType"/>
  <xs:complexType name="PersonType">
    <xs:sequence>
      <xs:element name="Name" type="xs:string"/>
    </xs:sequence>
  </xs:complexType>
</xs:schema>"#;

const COMPANY_XSD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           xmlns:c="http://example.com/company"
           targetNamespace="http://example.com/company">
  <xs:complexType name="CompanyType">
    <xs:sequence>
      <xs:element name="Name" type="xs:string"/>
    </xs:sequence>
  </xs:complexType>
</xs:schema>"#;

fn build_repo(dir: &Path) -> SchemaRepository {
    fs::write(dir.join("person.xsd"), PERSON_XSD).unwrap();
    fs::write(dir.join("company.xsd"), COMPANY_XSD).unwrap();
    let yaml = dir.join("repo.yml");
    fs::write(
        &yaml,
        r#"
files: ["person.xsd", "company.xsd"]
namespace_mappings:
  - { prefix: "p", uri: "http://example.com/person" }
  - { prefix: "c", uri: "http://example.com/company" }
"#,
    )
    .unwrap();

    let mut repo = SchemaRepository::from_yaml_file(&yaml).unwrap();
    repo.parse().unwrap();
    repo.resolve().unwrap();
    repo
}

/// Build, package, reload: statistics, names and categories survive
#[test]
fn test_package_round_trip() {
    let dir = TempDir::new().unwrap();
    let repo = build_repo(dir.path());

    let package_path = dir.path().join("bundle.lxr");
    let config = PackageConfig::default()
        .with_xsd_mode(XsdMode::IncludeAll)
        .with_resolution_mode(ResolutionMode::Resolved)
        .with_serialization_format(SerializationFormat::Marshal);
    repo.to_package(&package_path, &config, None).unwrap();

    let reloaded = SchemaRepository::from_package(&package_path).unwrap();

    let original_stats = repo.statistics();
    let reloaded_stats = reloaded.statistics();
    assert_eq!(original_stats.total_schemas, reloaded_stats.total_schemas);
    assert_eq!(original_stats.total_types, reloaded_stats.total_types);
    assert_eq!(original_stats.total_namespaces, reloaded_stats.total_namespaces);

    assert_eq!(
        repo.all_type_names(None, None),
        reloaded.all_type_names(None, None)
    );

    let original = repo.find_type("p:PersonType");
    let reloaded_result = reloaded.find_type("p:PersonType");
    assert!(original.resolved && reloaded_result.resolved);
    assert_eq!(original.category, reloaded_result.category);
}

/// All serialization formats reload to the same queryable state
#[test]
fn test_all_serialization_formats() {
    for format in [
        SerializationFormat::Marshal,
        SerializationFormat::Json,
        SerializationFormat::Yaml,
        SerializationFormat::Parse,
    ] {
        let dir = TempDir::new().unwrap();
        let repo = build_repo(dir.path());

        let package_path = dir.path().join("bundle.lxr");
        let config = PackageConfig::default().with_serialization_format(format);
        repo.to_package(&package_path, &config, None).unwrap();

        let reloaded = SchemaRepository::from_package(&package_path).unwrap();
        assert!(
            reloaded.find_type("{http://example.com/person}PersonType").resolved,
            "format {:?}",
            format
        );
        assert_eq!(
            repo.all_type_names(None, None),
            reloaded.all_type_names(None, None),
            "format {:?}",
            format
        );
    }
}

/// include_all packages reload self-contained: every import/include target
/// is present without any mapping configuration
#[test]
fn test_closure_after_include_all() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("main.xsd"),
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
             xmlns:m="urn:main" targetNamespace="urn:main">
             <xs:import namespace="urn:common" schemaLocation="common.xsd"/>
             <xs:include schemaLocation="extra.xsd"/>
             <xs:element name="Root" type="m:RootType"/>
             <xs:complexType name="RootType"/>
           </xs:schema>"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("common.xsd"),
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:common">
             <xs:complexType name="CommonType"/>
           </xs:schema>"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("extra.xsd"),
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:main">
             <xs:complexType name="ExtraType"/>
           </xs:schema>"#,
    )
    .unwrap();
    let yaml = dir.path().join("repo.yml");
    fs::write(&yaml, "files: [\"main.xsd\"]\n").unwrap();

    let mut repo = SchemaRepository::from_yaml_file(&yaml).unwrap();
    repo.parse().unwrap();
    repo.resolve().unwrap();
    assert_eq!(repo.processed_schemas().len(), 3);

    let package_path = dir.path().join("bundle.lxr");
    repo.to_package(&package_path, &PackageConfig::default(), None)
        .unwrap();

    let reloaded = SchemaRepository::from_package(&package_path).unwrap();
    assert_eq!(reloaded.processed_schemas().len(), 3);
    assert!(reloaded
        .package_metadata()
        .unwrap()
        .schema_location_mappings
        .is_empty());

    let report = reloaded.validate_full_resolution();
    assert!(report.valid, "errors: {:?}", report.errors);

    for schema in reloaded.processed_schemas().schemas() {
        for import in schema.imports() {
            let key = import.resolved_location.as_deref().unwrap();
            assert!(reloaded.processed_schemas().contains_key(key));
        }
        for include in schema.includes() {
            let key = include.resolved_location.as_deref().unwrap();
            assert!(reloaded.processed_schemas().contains_key(key));
        }
    }
}

/// The cached package is reused iff it is at least as fresh as the source
#[test]
fn test_cache_freshness() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("person.xsd"), PERSON_XSD).unwrap();
    let yaml = dir.path().join("repo.yml");
    fs::write(&yaml, "files: [\"person.xsd\"]\n").unwrap();
    let package_path = dir.path().join("repo.lxr");

    // First call builds and writes the cache
    let fresh = SchemaRepository::from_file_cached(&yaml, Some(&package_path)).unwrap();
    assert!(fresh.package_metadata().is_none());
    assert!(package_path.exists());

    // Second call hits the cache (the repository carries package metadata)
    let cached = SchemaRepository::from_file_cached(&yaml, Some(&package_path)).unwrap();
    assert!(cached.package_metadata().is_some());
    assert_eq!(
        fresh.all_type_names(None, None),
        cached.all_type_names(None, None)
    );

    // Touch the source: the cache is stale and gets rebuilt
    std::thread::sleep(std::time::Duration::from_millis(1100));
    fs::write(&yaml, "files: [\"person.xsd\"]\n").unwrap();

    let rebuilt = SchemaRepository::from_file_cached(&yaml, Some(&package_path)).unwrap();
    assert!(rebuilt.package_metadata().is_none());

    let package_mtime = fs::metadata(&package_path).unwrap().modified().unwrap();
    let source_mtime = fs::metadata(&yaml).unwrap().modified().unwrap();
    assert!(package_mtime >= source_mtime);
}

/// from_file dispatches on the input extension
#[test]
fn test_from_file_dispatch() {
    let dir = TempDir::new().unwrap();
    let repo = build_repo(dir.path());

    // .xsd input
    let from_xsd = SchemaRepository::from_file(dir.path().join("person.xsd")).unwrap();
    assert!(from_xsd
        .find_type("{http://example.com/person}PersonType")
        .resolved);

    // .yml input
    let from_yaml = SchemaRepository::from_file(dir.path().join("repo.yml")).unwrap();
    assert_eq!(from_yaml.statistics().total_schemas, 2);

    // .lxr input
    let package_path = dir.path().join("bundle.lxr");
    repo.to_package(&package_path, &PackageConfig::default(), None)
        .unwrap();
    let from_package = SchemaRepository::from_file(&package_path).unwrap();
    assert_eq!(from_package.statistics().total_schemas, 2);

    // Unknown extension
    assert!(SchemaRepository::from_file(dir.path().join("person.txt")).is_err());
}
