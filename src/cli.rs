//! Command-line interface
//!
//! The CLI is a thin collaborator over the library: it parses options,
//! drives the repository and package codec, and renders results. Exit
//! codes: 0 success, 1 usage/configuration error, 2 validation failure,
//! 3 I/O error.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::error::{Error, Result};
use crate::package::{PackageConfig, ResolutionMode, SerializationFormat, XsdMode};
use crate::repository::SchemaRepository;
use crate::validation::InstanceValidator;

/// Exit code for validation failures
pub const EXIT_VALIDATION: i32 = 2;

/// Exit code for I/O failures
pub const EXIT_IO: i32 = 3;

/// Schema repository tooling
#[derive(Parser, Debug)]
#[command(name = "xsdrepo", author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build packages from configurations
    #[command(subcommand)]
    Build(BuildCommand),
    /// Inspect and query packages
    #[command(subcommand)]
    Pkg(PkgCommand),
    /// Validate XML instances
    #[command(subcommand)]
    Xml(XmlCommand),
}

/// Build sub-commands
#[derive(Subcommand, Debug)]
pub enum BuildCommand {
    /// Build a package from a YAML configuration
    FromConfig {
        /// Configuration file
        config: PathBuf,
        /// Output package path
        #[arg(short, long)]
        output: PathBuf,
        #[command(flatten)]
        options: PackageOptions,
    },
    /// Build with the mtime-based package cache
    Auto {
        /// Configuration file
        config: PathBuf,
    },
    /// Build, validate closure and print statistics
    Quick {
        /// Configuration file
        config: PathBuf,
    },
    /// Validate reference closure of a package
    ValidateResolution {
        /// Package path
        package: PathBuf,
    },
}

/// Shared package-writing options
#[derive(Args, Debug)]
pub struct PackageOptions {
    /// Bundling mode (include_all | allow_external)
    #[arg(long, default_value = "include_all")]
    pub xsd_mode: String,
    /// Resolution mode (bare | resolved)
    #[arg(long, default_value = "resolved")]
    pub resolution_mode: String,
    /// Serialization format (marshal | json | yaml | parse)
    #[arg(long, default_value = "marshal")]
    pub serialization_format: String,
    /// Package name
    #[arg(long)]
    pub name: Option<String>,
    /// Package version
    #[arg(long)]
    pub version: Option<String>,
    /// Package description
    #[arg(long)]
    pub description: Option<String>,
}

impl PackageOptions {
    fn to_config(&self) -> Result<PackageConfig> {
        let xsd_mode = XsdMode::parse(&self.xsd_mode)
            .ok_or_else(|| Error::Configuration(format!("unknown xsd mode '{}'", self.xsd_mode)))?;
        let resolution_mode = ResolutionMode::parse(&self.resolution_mode).ok_or_else(|| {
            Error::Configuration(format!("unknown resolution mode '{}'", self.resolution_mode))
        })?;
        let serialization_format = SerializationFormat::parse(&self.serialization_format)
            .ok_or_else(|| {
                Error::Configuration(format!(
                    "unknown serialization format '{}'",
                    self.serialization_format
                ))
            })?;

        let mut config = PackageConfig::default()
            .with_xsd_mode(xsd_mode)
            .with_resolution_mode(resolution_mode)
            .with_serialization_format(serialization_format);
        if let Some(name) = &self.name {
            config = config.with_name(name.clone());
        }
        if let Some(version) = &self.version {
            config = config.with_version(version.clone());
        }
        if let Some(description) = &self.description {
            config = config.with_description(description.clone());
        }
        Ok(config)
    }
}

/// Package sub-commands
#[derive(Subcommand, Debug)]
pub enum PkgCommand {
    /// Print repository statistics
    Stats { package: PathBuf },
    /// List all qualified names
    Ls {
        package: PathBuf,
        /// Restrict to one namespace
        #[arg(long)]
        namespace: Option<String>,
    },
    /// Print schemas and their declarations as a tree
    Tree { package: PathBuf },
    /// Extract the package contents into a directory
    Extract {
        package: PathBuf,
        /// Target directory
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Compute type coverage from entry points
    Coverage {
        package: PathBuf,
        /// Entry-point qualified type names
        #[arg(long = "entry", required = true)]
        entries: Vec<String>,
    },
    /// Verify package structure and reference closure
    Verify { package: PathBuf },
    /// Print package metadata
    Metadata { package: PathBuf },
    /// Look up a type by qualified name
    TypeFind {
        qname: String,
        package: PathBuf,
    },
    /// Search type names by substring
    Search {
        term: String,
        package: PathBuf,
    },
    /// List namespaces and their prefixes
    NamespaceList { package: PathBuf },
    /// Look up a top-level element
    Element {
        qname: String,
        package: PathBuf,
    },
}

/// XML sub-commands
#[derive(Subcommand, Debug)]
pub enum XmlCommand {
    /// Validate an XML instance against a package
    Validate {
        /// XML document
        xml: PathBuf,
        /// Package path
        package: PathBuf,
    },
}

/// Run a parsed command; returns the process exit code
pub fn run(cli: &Cli) -> Result<i32> {
    match &cli.command {
        Command::Build(command) => run_build(command),
        Command::Pkg(command) => run_pkg(command),
        Command::Xml(command) => run_xml(command),
    }
}

fn run_build(command: &BuildCommand) -> Result<i32> {
    match command {
        BuildCommand::FromConfig {
            config,
            output,
            options,
        } => {
            let package_config = options.to_config()?;
            let mut repo = SchemaRepository::from_yaml_file(config)?;
            repo.parse()?;
            repo.resolve()?;
            repo.to_package(output, &package_config, None)?;
            println!("wrote {}", output.display());
            Ok(0)
        }
        BuildCommand::Auto { config } => {
            let repo = SchemaRepository::from_file_cached(config, None)?;
            let stats = repo.statistics();
            println!(
                "{} schemas, {} types, {} namespaces",
                stats.total_schemas, stats.total_types, stats.total_namespaces
            );
            Ok(0)
        }
        BuildCommand::Quick { config } => {
            let mut repo = SchemaRepository::from_yaml_file(config)?;
            repo.parse()?;
            repo.resolve()?;

            let issues = repo.validate(false)?;
            for issue in &issues {
                println!(
                    "{}: {}",
                    if issue.is_error { "error" } else { "warning" },
                    issue.message
                );
            }

            let report = repo.validate_full_resolution();
            print_stats(&repo);
            if issues.iter().any(|issue| issue.is_error) || !report.valid {
                for error in &report.errors {
                    println!("error: {}", error.message);
                }
                return Ok(EXIT_VALIDATION);
            }
            Ok(0)
        }
        BuildCommand::ValidateResolution { package } => {
            let repo = SchemaRepository::from_package(package)?;
            let report = repo.validate_full_resolution();
            for warning in &report.warnings {
                println!("warning: {}", warning.message);
            }
            for error in &report.errors {
                println!(
                    "error: {} (schema: {})",
                    error.message,
                    error.schema.as_deref().unwrap_or("<unknown>")
                );
            }
            if report.valid {
                println!("resolution OK");
                Ok(0)
            } else {
                Ok(EXIT_VALIDATION)
            }
        }
    }
}

fn run_pkg(command: &PkgCommand) -> Result<i32> {
    match command {
        PkgCommand::Stats { package } => {
            let repo = SchemaRepository::from_package(package)?;
            print_stats(&repo);
            Ok(0)
        }
        PkgCommand::Ls { package, namespace } => {
            let repo = SchemaRepository::from_package(package)?;
            for name in repo.all_type_names(namespace.as_deref(), None) {
                println!("{}", name);
            }
            Ok(0)
        }
        PkgCommand::Tree { package } => {
            let repo = SchemaRepository::from_package(package)?;
            for (key, schema) in repo.processed_schemas().iter() {
                println!(
                    "{} ({})",
                    key,
                    schema.target_namespace.as_deref().unwrap_or("<no namespace>")
                );
                for item in schema.resolved_element_order() {
                    if let Some(name) = item.name() {
                        println!("  {}", name);
                    }
                }
            }
            Ok(0)
        }
        PkgCommand::Extract { package, output } => {
            let file = std::fs::File::open(package)?;
            let mut archive = zip::ZipArchive::new(file)?;
            archive.extract(output)?;
            println!("extracted to {}", output.display());
            Ok(0)
        }
        PkgCommand::Coverage { package, entries } => {
            let repo = SchemaRepository::from_package(package)?;
            let report = crate::analysis::coverage(&repo, entries)?;
            println!(
                "{}/{} types used ({:.1}%)",
                report.used, report.total, report.coverage_percent
            );
            for unused in &report.unused {
                println!("unused: {}", unused);
            }
            Ok(0)
        }
        PkgCommand::Verify { package } => {
            let validation = crate::package::validate_package(package);
            for warning in &validation.warnings {
                println!("warning: {}", warning);
            }
            for error in &validation.errors {
                println!("error: {}", error);
            }
            if !validation.valid {
                return Ok(EXIT_VALIDATION);
            }

            let repo = SchemaRepository::from_package(package)?;
            let closure = repo.validate_full_resolution();
            for error in &closure.errors {
                println!("error: {}", error.message);
            }
            if closure.valid {
                println!("package OK");
                Ok(0)
            } else {
                Ok(EXIT_VALIDATION)
            }
        }
        PkgCommand::Metadata { package } => {
            let validation = crate::package::validate_package(package);
            match validation.metadata {
                Some(metadata) => {
                    print!("{}", serde_yaml::to_string(&metadata)?);
                    Ok(0)
                }
                None => {
                    for error in &validation.errors {
                        println!("error: {}", error);
                    }
                    Ok(EXIT_VALIDATION)
                }
            }
        }
        PkgCommand::TypeFind { qname, package } => {
            let repo = SchemaRepository::from_package(package)?;
            let result = repo.find_type(qname);
            if result.resolved {
                println!(
                    "{} ({}) in {}",
                    result.qname,
                    result.category.map(|c| c.to_string()).unwrap_or_default(),
                    result.schema_file.as_deref().unwrap_or("<unknown>")
                );
                for step in &result.resolution_path {
                    println!("  {}: {}", step.stage, step.value);
                }
                Ok(0)
            } else {
                println!(
                    "not found: {}",
                    result.error_message.as_deref().unwrap_or(qname)
                );
                if !result.suggestions.is_empty() {
                    println!("did you mean: {}?", result.suggestions.join(", "));
                }
                Ok(EXIT_VALIDATION)
            }
        }
        PkgCommand::Search { term, package } => {
            let repo = SchemaRepository::from_package(package)?;
            for name in repo.all_type_names(None, None) {
                if name.contains(term.as_str()) {
                    println!("{}", name);
                }
            }
            Ok(0)
        }
        PkgCommand::NamespaceList { package } => {
            let repo = SchemaRepository::from_package(package)?;
            for uri in repo.type_index().namespaces() {
                let prefix = repo
                    .namespace_registry()
                    .primary_prefix(&uri)
                    .unwrap_or("-");
                println!("{}\t{}", prefix, uri);
            }
            Ok(0)
        }
        PkgCommand::Element { qname, package } => {
            let repo = SchemaRepository::from_package(package)?;
            match repo.find_element(qname) {
                Some(item) => {
                    println!("{}", item.name().unwrap_or("<anonymous>"));
                    Ok(0)
                }
                None => {
                    println!("element '{}' not found", qname);
                    Ok(EXIT_VALIDATION)
                }
            }
        }
    }
}

fn run_xml(command: &XmlCommand) -> Result<i32> {
    match command {
        XmlCommand::Validate { xml, package } => {
            let repo = SchemaRepository::from_package(package)?;
            let validator = InstanceValidator::new(&repo);
            let report = validator.validate_file(xml)?;
            if report.valid {
                println!("{} is valid", xml.display());
                Ok(0)
            } else {
                for error in &report.errors {
                    println!("{}: {}", error.path, error.message);
                }
                Ok(EXIT_VALIDATION)
            }
        }
    }
}

fn print_stats(repo: &SchemaRepository) {
    let stats = repo.statistics();
    println!("schemas:          {}", stats.total_schemas);
    println!("types:            {}", stats.total_types);
    println!("elements:         {}", stats.total_elements);
    println!("attributes:       {}", stats.total_attributes);
    println!("groups:           {}", stats.total_groups);
    println!("attribute groups: {}", stats.total_attribute_groups);
    println!("namespaces:       {}", stats.total_namespaces);
}

/// Map an error to its process exit code
pub fn exit_code(error: &Error) -> i32 {
    match error {
        Error::Configuration(_) | Error::Yaml(_) => 1,
        Error::Validation(_) | Error::Reference(_) | Error::Schema(_) => EXIT_VALIDATION,
        Error::Io(_) | Error::Location(_) | Error::Package(_) => EXIT_IO,
        _ => 1,
    }
}
