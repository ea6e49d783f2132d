//! Typed Object CLI
//!
//! Validates typed object documents against a directory of versioned
//! schemas, lists the identifier references they embed, extracts the
//! searchable subset, and relabels store identifiers.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use typedobj::config::TypedObjConfig;
use typedobj::{FileSchemaProvider, TypeReference, TypedObjectValidator};

#[derive(Parser)]
#[command(name = "typedobj")]
#[command(about = "Validate typed objects against versioned schemas")]
struct Cli {
    /// Schema directory (overrides typedobj.toml)
    #[arg(short, long)]
    schemas: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a document and print the report
    Validate {
        /// Document file (JSON)
        file: PathBuf,
        /// Type to validate against, e.g. KB.Genome or KB.Genome-1.0.0
        #[arg(short, long = "type")]
        type_ref: String,
    },

    /// List the identifier references of a valid document
    Ids {
        file: PathBuf,
        #[arg(short, long = "type")]
        type_ref: String,
        /// Only list store-addressable identifiers
        #[arg(long)]
        store: bool,
    },

    /// Print the searchable subset of a valid document
    Subset {
        file: PathBuf,
        #[arg(short, long = "type")]
        type_ref: String,
    },

    /// Relabel store identifiers and print the rewritten document
    Relabel {
        file: PathBuf,
        #[arg(short, long = "type")]
        type_ref: String,
        /// JSON file mapping original identifiers to replacements
        #[arg(short, long)]
        mapping: PathBuf,
    },
}

fn main() {
    let config = TypedObjConfig::load().unwrap_or_default();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log.filter.clone())),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli, config) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli, config: TypedObjConfig) -> anyhow::Result<()> {
    let root = cli.schemas.unwrap_or(config.schemas.root);
    let provider = FileSchemaProvider::open(&root)
        .with_context(|| format!("opening schema directory {}", root.display()))?;
    let validator = TypedObjectValidator::new(provider);

    match cli.command {
        Commands::Validate { file, type_ref } => {
            let report = validate(&validator, &file, &type_ref)?;
            print!("{}", report);
            if !report.is_valid() {
                std::process::exit(1);
            }
            println!(" -checksum: {}", report.document_checksum());
            Ok(())
        }

        Commands::Ids {
            file,
            type_ref,
            store,
        } => {
            let report = validate(&validator, &file, &type_ref)?;
            require_valid(&report)?;
            if store {
                for reference in report.store_id_references() {
                    println!("{}\t{}", reference.id, reference.pointer);
                }
            } else {
                for reference in report.all_id_references() {
                    println!("{}\t{}\t{}", reference.kind, reference.id, reference.pointer);
                }
            }
            Ok(())
        }

        Commands::Subset { file, type_ref } => {
            let report = validate(&validator, &file, &type_ref)?;
            require_valid(&report)?;
            let subset = report.extract_searchable_subset()?;
            println!("{}", serde_json::to_string_pretty(&subset)?);
            Ok(())
        }

        Commands::Relabel {
            file,
            type_ref,
            mapping,
        } => {
            let mut report = validate(&validator, &file, &type_ref)?;
            require_valid(&report)?;
            let mapping_text = std::fs::read_to_string(&mapping)
                .with_context(|| format!("reading mapping file {}", mapping.display()))?;
            let mapping: HashMap<String, String> = serde_json::from_str(&mapping_text)
                .context("mapping file must be a JSON object of old -> new ids")?;
            let document = report.relabel_store_references(&mapping)?;
            println!("{}", serde_json::to_string_pretty(document)?);
            Ok(())
        }
    }
}

fn validate(
    validator: &TypedObjectValidator<FileSchemaProvider>,
    file: &Path,
    type_ref: &str,
) -> anyhow::Result<typedobj::ValidationReport> {
    let reference: TypeReference = type_ref.parse()?;
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("reading document {}", file.display()))?;
    Ok(validator.validate_text(&text, &reference)?)
}

fn require_valid(report: &typedobj::ValidationReport) -> anyhow::Result<()> {
    if !report.is_valid() {
        for message in report.error_messages() {
            eprintln!("  {}", message);
        }
        anyhow::bail!(
            "document is not a valid '{}'",
            report.type_reference()
        );
    }
    Ok(())
}
