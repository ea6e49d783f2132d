//! Schema providers
//!
//! The validator resolves type references through the [`SchemaProvider`]
//! boundary: given a module, a type name, and an optional version, a
//! provider returns the compiled schema and the absolute type reference it
//! resolved to. Registry storage, compilation pipelines, and approval
//! workflows live behind this trait; the core only consumes it.
//!
//! Two concrete providers ship with the crate: an in-memory one for
//! embedding and tests, and a directory-backed one for the CLI.

use semver::Version;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::error::{Result, TypedObjectError};
use crate::schema::CompiledSchema;
use crate::typeref::AbsoluteTypeReference;

/// Source of compiled schemas for the validator
pub trait SchemaProvider {
    /// Resolve a module/type pair to a compiled schema
    ///
    /// A `None` version resolves to the most recent registered version.
    fn get_schema(
        &self,
        module: &str,
        name: &str,
        version: Option<&Version>,
    ) -> Result<(Arc<CompiledSchema>, AbsoluteTypeReference)>;
}

/// Versioned schemas for the types of one module
type TypeVersions = BTreeMap<Version, Arc<CompiledSchema>>;

/// An in-memory schema provider
///
/// Schemas are compiled eagerly at registration, so a bad schema document
/// is rejected up front rather than at first validation.
#[derive(Default)]
pub struct MemorySchemaProvider {
    modules: HashMap<String, HashMap<String, TypeVersions>>,
}

impl MemorySchemaProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema document for a module/type/version triple
    pub fn register(
        &mut self,
        module: impl Into<String>,
        name: impl Into<String>,
        version: Version,
        schema: serde_json::Value,
    ) -> Result<()> {
        let compiled = Arc::new(CompiledSchema::compile(schema)?);
        self.modules
            .entry(module.into())
            .or_default()
            .entry(name.into())
            .or_default()
            .insert(version, compiled);
        Ok(())
    }
}

/// Shared version-resolution logic for the bundled providers
fn resolve<'a>(
    versions: &'a TypeVersions,
    module: &str,
    name: &str,
    version: Option<&Version>,
) -> Result<(&'a Version, &'a Arc<CompiledSchema>)> {
    let found = match version {
        Some(v) => versions.get_key_value(v),
        None => versions.last_key_value(),
    };
    found.ok_or_else(|| TypedObjectError::NoSuchType {
        module: module.to_string(),
        name: name.to_string(),
        version: version.cloned(),
    })
}

impl SchemaProvider for MemorySchemaProvider {
    fn get_schema(
        &self,
        module: &str,
        name: &str,
        version: Option<&Version>,
    ) -> Result<(Arc<CompiledSchema>, AbsoluteTypeReference)> {
        let types = self
            .modules
            .get(module)
            .ok_or_else(|| TypedObjectError::NoSuchModule {
                module: module.to_string(),
            })?;
        let versions = types.get(name).ok_or_else(|| TypedObjectError::NoSuchType {
            module: module.to_string(),
            name: name.to_string(),
            version: version.cloned(),
        })?;
        let (resolved, schema) = resolve(versions, module, name, version)?;
        Ok((
            Arc::clone(schema),
            AbsoluteTypeReference::new(module, name, resolved.clone()),
        ))
    }
}

/// A directory-backed schema provider
///
/// Layout: `<root>/<Module>/<Type>-<version>.json`, one schema document
/// per released type version. The whole tree is scanned and compiled at
/// open time; I/O failures surface as
/// [`SchemaStorage`](TypedObjectError::SchemaStorage).
pub struct FileSchemaProvider {
    root: PathBuf,
    modules: HashMap<String, HashMap<String, TypeVersions>>,
}

impl FileSchemaProvider {
    /// Scan and compile every schema under `root`
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let mut modules: HashMap<String, HashMap<String, TypeVersions>> = HashMap::new();

        for module_entry in read_dir(&root)? {
            let module_path = module_entry.path();
            if !module_path.is_dir() {
                continue;
            }
            let module = file_name(&module_path)?;

            for schema_entry in read_dir(&module_path)? {
                let schema_path = schema_entry.path();
                let Some(stem) = schema_path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .and_then(|n| n.strip_suffix(".json"))
                else {
                    continue;
                };
                let Some((name, version)) = stem.split_once('-') else {
                    continue;
                };
                let version = Version::parse(version).map_err(|e| {
                    TypedObjectError::SchemaStorage(format!(
                        "bad version in schema file {}: {e}",
                        schema_path.display()
                    ))
                })?;

                let content = fs::read_to_string(&schema_path).map_err(|e| {
                    TypedObjectError::SchemaStorage(format!(
                        "cannot read {}: {e}",
                        schema_path.display()
                    ))
                })?;
                let document = serde_json::from_str(&content).map_err(|e| {
                    TypedObjectError::SchemaStorage(format!(
                        "schema file {} is not valid JSON: {e}",
                        schema_path.display()
                    ))
                })?;
                let compiled = Arc::new(CompiledSchema::compile(document)?);

                modules
                    .entry(module.clone())
                    .or_default()
                    .entry(name.to_string())
                    .or_default()
                    .insert(version, compiled);
            }
        }

        debug!(root = %root.display(), modules = modules.len(), "opened schema directory");
        Ok(Self { root, modules })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl SchemaProvider for FileSchemaProvider {
    fn get_schema(
        &self,
        module: &str,
        name: &str,
        version: Option<&Version>,
    ) -> Result<(Arc<CompiledSchema>, AbsoluteTypeReference)> {
        let types = self
            .modules
            .get(module)
            .ok_or_else(|| TypedObjectError::NoSuchModule {
                module: module.to_string(),
            })?;
        let versions = types.get(name).ok_or_else(|| TypedObjectError::NoSuchType {
            module: module.to_string(),
            name: name.to_string(),
            version: version.cloned(),
        })?;
        let (resolved, schema) = resolve(versions, module, name, version)?;
        Ok((
            Arc::clone(schema),
            AbsoluteTypeReference::new(module, name, resolved.clone()),
        ))
    }
}

fn read_dir(path: &Path) -> Result<Vec<fs::DirEntry>> {
    let entries = fs::read_dir(path)
        .map_err(|e| {
            TypedObjectError::SchemaStorage(format!("cannot read {}: {e}", path.display()))
        })?
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|e| {
            TypedObjectError::SchemaStorage(format!("cannot read {}: {e}", path.display()))
        })?;
    Ok(entries)
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(String::from)
        .ok_or_else(|| {
            TypedObjectError::SchemaStorage(format!(
                "non-UTF-8 path in schema directory: {}",
                path.display()
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn string_schema() -> serde_json::Value {
        json!({"type": "object", "properties": {"id": {"type": "string"}}})
    }

    #[test]
    fn memory_provider_resolves_latest() {
        let mut provider = MemorySchemaProvider::new();
        provider
            .register("KB", "Genome", Version::new(1, 0, 0), string_schema())
            .unwrap();
        provider
            .register("KB", "Genome", Version::new(1, 1, 0), string_schema())
            .unwrap();

        let (_, abs) = provider.get_schema("KB", "Genome", None).unwrap();
        assert_eq!(abs.version, Version::new(1, 1, 0));

        let pinned = Version::new(1, 0, 0);
        let (_, abs) = provider.get_schema("KB", "Genome", Some(&pinned)).unwrap();
        assert_eq!(abs.version, pinned);
    }

    #[test]
    fn memory_provider_failure_taxonomy() {
        let mut provider = MemorySchemaProvider::new();
        provider
            .register("KB", "Genome", Version::new(1, 0, 0), string_schema())
            .unwrap();

        assert!(matches!(
            provider.get_schema("FBA", "Model", None),
            Err(TypedObjectError::NoSuchModule { .. })
        ));
        assert!(matches!(
            provider.get_schema("KB", "Feature", None),
            Err(TypedObjectError::NoSuchType { .. })
        ));
        let missing = Version::new(9, 0, 0);
        assert!(matches!(
            provider.get_schema("KB", "Genome", Some(&missing)),
            Err(TypedObjectError::NoSuchType { .. })
        ));
    }

    #[test]
    fn register_rejects_bad_schema() {
        let mut provider = MemorySchemaProvider::new();
        let result = provider.register(
            "KB",
            "Genome",
            Version::new(1, 0, 0),
            json!({"type": "not-a-type"}),
        );
        assert!(matches!(
            result,
            Err(TypedObjectError::BadSchemaDocument(_))
        ));
    }

    #[test]
    fn file_provider_scans_directory_layout() {
        let dir = tempfile::tempdir().unwrap();
        let module_dir = dir.path().join("KB");
        fs::create_dir_all(&module_dir).unwrap();
        fs::write(
            module_dir.join("Genome-1.0.0.json"),
            serde_json::to_string_pretty(&string_schema()).unwrap(),
        )
        .unwrap();
        fs::write(
            module_dir.join("Genome-1.2.0.json"),
            serde_json::to_string_pretty(&string_schema()).unwrap(),
        )
        .unwrap();

        let provider = FileSchemaProvider::open(dir.path()).unwrap();
        let (_, abs) = provider.get_schema("KB", "Genome", None).unwrap();
        assert_eq!(abs.to_string(), "KB.Genome-1.2.0");

        assert!(matches!(
            provider.get_schema("KB", "Nope", None),
            Err(TypedObjectError::NoSuchType { .. })
        ));
    }

    #[test]
    fn file_provider_reports_storage_failures() {
        let dir = tempfile::tempdir().unwrap();
        let module_dir = dir.path().join("KB");
        fs::create_dir_all(&module_dir).unwrap();
        fs::write(module_dir.join("Genome-1.0.0.json"), "{ not json").unwrap();

        assert!(matches!(
            FileSchemaProvider::open(dir.path()),
            Err(TypedObjectError::SchemaStorage(_))
        ));
    }
}
