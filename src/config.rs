//! Configuration for the typedobj CLI
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (typedobj.toml)
//! - Environment variables (TYPEDOBJ_*)
//!
//! ## Example config file (typedobj.toml):
//! ```toml
//! [schemas]
//! root = "./schemas"
//!
//! [log]
//! filter = "typedobj=debug"
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for the CLI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypedObjConfig {
    /// Schema directory settings
    #[serde(default)]
    pub schemas: SchemasConfig,

    /// Logging settings
    #[serde(default)]
    pub log: LogConfig,
}

/// Schema directory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemasConfig {
    /// Root directory holding `<Module>/<Type>-<version>.json` schemas
    #[serde(default = "default_schema_root")]
    pub root: PathBuf,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default tracing filter when RUST_LOG is unset
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_schema_root() -> PathBuf {
    PathBuf::from("./schemas")
}

fn default_log_filter() -> String {
    "typedobj=info".to_string()
}

impl Default for SchemasConfig {
    fn default() -> Self {
        Self {
            root: default_schema_root(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl Default for TypedObjConfig {
    fn default() -> Self {
        Self {
            schemas: SchemasConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl TypedObjConfig {
    /// Load configuration from typedobj.toml (if present) and the
    /// environment
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("typedobj").required(false))
            .add_source(
                Environment::with_prefix("TYPEDOBJ")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
