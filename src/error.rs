//! Error types for typed object validation

use thiserror::Error;

/// Result type for typed object operations
pub type Result<T> = std::result::Result<T, TypedObjectError>;

/// Typed object validation errors
///
/// Content-level validation failures (the document simply does not conform
/// to its schema) are never errors of this type; they accumulate as
/// diagnostics on the [`ValidationReport`](crate::ValidationReport).
#[derive(Error, Debug)]
pub enum TypedObjectError {
    #[error("document is not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("no such module: {module}")]
    NoSuchModule { module: String },

    #[error("no such type: {module}.{name}{}", .version.as_ref().map(|v| format!(" version {v}")).unwrap_or_default())]
    NoSuchType {
        module: String,
        name: String,
        version: Option<semver::Version>,
    },

    #[error("schema storage failure: {0}")]
    SchemaStorage(String),

    #[error("bad schema document: {0}")]
    BadSchemaDocument(String),

    #[error("validation engine failure: {0}")]
    ValidationExecution(String),

    #[error("no replacement supplied for store identifier '{id}'")]
    UnresolvedRelabelTarget { id: String },

    #[error("unsupported selection: {0}")]
    UnsupportedSelection(String),

    #[error("invalid type reference '{0}'")]
    InvalidTypeReference(String),
}
