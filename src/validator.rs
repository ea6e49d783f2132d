//! Typed object validation entry point

use serde_json::Value;
use tracing::debug;

use crate::error::{Result, TypedObjectError};
use crate::provider::SchemaProvider;
use crate::report::ValidationReport;
use crate::typeref::TypeReference;

/// Validates typed object documents against the schemas of a provider
///
/// Validation is synchronous and touches nothing but the provider boundary:
/// resolve the type reference, run one evaluation pass, and wrap the
/// results in a [`ValidationReport`] that owns the document.
pub struct TypedObjectValidator<P> {
    provider: P,
}

impl<P: SchemaProvider> TypedObjectValidator<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// The schema provider this validator resolves types against
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Validate a JSON text document
    ///
    /// Malformed text fails with [`Parse`](TypedObjectError::Parse) before
    /// schema resolution is attempted.
    pub fn validate_text(
        &self,
        text: &str,
        reference: &TypeReference,
    ) -> Result<ValidationReport> {
        let document = serde_json::from_str(text).map_err(TypedObjectError::Parse)?;
        self.validate(document, reference)
    }

    /// Validate an already-parsed document
    ///
    /// Content-level failures never surface here; they accumulate as
    /// diagnostics on the returned report. `Err` is reserved for schema
    /// resolution and engine failures.
    pub fn validate(
        &self,
        document: Value,
        reference: &TypeReference,
    ) -> Result<ValidationReport> {
        let (schema, absolute) = self.provider.get_schema(
            &reference.module,
            &reference.name,
            reference.version.as_ref(),
        )?;
        let diagnostics = schema.evaluate(&document)?;
        debug!(
            type_ref = %absolute,
            diagnostics = diagnostics.len(),
            "validated typed object"
        );
        Ok(ValidationReport::new(document, absolute, diagnostics))
    }
}
