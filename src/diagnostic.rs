//! Structured validation diagnostics
//!
//! Schema evaluation produces a flat stream of diagnostics. Content
//! failures are error-severity entries; the schema engine's side channels
//! (identifier annotations, the subset specification) are info-severity
//! entries carrying a typed payload, decided at emission time so consumers
//! never string-match message text.

use serde::{Deserialize, Serialize};

use crate::pointer::JsonPointer;
use crate::subset::SubsetSpec;

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Info,
}

/// Typed side-channel payload attached to a diagnostic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "payload", rename_all = "snake_case")]
pub enum DiagnosticPayload {
    /// No structured payload, just the message
    Plain,
    /// A recognized identifier at the diagnostic's pointer
    IdAnnotation(IdAnnotation),
    /// The schema's searchable subset specification (at most one per run)
    SubsetSpec(SubsetSpec),
}

/// An identifier recognized during validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdAnnotation {
    /// Identifier kind declared by the schema (e.g., "genome", "store")
    pub kind: String,
    /// Whether the identifier addresses an object in an external store and
    /// is therefore subject to relabeling
    pub store: bool,
    /// The identifier text as found in the document
    pub id: String,
}

/// One entry of the validation diagnostic stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    /// Path into the document this diagnostic refers to, when known
    pub pointer: Option<JsonPointer>,
    pub payload: DiagnosticPayload,
}

impl Diagnostic {
    /// A content validation failure
    pub fn error(message: impl Into<String>, pointer: JsonPointer) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            pointer: Some(pointer),
            payload: DiagnosticPayload::Plain,
        }
    }

    /// An identifier annotation at the given position
    pub fn id_annotation(annotation: IdAnnotation, pointer: JsonPointer) -> Self {
        Self {
            severity: Severity::Info,
            message: format!("id reference ({})", annotation.kind),
            pointer: Some(pointer),
            payload: DiagnosticPayload::IdAnnotation(annotation),
        }
    }

    /// The subset specification side channel
    pub fn subset_spec(spec: SubsetSpec) -> Self {
        Self {
            severity: Severity::Info,
            message: "searchable subset specification".to_string(),
            pointer: None,
            payload: DiagnosticPayload::SubsetSpec(spec),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}
