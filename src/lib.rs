//! Typed Object Validation Core
//!
//! Validates semi-structured documents ("typed objects") against versioned
//! schema definitions, extracts the typed identifier references embedded in
//! a document, supports in-place renaming of store-addressable identifiers,
//! and derives a reduced searchable subset for indexing.
//!
//! ## Flow
//!
//! ```text
//! TypedObjectValidator ──validate──▶ ValidationReport
//!                                        ├── is_valid / error_messages
//!                                        ├── id references / relabel
//!                                        └── extract_searchable_subset
//! ```
//!
//! Schemas come from a [`SchemaProvider`]: the registry that stores,
//! compiles, and versions them is an external collaborator. The core
//! operates purely on an in-memory document plus the compiled schema handle
//! the provider returns.
//!
//! Content-level validation failures (the document does not conform) are
//! never `Err`: they accumulate as diagnostics on the report, so callers
//! can validate documents in a loop without error-driven control flow.
//! Hard failures (unknown type, broken schema, storage outage, engine
//! faults) surface as [`TypedObjectError`].

pub mod checksum;
pub mod config;
pub mod diagnostic;
pub mod error;
pub mod idref;
pub mod pointer;
pub mod provider;
pub mod report;
pub mod schema;
pub mod subset;
pub mod typeref;
pub mod validator;

pub use checksum::Checksum;
pub use diagnostic::{Diagnostic, DiagnosticPayload, IdAnnotation, Severity};
pub use error::{Result, TypedObjectError};
pub use idref::{IdReference, IdReferenceManager, StoreIdReference};
pub use pointer::JsonPointer;
pub use provider::{FileSchemaProvider, MemorySchemaProvider, SchemaProvider};
pub use report::ValidationReport;
pub use schema::CompiledSchema;
pub use subset::{SelectionNode, SubsetSpec};
pub use typeref::{AbsoluteTypeReference, TypeReference};
pub use validator::TypedObjectValidator;
