//! Identifier reference bookkeeping and relabeling
//!
//! During validation the schema engine annotates every recognized
//! identifier with its kind and position. The manager collects those
//! annotations once, partitions out the store-addressable subset, and
//! supports renaming store identifiers in place inside the owned document.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::debug;

use crate::diagnostic::{Diagnostic, DiagnosticPayload};
use crate::error::{Result, TypedObjectError};
use crate::pointer::JsonPointer;

/// Allowed syntax for a store identifier: a name, optionally prefixed by a
/// store name and a slash
pub fn store_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.|-]*(/[A-Za-z0-9_][A-Za-z0-9_.|-]*)?$")
            .expect("store id pattern is valid")
    })
}

/// An identifier found in a validated document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdReference {
    /// Identifier kind declared by the schema
    pub kind: String,
    /// The original identifier text
    pub id: String,
    /// Where in the document the identifier sits
    pub pointer: JsonPointer,
}

/// A store-addressable identifier, subject to relabeling
///
/// The raw text is split on the first `/` into an optional store name and
/// the object name it addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreIdReference {
    /// The original identifier text (never updated by relabeling)
    pub id: String,
    /// Where in the document the identifier sits
    pub pointer: JsonPointer,
    /// Store component of a `store/name` pair, if present
    pub store_name: Option<String>,
    /// Object name component
    pub object_name: String,
}

impl StoreIdReference {
    fn from_text(id: &str, pointer: JsonPointer) -> Self {
        let (store_name, object_name) = match id.split_once('/') {
            Some((store, name)) => (Some(store.to_string()), name.to_string()),
            None => (None, id.to_string()),
        };
        Self {
            id: id.to_string(),
            pointer,
            store_name,
            object_name,
        }
    }
}

/// Collected identifier annotations for one validation report
///
/// Built by a single scan of the diagnostic stream; both lists preserve
/// emission order. Records are keyed by the original identifier text and
/// are never updated after a relabel.
#[derive(Debug, Clone, Default)]
pub struct IdReferenceManager {
    all: Vec<IdReference>,
    store: Vec<StoreIdReference>,
}

impl IdReferenceManager {
    /// Scan a diagnostic stream for identifier annotations
    pub fn from_diagnostics(diagnostics: &[Diagnostic]) -> Self {
        let mut manager = Self::default();
        for diagnostic in diagnostics {
            let DiagnosticPayload::IdAnnotation(annotation) = &diagnostic.payload else {
                continue;
            };
            let pointer = diagnostic.pointer.clone().unwrap_or_default();
            manager.all.push(IdReference {
                kind: annotation.kind.clone(),
                id: annotation.id.clone(),
                pointer: pointer.clone(),
            });
            if annotation.store {
                manager
                    .store
                    .push(StoreIdReference::from_text(&annotation.id, pointer));
            }
        }
        manager
    }

    /// Every identifier reference, in emission order
    pub fn all_references(&self) -> &[IdReference] {
        &self.all
    }

    /// Every identifier's text, in emission order
    pub fn all_ids(&self) -> Vec<&str> {
        self.all.iter().map(|r| r.id.as_str()).collect()
    }

    /// References of one kind, in emission order
    pub fn references_of_kind(&self, kind: &str) -> Vec<&IdReference> {
        self.all.iter().filter(|r| r.kind == kind).collect()
    }

    /// The store-addressable subset, in emission order
    pub fn store_references(&self) -> &[StoreIdReference] {
        &self.store
    }

    /// Rename every store identifier in place inside `document`
    ///
    /// `mapping` keys are original identifier texts, values are their
    /// replacements. Every store identifier must be resolvable; on the
    /// first miss the operation aborts with the document left partially
    /// mutated, so callers must re-validate or discard it on failure.
    ///
    /// Manager records keep the original text, so a later relabel must
    /// still key its mapping by the original identifiers, not by any
    /// previously substituted text.
    pub fn relabel(
        &self,
        document: &mut Value,
        mapping: &HashMap<String, String>,
    ) -> Result<()> {
        for reference in &self.store {
            let replacement = mapping.get(&reference.id).ok_or_else(|| {
                TypedObjectError::UnresolvedRelabelTarget {
                    id: reference.id.clone(),
                }
            })?;
            let slot = reference
                .pointer
                .resolve_mut(document)
                .filter(|v| v.is_string())
                .ok_or_else(|| {
                    TypedObjectError::ValidationExecution(format!(
                        "store identifier at {} no longer resolves to a string; \
                         was the document restructured after validation?",
                        reference.pointer
                    ))
                })?;
            *slot = Value::String(replacement.clone());
        }
        debug!(count = self.store.len(), "relabeled store identifiers");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::IdAnnotation;
    use serde_json::json;

    fn annotation(kind: &str, store: bool, id: &str, pointer: &str) -> Diagnostic {
        Diagnostic::id_annotation(
            IdAnnotation {
                kind: kind.to_string(),
                store,
                id: id.to_string(),
            },
            pointer.parse().unwrap(),
        )
    }

    #[test]
    fn scan_partitions_store_references() {
        let diagnostics = vec![
            annotation("genome", false, "g.1", "/genome"),
            annotation("store", true, "myws/genome_obj", "/ref"),
            Diagnostic::error("boom", JsonPointer::root()),
        ];
        let manager = IdReferenceManager::from_diagnostics(&diagnostics);
        assert_eq!(manager.all_ids(), vec!["g.1", "myws/genome_obj"]);
        assert_eq!(manager.store_references().len(), 1);
        assert_eq!(manager.references_of_kind("genome").len(), 1);

        let store = &manager.store_references()[0];
        assert_eq!(store.store_name.as_deref(), Some("myws"));
        assert_eq!(store.object_name, "genome_obj");
    }

    #[test]
    fn relabel_rewrites_in_place() {
        let diagnostics = vec![annotation("store", true, "42", "/ref")];
        let manager = IdReferenceManager::from_diagnostics(&diagnostics);

        let mut document = json!({"ref": "42"});
        let mapping = HashMap::from([("42".to_string(), "ws/7".to_string())]);
        manager.relabel(&mut document, &mapping).unwrap();

        assert_eq!(document, json!({"ref": "ws/7"}));
        // Memory of the original id survives the mutation.
        assert_eq!(manager.all_ids(), vec!["42"]);
    }

    #[test]
    fn relabel_fails_on_missing_mapping_entry() {
        let diagnostics = vec![annotation("store", true, "42", "/ref")];
        let manager = IdReferenceManager::from_diagnostics(&diagnostics);

        let mut document = json!({"ref": "42"});
        let err = manager.relabel(&mut document, &HashMap::new()).unwrap_err();
        assert!(matches!(
            err,
            TypedObjectError::UnresolvedRelabelTarget { id } if id == "42"
        ));
    }

    #[test]
    fn relabel_failure_leaves_earlier_mutations() {
        let diagnostics = vec![
            annotation("store", true, "a", "/first"),
            annotation("store", true, "b", "/second"),
        ];
        let manager = IdReferenceManager::from_diagnostics(&diagnostics);

        let mut document = json!({"first": "a", "second": "b"});
        let mapping = HashMap::from([("a".to_string(), "ws/a".to_string())]);
        assert!(manager.relabel(&mut document, &mapping).is_err());
        // The identifier processed before the failure point was committed.
        assert_eq!(document, json!({"first": "ws/a", "second": "b"}));
    }

    #[test]
    fn relabel_detects_restructured_document() {
        let diagnostics = vec![annotation("store", true, "42", "/ref")];
        let manager = IdReferenceManager::from_diagnostics(&diagnostics);

        let mut document = json!({"other": "42"});
        let mapping = HashMap::from([("42".to_string(), "ws/7".to_string())]);
        assert!(matches!(
            manager.relabel(&mut document, &mapping),
            Err(TypedObjectError::ValidationExecution(_))
        ));
    }

    #[test]
    fn store_id_syntax() {
        let re = store_id_regex();
        assert!(re.is_match("myws/genome_obj"));
        assert!(re.is_match("kb|g.1"));
        assert!(re.is_match("42"));
        assert!(!re.is_match("a/b/c"));
        assert!(!re.is_match(""));
        assert!(!re.is_match("ws/"));
        assert!(!re.is_match("bad id"));
    }
}
