//! Validation reports
//!
//! The report produced when a typed object is validated. It owns the
//! original document and the diagnostic stream, and is the sole entry
//! point for every derived view: error messages, identifier references,
//! store identifier relabeling, and searchable subset extraction.

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

use crate::checksum::Checksum;
use crate::diagnostic::{Diagnostic, DiagnosticPayload};
use crate::error::Result;
use crate::idref::{IdReference, IdReferenceManager, StoreIdReference};
use crate::typeref::AbsoluteTypeReference;

/// The result of validating one typed object
///
/// Immutable except for [`relabel_store_references`], the one explicit
/// mutation of the owned document. Read-only accessors are idempotent
/// between relabels.
///
/// [`relabel_store_references`]: ValidationReport::relabel_store_references
#[derive(Debug)]
pub struct ValidationReport {
    document: Value,
    type_reference: AbsoluteTypeReference,
    diagnostics: Vec<Diagnostic>,
    id_references: IdReferenceManager,
}

impl ValidationReport {
    /// Wrap a validated document with its diagnostic stream
    pub fn new(
        document: Value,
        type_reference: AbsoluteTypeReference,
        diagnostics: Vec<Diagnostic>,
    ) -> Self {
        let id_references = IdReferenceManager::from_diagnostics(&diagnostics);
        Self {
            document,
            type_reference,
            diagnostics,
            id_references,
        }
    }

    /// True iff no diagnostic has error severity
    pub fn is_valid(&self) -> bool {
        !self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Number of error-severity diagnostics
    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    /// Error messages in emission order
    ///
    /// Each is `"<message>, at <pointer>"` when the diagnostic carries a
    /// non-root pointer, else the bare message.
    pub fn error_messages(&self) -> Vec<String> {
        self.diagnostics
            .iter()
            .filter(|d| d.is_error())
            .map(|d| match &d.pointer {
                Some(p) if !p.is_root() => format!("{}, at {}", d.message, p),
                _ => d.message.clone(),
            })
            .collect()
    }

    /// The absolute type reference the document was validated against
    pub fn type_reference(&self) -> &AbsoluteTypeReference {
        &self.type_reference
    }

    /// The owned document
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Consume the report, yielding the owned document
    pub fn into_document(self) -> Value {
        self.document
    }

    /// SHA-256 checksum of the document's canonical serialization
    pub fn document_checksum(&self) -> Checksum {
        Checksum::from_json(&self.document)
    }

    /// The raw diagnostic stream, in emission order
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Every identifier reference found during validation
    pub fn all_id_references(&self) -> &[IdReference] {
        self.id_references.all_references()
    }

    /// Every identifier's text, in emission order
    pub fn all_ids(&self) -> Vec<&str> {
        self.id_references.all_ids()
    }

    /// Identifier references of one kind
    pub fn id_references_of_kind(&self, kind: &str) -> Vec<&IdReference> {
        self.id_references.references_of_kind(kind)
    }

    /// The store-addressable identifier references
    pub fn store_id_references(&self) -> &[StoreIdReference] {
        self.id_references.store_references()
    }

    /// Rename store identifiers in place inside the owned document
    ///
    /// `mapping` keys are original identifier texts. Identifier memory is
    /// never updated: a second relabel must still key off the original
    /// texts. On failure the document is left partially mutated and must
    /// be re-validated or discarded.
    pub fn relabel_store_references(
        &mut self,
        mapping: &HashMap<String, String>,
    ) -> Result<&Value> {
        self.id_references.relabel(&mut self.document, mapping)?;
        Ok(&self.document)
    }

    /// Extract the searchable subset the schema selected for indexing
    ///
    /// Returns an empty object for invalid documents: selection trees are
    /// schema-driven and assume conformance. Otherwise the first subset
    /// specification diagnostic wins and the scan stops there.
    pub fn extract_searchable_subset(&self) -> Result<Value> {
        if !self.is_valid() {
            return Ok(Value::Object(Map::new()));
        }
        let spec = self.diagnostics.iter().find_map(|d| match &d.payload {
            DiagnosticPayload::SubsetSpec(spec) => Some(spec),
            _ => None,
        });
        match spec {
            Some(spec) => spec.extract(&self.document),
            None => Ok(Value::Object(Map::new())),
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "typed object validation report")?;
        writeln!(f, " -validated against: '{}'", self.type_reference)?;
        if self.is_valid() {
            writeln!(f, " -status: pass")?;
            writeln!(
                f,
                " -id references: {} ({} store-addressable)",
                self.id_references.all_references().len(),
                self.id_references.store_references().len()
            )
        } else {
            let messages = self.error_messages();
            writeln!(f, " -status: fail ({} error(s))", messages.len())?;
            for (index, message) in messages.iter().enumerate() {
                writeln!(f, " -[{}]: {}", index + 1, message)?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::IdAnnotation;
    use crate::pointer::JsonPointer;
    use crate::subset::{SelectionNode, SubsetSpec};
    use semver::Version;
    use serde_json::json;

    fn type_ref() -> AbsoluteTypeReference {
        AbsoluteTypeReference::new("KB", "Genome", Version::new(1, 0, 0))
    }

    #[test]
    fn valid_report_has_no_errors() {
        let report = ValidationReport::new(json!({}), type_ref(), vec![]);
        assert!(report.is_valid());
        assert_eq!(report.error_count(), 0);
        assert!(report.error_messages().is_empty());
    }

    #[test]
    fn error_messages_carry_pointers() {
        let diagnostics = vec![
            Diagnostic::error("missing required property 'id'", JsonPointer::root()),
            Diagnostic::error(
                "\"x\" is not of type \"integer\"",
                "/features/0/len".parse().unwrap(),
            ),
        ];
        let report = ValidationReport::new(json!({}), type_ref(), diagnostics);
        assert!(!report.is_valid());
        assert_eq!(report.error_count(), 2);
        assert_eq!(
            report.error_messages(),
            vec![
                "missing required property 'id'".to_string(),
                "\"x\" is not of type \"integer\", at /features/0/len".to_string(),
            ]
        );
    }

    #[test]
    fn read_accessors_are_idempotent() {
        let diagnostics = vec![Diagnostic::id_annotation(
            IdAnnotation {
                kind: "genome".into(),
                store: false,
                id: "g.1".into(),
            },
            "/id".parse().unwrap(),
        )];
        let report = ValidationReport::new(json!({"id": "g.1"}), type_ref(), diagnostics);
        assert_eq!(report.all_ids(), report.all_ids());
        assert_eq!(
            report.extract_searchable_subset().unwrap(),
            report.extract_searchable_subset().unwrap()
        );
    }

    #[test]
    fn invalid_report_yields_empty_subset() {
        let spec = SubsetSpec {
            fields: Some(SelectionNode::parse(&json!({"id": {}})).unwrap()),
            keys_of: None,
        };
        let diagnostics = vec![
            Diagnostic::error("boom", JsonPointer::root()),
            Diagnostic::subset_spec(spec),
        ];
        let report = ValidationReport::new(json!({"id": "g.1"}), type_ref(), diagnostics);
        assert_eq!(report.extract_searchable_subset().unwrap(), json!({}));
    }

    #[test]
    fn first_subset_spec_wins() {
        let first = SubsetSpec {
            fields: Some(SelectionNode::parse(&json!({"id": {}})).unwrap()),
            keys_of: None,
        };
        let second = SubsetSpec {
            fields: Some(SelectionNode::parse(&json!({"name": {}})).unwrap()),
            keys_of: None,
        };
        let diagnostics = vec![
            Diagnostic::subset_spec(first),
            Diagnostic::subset_spec(second),
        ];
        let report = ValidationReport::new(
            json!({"id": "g.1", "name": "E. coli"}),
            type_ref(),
            diagnostics,
        );
        assert_eq!(
            report.extract_searchable_subset().unwrap(),
            json!({"id": "g.1"})
        );
    }

    #[test]
    fn relabel_then_reread_reports_original_ids() {
        let diagnostics = vec![Diagnostic::id_annotation(
            IdAnnotation {
                kind: "store".into(),
                store: true,
                id: "42".into(),
            },
            "/ref".parse().unwrap(),
        )];
        let mut report =
            ValidationReport::new(json!({"ref": "42"}), type_ref(), diagnostics);

        let mapping = HashMap::from([("42".to_string(), "ws/7".to_string())]);
        let document = report.relabel_store_references(&mapping).unwrap();
        assert_eq!(document, &json!({"ref": "ws/7"}));
        assert_eq!(report.all_ids(), vec!["42"]);
        assert_eq!(report.document(), &json!({"ref": "ws/7"}));
    }

    #[test]
    fn display_summarizes_pass_and_fail() {
        let report = ValidationReport::new(json!({}), type_ref(), vec![]);
        let text = report.to_string();
        assert!(text.contains("KB.Genome-1.0.0"));
        assert!(text.contains("pass"));

        let failing = ValidationReport::new(
            json!({}),
            type_ref(),
            vec![Diagnostic::error("boom", "/x".parse().unwrap())],
        );
        let text = failing.to_string();
        assert!(text.contains("fail (1 error(s))"));
        assert!(text.contains("boom, at /x"));
    }
}
