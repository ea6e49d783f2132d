//! Compiled validation schemas and the schema engine
//!
//! A [`CompiledSchema`] wraps the compiled JSON Schema validator together
//! with the two side channels a type schema may declare:
//!
//! - `x-id-reference` on a string-typed schema node marks document values
//!   at that position as identifiers of a given kind (optionally
//!   store-addressable, making them subject to relabeling);
//! - `x-searchable-subset` at the top level carries the selection trees
//!   for searchable subset extraction.
//!
//! One call to [`CompiledSchema::evaluate`] produces the full diagnostic
//! stream: content errors from the validator, one identifier annotation
//! per recognized identifier, and at most one subset specification.
//! Content failures never surface as `Err`; only engine-level failures do.

use jsonschema::JSONSchema;
use serde_json::Value;

use crate::diagnostic::{Diagnostic, IdAnnotation};
use crate::error::{Result, TypedObjectError};
use crate::idref::store_id_regex;
use crate::pointer::JsonPointer;
use crate::subset::SubsetSpec;

/// Schema keyword marking identifier positions
pub const ID_REFERENCE_KEYWORD: &str = "x-id-reference";
/// Top-level schema keyword carrying the subset specification
pub const SEARCHABLE_SUBSET_KEYWORD: &str = "x-searchable-subset";

/// A compiled, ready-to-evaluate type schema
pub struct CompiledSchema {
    /// The raw schema document, kept for the annotation walk
    raw: Value,
    /// The compiled structural validator
    compiled: JSONSchema,
    /// Parsed subset specification, if the schema declares one
    subset_spec: Option<SubsetSpec>,
}

impl std::fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledSchema")
            .field("subset_spec", &self.subset_spec)
            .finish_non_exhaustive()
    }
}

impl CompiledSchema {
    /// Compile a schema document
    ///
    /// Structural compilation failures, malformed `x-id-reference`
    /// annotations, and malformed subset specifications are all
    /// [`BadSchemaDocument`](TypedObjectError::BadSchemaDocument): the
    /// schema itself is broken, which is not recoverable at validation
    /// time.
    pub fn compile(raw: Value) -> Result<Self> {
        let compiled = JSONSchema::compile(&raw)
            .map_err(|e| TypedObjectError::BadSchemaDocument(e.to_string()))?;

        check_id_annotations(&raw)?;

        let subset_spec = match raw.get(SEARCHABLE_SUBSET_KEYWORD) {
            Some(spec) => Some(SubsetSpec::parse(spec)?),
            None => None,
        };

        Ok(Self {
            raw,
            compiled,
            subset_spec,
        })
    }

    /// The raw schema document this was compiled from
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// The parsed subset specification, if any
    pub fn subset_spec(&self) -> Option<&SubsetSpec> {
        self.subset_spec.as_ref()
    }

    /// Run one validation pass over an instance, producing the diagnostic
    /// stream in emission order
    pub fn evaluate(&self, instance: &Value) -> Result<Vec<Diagnostic>> {
        let mut diagnostics = Vec::new();

        if let Err(errors) = self.compiled.validate(instance) {
            for error in errors {
                let pointer = error
                    .instance_path
                    .to_string()
                    .parse()
                    .unwrap_or_default();
                diagnostics.push(Diagnostic::error(error.to_string(), pointer));
            }
        }

        let mut pointer = JsonPointer::root();
        scan_ids(&self.raw, instance, &mut pointer, &mut diagnostics);

        if let Some(spec) = &self.subset_spec {
            diagnostics.push(Diagnostic::subset_spec(spec.clone()));
        }

        Ok(diagnostics)
    }
}

/// Parsed form of an `x-id-reference` annotation
struct IdKeyword {
    kind: String,
    store: bool,
}

fn parse_id_keyword(value: &Value) -> Result<IdKeyword> {
    let obj = value.as_object().ok_or_else(|| {
        TypedObjectError::BadSchemaDocument(format!(
            "{ID_REFERENCE_KEYWORD} must be an object"
        ))
    })?;
    let kind = obj
        .get("kind")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            TypedObjectError::BadSchemaDocument(format!(
                "{ID_REFERENCE_KEYWORD} requires a string 'kind'"
            ))
        })?
        .to_string();
    let store = match obj.get("store") {
        None => false,
        Some(Value::Bool(b)) => *b,
        Some(_) => {
            return Err(TypedObjectError::BadSchemaDocument(format!(
                "{ID_REFERENCE_KEYWORD} 'store' must be a boolean"
            )))
        }
    };
    for key in obj.keys() {
        if key != "kind" && key != "store" {
            return Err(TypedObjectError::BadSchemaDocument(format!(
                "unknown {ID_REFERENCE_KEYWORD} key '{key}'"
            )));
        }
    }
    Ok(IdKeyword { kind, store })
}

/// Reject malformed id annotations anywhere in the schema at compile time
fn check_id_annotations(schema: &Value) -> Result<()> {
    match schema {
        Value::Object(map) => {
            if let Some(annotation) = map.get(ID_REFERENCE_KEYWORD) {
                parse_id_keyword(annotation)?;
            }
            for value in map.values() {
                check_id_annotations(value)?;
            }
            Ok(())
        }
        Value::Array(items) => items.iter().try_for_each(check_id_annotations),
        _ => Ok(()),
    }
}

/// Walk schema and instance in lockstep, emitting identifier diagnostics
///
/// Descends through the structural keywords the type system maps onto:
/// `properties` (structures), `additionalProperties` with a schema
/// (mappings), `items` with a schema (lists) or an array of schemas
/// (tuples). Positions the instance does not populate are skipped.
fn scan_ids(
    schema: &Value,
    instance: &Value,
    pointer: &mut JsonPointer,
    out: &mut Vec<Diagnostic>,
) {
    let Some(schema_obj) = schema.as_object() else {
        return;
    };

    if let Some(annotation) = schema_obj.get(ID_REFERENCE_KEYWORD) {
        // Validated at compile time; a parse failure here is unreachable.
        if let (Ok(keyword), Value::String(id)) = (parse_id_keyword(annotation), instance)
        {
            if keyword.store && !store_id_regex().is_match(id) {
                out.push(Diagnostic::error(
                    format!("invalid store identifier '{id}'"),
                    pointer.clone(),
                ));
            } else {
                out.push(Diagnostic::id_annotation(
                    IdAnnotation {
                        kind: keyword.kind,
                        store: keyword.store,
                        id: id.clone(),
                    },
                    pointer.clone(),
                ));
            }
        }
    }

    let properties = schema_obj.get("properties").and_then(Value::as_object);

    if let (Some(properties), Value::Object(fields)) = (properties, instance) {
        for (name, subschema) in properties {
            if let Some(child) = fields.get(name) {
                pointer.push_key(name.as_str());
                scan_ids(subschema, child, pointer, out);
                pointer.pop();
            }
        }
    }

    if let (Some(value_schema), Value::Object(fields)) =
        (schema_obj.get("additionalProperties"), instance)
    {
        if value_schema.is_object() {
            for (key, child) in fields {
                if properties.is_some_and(|p| p.contains_key(key)) {
                    continue;
                }
                pointer.push_key(key.as_str());
                scan_ids(value_schema, child, pointer, out);
                pointer.pop();
            }
        }
    }

    if let (Some(items), Value::Array(elements)) = (schema_obj.get("items"), instance) {
        match items {
            Value::Object(_) => {
                for (index, child) in elements.iter().enumerate() {
                    pointer.push_index(index);
                    scan_ids(items, child, pointer, out);
                    pointer.pop();
                }
            }
            Value::Array(slots) => {
                for (index, (slot, child)) in slots.iter().zip(elements).enumerate() {
                    pointer.push_index(index);
                    scan_ids(slot, child, pointer, out);
                    pointer.pop();
                }
            }
            _ => {}
        }
    }
}
