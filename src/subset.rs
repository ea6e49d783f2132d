//! Searchable subset selection and extraction
//!
//! A schema may mark a reduced projection of a document for indexing. The
//! projection is described by two selection trees ("fields" copies the
//! selected substructure, "keys-of" replaces mappings with the list of
//! their keys). The extractor recursively copies only the selected data
//! into a freshly built tree; it never aliases the source containers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, TypedObjectError};

/// Wildcard selecting every entry of a mapping
pub const MAPPING_WILDCARD: &str = "*";
/// Wildcard selecting every index of a list
pub const ARRAY_WILDCARD: &str = "[*]";

/// One node of a selection tree
///
/// Decided once, when the schema's subset specification is parsed, so the
/// extractor never compares field names against wildcard markers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionNode {
    /// Stop descending: take the whole value (or its keys, in keys mode)
    Leaf,
    /// Descend into every entry of a mapping
    MappingWildcard(Box<SelectionNode>),
    /// Descend into every index of a list
    ArrayWildcard(Box<SelectionNode>),
    /// Descend into the named fields of a structure, in selection order
    Fields(Vec<(String, SelectionNode)>),
}

impl SelectionNode {
    /// Parse a selection tree from its schema JSON form
    ///
    /// An empty object is a leaf. A wildcard must be the only key of its
    /// node; mixing it with field names is a schema authoring error.
    pub fn parse(value: &Value) -> Result<Self> {
        let obj = value.as_object().ok_or_else(|| {
            TypedObjectError::BadSchemaDocument(format!(
                "selection node must be an object, found {}",
                kind_name(value)
            ))
        })?;

        if obj.is_empty() {
            return Ok(SelectionNode::Leaf);
        }

        let has_wildcard =
            obj.contains_key(MAPPING_WILDCARD) || obj.contains_key(ARRAY_WILDCARD);
        if has_wildcard {
            if obj.len() != 1 {
                return Err(TypedObjectError::BadSchemaDocument(
                    "a selection wildcard must be the only key of its node".to_string(),
                ));
            }
            let (key, nested) = obj.iter().next().expect("len checked");
            let nested = Box::new(Self::parse(nested)?);
            return Ok(if key == MAPPING_WILDCARD {
                SelectionNode::MappingWildcard(nested)
            } else {
                SelectionNode::ArrayWildcard(nested)
            });
        }

        let mut fields = Vec::with_capacity(obj.len());
        for (name, nested) in obj {
            fields.push((name.clone(), Self::parse(nested)?));
        }
        Ok(SelectionNode::Fields(fields))
    }

    fn is_leaf(&self) -> bool {
        matches!(self, SelectionNode::Leaf)
    }
}

/// The two selection trees a schema may emit for subset extraction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubsetSpec {
    /// Ordinary field selection: copy the selected substructure
    pub fields: Option<SelectionNode>,
    /// Keys-of selection: replace selected mappings with their key lists
    pub keys_of: Option<SelectionNode>,
}

impl SubsetSpec {
    /// Parse from the schema keyword value `{"fields": ..., "keys-of": ...}`
    pub fn parse(value: &Value) -> Result<Self> {
        let obj = value.as_object().ok_or_else(|| {
            TypedObjectError::BadSchemaDocument(
                "subset specification must be an object".to_string(),
            )
        })?;
        let mut spec = SubsetSpec::default();
        for (key, tree) in obj {
            match key.as_str() {
                "fields" => spec.fields = Some(SelectionNode::parse(tree)?),
                "keys-of" => spec.keys_of = Some(SelectionNode::parse(tree)?),
                other => {
                    return Err(TypedObjectError::BadSchemaDocument(format!(
                        "unknown subset specification key '{other}'"
                    )))
                }
            }
        }
        Ok(spec)
    }

    /// Extract the subset of `source` selected by this specification
    ///
    /// Both trees are merged into one output object: the fields tree is
    /// applied in plain mode, then the keys-of tree in keys mode.
    pub fn extract(&self, source: &Value) -> Result<Value> {
        let mut subset = Value::Object(Map::new());
        if let Some(fields) = &self.fields {
            extract_subset(&mut subset, source, fields, false)?;
        }
        if let Some(keys_of) = &self.keys_of {
            extract_subset(&mut subset, source, keys_of, true)?;
        }
        Ok(subset)
    }
}

/// Recursively copy the substructure of `source` selected by `node` into
/// `dest`
///
/// In keys mode the leaf rule replaces a mapping with the array of its
/// keys instead of copying its contents. `dest` must already be a container
/// of the kind matching `node` (object for field/mapping selection, array
/// for list selection); nested destination containers are created on first
/// use, matching the source value's kind.
pub fn extract_subset(
    dest: &mut Value,
    source: &Value,
    node: &SelectionNode,
    keys_mode: bool,
) -> Result<()> {
    match node {
        // An empty selection selects nothing.
        SelectionNode::Leaf => Ok(()),

        SelectionNode::MappingWildcard(nested) => {
            let entries = source.as_object().ok_or_else(|| {
                TypedObjectError::UnsupportedSelection(format!(
                    "mapping wildcard applied to {}",
                    kind_name(source)
                ))
            })?;
            let dest = as_object_dest(dest)?;
            for (key, value) in entries {
                if nested.is_leaf() {
                    dest.insert(key.clone(), leaf_value(value, keys_mode)?);
                } else if let Some(slot) = slot_for(dest, key, value) {
                    extract_subset(slot, value, nested, keys_mode)?;
                }
            }
            Ok(())
        }

        SelectionNode::ArrayWildcard(nested) => {
            let items = source.as_array().ok_or_else(|| {
                TypedObjectError::UnsupportedSelection(format!(
                    "list wildcard applied to {}",
                    kind_name(source)
                ))
            })?;
            let dest = as_array_dest(dest)?;
            for (index, value) in items.iter().enumerate() {
                if nested.is_leaf() {
                    if index < dest.len() {
                        dest[index] = leaf_value(value, keys_mode)?;
                    } else {
                        dest.push(leaf_value(value, keys_mode)?);
                    }
                } else if let Some(slot) = indexed_slot_for(dest, index, value) {
                    extract_subset(slot, value, nested, keys_mode)?;
                }
            }
            Ok(())
        }

        SelectionNode::Fields(fields) => {
            // Addressing named slots of a tuple (a fixed-arity array) is
            // not supported; report it instead of silently mis-extracting.
            if source.is_array() {
                return Err(TypedObjectError::UnsupportedSelection(
                    "cannot select named fields from a list or tuple".to_string(),
                ));
            }
            let Some(entries) = source.as_object() else {
                // Scalar source: every selected field is absent.
                return Ok(());
            };
            let dest = as_object_dest(dest)?;
            for (name, nested) in fields {
                // Absent optional fields are skipped without error.
                let Some(value) = entries.get(name) else {
                    continue;
                };
                if nested.is_leaf() {
                    dest.insert(name.clone(), leaf_value(value, keys_mode)?);
                } else if let Some(slot) = slot_for(dest, name, value) {
                    extract_subset(slot, value, nested, keys_mode)?;
                }
            }
            Ok(())
        }
    }
}

/// Apply the leaf rule: full copy, or the key list of a mapping
fn leaf_value(value: &Value, keys_mode: bool) -> Result<Value> {
    if !keys_mode {
        return Ok(value.clone());
    }
    let entries = value.as_object().ok_or_else(|| {
        TypedObjectError::UnsupportedSelection(format!(
            "keys-of selection applied to {}",
            kind_name(value)
        ))
    })?;
    Ok(Value::Array(
        entries.keys().map(|k| Value::String(k.clone())).collect(),
    ))
}

/// Fetch or create the destination container under `key`, kind matching the
/// source value; scalar sources below a non-leaf selection yield no slot
fn slot_for<'a>(
    dest: &'a mut Map<String, Value>,
    key: &str,
    source: &Value,
) -> Option<&'a mut Value> {
    if !dest.contains_key(key) {
        let fresh = fresh_container(source)?;
        dest.insert(key.to_string(), fresh);
    }
    dest.get_mut(key)
}

/// Array analogue of [`slot_for`]: fetch or append the container at `index`
fn indexed_slot_for<'a>(
    dest: &'a mut Vec<Value>,
    index: usize,
    source: &Value,
) -> Option<&'a mut Value> {
    if index >= dest.len() {
        dest.push(fresh_container(source)?);
    }
    dest.get_mut(index)
}

fn fresh_container(source: &Value) -> Option<Value> {
    match source {
        Value::Object(_) => Some(Value::Object(Map::new())),
        Value::Array(_) => Some(Value::Array(Vec::new())),
        _ => None,
    }
}

fn as_object_dest(dest: &mut Value) -> Result<&mut Map<String, Value>> {
    dest.as_object_mut().ok_or_else(|| {
        TypedObjectError::ValidationExecution(
            "subset destination is not an object".to_string(),
        )
    })
}

fn as_array_dest(dest: &mut Value) -> Result<&mut Vec<Value>> {
    dest.as_array_mut().ok_or_else(|| {
        TypedObjectError::ValidationExecution(
            "subset destination is not a list".to_string(),
        )
    })
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(v: Value) -> SelectionNode {
        SelectionNode::parse(&v).unwrap()
    }

    #[test]
    fn parse_leaf_and_fields() {
        assert_eq!(parse(json!({})), SelectionNode::Leaf);
        match parse(json!({"a": {}, "b": {"c": {}}})) {
            SelectionNode::Fields(fields) => {
                assert_eq!(fields[0].0, "a");
                assert_eq!(fields[1].0, "b");
            }
            other => panic!("expected Fields, got {other:?}"),
        }
    }

    #[test]
    fn parse_wildcards() {
        assert!(matches!(
            parse(json!({"*": {}})),
            SelectionNode::MappingWildcard(_)
        ));
        assert!(matches!(
            parse(json!({"[*]": {"n": {}}})),
            SelectionNode::ArrayWildcard(_)
        ));
    }

    #[test]
    fn parse_rejects_mixed_wildcard() {
        assert!(SelectionNode::parse(&json!({"*": {}, "a": {}})).is_err());
        assert!(SelectionNode::parse(&json!("leaf")).is_err());
    }

    #[test]
    fn field_selection_copies_selected_fields() {
        let source = json!({"id": "g.1", "name": "E. coli", "sequence": "acgt"});
        let spec = SubsetSpec {
            fields: Some(parse(json!({"id": {}, "name": {}}))),
            keys_of: None,
        };
        assert_eq!(
            spec.extract(&source).unwrap(),
            json!({"id": "g.1", "name": "E. coli"})
        );
    }

    #[test]
    fn absent_optional_field_is_skipped() {
        let source = json!({"id": "g.1"});
        let spec = SubsetSpec {
            fields: Some(parse(json!({"id": {}, "name": {}}))),
            keys_of: None,
        };
        assert_eq!(spec.extract(&source).unwrap(), json!({"id": "g.1"}));
    }

    #[test]
    fn mapping_wildcard_leaf_copies_values() {
        let source = json!({"a": {"x": 1, "y": 2}, "b": {"x": 3}});
        let mut dest = json!({});
        extract_subset(&mut dest, &source, &parse(json!({"*": {}})), false).unwrap();
        assert_eq!(dest, source);
    }

    #[test]
    fn mapping_wildcard_keys_mode_lists_nested_keys() {
        // For each source key, the array of the nested mapping's own keys.
        let source = json!({"a": {"x": 1, "y": 2}, "b": {"x": 3}});
        let mut dest = json!({});
        extract_subset(&mut dest, &source, &parse(json!({"*": {}})), true).unwrap();
        assert_eq!(dest, json!({"a": ["x", "y"], "b": ["x"]}));
    }

    #[test]
    fn array_wildcard_selects_per_index() {
        let source = json!([{"n": 1, "m": 9}, {"n": 2}, {"m": 8}]);
        let mut dest = json!([]);
        extract_subset(&mut dest, &source, &parse(json!({"[*]": {"n": {}}})), false)
            .unwrap();
        // An absent field at one index is omitted there, not an error.
        assert_eq!(dest, json!([{"n": 1}, {"n": 2}, {}]));
    }

    #[test]
    fn keys_of_field_selection() {
        let source = json!({"features": {"f1": 1, "f2": 2}, "id": "g.1"});
        let spec = SubsetSpec {
            fields: Some(parse(json!({"id": {}}))),
            keys_of: Some(parse(json!({"features": {}}))),
        };
        assert_eq!(
            spec.extract(&source).unwrap(),
            json!({"id": "g.1", "features": ["f1", "f2"]})
        );
    }

    #[test]
    fn keys_of_non_mapping_is_reported() {
        let source = json!({"features": [1, 2]});
        let spec = SubsetSpec {
            fields: None,
            keys_of: Some(parse(json!({"features": {}}))),
        };
        assert!(matches!(
            spec.extract(&source),
            Err(TypedObjectError::UnsupportedSelection(_))
        ));
    }

    #[test]
    fn tuple_descent_is_reported() {
        let source = json!({"pair": ["g.1", 42]});
        let spec = SubsetSpec {
            fields: Some(parse(json!({"pair": {"first": {}}}))),
            keys_of: None,
        };
        assert!(matches!(
            spec.extract(&source),
            Err(TypedObjectError::UnsupportedSelection(_))
        ));
    }

    #[test]
    fn subset_does_not_alias_source_containers() {
        let source = json!({"data": {"x": 1}});
        let spec = SubsetSpec {
            fields: Some(parse(json!({"data": {"x": {}}}))),
            keys_of: None,
        };
        let mut subset = spec.extract(&source).unwrap();
        subset["data"]["x"] = json!(2);
        assert_eq!(source["data"]["x"], json!(1));
    }

    #[test]
    fn whole_document_selection_is_deep_equal() {
        let source = json!({"id": "g.1", "features": {"f1": {"len": 10}}});
        let spec = SubsetSpec {
            fields: Some(parse(json!({"id": {}, "features": {}}))),
            keys_of: None,
        };
        assert_eq!(spec.extract(&source).unwrap(), source);
    }

    #[test]
    fn destination_order_follows_selection_then_source() {
        let source = json!({"b": 1, "a": 2, "c": 3});
        let spec = SubsetSpec {
            fields: Some(parse(json!({"c": {}, "a": {}}))),
            keys_of: None,
        };
        let subset = spec.extract(&source).unwrap();
        let keys: Vec<_> = subset.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["c", "a"]);
    }

    #[test]
    fn nested_mapping_wildcard_recursion() {
        let source = json!({
            "genomes": {
                "g1": {"id": "g.1", "seq": "acgt"},
                "g2": {"id": "g.2", "seq": "ttaa"}
            }
        });
        let spec = SubsetSpec {
            fields: Some(parse(json!({"genomes": {"*": {"id": {}}}}))),
            keys_of: None,
        };
        assert_eq!(
            spec.extract(&source).unwrap(),
            json!({"genomes": {"g1": {"id": "g.1"}, "g2": {"id": "g.2"}}})
        );
    }
}
