//! JSON Pointer (RFC 6901) paths into a document tree
//!
//! Identifier locations and diagnostic positions are recorded as structural
//! paths rather than live references into the tree, so in-place mutation is
//! a pure `(tree, pointer, new value)` operation with a single mutable
//! borrow of the root.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// An ordered sequence of reference tokens addressing a node in a document
///
/// Tokens are stored unescaped. Each token is interpreted against the
/// concrete container during resolution: an object consumes it as a key, an
/// array as a decimal index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct JsonPointer(Vec<String>);

impl JsonPointer {
    /// The root pointer, addressing the whole document
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of reference tokens
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Append an object key token
    pub fn push_key(&mut self, key: impl Into<String>) {
        self.0.push(key.into());
    }

    /// Append an array index token
    pub fn push_index(&mut self, index: usize) {
        self.0.push(index.to_string());
    }

    /// Remove the last token
    pub fn pop(&mut self) {
        self.0.pop();
    }

    /// Resolve against a document, yielding the addressed node
    pub fn resolve<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        let mut node = root;
        for token in &self.0 {
            node = match node {
                Value::Object(map) => map.get(token)?,
                Value::Array(items) => items.get(token.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(node)
    }

    /// Resolve against a document, yielding a mutable handle to the node
    pub fn resolve_mut<'a>(&self, root: &'a mut Value) -> Option<&'a mut Value> {
        let mut node = root;
        for token in &self.0 {
            node = match node {
                Value::Object(map) => map.get_mut(token)?,
                Value::Array(items) => items.get_mut(token.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(node)
    }
}

impl fmt::Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.0 {
            let escaped = token.replace('~', "~0").replace('/', "~1");
            write!(f, "/{escaped}")?;
        }
        Ok(())
    }
}

impl FromStr for JsonPointer {
    type Err = InvalidPointer;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::root());
        }
        if !s.starts_with('/') {
            return Err(InvalidPointer(s.to_string()));
        }
        let tokens = s[1..]
            .split('/')
            .map(|t| t.replace("~1", "/").replace("~0", "~"))
            .collect();
        Ok(Self(tokens))
    }
}

/// A pointer string that does not start with `/`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidPointer(pub String);

impl fmt::Display for InvalidPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid JSON pointer '{}'", self.0)
    }
}

impl std::error::Error for InvalidPointer {}

impl Serialize for JsonPointer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for JsonPointer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn display_and_parse_round_trip() {
        let mut p = JsonPointer::root();
        p.push_key("features");
        p.push_index(0);
        p.push_key("id");
        assert_eq!(p.to_string(), "/features/0/id");
        assert_eq!("/features/0/id".parse::<JsonPointer>().unwrap(), p);
    }

    #[test]
    fn escaping_round_trip() {
        let mut p = JsonPointer::root();
        p.push_key("a/b");
        p.push_key("m~n");
        assert_eq!(p.to_string(), "/a~1b/m~0n");
        assert_eq!(p.to_string().parse::<JsonPointer>().unwrap(), p);
    }

    #[test]
    fn root_renders_empty() {
        assert_eq!(JsonPointer::root().to_string(), "");
        assert!("".parse::<JsonPointer>().unwrap().is_root());
    }

    #[test]
    fn resolve_object_and_array() {
        let doc = json!({"a": [{"b": 1}, {"b": 2}]});
        let p: JsonPointer = "/a/1/b".parse().unwrap();
        assert_eq!(p.resolve(&doc), Some(&json!(2)));

        let missing: JsonPointer = "/a/5/b".parse().unwrap();
        assert_eq!(missing.resolve(&doc), None);
    }

    #[test]
    fn resolve_mut_writes_through() {
        let mut doc = json!({"ref": "42"});
        let p: JsonPointer = "/ref".parse().unwrap();
        *p.resolve_mut(&mut doc).unwrap() = json!("ws/7");
        assert_eq!(doc, json!({"ref": "ws/7"}));
    }

    #[test]
    fn non_pointer_string_rejected() {
        assert!("ref".parse::<JsonPointer>().is_err());
    }
}
