//! Checksum utilities for document integrity

use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt;

/// SHA256 checksum of a typed object's content
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Checksum(String);

impl Checksum {
    /// Compute checksum from raw bytes
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = Sha256::digest(data);
        Self(format!("{:x}", hash))
    }

    /// Compute checksum from a document's canonical serialization
    ///
    /// Key order is preserved by the serializer, so a relabeled document
    /// hashes differently while an untouched one hashes stably.
    pub fn from_json(value: &Value) -> Self {
        let canonical = serde_json::to_string(value).unwrap_or_default();
        Self::from_bytes(canonical.as_bytes())
    }

    /// Get the hex string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Verify that a document matches this checksum
    pub fn verify_json(&self, value: &Value) -> bool {
        let computed = Self::from_json(value);
        self.0 == computed.0
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Checksum {
    fn from(s: String) -> Self {
        Self(s)
    }
}
