//! Type references
//!
//! A [`TypeReference`] names a versioned type as `Module.Type` or
//! `Module.Type-1.2.3`. An [`AbsoluteTypeReference`] always carries a
//! resolved version and is the canonical key for "which schema validated
//! this document".

use semver::Version;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TypedObjectError;

/// A reference to a versioned type, version optional
///
/// A missing version means "resolve to the most recent registered version".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeReference {
    /// Module the type belongs to (e.g., "KB")
    pub module: String,
    /// Type name within the module (e.g., "Genome")
    pub name: String,
    /// Requested version, if pinned
    pub version: Option<Version>,
}

impl TypeReference {
    /// Create an unversioned reference
    pub fn new(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
            version: None,
        }
    }

    /// Create a version-pinned reference
    pub fn with_version(
        module: impl Into<String>,
        name: impl Into<String>,
        version: Version,
    ) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
            version: Some(version),
        }
    }

    /// Get the unversioned type string (e.g., "KB.Genome")
    pub fn type_string(&self) -> String {
        format!("{}.{}", self.module, self.name)
    }

    /// Resolve this reference into an absolute one at the given version
    pub fn absolute(&self, version: Version) -> AbsoluteTypeReference {
        AbsoluteTypeReference {
            module: self.module.clone(),
            name: self.name.clone(),
            version,
        }
    }
}

impl fmt::Display for TypeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(v) => write!(f, "{}.{}-{}", self.module, self.name, v),
            None => write!(f, "{}.{}", self.module, self.name),
        }
    }
}

impl FromStr for TypeReference {
    type Err = TypedObjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TypedObjectError::InvalidTypeReference(s.to_string());

        let (typepart, version) = match s.split_once('-') {
            Some((t, v)) => {
                let version = Version::parse(v).map_err(|_| invalid())?;
                (t, Some(version))
            }
            None => (s, None),
        };

        let (module, name) = typepart.split_once('.').ok_or_else(invalid)?;
        if module.is_empty() || name.is_empty() || name.contains('.') {
            return Err(invalid());
        }

        Ok(Self {
            module: module.to_string(),
            name: name.to_string(),
            version,
        })
    }
}

/// A fully resolved type reference with a concrete version
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AbsoluteTypeReference {
    pub module: String,
    pub name: String,
    pub version: Version,
}

impl AbsoluteTypeReference {
    pub fn new(
        module: impl Into<String>,
        name: impl Into<String>,
        version: Version,
    ) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
            version,
        }
    }

    /// Get the unversioned type string (e.g., "KB.Genome")
    pub fn type_string(&self) -> String {
        format!("{}.{}", self.module, self.name)
    }

    /// Loosen back into a plain (still version-pinned) reference
    pub fn to_reference(&self) -> TypeReference {
        TypeReference {
            module: self.module.clone(),
            name: self.name.clone(),
            version: Some(self.version.clone()),
        }
    }
}

impl fmt::Display for AbsoluteTypeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}-{}", self.module, self.name, self.version)
    }
}
