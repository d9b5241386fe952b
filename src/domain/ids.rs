//! Domain identifier types with validation
//!
//! Newtype wrappers around the identifiers that cross component boundaries.
//! Each wrapper rejects empty values at construction so the rest of the crate
//! never has to re-check.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Object store key newtype wrapper
///
/// Names one stored artifact, e.g. `incoming/ct-0042.dcm` or
/// `deidentified/ct-0042.dcm`.
///
/// # Examples
///
/// ```
/// use aperture::domain::ids::ObjectKey;
/// use std::str::FromStr;
///
/// let key = ObjectKey::from_str("incoming/ct-0042.dcm").unwrap();
/// assert_eq!(key.as_str(), "incoming/ct-0042.dcm");
/// assert_eq!(key.file_name(), "ct-0042.dcm");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectKey(String);

impl ObjectKey {
    /// Creates a new object key from a string
    pub fn new(key: impl Into<String>) -> Result<Self, String> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err("object key cannot be empty".to_string());
        }
        Ok(Self(key))
    }

    /// Returns the key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the final path segment of the key
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ObjectKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for ObjectKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Workflow execution identifier newtype wrapper
///
/// Assigned by the execution tracking collaborator when a workflow run
/// starts. Opaque to the rest of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExecutionId(String);

impl ExecutionId {
    /// Creates a new execution id from a string
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("execution id cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ExecutionId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
