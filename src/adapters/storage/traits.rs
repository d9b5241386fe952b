//! Object store abstraction
//!
//! The trait every object store backend implements. The pipeline consumes
//! it in two places: the extract step reads raw objects, and the
//! de-identify step writes cleaned artifacts. Any fault surfacing from a
//! backend is treated as transient by the workflow retry policy.

use crate::domain::result::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Metadata attached to a stored object
pub type ObjectMetadata = BTreeMap<String, String>;

/// Object store collaborator
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetches an object's bytes
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`](crate::domain::StorageError::NotFound)
    /// wrapped in the domain error when the key does not exist.
    async fn get(&self, key: &str) -> Result<Vec<u8>>;

    /// Stores an object, replacing any previous content
    async fn put(&self, key: &str, bytes: Vec<u8>, metadata: ObjectMetadata) -> Result<()>;

    /// Probes for an object's existence
    ///
    /// A missing object is `Ok(false)`, never an error.
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Lists keys under a prefix
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;
}
