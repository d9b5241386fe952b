//! Object store adapters
//!
//! One trait, three backends: in-memory for tests and dry runs, local
//! filesystem for single-host runs, and an HTTP gateway for remote stores.

pub mod filesystem;
pub mod http;
pub mod memory;
pub mod traits;

pub use filesystem::FilesystemStore;
pub use http::HttpStore;
pub use memory::InMemoryStore;
pub use traits::{ObjectMetadata, ObjectStore};

use crate::config::{StorageBackend, StorageConfig};
use crate::domain::errors::ApertureError;
use crate::domain::result::Result;
use std::sync::Arc;

/// Builds the configured object store backend
pub fn create_store(config: &StorageConfig) -> Result<Arc<dyn ObjectStore>> {
    match config.backend {
        StorageBackend::Memory => Ok(Arc::new(InMemoryStore::new())),
        StorageBackend::Filesystem => {
            let root = config.root.as_deref().ok_or_else(|| {
                ApertureError::Configuration("storage.root is required".to_string())
            })?;
            Ok(Arc::new(FilesystemStore::new(root)))
        }
        StorageBackend::Http => {
            let base_url = config.base_url.as_deref().ok_or_else(|| {
                ApertureError::Configuration("storage.base_url is required".to_string())
            })?;
            Ok(Arc::new(HttpStore::new(
                base_url,
                config.bearer_token.clone(),
            )))
        }
    }
}
