//! In-memory object store
//!
//! Backs tests and dry runs. Concurrent-safe through an async RwLock; each
//! stored object keeps its bytes and metadata.

use crate::adapters::storage::traits::{ObjectMetadata, ObjectStore};
use crate::domain::errors::StorageError;
use crate::domain::result::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct StoredObject {
    bytes: Vec<u8>,
    metadata: ObjectMetadata,
}

/// Memory-backed [`ObjectStore`]
#[derive(Debug, Default)]
pub struct InMemoryStore {
    objects: RwLock<HashMap<String, StoredObject>>,
}

impl InMemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the metadata stored with an object, for assertions in tests
    pub async fn metadata(&self, key: &str) -> Option<ObjectMetadata> {
        self.objects
            .read()
            .await
            .get(key)
            .map(|object| object.metadata.clone())
    }
}

#[async_trait]
impl ObjectStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let objects = self.objects.read().await;
        objects
            .get(key)
            .map(|object| object.bytes.clone())
            .ok_or_else(|| {
                StorageError::NotFound {
                    key: key.to_string(),
                }
                .into()
            })
    }

    async fn put(&self, key: &str, bytes: Vec<u8>, metadata: ObjectMetadata) -> Result<()> {
        let mut objects = self.objects.write().await;
        objects.insert(key.to_string(), StoredObject { bytes, metadata });
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.objects.read().await.contains_key(key))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let objects = self.objects.read().await;
        let mut keys: Vec<String> = objects
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_then_get() {
        let store = InMemoryStore::new();
        store
            .put("incoming/a.dcm", vec![1, 2, 3], ObjectMetadata::new())
            .await
            .unwrap();
        assert_eq!(store.get("incoming/a.dcm").await.unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let store = InMemoryStore::new();
        let err = store.get("nope").await.unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn test_exists_is_a_value() {
        let store = InMemoryStore::new();
        assert!(!store.exists("nope").await.unwrap());
        store
            .put("yes", Vec::new(), ObjectMetadata::new())
            .await
            .unwrap();
        assert!(store.exists("yes").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_filters_by_prefix() {
        let store = InMemoryStore::new();
        for key in ["incoming/a.dcm", "incoming/b.dcm", "deidentified/a.dcm"] {
            store
                .put(key, Vec::new(), ObjectMetadata::new())
                .await
                .unwrap();
        }
        let keys = store.list("incoming/").await.unwrap();
        assert_eq!(keys, vec!["incoming/a.dcm", "incoming/b.dcm"]);
    }

    #[tokio::test]
    async fn test_metadata_survives_put() {
        let store = InMemoryStore::new();
        let mut metadata = ObjectMetadata::new();
        metadata.insert("pseudonym".to_string(), "a1b2".to_string());
        store.put("k", vec![0], metadata).await.unwrap();
        assert_eq!(
            store.metadata("k").await.unwrap().get("pseudonym").unwrap(),
            "a1b2"
        );
    }
}
