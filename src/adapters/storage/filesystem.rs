//! Local filesystem object store
//!
//! Maps object keys onto paths under a configured root directory. Metadata
//! rides in a JSON sidecar next to the object so a filesystem store behaves
//! like the remote ones.

use crate::adapters::storage::traits::{ObjectMetadata, ObjectStore};
use crate::domain::errors::{ApertureError, StorageError};
use crate::domain::result::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

const SIDECAR_SUFFIX: &str = ".meta.json";

/// Filesystem-backed [`ObjectStore`] rooted at one directory
#[derive(Debug, Clone)]
pub struct FilesystemStore {
    root: PathBuf,
}

impl FilesystemStore {
    /// Creates a store rooted at `root`; the directory is created lazily on
    /// the first write
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        // Reject traversal outside the root
        if key.split('/').any(|segment| segment == "..") || key.starts_with('/') {
            return Err(StorageError::Unavailable(format!("invalid object key: {key}")).into());
        }
        Ok(self.root.join(key))
    }

    fn io_error(err: std::io::Error) -> ApertureError {
        StorageError::Io(err.to_string()).into()
    }
}

#[async_trait]
impl ObjectStore for FilesystemStore {
    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound {
                    key: key.to_string(),
                }
                .into())
            }
            Err(err) => Err(Self::io_error(err)),
        }
    }

    async fn put(&self, key: &str, bytes: Vec<u8>, metadata: ObjectMetadata) -> Result<()> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(Self::io_error)?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .map_err(Self::io_error)?;

        if !metadata.is_empty() {
            let sidecar = sidecar_path(&path);
            let json = serde_json::to_vec_pretty(&metadata)
                .map_err(|e| ApertureError::Serialization(e.to_string()))?;
            tokio::fs::write(&sidecar, json)
                .await
                .map_err(Self::io_error)?;
        }
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let path = self.path_for(key)?;
        tokio::fs::try_exists(&path).await.map_err(Self::io_error)
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        if !tokio::fs::try_exists(&self.root)
            .await
            .map_err(Self::io_error)?
        {
            return Ok(keys);
        }

        let mut pending = vec![self.root.clone()];
        while let Some(dir) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir).await.map_err(Self::io_error)?;
            while let Some(entry) = entries.next_entry().await.map_err(Self::io_error)? {
                let path = entry.path();
                if path.is_dir() {
                    pending.push(path);
                    continue;
                }
                let Some(key) = relative_key(&self.root, &path) else {
                    continue;
                };
                if key.ends_with(SIDECAR_SUFFIX) {
                    continue;
                }
                if key.starts_with(prefix) {
                    keys.push(key);
                }
            }
        }

        keys.sort();
        Ok(keys)
    }
}

fn sidecar_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    name.push_str(SIDECAR_SUFFIX);
    path.with_file_name(name)
}

fn relative_key(root: &Path, path: &Path) -> Option<String> {
    path.strip_prefix(root)
        .ok()
        .map(|rel| rel.to_string_lossy().replace(std::path::MAIN_SEPARATOR, "/"))
}
