//! Secure delivery
//!
//! Issues expiring, existence-validated access descriptors for cleaned
//! artifacts, singly or in batches. A missing object is a value
//! (`NotFound`), never an error: batch resolution is isolated per key and
//! one missing artifact must not abort the rest.

pub mod signer;

pub use signer::UrlSigner;

use crate::adapters::storage::ObjectStore;
use crate::domain::result::Result;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Default descriptor lifetime in seconds
pub const DEFAULT_TTL_SECONDS: u64 = 3600;

/// A time-limited access handle for one stored artifact
///
/// Immutable once issued; descriptor usage is not tracked here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    /// Key of the artifact the descriptor grants access to
    pub object_key: String,
    /// Expiry instant
    pub expires_at: DateTime<Utc>,
    /// Signed access URL
    pub url: String,
}

/// Outcome of resolving one key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    /// A descriptor was issued
    Issued(Descriptor),
    /// The object does not exist
    NotFound {
        /// The key that failed to resolve
        object_key: String,
    },
}

impl DeliveryOutcome {
    /// Returns the descriptor when one was issued
    pub fn descriptor(&self) -> Option<&Descriptor> {
        match self {
            Self::Issued(descriptor) => Some(descriptor),
            Self::NotFound { .. } => None,
        }
    }
}

/// Issues delivery descriptors against one object store
pub struct DeliveryService {
    store: Arc<dyn ObjectStore>,
    signer: UrlSigner,
    default_ttl_seconds: u64,
}

impl DeliveryService {
    /// Creates a delivery service
    pub fn new(store: Arc<dyn ObjectStore>, signer: UrlSigner, default_ttl_seconds: u64) -> Self {
        Self {
            store,
            signer,
            default_ttl_seconds,
        }
    }

    /// Issues a descriptor for one object key
    ///
    /// `ttl_seconds` falls back to the configured default (3600s when
    /// unconfigured); no upper bound is enforced here, that belongs to the
    /// storage collaborator. With `validate_exists` the object is probed
    /// first and a missing object yields [`DeliveryOutcome::NotFound`].
    ///
    /// # Errors
    ///
    /// Returns an error only for signing or probe faults, never for a
    /// missing object.
    pub async fn issue(
        &self,
        object_key: &str,
        ttl_seconds: Option<u64>,
        validate_exists: bool,
    ) -> Result<DeliveryOutcome> {
        if validate_exists && !self.store.exists(object_key).await? {
            tracing::warn!(object_key, "Delivery requested for missing object");
            return Ok(DeliveryOutcome::NotFound {
                object_key: object_key.to_string(),
            });
        }

        let ttl = ttl_seconds.unwrap_or(self.default_ttl_seconds);
        let expires_at = Utc::now() + ChronoDuration::seconds(ttl as i64);
        let url = self.signer.sign(object_key, expires_at.timestamp())?;

        tracing::info!(object_key, ttl_seconds = ttl, "Issued delivery descriptor");
        Ok(DeliveryOutcome::Issued(Descriptor {
            object_key: object_key.to_string(),
            expires_at,
            url,
        }))
    }

    /// Issues descriptors for a batch of keys
    ///
    /// Every key resolves independently with existence validation; a
    /// missing key maps to `NotFound` without disturbing the others. A
    /// storage fault while probing one key is logged and reported as
    /// `NotFound` for that key so per-key isolation holds.
    pub async fn issue_batch(
        &self,
        keys: &[String],
        ttl_seconds: Option<u64>,
    ) -> BTreeMap<String, DeliveryOutcome> {
        let resolutions = join_all(keys.iter().map(|key| async move {
            let outcome = match self.issue(key, ttl_seconds, true).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    tracing::warn!(object_key = %key, error = %err, "Batch resolution failed for key");
                    DeliveryOutcome::NotFound {
                        object_key: key.clone(),
                    }
                }
            };
            (key.clone(), outcome)
        }))
        .await;

        resolutions.into_iter().collect()
    }
}
