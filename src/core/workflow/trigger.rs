//! Workflow trigger contract
//!
//! A new raw object whose key matches the configured suffix filter starts
//! exactly one workflow execution. Execution names derive deterministically
//! from the object key, so the at-least-once delivery of object events is
//! tolerated: a duplicate event resolves to the same execution name and the
//! tracker's idempotent start reuses the run.

use crate::core::workflow::context::InputEnvelope;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One object-created event from the storage collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectCreatedEvent {
    /// Bucket or store the object landed in
    pub bucket: String,
    /// Object key
    pub key: String,
}

/// Suffix-filtered workflow trigger
#[derive(Debug, Clone)]
pub struct WorkflowTrigger {
    suffix_filter: String,
}

impl WorkflowTrigger {
    /// Creates a trigger for a key suffix, e.g. `.dcm`
    pub fn new(suffix_filter: impl Into<String>) -> Self {
        Self {
            suffix_filter: suffix_filter.into(),
        }
    }

    /// Returns true when a key passes the suffix filter
    pub fn matches(&self, key: &str) -> bool {
        key.ends_with(&self.suffix_filter)
    }

    /// Builds the input envelope for an event, `None` when filtered out
    pub fn envelope_for(&self, event: &ObjectCreatedEvent) -> Option<InputEnvelope> {
        if !self.matches(&event.key) {
            tracing::debug!(key = %event.key, "Object ignored by suffix filter");
            return None;
        }
        Some(InputEnvelope::new(event.key.clone()))
    }

    /// Deterministic execution name for an object key
    ///
    /// The same key always maps to the same name, which is what makes
    /// duplicate trigger deliveries collapse onto one execution.
    pub fn execution_name(&self, key: &str) -> String {
        let digest = Sha256::digest(key.as_bytes());
        format!("exec-{}", hex::encode(&digest[..6]))
    }
}
