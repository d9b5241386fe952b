//! Metrics and structured operation logging
//!
//! The sink that receives named counters with dimensions and structured
//! operation records. The default implementation forwards everything to the
//! `tracing` subscriber, which is where centralized collection hooks in; a
//! recording implementation backs test assertions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// One structured operation log record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationRecord {
    /// When the operation was recorded
    pub timestamp: DateTime<Utc>,
    /// Operation name, e.g. a workflow state name
    pub operation: String,
    /// `started`, `completed`, or `failed`
    pub status: String,
    /// Free-form dimensions
    pub details: BTreeMap<String, String>,
}

impl OperationRecord {
    /// Builds a record stamped with the current time
    pub fn new(operation: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            operation: operation.into(),
            status: status.into(),
            details: BTreeMap::new(),
        }
    }

    /// Attaches one detail dimension
    pub fn with_detail(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(name.into(), value.into());
        self
    }
}

/// Metrics and log sink collaborator
pub trait MetricsSink: Send + Sync {
    /// Increments a named counter with dimensions
    fn incr(&self, name: &str, dimensions: &[(&str, &str)]);

    /// Emits one structured operation record
    fn record(&self, record: OperationRecord);
}

/// Sink that forwards to the `tracing` subscriber
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMetrics;

impl TracingMetrics {
    /// Creates the sink
    pub fn new() -> Self {
        Self
    }
}

impl MetricsSink for TracingMetrics {
    fn incr(&self, name: &str, dimensions: &[(&str, &str)]) {
        let dimensions = dimensions
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(",");
        tracing::info!(counter = name, %dimensions, value = 1u64, "metric");
    }

    fn record(&self, record: OperationRecord) {
        tracing::info!(
            operation = %record.operation,
            status = %record.status,
            details = %serde_json::to_string(&record.details).unwrap_or_default(),
            "operation"
        );
    }
}

/// Sink that captures everything for assertions
#[derive(Debug, Default)]
pub struct RecordingMetrics {
    counters: Mutex<Vec<(String, Vec<(String, String)>)>>,
    records: Mutex<Vec<OperationRecord>>,
}

impl RecordingMetrics {
    /// Creates an empty recording sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Counters captured so far
    pub fn counters(&self) -> Vec<(String, Vec<(String, String)>)> {
        self.counters.lock().expect("metrics lock").clone()
    }

    /// Operation records captured so far
    pub fn records(&self) -> Vec<OperationRecord> {
        self.records.lock().expect("metrics lock").clone()
    }

    /// Number of counters captured for a name
    pub fn count_of(&self, name: &str) -> usize {
        self.counters
            .lock()
            .expect("metrics lock")
            .iter()
            .filter(|(n, _)| n == name)
            .count()
    }
}

impl MetricsSink for RecordingMetrics {
    fn incr(&self, name: &str, dimensions: &[(&str, &str)]) {
        self.counters.lock().expect("metrics lock").push((
            name.to_string(),
            dimensions
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        ));
    }

    fn record(&self, record: OperationRecord) {
        self.records.lock().expect("metrics lock").push(record);
    }
}
