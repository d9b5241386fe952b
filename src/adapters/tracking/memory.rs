//! In-memory execution tracker
//!
//! Keeps execution records in process memory. Used for local runs and
//! tests; a durable deployment swaps in a tracker backed by an external
//! workflow service behind the same trait.

use crate::adapters::tracking::traits::{
    ExecutionRecord, ExecutionStatus, ExecutionTracker, StepStatus,
};
use crate::core::workflow::context::InputEnvelope;
use crate::domain::errors::TrackingError;
use crate::domain::ids::ExecutionId;
use crate::domain::result::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Memory-backed [`ExecutionTracker`]
#[derive(Debug, Default)]
pub struct InMemoryTracker {
    records: RwLock<HashMap<ExecutionId, ExecutionRecord>>,
    by_name: RwLock<HashMap<String, ExecutionId>>,
}

impl InMemoryTracker {
    /// Creates an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    async fn update<F>(&self, id: &ExecutionId, apply: F) -> Result<()>
    where
        F: FnOnce(&mut ExecutionRecord),
    {
        let mut records = self.records.write().await;
        let record = records.get_mut(id).ok_or_else(|| TrackingError::UnknownExecution {
            id: id.to_string(),
        })?;
        apply(record);
        Ok(())
    }
}

#[async_trait]
impl ExecutionTracker for InMemoryTracker {
    async fn start(&self, name: &str, input: &InputEnvelope) -> Result<ExecutionId> {
        let mut by_name = self.by_name.write().await;
        if let Some(existing) = by_name.get(name) {
            tracing::debug!(name, execution_id = %existing, "Duplicate start, reusing execution");
            return Ok(existing.clone());
        }

        let id = ExecutionId::new(Uuid::new_v4().to_string())
            .map_err(|e| TrackingError::Unavailable(e))?;
        let record = ExecutionRecord {
            execution_id: id.clone(),
            name: name.to_string(),
            status: ExecutionStatus::Running,
            input: input.clone(),
            output: None,
            error: None,
            cause: None,
            steps: Vec::new(),
            started_at: Utc::now(),
            stopped_at: None,
        };

        by_name.insert(name.to_string(), id.clone());
        self.records.write().await.insert(id.clone(), record);
        Ok(id)
    }

    async fn describe(&self, id: &ExecutionId) -> Result<ExecutionRecord> {
        let records = self.records.read().await;
        records
            .get(id)
            .cloned()
            .ok_or_else(|| {
                TrackingError::UnknownExecution {
                    id: id.to_string(),
                }
                .into()
            })
    }

    async fn list(&self, filter: Option<ExecutionStatus>) -> Result<Vec<ExecutionId>> {
        let records = self.records.read().await;
        let mut entries: Vec<(&ExecutionId, &ExecutionRecord)> = records
            .iter()
            .filter(|(_, record)| filter.map(|f| record.status == f).unwrap_or(true))
            .collect();
        entries.sort_by_key(|(_, record)| record.started_at);
        Ok(entries.into_iter().map(|(id, _)| id.clone()).collect())
    }

    async fn record_step(&self, id: &ExecutionId, state: &str, status: &str) -> Result<()> {
        self.update(id, |record| {
            record.steps.push(StepStatus {
                state: state.to_string(),
                status: status.to_string(),
                at: Utc::now(),
            });
        })
        .await
    }

    async fn complete(&self, id: &ExecutionId, output: serde_json::Value) -> Result<()> {
        self.update(id, |record| {
            record.status = ExecutionStatus::Succeeded;
            record.output = Some(output);
            record.stopped_at = Some(Utc::now());
        })
        .await
    }

    async fn fail(&self, id: &ExecutionId, error: &str, cause: &str) -> Result<()> {
        self.update(id, |record| {
            record.status = ExecutionStatus::Failed;
            record.error = Some(error.to_string());
            record.cause = Some(cause.to_string());
            record.stopped_at = Some(Utc::now());
        })
        .await
    }

    async fn abort(&self, id: &ExecutionId, cause: &str) -> Result<()> {
        self.update(id, |record| {
            record.status = ExecutionStatus::Aborted;
            record.cause = Some(cause.to_string());
            record.stopped_at = Some(Utc::now());
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope() -> InputEnvelope {
        InputEnvelope::new("incoming/a.dcm")
    }

    #[tokio::test]
    async fn test_start_describe() {
        let tracker = InMemoryTracker::new();
        let id = tracker.start("exec-a", &envelope()).await.unwrap();

        let record = tracker.describe(&id).await.unwrap();
        assert_eq!(record.status, ExecutionStatus::Running);
        assert_eq!(record.input.storage_location, "incoming/a.dcm");
        assert!(record.stopped_at.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_start_reuses_execution() {
        let tracker = InMemoryTracker::new();
        let first = tracker.start("exec-a", &envelope()).await.unwrap();
        let second = tracker.start("exec-a", &envelope()).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(tracker.list(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_step_history_and_completion() {
        let tracker = InMemoryTracker::new();
        let id = tracker.start("exec-a", &envelope()).await.unwrap();

        tracker.record_step(&id, "Extract", "started").await.unwrap();
        tracker.record_step(&id, "Extract", "completed").await.unwrap();
        tracker
            .complete(&id, serde_json::json!({"output_key": "deidentified/a.dcm"}))
            .await
            .unwrap();

        let record = tracker.describe(&id).await.unwrap();
        assert_eq!(record.status, ExecutionStatus::Succeeded);
        assert_eq!(record.steps.len(), 2);
        assert!(record.output.unwrap()["output_key"]
            .as_str()
            .unwrap()
            .contains("deidentified"));
    }

    #[tokio::test]
    async fn test_failure_carries_error_and_cause() {
        let tracker = InMemoryTracker::new();
        let id = tracker.start("exec-a", &envelope()).await.unwrap();
        tracker
            .fail(&id, "MissingRequiredTagError", "missing required tag: SeriesInstanceUID")
            .await
            .unwrap();

        let record = tracker.describe(&id).await.unwrap();
        assert_eq!(record.status, ExecutionStatus::Failed);
        assert_eq!(record.error.as_deref(), Some("MissingRequiredTagError"));
        assert!(record.cause.unwrap().contains("SeriesInstanceUID"));
    }

    #[tokio::test]
    async fn test_list_filters_by_status() {
        let tracker = InMemoryTracker::new();
        let a = tracker.start("exec-a", &envelope()).await.unwrap();
        let _b = tracker.start("exec-b", &envelope()).await.unwrap();
        tracker.complete(&a, serde_json::json!({})).await.unwrap();

        let succeeded = tracker
            .list(Some(ExecutionStatus::Succeeded))
            .await
            .unwrap();
        assert_eq!(succeeded, vec![a]);
        assert_eq!(tracker.list(None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_execution() {
        let tracker = InMemoryTracker::new();
        let ghost = ExecutionId::new("ghost").unwrap();
        assert!(tracker.describe(&ghost).await.is_err());
    }
}
