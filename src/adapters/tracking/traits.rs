//! Execution tracking abstraction
//!
//! The collaborator that records workflow executions: start, per-step
//! status, terminal outcome, and the describe/list surface consumers gate
//! on. Consumers must check for terminal `Succeeded` status here, never for
//! mere object existence, because a partially written artifact can exist
//! mid-pipeline.

use crate::core::workflow::context::InputEnvelope;
use crate::domain::ids::ExecutionId;
use crate::domain::result::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of one execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExecutionStatus {
    /// Execution in progress
    Running,
    /// Terminal success; the output is authoritative
    Succeeded,
    /// Terminal failure
    Failed,
    /// Cancelled before reaching a terminal state
    Aborted,
}

/// One step status entry in an execution's history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepStatus {
    /// Workflow state name
    pub state: String,
    /// `started`, `completed`, or `failed`
    pub status: String,
    /// When the entry was recorded
    pub at: DateTime<Utc>,
}

/// Full description of one execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    /// Tracker-assigned identifier
    pub execution_id: ExecutionId,
    /// Deterministic name derived from the triggering key
    pub name: String,
    /// Lifecycle status
    pub status: ExecutionStatus,
    /// The envelope the execution started from
    pub input: InputEnvelope,
    /// Output document, present once succeeded
    pub output: Option<serde_json::Value>,
    /// Error kind, present once failed
    pub error: Option<String>,
    /// Error cause, present once failed
    pub cause: Option<String>,
    /// Per-step status history
    pub steps: Vec<StepStatus>,
    /// Start timestamp
    pub started_at: DateTime<Utc>,
    /// Stop timestamp, present once terminal
    pub stopped_at: Option<DateTime<Utc>>,
}

/// Execution tracking collaborator
#[async_trait]
pub trait ExecutionTracker: Send + Sync {
    /// Starts an execution, or returns the existing one for a name
    ///
    /// Start is idempotent per name: trigger delivery is at-least-once, so a
    /// duplicate start for the same key must not fork a second execution.
    async fn start(&self, name: &str, input: &InputEnvelope) -> Result<ExecutionId>;

    /// Describes an execution
    async fn describe(&self, id: &ExecutionId) -> Result<ExecutionRecord>;

    /// Lists executions, optionally filtered by status
    async fn list(&self, filter: Option<ExecutionStatus>) -> Result<Vec<ExecutionId>>;

    /// Appends a step status entry
    async fn record_step(&self, id: &ExecutionId, state: &str, status: &str) -> Result<()>;

    /// Marks an execution succeeded with its output document
    async fn complete(&self, id: &ExecutionId, output: serde_json::Value) -> Result<()>;

    /// Marks an execution failed with an error kind and cause
    async fn fail(&self, id: &ExecutionId, error: &str, cause: &str) -> Result<()>;

    /// Marks an execution aborted
    async fn abort(&self, id: &ExecutionId, cause: &str) -> Result<()>;
}
