//! Execution context
//!
//! Per-file workflow state: the input envelope, the current state, the
//! attempt count of the last step, and the last failure. Created when a run
//! starts, mutated only by the orchestrator, and discarded once a terminal
//! state is reached; durable history lives with the execution tracking
//! collaborator.

use crate::core::workflow::state::WorkflowState;
use crate::core::workflow::step::StepFailure;
use crate::domain::ids::ExecutionId;
use serde::{Deserialize, Serialize};

/// Input envelope a workflow execution starts from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputEnvelope {
    /// Key of the raw object in the store
    pub storage_location: String,
}

impl InputEnvelope {
    /// Creates an envelope for a storage location
    pub fn new(storage_location: impl Into<String>) -> Self {
        Self {
            storage_location: storage_location.into(),
        }
    }
}

/// Mutable state of one running execution
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Tracker-assigned identifier
    pub execution_id: ExecutionId,
    /// The input reference every step receives
    pub input: InputEnvelope,
    /// Current state
    pub state: WorkflowState,
    /// Attempts made by the most recent step
    pub attempt: u32,
    /// Most recent step failure, if any
    pub last_error: Option<StepFailure>,
}

impl ExecutionContext {
    /// Creates a context positioned at the first state
    pub fn new(execution_id: ExecutionId, input: InputEnvelope) -> Self {
        Self {
            execution_id,
            input,
            state: WorkflowState::Extract,
            attempt: 0,
            last_error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_new_context_starts_at_extract() {
        let ctx = ExecutionContext::new(
            ExecutionId::from_str("exec-1").unwrap(),
            InputEnvelope::new("incoming/a.dcm"),
        );
        assert_eq!(ctx.state, WorkflowState::Extract);
        assert_eq!(ctx.attempt, 0);
        assert!(ctx.last_error.is_none());
    }

    #[test]
    fn test_envelope_serializes_storage_location() {
        let envelope = InputEnvelope::new("incoming/a.dcm");
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["storage_location"], "incoming/a.dcm");
    }
}
