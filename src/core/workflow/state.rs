//! Workflow state enumeration
//!
//! The explicit, finite set of states a pipeline execution moves through.
//! Transitions are decided by typed handlers in the orchestrator; there are
//! no string-keyed lookups anywhere in the dispatch path.

use serde::{Deserialize, Serialize};
use std::fmt;

/// States of one pipeline execution
///
/// The happy path runs `Extract` through `PublishSuccess` to the terminal
/// `Success`; any check failure or raised step error routes through
/// `HandleError` and `PublishFailure` to the terminal `Failure`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkflowState {
    /// Fetch and parse the raw object, extract the metadata record
    Extract,
    /// Route on the extract step's outcome
    CheckExtract,
    /// Validate the metadata record
    Validate,
    /// Route on the validation outcome
    CheckValidate,
    /// De-identify and persist the cleaned artifact
    Deidentify,
    /// Route on the de-identify outcome
    CheckDeidentify,
    /// Record the successful outcome with the tracker and metrics
    PublishSuccess,
    /// Terminal success
    Success,
    /// Capture the failing step and error for publication
    HandleError,
    /// Record the failed outcome with the tracker and metrics
    PublishFailure,
    /// Terminal failure
    Failure,
}

impl WorkflowState {
    /// Returns true for the two terminal states
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failure)
    }

    /// The state's name as published to the tracker and metrics
    pub fn name(&self) -> &'static str {
        match self {
            Self::Extract => "Extract",
            Self::CheckExtract => "CheckExtract",
            Self::Validate => "Validate",
            Self::CheckValidate => "CheckValidate",
            Self::Deidentify => "Deidentify",
            Self::CheckDeidentify => "CheckDeidentify",
            Self::PublishSuccess => "PublishSuccess",
            Self::Success => "Success",
            Self::HandleError => "HandleError",
            Self::PublishFailure => "PublishFailure",
            Self::Failure => "Failure",
        }
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
