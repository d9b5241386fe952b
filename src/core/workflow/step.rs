//! Step envelope and normalization
//!
//! Every pipeline step returns the same discriminated result: an explicit
//! success value or a classified [`StepFailure`]. The orchestrator never
//! infers success from the absence of an error; only the `Ok` discriminator
//! advances state.
//!
//! [`run_step`] is the single invoke-and-normalize wrapper applied at every
//! call site. It enforces the per-attempt wall-clock budget and converts a
//! timeout into a transient failure so the retry policy can intercept it.

use crate::domain::errors::ApertureError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::time::Duration;

/// Classification driving retry behavior
///
/// The transient class is an explicit allow-list: object store faults,
/// tracker faults, and step timeouts. Everything else is business and is
/// never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureClass {
    /// Malformed input or contract violation; routed straight to failure
    Business,
    /// Infrastructure fault; eligible for retry with backoff
    Transient,
}

/// A normalized step failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepFailure {
    /// Retry classification
    pub class: FailureClass,
    /// Stable error kind name, e.g. `ParseError` or `TransientError`
    pub kind: String,
    /// Human-readable cause
    pub cause: String,
}

impl StepFailure {
    /// Builds a business failure
    pub fn business(kind: impl Into<String>, cause: impl Into<String>) -> Self {
        Self {
            class: FailureClass::Business,
            kind: kind.into(),
            cause: cause.into(),
        }
    }

    /// Builds a transient failure
    pub fn transient(kind: impl Into<String>, cause: impl Into<String>) -> Self {
        Self {
            class: FailureClass::Transient,
            kind: kind.into(),
            cause: cause.into(),
        }
    }

    /// Returns true when the retry policy may re-attempt the step
    pub fn is_transient(&self) -> bool {
        self.class == FailureClass::Transient
    }
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.cause)
    }
}

impl From<ApertureError> for StepFailure {
    fn from(err: ApertureError) -> Self {
        match &err {
            ApertureError::Storage(inner) => Self::transient("StorageError", inner.to_string()),
            ApertureError::Tracking(inner) => Self::transient("TrackingError", inner.to_string()),
            ApertureError::Parse(inner) => Self::business("ParseError", inner.to_string()),
            ApertureError::Extract(inner) => {
                Self::business("MissingRequiredTagError", inner.to_string())
            }
            ApertureError::Deidentify(inner) => {
                Self::business("UnsupportedTagError", inner.to_string())
            }
            ApertureError::Validation(cause) => Self::business("ValidationError", cause.clone()),
            other => Self::business("Error", other.to_string()),
        }
    }
}

/// Discriminated result of one step
pub type StepResult<T> = std::result::Result<T, StepFailure>;

/// Invokes a step under a wall-clock budget and normalizes its outcome
///
/// Exceeding the budget yields a transient `TimeoutError` failure, never a
/// hang: each step fails closed.
pub async fn run_step<T, Fut>(name: &str, budget: Duration, step: Fut) -> StepResult<T>
where
    Fut: Future<Output = StepResult<T>>,
{
    match tokio::time::timeout(budget, step).await {
        Ok(outcome) => outcome,
        Err(_) => Err(StepFailure::transient(
            "TimeoutError",
            format!("step {name} exceeded its {}s budget", budget.as_secs()),
        )),
    }
}
