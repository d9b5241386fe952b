//! Workflow orchestrator
//!
//! Drives one execution through the explicit state machine:
//!
//! ```text
//! Extract -> CheckExtract -> Validate -> CheckValidate
//!     -> Deidentify -> CheckDeidentify -> PublishSuccess -> Success
//! ```
//!
//! with any failure routing through `HandleError -> PublishFailure ->
//! Failure`. Dispatch is one typed handler per state; step invocations go
//! through the shared [`run_step`] normalizer and the transient-only
//! [`RetryPolicy`]. Cancellation is honored before every transition.

use crate::adapters::metrics::{MetricsSink, OperationRecord};
use crate::adapters::storage::{ObjectMetadata, ObjectStore};
use crate::adapters::tracking::{ExecutionStatus, ExecutionTracker};
use crate::core::deidentify::{Deidentifier, Pseudonym};
use crate::core::extract::extract;
use crate::core::parse::{parse, transfer_syntax, write, Dataset};
use crate::core::validate::validate;
use crate::core::workflow::context::{ExecutionContext, InputEnvelope};
use crate::core::workflow::retry::RetryPolicy;
use crate::core::workflow::state::WorkflowState;
use crate::core::workflow::step::{run_step, StepFailure, StepResult};
use crate::domain::errors::ApertureError;
use crate::domain::ids::{ExecutionId, ObjectKey};
use crate::domain::metadata::MetadataRecord;
use crate::domain::result::Result;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Tunables for one orchestrator instance
#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    /// Retry policy for transient step failures
    pub retry: RetryPolicy,
    /// Wall-clock budget per step attempt
    pub step_budget: Duration,
    /// Key prefix for cleaned artifacts
    pub output_prefix: String,
    /// Skip object store writes
    pub dry_run: bool,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            step_budget: Duration::from_secs(30),
            output_prefix: "deidentified/".to_string(),
            dry_run: false,
        }
    }
}

/// Terminal summary of one execution
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    /// Tracker-assigned identifier
    pub execution_id: ExecutionId,
    /// Terminal status
    pub status: ExecutionStatus,
    /// Key of the cleaned artifact on success
    pub output_key: Option<String>,
    /// Name of the step that failed, on failure
    pub failed_step: Option<String>,
    /// The failure that routed the execution to `Failure`
    pub error: Option<StepFailure>,
}

/// Output of the de-identify step
struct DeidentifyOutput {
    output_key: String,
    pseudonym: Pseudonym,
    removed_tags: usize,
    skipped_unknown: usize,
}

/// The workflow orchestrator
///
/// Stateless across executions: all per-run state lives in the
/// [`ExecutionContext`] and locals of [`run`](Self::run), so one instance
/// serves any number of concurrent executions.
pub struct Orchestrator {
    store: Arc<dyn ObjectStore>,
    tracker: Arc<dyn ExecutionTracker>,
    metrics: Arc<dyn MetricsSink>,
    deidentifier: Arc<Deidentifier>,
    options: OrchestratorOptions,
}

impl Orchestrator {
    /// Creates an orchestrator over the three collaborators
    pub fn new(
        store: Arc<dyn ObjectStore>,
        tracker: Arc<dyn ExecutionTracker>,
        metrics: Arc<dyn MetricsSink>,
        deidentifier: Arc<Deidentifier>,
        options: OrchestratorOptions,
    ) -> Self {
        Self {
            store,
            tracker,
            metrics,
            deidentifier,
            options,
        }
    }

    /// Runs one execution to a terminal state
    ///
    /// `name` is the deterministic execution name derived from the trigger;
    /// a duplicate start for the same name reuses the existing execution.
    /// Cancellation via `cancel` is honored before the next transition
    /// begins.
    ///
    /// # Errors
    ///
    /// Returns an error only when the tracking collaborator itself fails;
    /// step failures are routed into the terminal `Failure` state instead.
    pub async fn run(
        &self,
        name: &str,
        input: InputEnvelope,
        cancel: watch::Receiver<bool>,
    ) -> Result<ExecutionOutcome> {
        let execution_id = self.tracker.start(name, &input).await?;
        let mut ctx = ExecutionContext::new(execution_id, input);

        let mut dataset: Option<Dataset> = None;
        let mut record: Option<MetadataRecord> = None;
        let mut output: Option<DeidentifyOutput> = None;
        let mut failed_step: Option<WorkflowState> = None;

        while !ctx.state.is_terminal() {
            if *cancel.borrow() {
                tracing::warn!(execution_id = %ctx.execution_id, state = %ctx.state, "Execution cancelled");
                self.tracker
                    .abort(&ctx.execution_id, "cancellation requested")
                    .await?;
                self.metrics
                    .record(OperationRecord::new(ctx.state.name(), "aborted"));
                return Ok(ExecutionOutcome {
                    execution_id: ctx.execution_id,
                    status: ExecutionStatus::Aborted,
                    output_key: None,
                    failed_step: failed_step.map(|s| s.name().to_string()),
                    error: ctx.last_error,
                });
            }

            self.metrics
                .record(OperationRecord::new(ctx.state.name(), "entered"));

            ctx.state = match ctx.state {
                WorkflowState::Extract => {
                    self.tracker
                        .record_step(&ctx.execution_id, "Extract", "started")
                        .await?;
                    let key = ctx.input.storage_location.clone();
                    let (result, attempts) = self
                        .options
                        .retry
                        .run(|| self.extract_step(&key))
                        .await;
                    ctx.attempt = attempts;
                    self.settle_step(&mut ctx, WorkflowState::Extract, result, &mut failed_step, |value| {
                        let (ds, rec) = value;
                        dataset = Some(ds);
                        record = Some(rec);
                    })
                    .await?;
                    WorkflowState::CheckExtract
                }
                WorkflowState::CheckExtract => {
                    self.route(&ctx, WorkflowState::Validate)
                }
                WorkflowState::Validate => {
                    self.tracker
                        .record_step(&ctx.execution_id, "Validate", "started")
                        .await?;
                    let current = record.clone().unwrap_or_default();
                    let (result, attempts) = self
                        .options
                        .retry
                        .run(|| self.validate_step(&current))
                        .await;
                    ctx.attempt = attempts;
                    self.settle_step(&mut ctx, WorkflowState::Validate, result, &mut failed_step, |_| {})
                        .await?;
                    WorkflowState::CheckValidate
                }
                WorkflowState::CheckValidate => {
                    self.route(&ctx, WorkflowState::Deidentify)
                }
                WorkflowState::Deidentify => {
                    self.tracker
                        .record_step(&ctx.execution_id, "Deidentify", "started")
                        .await?;
                    let key = ctx.input.storage_location.clone();
                    let current = dataset.clone().unwrap_or_default();
                    let (result, attempts) = self
                        .options
                        .retry
                        .run(|| self.deidentify_step(&key, &current))
                        .await;
                    ctx.attempt = attempts;
                    self.settle_step(&mut ctx, WorkflowState::Deidentify, result, &mut failed_step, |value| {
                        output = Some(value);
                    })
                    .await?;
                    WorkflowState::CheckDeidentify
                }
                WorkflowState::CheckDeidentify => {
                    self.route(&ctx, WorkflowState::PublishSuccess)
                }
                WorkflowState::PublishSuccess => {
                    let out = output.as_ref().ok_or_else(|| {
                        ApertureError::Workflow(
                            "PublishSuccess reached without de-identify output".to_string(),
                        )
                    })?;
                    self.tracker
                        .complete(
                            &ctx.execution_id,
                            json!({
                                "storage_location": ctx.input.storage_location,
                                "output_key": out.output_key,
                                "pseudonym": out.pseudonym.as_str(),
                                "removed_tags": out.removed_tags,
                                "skipped_unknown": out.skipped_unknown,
                            }),
                        )
                        .await?;
                    self.metrics.incr("WorkflowSuccess", &[]);
                    WorkflowState::Success
                }
                WorkflowState::HandleError => {
                    let failure = ctx.last_error.clone().unwrap_or_else(|| {
                        StepFailure::business("Error", "unknown failure")
                    });
                    let step_name = failed_step.map(|s| s.name()).unwrap_or("Unknown");
                    tracing::error!(
                        execution_id = %ctx.execution_id,
                        failed_step = step_name,
                        error = %failure,
                        "Execution failed"
                    );
                    self.metrics.record(
                        OperationRecord::new(step_name, "failed")
                            .with_detail("attempts", ctx.attempt.to_string())
                            .with_detail("error", failure.kind.clone()),
                    );
                    WorkflowState::PublishFailure
                }
                WorkflowState::PublishFailure => {
                    let failure = ctx.last_error.clone().unwrap_or_else(|| {
                        StepFailure::business("Error", "unknown failure")
                    });
                    let step_name = failed_step.map(|s| s.name()).unwrap_or("Unknown");
                    // The describe surface names the failing state alongside
                    // the error kind and cause.
                    self.tracker
                        .fail(
                            &ctx.execution_id,
                            &failure.kind,
                            &format!("{step_name}: {}", failure.cause),
                        )
                        .await?;
                    self.metrics
                        .incr("WorkflowFailure", &[("failed_step", step_name)]);
                    WorkflowState::Failure
                }
                WorkflowState::Success | WorkflowState::Failure => ctx.state,
            };
        }

        self.metrics
            .record(OperationRecord::new(ctx.state.name(), "entered"));

        Ok(ExecutionOutcome {
            execution_id: ctx.execution_id,
            status: if ctx.state == WorkflowState::Success {
                ExecutionStatus::Succeeded
            } else {
                ExecutionStatus::Failed
            },
            output_key: output.map(|out| out.output_key),
            failed_step: failed_step.map(|s| s.name().to_string()),
            error: ctx.last_error,
        })
    }

    /// Records a settled step with the tracker and stores its outcome
    async fn settle_step<T>(
        &self,
        ctx: &mut ExecutionContext,
        state: WorkflowState,
        result: StepResult<T>,
        failed_step: &mut Option<WorkflowState>,
        on_success: impl FnOnce(T),
    ) -> Result<()> {
        match result {
            Ok(value) => {
                on_success(value);
                ctx.last_error = None;
                self.tracker
                    .record_step(&ctx.execution_id, state.name(), "completed")
                    .await?;
            }
            Err(failure) => {
                ctx.last_error = Some(failure);
                *failed_step = Some(state);
                self.tracker
                    .record_step(&ctx.execution_id, state.name(), "failed")
                    .await?;
            }
        }
        Ok(())
    }

    /// Check-state routing: advance only on an explicit success
    fn route(&self, ctx: &ExecutionContext, next: WorkflowState) -> WorkflowState {
        if ctx.last_error.is_some() {
            WorkflowState::HandleError
        } else {
            next
        }
    }

    async fn extract_step(&self, key: &str) -> StepResult<(Dataset, MetadataRecord)> {
        run_step("Extract", self.options.step_budget, async {
            let bytes = self.store.get(key).await.map_err(StepFailure::from)?;
            let dataset =
                parse(&bytes).map_err(|e| StepFailure::from(ApertureError::Parse(e)))?;
            let record =
                extract(&dataset).map_err(|e| StepFailure::from(ApertureError::Extract(e)))?;
            Ok((dataset, record))
        })
        .await
    }

    async fn validate_step(&self, record: &MetadataRecord) -> StepResult<()> {
        run_step("Validate", self.options.step_budget, async {
            let result = validate(record);
            if result.is_valid() {
                Ok(())
            } else {
                Err(StepFailure::business("ValidationError", result.summary()))
            }
        })
        .await
    }

    async fn deidentify_step(&self, input_key: &str, dataset: &Dataset) -> StepResult<DeidentifyOutput> {
        run_step("Deidentify", self.options.step_budget, async {
            let deidentified = self
                .deidentifier
                .deidentify(dataset, None)
                .map_err(|e| StepFailure::from(ApertureError::Deidentify(e)))?;

            let input_key = ObjectKey::new(input_key)
                .map_err(|e| StepFailure::business("Error", e))?;
            let output_key = format!("{}{}", self.options.output_prefix, input_key.file_name());
            let bytes = write(&deidentified.dataset);

            let mut metadata = ObjectMetadata::new();
            metadata.insert("pseudonym".to_string(), deidentified.pseudonym.to_string());
            metadata.insert(
                "removed-tags".to_string(),
                deidentified.removed_tags.len().to_string(),
            );
            let encoding = transfer_syntax(dataset);
            if !encoding.is_empty() {
                metadata.insert("transfer-syntax".to_string(), encoding);
            }

            if self.options.dry_run {
                tracing::info!(output_key = %output_key, "Dry run, skipping artifact write");
            } else {
                self.store
                    .put(&output_key, bytes, metadata)
                    .await
                    .map_err(StepFailure::from)?;
            }

            Ok(DeidentifyOutput {
                output_key,
                pseudonym: deidentified.pseudonym,
                removed_tags: deidentified.removed_tags.len(),
                skipped_unknown: deidentified.skipped_unknown,
            })
        })
        .await
    }
}
