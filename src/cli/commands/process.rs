//! `process` command: run the pipeline for one input

use crate::adapters::metrics::TracingMetrics;
use crate::adapters::storage::{create_store, ObjectMetadata};
use crate::adapters::tracking::{ExecutionStatus, ExecutionTracker, InMemoryTracker};
use crate::config::load_config;
use crate::core::deidentify::{Deidentifier, PhiPolicy};
use crate::core::workflow::{
    ObjectCreatedEvent, Orchestrator, OrchestratorOptions, RetryPolicy, WorkflowTrigger,
};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Arguments for the `process` command
#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// Local DICOM file to ingest and process
    #[arg(required_unless_present = "key")]
    pub input: Option<PathBuf>,

    /// Process an object already present in the configured store
    #[arg(long, conflicts_with = "input")]
    pub key: Option<String>,

    /// Key prefix for the ingested raw object
    #[arg(long, default_value = "incoming/")]
    pub ingest_prefix: String,
}

impl ProcessArgs {
    /// Executes the command, returning the process exit code
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        let config = load_config(config_path)?;
        let store = create_store(&config.storage)?;
        let tracker: Arc<dyn ExecutionTracker> = Arc::new(InMemoryTracker::new());
        let metrics = Arc::new(TracingMetrics::new());

        let deidentifier = Arc::new(Deidentifier::new(
            Arc::new(PhiPolicy::safe_harbor()),
            config.deidentification.pseudonym_key.clone(),
            config.deidentification.unknown_tags,
        ));

        let orchestrator = Orchestrator::new(
            store.clone(),
            tracker.clone(),
            metrics,
            deidentifier,
            OrchestratorOptions {
                retry: RetryPolicy::new(
                    config.workflow.max_attempts,
                    Duration::from_secs(config.workflow.retry_base_seconds),
                ),
                step_budget: Duration::from_secs(config.workflow.step_budget_seconds),
                output_prefix: config.ingestion.output_prefix.clone(),
                dry_run: config.application.dry_run,
            },
        );

        // Resolve the storage location: either an existing object key or a
        // local file ingested under the incoming prefix.
        let storage_location = match (&self.key, &self.input) {
            (Some(key), _) => key.clone(),
            (None, Some(path)) => {
                let bytes = std::fs::read(path)?;
                let file_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "input.dcm".to_string());
                let key = format!("{}{}", self.ingest_prefix, file_name);
                store.put(&key, bytes, ObjectMetadata::new()).await?;
                tracing::info!(key = %key, "Ingested local file");
                key
            }
            (None, None) => unreachable!("clap enforces input or key"),
        };

        let trigger = WorkflowTrigger::new(config.ingestion.suffix_filter.clone());
        let event = ObjectCreatedEvent {
            bucket: "local".to_string(),
            key: storage_location.clone(),
        };
        let Some(envelope) = trigger.envelope_for(&event) else {
            eprintln!(
                "Input '{}' does not match the configured suffix filter '{}'",
                storage_location, config.ingestion.suffix_filter
            );
            return Ok(2);
        };

        let name = trigger.execution_name(&storage_location);
        let outcome = orchestrator.run(&name, envelope, shutdown).await?;

        let record = tracker.describe(&outcome.execution_id).await?;
        println!("{}", serde_json::to_string_pretty(&record)?);

        Ok(match outcome.status {
            ExecutionStatus::Succeeded => 0,
            ExecutionStatus::Aborted => 3,
            _ => 1,
        })
    }
}
