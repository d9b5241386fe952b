//! End-to-end pipeline tests over in-memory collaborators

mod common;

use aperture::adapters::storage::{ObjectMetadata, ObjectStore};
use aperture::adapters::tracking::{ExecutionStatus, ExecutionTracker};
use aperture::core::parse::{parse, Element};
use aperture::core::workflow::InputEnvelope;
use aperture::domain::tag::{tags, Vr};
use common::{harness, sample_dataset, sample_dicom_bytes};
use tokio::sync::watch;

fn no_cancel() -> watch::Receiver<bool> {
    // A dropped sender freezes the value at false, which is all we need
    watch::channel(false).1
}

#[tokio::test]
async fn test_pipeline_cleans_phi_end_to_end() {
    let h = harness(|_| {});
    h.store
        .put(
            "incoming/john-doe.dcm",
            sample_dicom_bytes(),
            ObjectMetadata::new(),
        )
        .await
        .unwrap();

    let outcome = h
        .orchestrator
        .run("exec-a", InputEnvelope::new("incoming/john-doe.dcm"), no_cancel())
        .await
        .unwrap();

    assert_eq!(outcome.status, ExecutionStatus::Succeeded);
    let output_key = outcome.output_key.unwrap();
    assert_eq!(output_key, "deidentified/john-doe.dcm");

    let cleaned = parse(&h.store.get(&output_key).await.unwrap()).unwrap();
    // PHI removal per the end-to-end fixture
    assert!(!cleaned.contains(tags::PATIENT_NAME));
    let new_id = cleaned.string(tags::PATIENT_ID);
    assert_ne!(new_id, "12345");
    assert!(!new_id.is_empty());
    assert_eq!(cleaned.string(tags::STUDY_DATE), "20230100");
    // Diagnostic fields survive
    assert_eq!(cleaned.string(tags::MODALITY), "CT");
    assert_eq!(cleaned.ushort(tags::ROWS), Some(512));
    assert_eq!(cleaned.string(tags::PATIENT_IDENTITY_REMOVED), "YES");

    // Artifact metadata carries the pseudonym and encoding
    let metadata = h.store.metadata(&output_key).await.unwrap();
    assert_eq!(metadata["pseudonym"], new_id);
    assert_eq!(metadata["transfer-syntax"], "1.2.840.10008.1.2.1");

    // One success counter, no failure counter, transitions logged
    assert_eq!(h.metrics.count_of("WorkflowSuccess"), 1);
    assert_eq!(h.metrics.count_of("WorkflowFailure"), 0);
    let operations = h.metrics.records();
    assert!(operations.iter().any(|r| r.operation == "Extract"));
    assert!(operations.iter().any(|r| r.operation == "Success"));

    // Tracker output is the authoritative consumer surface
    let record = h.tracker.describe(&outcome.execution_id).await.unwrap();
    assert_eq!(record.status, ExecutionStatus::Succeeded);
    let output = record.output.unwrap();
    assert_eq!(output["output_key"], "deidentified/john-doe.dcm");
    assert_eq!(output["pseudonym"], new_id);
}

#[tokio::test]
async fn test_pipeline_is_deterministic_across_runs() {
    let h = harness(|_| {});
    h.store
        .put("incoming/a.dcm", sample_dicom_bytes(), ObjectMetadata::new())
        .await
        .unwrap();

    let first = h
        .orchestrator
        .run("exec-1", InputEnvelope::new("incoming/a.dcm"), no_cancel())
        .await
        .unwrap();
    let first_bytes = h.store.get(first.output_key.as_ref().unwrap()).await.unwrap();

    // A second, separately named run over the same input
    let second = h
        .orchestrator
        .run("exec-2", InputEnvelope::new("incoming/a.dcm"), no_cancel())
        .await
        .unwrap();
    let second_bytes = h.store.get(second.output_key.as_ref().unwrap()).await.unwrap();

    assert_eq!(first_bytes, second_bytes);
}

#[tokio::test]
async fn test_missing_series_uid_fails_without_later_steps() {
    let h = harness(|_| {});
    let mut dataset = sample_dataset();
    dataset.remove(tags::SERIES_INSTANCE_UID);
    h.store
        .put(
            "incoming/broken.dcm",
            aperture::core::parse::write(&dataset),
            ObjectMetadata::new(),
        )
        .await
        .unwrap();

    let outcome = h
        .orchestrator
        .run("exec-b", InputEnvelope::new("incoming/broken.dcm"), no_cancel())
        .await
        .unwrap();

    assert_eq!(outcome.status, ExecutionStatus::Failed);
    assert_eq!(outcome.failed_step.as_deref(), Some("Extract"));
    let failure = outcome.error.unwrap();
    assert_eq!(failure.kind, "MissingRequiredTagError");
    assert!(failure.cause.contains("SeriesInstanceUID"));

    // Validate and Deidentify never ran
    let record = h.tracker.describe(&outcome.execution_id).await.unwrap();
    assert!(record.steps.iter().all(|s| s.state == "Extract"));
    assert_eq!(record.error.as_deref(), Some("MissingRequiredTagError"));

    // Failure counter tagged with the failing step
    let counters = h.metrics.counters();
    let failure_counter = counters
        .iter()
        .find(|(name, _)| name == "WorkflowFailure")
        .unwrap();
    assert_eq!(
        failure_counter.1[0],
        ("failed_step".to_string(), "Extract".to_string())
    );

    // No artifact was written
    assert!(h.store.list("deidentified/").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_validation_failure_aggregates_all_errors() {
    let h = harness(|_| {});
    let mut dataset = sample_dataset();
    // Two violations: a malformed study date and a bad sex code
    dataset.insert(tags::STUDY_DATE, Element::text(Vr::DA, "June 2023"));
    dataset.insert(tags::PATIENT_SEX, Element::text(Vr::CS, "X"));
    h.store
        .put(
            "incoming/invalid.dcm",
            aperture::core::parse::write(&dataset),
            ObjectMetadata::new(),
        )
        .await
        .unwrap();

    let outcome = h
        .orchestrator
        .run("exec-c", InputEnvelope::new("incoming/invalid.dcm"), no_cancel())
        .await
        .unwrap();

    assert_eq!(outcome.status, ExecutionStatus::Failed);
    assert_eq!(outcome.failed_step.as_deref(), Some("Validate"));
    let cause = outcome.error.unwrap().cause;
    // Both violations surface in one pass
    assert!(cause.contains("study.date"));
    assert!(cause.contains("patient.sex"));
}

#[tokio::test]
async fn test_duplicate_start_reuses_execution() {
    let h = harness(|_| {});
    h.store
        .put("incoming/a.dcm", sample_dicom_bytes(), ObjectMetadata::new())
        .await
        .unwrap();

    let first = h
        .orchestrator
        .run("exec-dup", InputEnvelope::new("incoming/a.dcm"), no_cancel())
        .await
        .unwrap();
    let second = h
        .orchestrator
        .run("exec-dup", InputEnvelope::new("incoming/a.dcm"), no_cancel())
        .await
        .unwrap();

    // At-least-once trigger delivery collapses onto one tracked execution
    assert_eq!(first.execution_id, second.execution_id);
    assert_eq!(h.tracker.list(None).await.unwrap().len(), 1);
    // And the duplicate run produced an identical artifact
    assert_eq!(first.output_key, second.output_key);
}

#[tokio::test]
async fn test_cancellation_honored_before_first_transition() {
    let h = harness(|_| {});
    h.store
        .put("incoming/a.dcm", sample_dicom_bytes(), ObjectMetadata::new())
        .await
        .unwrap();

    let (tx, rx) = watch::channel(true);
    let outcome = h
        .orchestrator
        .run("exec-cancel", InputEnvelope::new("incoming/a.dcm"), rx)
        .await
        .unwrap();
    drop(tx);

    assert_eq!(outcome.status, ExecutionStatus::Aborted);
    assert!(outcome.output_key.is_none());

    let record = h.tracker.describe(&outcome.execution_id).await.unwrap();
    assert_eq!(record.status, ExecutionStatus::Aborted);
    assert!(record.steps.is_empty());
}
