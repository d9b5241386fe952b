//! Secure delivery over artifacts produced by the pipeline

mod common;

use aperture::adapters::storage::{ObjectMetadata, ObjectStore};
use aperture::config::secret_string;
use aperture::core::delivery::{DeliveryOutcome, DeliveryService, UrlSigner, DEFAULT_TTL_SECONDS};
use aperture::core::workflow::InputEnvelope;
use chrono::Utc;
use common::{harness, sample_dicom_bytes};
use std::sync::Arc;
use tokio::sync::watch;

fn no_cancel() -> watch::Receiver<bool> {
    watch::channel(false).1
}

fn service(store: Arc<dyn ObjectStore>) -> DeliveryService {
    let signer = UrlSigner::new(
        "https://delivery.example.org/artifacts",
        secret_string("delivery-integration-key".to_string()),
    )
    .unwrap();
    DeliveryService::new(store, signer, DEFAULT_TTL_SECONDS)
}

#[tokio::test]
async fn test_descriptor_for_pipeline_artifact() {
    let h = harness(|_| {});
    h.store
        .put("incoming/a.dcm", sample_dicom_bytes(), ObjectMetadata::new())
        .await
        .unwrap();

    let outcome = h
        .orchestrator
        .run("exec-a", InputEnvelope::new("incoming/a.dcm"), no_cancel())
        .await
        .unwrap();
    let output_key = outcome.output_key.unwrap();

    let delivery = service(h.store.clone())
        .issue(&output_key, None, true)
        .await
        .unwrap();

    let descriptor = delivery.descriptor().expect("descriptor expected");
    assert_eq!(descriptor.object_key, output_key);
    assert!(descriptor.url.contains(&output_key));
    assert!(descriptor.expires_at > Utc::now());
}

#[tokio::test]
async fn test_batch_isolation_with_missing_key() {
    let h = harness(|_| {});
    h.store
        .put(
            "deidentified/present.dcm",
            sample_dicom_bytes(),
            ObjectMetadata::new(),
        )
        .await
        .unwrap();

    let keys = vec![
        "deidentified/present.dcm".to_string(),
        "deidentified/absent.dcm".to_string(),
    ];
    let outcomes = service(h.store.clone()).issue_batch(&keys, Some(600)).await;

    assert_eq!(outcomes.len(), 2);
    match &outcomes["deidentified/present.dcm"] {
        DeliveryOutcome::Issued(descriptor) => {
            let remaining = descriptor.expires_at - Utc::now();
            assert!(remaining.num_seconds() <= 600);
        }
        other => panic!("expected descriptor, got {other:?}"),
    }
    assert_eq!(
        outcomes["deidentified/absent.dcm"],
        DeliveryOutcome::NotFound {
            object_key: "deidentified/absent.dcm".to_string()
        }
    );
}

#[tokio::test]
async fn test_issue_without_validation_for_missing_key() {
    let h = harness(|_| {});
    let outcome = service(h.store.clone())
        .issue("deidentified/not-yet-written.dcm", None, false)
        .await
        .unwrap();
    // Blind issuance is allowed when the caller opts out of the probe
    assert!(outcome.descriptor().is_some());
}
