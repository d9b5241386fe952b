//! Shared fixtures for integration tests

// Each test binary compiles this module; not every binary uses every helper.
#![allow(dead_code)]

use aperture::adapters::metrics::RecordingMetrics;
use aperture::adapters::storage::{InMemoryStore, ObjectStore};
use aperture::adapters::tracking::{ExecutionTracker, InMemoryTracker};
use aperture::config::secret_string;
use aperture::core::deidentify::{Deidentifier, PhiPolicy, UnknownTagMode};
use aperture::core::parse::{write, Dataset, Element};
use aperture::core::workflow::{Orchestrator, OrchestratorOptions};
use aperture::domain::tag::{tags, Vr};
use std::sync::Arc;

/// A complete, well-formed CT header dataset
pub fn sample_dataset() -> Dataset {
    let mut dataset = Dataset::new();
    dataset.insert(
        tags::TRANSFER_SYNTAX_UID,
        Element::text(Vr::UI, "1.2.840.10008.1.2.1"),
    );
    dataset.insert(
        tags::SOP_CLASS_UID,
        Element::text(Vr::UI, "1.2.840.10008.5.1.4.1.1.2"),
    );
    dataset.insert(
        tags::SOP_INSTANCE_UID,
        Element::text(Vr::UI, "1.2.840.113619.2.55.3.1"),
    );
    dataset.insert(tags::STUDY_DATE, Element::text(Vr::DA, "20230615"));
    dataset.insert(tags::STUDY_TIME, Element::text(Vr::TM, "141530"));
    dataset.insert(tags::MODALITY, Element::text(Vr::CS, "CT"));
    dataset.insert(tags::PATIENT_NAME, Element::text(Vr::PN, "John Doe"));
    dataset.insert(tags::PATIENT_ID, Element::text(Vr::LO, "12345"));
    dataset.insert(tags::PATIENT_SEX, Element::text(Vr::CS, "M"));
    dataset.insert(
        tags::STUDY_INSTANCE_UID,
        Element::text(Vr::UI, "1.2.840.113619.2.55"),
    );
    dataset.insert(
        tags::SERIES_INSTANCE_UID,
        Element::text(Vr::UI, "1.2.840.113619.2.55.3"),
    );
    dataset.insert(tags::ROWS, Element::new(Vr::US, 512u16.to_le_bytes().to_vec()));
    dataset.insert(
        tags::COLUMNS,
        Element::new(Vr::US, 512u16.to_le_bytes().to_vec()),
    );
    dataset.insert(
        tags::BITS_ALLOCATED,
        Element::new(Vr::US, 16u16.to_le_bytes().to_vec()),
    );
    dataset.insert(
        tags::BITS_STORED,
        Element::new(Vr::US, 12u16.to_le_bytes().to_vec()),
    );
    dataset.insert(tags::KVP, Element::text(Vr::DS, "120"));
    dataset
}

/// The sample dataset serialized to Part-10 bytes
pub fn sample_dicom_bytes() -> Vec<u8> {
    write(&sample_dataset())
}

/// One wired-up pipeline over in-memory collaborators
pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub tracker: Arc<InMemoryTracker>,
    pub metrics: Arc<RecordingMetrics>,
    pub orchestrator: Orchestrator,
}

/// Builds a harness with default options adjusted by `tune`
pub fn harness(tune: impl FnOnce(&mut OrchestratorOptions)) -> Harness {
    let store = Arc::new(InMemoryStore::new());
    harness_with_store(store.clone() as Arc<dyn ObjectStore>, store, tune)
}

/// Builds a harness over an explicit store implementation
///
/// `raw` is the trait object handed to the orchestrator, `store` the
/// concrete in-memory store used for assertions (they may differ when a
/// test wraps the store with fault injection).
pub fn harness_with_store(
    raw: Arc<dyn ObjectStore>,
    store: Arc<InMemoryStore>,
    tune: impl FnOnce(&mut OrchestratorOptions),
) -> Harness {
    let tracker = Arc::new(InMemoryTracker::new());
    let metrics = Arc::new(RecordingMetrics::new());

    let deidentifier = Arc::new(Deidentifier::new(
        Arc::new(PhiPolicy::safe_harbor()),
        secret_string("integration-test-key".to_string()),
        UnknownTagMode::Lenient,
    ));

    let mut options = OrchestratorOptions::default();
    tune(&mut options);

    let orchestrator = Orchestrator::new(
        raw,
        tracker.clone() as Arc<dyn ExecutionTracker>,
        metrics.clone(),
        deidentifier,
        options,
    );

    Harness {
        store,
        tracker,
        metrics,
        orchestrator,
    }
}
