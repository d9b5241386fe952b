// Aperture - DICOM De-identification Pipeline
// Copyright (c) 2025 Aperture Contributors
// Licensed under the MIT License

//! # Aperture - DICOM De-identification Pipeline
//!
//! Aperture ingests binary medical-image files, extracts structured
//! metadata, removes patient-identifying content, validates the result, and
//! issues time-limited secure delivery handles for the cleaned artifacts.
//!
//! ## Architecture
//!
//! Aperture follows a layered architecture:
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (parse/extract, validate, de-identify,
//!   workflow, delivery)
//! - [`adapters`] - External collaborators (object store, execution
//!   tracker, metrics sink)
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and observability
//!
//! ## Pipeline
//!
//! Each input runs through an explicit state machine: `Extract` parses the
//! DICOM header and maps it onto a typed metadata record, `Validate` checks
//! every field contract and aggregates all violations, and `Deidentify`
//! applies the PHI policy table and writes the cleaned artifact back to the
//! object store. Transient infrastructure faults retry with exponential
//! backoff; malformed input routes straight to the terminal failure state.
//!
//! ```rust
//! use aperture::core::parse::{parse, write, Dataset, Element};
//! use aperture::core::extract::extract;
//! use aperture::domain::tag::{tags, Vr};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut dataset = Dataset::new();
//! dataset.insert(tags::PATIENT_ID, Element::text(Vr::LO, "12345"));
//! dataset.insert(tags::STUDY_INSTANCE_UID, Element::text(Vr::UI, "1.2.3"));
//! dataset.insert(tags::SERIES_INSTANCE_UID, Element::text(Vr::UI, "1.2.3.4"));
//! dataset.insert(tags::SOP_INSTANCE_UID, Element::text(Vr::UI, "1.2.3.4.5"));
//!
//! let parsed = parse(&write(&dataset))?;
//! let record = extract(&parsed)?;
//! assert_eq!(record.patient.id, "12345");
//! # Ok(())
//! # }
//! ```
//!
//! ## De-identification
//!
//! The PHI policy table maps each governed tag to remove, date-shift, or
//! preserve. Identifiers are replaced by keyed HMAC-SHA256 pseudonyms that
//! are stable across runs and never equal the source value. The transform
//! is pure and idempotent, which is what makes workflow retries and
//! duplicate triggers safe.
//!
//! ## Delivery
//!
//! [`core::delivery::DeliveryService`] issues expiring signed URLs for
//! cleaned artifacts, singly or in batches; a missing object resolves to a
//! `NotFound` value without disturbing the other keys in a batch.
//!
//! ## Error Handling
//!
//! All errors flow through [`domain::ApertureError`]. Business failures
//! (parse, missing tag, validation) are never retried; object store and
//! tracker faults and step timeouts are transient and retried up to the
//! configured bound.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
