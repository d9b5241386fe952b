//! Structured metadata record model
//!
//! The typed representation of the header fields extracted from one DICOM
//! instance. Field values are kept in their wire text form (dates as
//! `YYYYMMDD` strings, sex codes as single letters) so the validator can
//! report contract violations on exactly what the stream carried; absent
//! optional fields are explicit empty values, never missing keys.

use serde::{Deserialize, Serialize};

/// Complete metadata record for one image instance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    /// Patient-level fields (subject to de-identification downstream)
    pub patient: PatientInfo,
    /// Study-level fields
    pub study: StudyInfo,
    /// Series-level fields
    pub series: SeriesInfo,
    /// Instance and image geometry fields
    pub image: ImageInfo,
    /// Modality-specific acquisition parameters, when the modality is known
    pub acquisition: Option<Acquisition>,
}

/// Patient information
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientInfo {
    /// Patient identifier, required
    pub id: String,
    /// Patient name, empty when absent
    pub name: String,
    /// Birth date as `YYYYMMDD`, empty when absent
    pub birth_date: String,
    /// Sex code (`M`, `F`, `O`), empty when absent
    pub sex: String,
    /// Age string in DICOM form (`065Y`), empty when absent
    pub age: String,
}

/// Study information
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudyInfo {
    /// Study instance UID, required
    pub uid: String,
    /// Study date as `YYYYMMDD`, empty when absent
    pub date: String,
    /// Study time as `HHMMSS[.ffffff]`, empty when absent
    pub time: String,
    /// Free-text study description, empty when absent
    pub description: String,
    /// Accession number, empty when absent
    pub accession_number: String,
}

/// Series information
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesInfo {
    /// Series instance UID, required
    pub uid: String,
    /// Series number, absent when not present in the stream
    pub number: Option<i32>,
    /// Free-text series description, empty when absent
    pub description: String,
    /// Imaging modality code (`CT`, `MR`, ...), empty when absent
    pub modality: String,
}

/// Instance and image geometry information
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageInfo {
    /// SOP instance UID, required
    pub sop_instance_uid: String,
    /// SOP class UID, empty when absent
    pub sop_class_uid: String,
    /// Instance number, absent when not present
    pub instance_number: Option<i32>,
    /// Image height in pixels
    pub rows: Option<u16>,
    /// Image width in pixels
    pub columns: Option<u16>,
    /// Bits allocated per pixel
    pub bits_allocated: Option<u16>,
    /// Bits stored per pixel
    pub bits_stored: Option<u16>,
    /// Pixel spacing in mm as (row, column)
    pub pixel_spacing: Option<(f64, f64)>,
}

/// Modality-specific acquisition parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "modality", rename_all = "UPPERCASE")]
pub enum Acquisition {
    /// Computed tomography parameters
    Ct {
        /// Peak kilovoltage
        kvp: Option<f64>,
        /// Slice thickness in mm
        slice_thickness: Option<f64>,
        /// Reconstruction field of view in mm
        reconstruction_diameter: Option<f64>,
    },
    /// Magnetic resonance parameters
    Mr {
        /// Repetition time in ms
        repetition_time: Option<f64>,
        /// Echo time in ms
        echo_time: Option<f64>,
        /// Field strength in Tesla
        magnetic_field_strength: Option<f64>,
    },
}
