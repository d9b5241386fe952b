//! Metadata extraction
//!
//! Maps a parsed [`Dataset`] onto the typed [`MetadataRecord`]. Optional
//! tags that are absent become explicit empty values; the four mandatory
//! identifiers must be present and non-empty or extraction fails naming the
//! first one missing.

use crate::core::parse::Dataset;
use crate::domain::errors::ExtractError;
use crate::domain::metadata::{
    Acquisition, ImageInfo, MetadataRecord, PatientInfo, SeriesInfo, StudyInfo,
};
use crate::domain::tag::{tags, Tag};

/// Mandatory identifier tags in the order they are checked
const REQUIRED_IDENTIFIERS: [(Tag, &str); 4] = [
    (tags::PATIENT_ID, "PatientID"),
    (tags::STUDY_INSTANCE_UID, "StudyInstanceUID"),
    (tags::SERIES_INSTANCE_UID, "SeriesInstanceUID"),
    (tags::SOP_INSTANCE_UID, "SOPInstanceUID"),
];

/// Extracts a structured metadata record from a dataset
///
/// Extraction is a pure function of the dataset: two invocations over the
/// same input yield identical records. Header fields are read regardless of
/// how (or whether) pixel data is encoded.
///
/// # Errors
///
/// Returns [`ExtractError::MissingRequiredTag`] naming the first mandatory
/// identifier that is absent or empty.
pub fn extract(dataset: &Dataset) -> Result<MetadataRecord, ExtractError> {
    for (tag, name) in REQUIRED_IDENTIFIERS {
        if dataset.string(tag).is_empty() {
            return Err(ExtractError::MissingRequiredTag { name });
        }
    }

    let modality = dataset.string(tags::MODALITY);
    let acquisition = acquisition_for(dataset, &modality);

    let pixel_spacing = {
        let values = dataset.decimals(tags::PIXEL_SPACING);
        if values.len() == 2 {
            Some((values[0], values[1]))
        } else {
            None
        }
    };

    Ok(MetadataRecord {
        patient: PatientInfo {
            id: dataset.string(tags::PATIENT_ID),
            name: dataset.string(tags::PATIENT_NAME),
            birth_date: dataset.string(tags::PATIENT_BIRTH_DATE),
            sex: dataset.string(tags::PATIENT_SEX),
            age: dataset.string(tags::PATIENT_AGE),
        },
        study: StudyInfo {
            uid: dataset.string(tags::STUDY_INSTANCE_UID),
            date: dataset.string(tags::STUDY_DATE),
            time: dataset.string(tags::STUDY_TIME),
            description: dataset.string(tags::STUDY_DESCRIPTION),
            accession_number: dataset.string(tags::ACCESSION_NUMBER),
        },
        series: SeriesInfo {
            uid: dataset.string(tags::SERIES_INSTANCE_UID),
            number: dataset.int(tags::SERIES_NUMBER),
            description: dataset.string(tags::SERIES_DESCRIPTION),
            modality,
        },
        image: ImageInfo {
            sop_instance_uid: dataset.string(tags::SOP_INSTANCE_UID),
            sop_class_uid: dataset.string(tags::SOP_CLASS_UID),
            instance_number: dataset.int(tags::INSTANCE_NUMBER),
            rows: dataset.ushort(tags::ROWS),
            columns: dataset.ushort(tags::COLUMNS),
            bits_allocated: dataset.ushort(tags::BITS_ALLOCATED),
            bits_stored: dataset.ushort(tags::BITS_STORED),
            pixel_spacing,
        },
        acquisition,
    })
}

/// Builds the modality-specific acquisition block, `None` for modalities
/// without dedicated parameters
fn acquisition_for(dataset: &Dataset, modality: &str) -> Option<Acquisition> {
    match modality {
        "CT" => Some(Acquisition::Ct {
            kvp: dataset.decimal(tags::KVP),
            slice_thickness: dataset.decimal(tags::SLICE_THICKNESS),
            reconstruction_diameter: dataset.decimal(tags::RECONSTRUCTION_DIAMETER),
        }),
        "MR" => Some(Acquisition::Mr {
            repetition_time: dataset.decimal(tags::REPETITION_TIME),
            echo_time: dataset.decimal(tags::ECHO_TIME),
            magnetic_field_strength: dataset.decimal(tags::MAGNETIC_FIELD_STRENGTH),
        }),
        _ => None,
    }
}
