//! PHI policy table
//!
//! One immutable mapping from tag to de-identification action, built once
//! and passed into the de-identifier explicitly. The default table carries
//! the HIPAA Safe Harbor field list.

use crate::domain::tag::{tags, Tag};
use std::collections::BTreeMap;

/// What the de-identifier does with a tag it finds in the policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhiAction {
    /// Delete the field entirely and record it in the removed list
    Remove,
    /// Keep only the year component, zero the remainder
    DateShift,
    /// Leave the field untouched (diagnostic fields)
    Preserve,
}

/// Immutable tag-to-action policy table
///
/// Construction is the only mutation point; afterwards the table is shared
/// read-only across all pipeline executions.
#[derive(Debug, Clone)]
pub struct PhiPolicy {
    actions: BTreeMap<Tag, PhiAction>,
}

/// Tags removed outright under Safe Harbor
const REMOVE: &[Tag] = &[
    tags::PATIENT_NAME,
    tags::PATIENT_BIRTH_DATE,
    tags::PATIENT_ADDRESS,
    tags::PATIENT_TELEPHONE_NUMBERS,
    tags::PATIENT_MOTHER_BIRTH_NAME,
    tags::MILITARY_RANK,
    tags::BRANCH_OF_SERVICE,
    tags::MEDICAL_RECORD_LOCATOR,
    tags::ISSUER_OF_PATIENT_ID,
    tags::OTHER_PATIENT_IDS,
    tags::OTHER_PATIENT_NAMES,
    tags::REGION_OF_RESIDENCE,
    tags::CURRENT_PATIENT_LOCATION,
    tags::PATIENT_INSTITUTION_RESIDENCE,
    tags::INSTITUTION_NAME,
    tags::INSTITUTION_ADDRESS,
    tags::INSTITUTIONAL_DEPARTMENT_NAME,
    tags::REFERRING_PHYSICIAN_NAME,
    tags::PERFORMING_PHYSICIAN_NAME,
    tags::NAME_OF_PHYSICIANS_READING_STUDY,
    tags::OPERATORS_NAME,
    tags::REQUESTING_PHYSICIAN,
    tags::STATION_NAME,
    tags::DEVICE_SERIAL_NUMBER,
    tags::PLATE_ID,
    tags::PROTOCOL_NAME,
];

/// Date and time tags reduced to their year component
const DATE_SHIFT: &[Tag] = &[
    tags::STUDY_DATE,
    tags::SERIES_DATE,
    tags::ACQUISITION_DATE,
    tags::CONTENT_DATE,
    tags::INSTANCE_CREATION_DATE,
    tags::STUDY_TIME,
    tags::SERIES_TIME,
    tags::ACQUISITION_TIME,
    tags::CONTENT_TIME,
    tags::INSTANCE_CREATION_TIME,
];

/// Diagnostic fields explicitly kept as-is
const PRESERVE: &[Tag] = &[
    tags::MODALITY,
    tags::BODY_PART_EXAMINED,
    tags::ROWS,
    tags::COLUMNS,
    tags::PIXEL_SPACING,
    tags::BITS_ALLOCATED,
    tags::BITS_STORED,
    tags::KVP,
    tags::SLICE_THICKNESS,
    tags::RECONSTRUCTION_DIAMETER,
    tags::REPETITION_TIME,
    tags::ECHO_TIME,
    tags::MAGNETIC_FIELD_STRENGTH,
    tags::PATIENT_SEX,
    tags::PATIENT_AGE,
];

impl PhiPolicy {
    /// Builds the default Safe Harbor policy table
    pub fn safe_harbor() -> Self {
        let mut actions = BTreeMap::new();
        for tag in REMOVE {
            actions.insert(*tag, PhiAction::Remove);
        }
        for tag in DATE_SHIFT {
            actions.insert(*tag, PhiAction::DateShift);
        }
        for tag in PRESERVE {
            actions.insert(*tag, PhiAction::Preserve);
        }
        Self { actions }
    }

    /// Builds a policy table from an explicit action map
    pub fn from_actions(actions: BTreeMap<Tag, PhiAction>) -> Self {
        Self { actions }
    }

    /// Looks up the action for a tag, `None` when the tag is not governed
    pub fn action_for(&self, tag: Tag) -> Option<PhiAction> {
        self.actions.get(&tag).copied()
    }

    /// Number of governed tags
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Returns true when the table governs no tags
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl Default for PhiPolicy {
    fn default() -> Self {
        Self::safe_harbor()
    }
}
