//! PHI de-identification
//!
//! A pure, side-effect-free transform over a parsed dataset: fields governed
//! by the [`PhiPolicy`] are removed, date-shifted, or preserved; identifying
//! numbers are replaced with keyed pseudonyms; and the output is stamped so
//! a re-run recognizes already-cleaned data. Purity is what makes workflow
//! retries and duplicate triggers safe.

pub mod policy;
pub mod pseudonym;

pub use policy::{PhiAction, PhiPolicy};
pub use pseudonym::Pseudonym;

use crate::config::SecretString;
use crate::core::parse::{Dataset, Element};
use crate::domain::errors::DeidentifyError;
use crate::domain::tag::{tags, Tag, Vr};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// How a tag with an unknown value representation outside the policy table
/// is handled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownTagMode {
    /// Skip the tag and count it
    #[default]
    Lenient,
    /// Fail the transform
    Strict,
}

/// Result of one de-identification pass
#[derive(Debug, Clone)]
pub struct Deidentified {
    /// The cleaned dataset
    pub dataset: Dataset,
    /// Tags deleted by the policy, in stream order
    pub removed_tags: Vec<Tag>,
    /// Pseudonymous identifier that replaced the patient id
    pub pseudonym: Pseudonym,
    /// Unknown-VR tags skipped in lenient mode
    pub skipped_unknown: usize,
}

/// Method marker written into cleaned datasets
const DEID_METHOD: &str = "Safe Harbor: policy removal, year-only dates, keyed pseudonyms";

/// Dates where only the day component is cleared along with the month kept
/// as the fixed `01` marker; acquisition-level dates collapse to January 1st
const STUDY_LEVEL_DATES: [Tag; 2] = [tags::STUDY_DATE, tags::SERIES_DATE];

/// The de-identifier
///
/// Holds the immutable policy table, the pseudonym key, and the
/// unknown-tag mode. One instance is shared read-only across all
/// concurrent executions.
pub struct Deidentifier {
    policy: Arc<PhiPolicy>,
    key: SecretString,
    mode: UnknownTagMode,
}

impl Deidentifier {
    /// Creates a de-identifier from a policy table, pseudonym key, and mode
    pub fn new(policy: Arc<PhiPolicy>, key: SecretString, mode: UnknownTagMode) -> Self {
        Self { policy, key, mode }
    }

    /// De-identifies a dataset
    ///
    /// The input is never mutated. Re-running on the output removes zero
    /// additional tags and leaves the pseudonym unchanged.
    ///
    /// `explicit_id` overrides the derived pseudonym; it must differ from
    /// the source identifier or the call fails.
    ///
    /// # Errors
    ///
    /// Returns [`DeidentifyError::UnsupportedTag`] in strict mode for an
    /// unknown-VR tag outside the policy, [`DeidentifyError::InvalidOverride`]
    /// when the explicit id equals the source id, and
    /// [`DeidentifyError::EmptyKey`] when no pseudonym key is configured.
    pub fn deidentify(
        &self,
        dataset: &Dataset,
        explicit_id: Option<&str>,
    ) -> Result<Deidentified, DeidentifyError> {
        let mut cleaned = dataset.clone();
        let mut removed_tags = Vec::new();
        let mut skipped_unknown = 0usize;

        let already_cleaned = dataset.string(tags::PATIENT_IDENTITY_REMOVED) == "YES";
        let source_id = dataset.string(tags::PATIENT_ID);

        let present: Vec<(Tag, Vr)> = dataset.iter().map(|(tag, e)| (*tag, e.vr)).collect();
        for (tag, vr) in present {
            match self.policy.action_for(tag) {
                Some(PhiAction::Remove) => {
                    cleaned.remove(tag);
                    removed_tags.push(tag);
                }
                Some(PhiAction::DateShift) => {
                    if let Some(element) = cleaned.get(tag) {
                        let shifted = shift_to_year(tag, element);
                        cleaned.insert(tag, shifted);
                    }
                }
                Some(PhiAction::Preserve) => {}
                None => {
                    if vr == Vr::UN {
                        match self.mode {
                            UnknownTagMode::Lenient => skipped_unknown += 1,
                            UnknownTagMode::Strict => {
                                return Err(DeidentifyError::UnsupportedTag { tag })
                            }
                        }
                    }
                }
            }
        }

        let pseudonym = if already_cleaned {
            Pseudonym::from_value(source_id)
        } else {
            let pseudonym = match explicit_id {
                Some(id) => {
                    if id == source_id {
                        return Err(DeidentifyError::InvalidOverride);
                    }
                    Pseudonym::from_value(id)
                }
                None => pseudonym::derive(
                    self.key.expose_secret().as_ref().as_bytes(),
                    &source_id,
                )?,
            };

            cleaned.insert(tags::PATIENT_ID, Element::text(Vr::LO, pseudonym.as_str()));

            let accession = dataset.string(tags::ACCESSION_NUMBER);
            if !accession.is_empty() {
                let substitute = pseudonym::derive(
                    self.key.expose_secret().as_ref().as_bytes(),
                    &accession,
                )?;
                cleaned.insert(
                    tags::ACCESSION_NUMBER,
                    Element::text(Vr::SH, substitute.as_str()),
                );
            }

            pseudonym
        };

        cap_patient_age(&mut cleaned);

        cleaned.insert(tags::PATIENT_IDENTITY_REMOVED, Element::text(Vr::CS, "YES"));
        cleaned.insert(
            tags::DEIDENTIFICATION_METHOD,
            Element::text(Vr::LO, DEID_METHOD),
        );

        Ok(Deidentified {
            dataset: cleaned,
            removed_tags,
            pseudonym,
            skipped_unknown,
        })
    }
}

/// Reduces a date or time value to its year component
///
/// `DA` study-level dates become `YYYY0100` (month kept as marker, day
/// cleared), acquisition and content dates become `YYYY0101`, `TM` values
/// become `000000`, and `DT` values keep the year with the remainder set to
/// the epoch.
fn shift_to_year(tag: Tag, element: &Element) -> Element {
    let text = element.as_string();
    match element.vr {
        Vr::DA => {
            if text.len() < 4 {
                return Element::text(Vr::DA, "");
            }
            let year = &text[..4];
            if STUDY_LEVEL_DATES.contains(&tag) {
                Element::text(Vr::DA, &format!("{year}0100"))
            } else {
                Element::text(Vr::DA, &format!("{year}0101"))
            }
        }
        Vr::TM => Element::text(Vr::TM, "000000"),
        Vr::DT => {
            if text.len() < 4 {
                return Element::text(Vr::DT, "");
            }
            Element::text(Vr::DT, &format!("{}0101000000", &text[..4]))
        }
        _ => element.clone(),
    }
}

/// Collapses ages above 89 years to `090Y` per Safe Harbor
fn cap_patient_age(dataset: &mut Dataset) {
    let age = dataset.string(tags::PATIENT_AGE);
    if let Some(years) = age.strip_suffix('Y').and_then(|n| n.parse::<u32>().ok()) {
        if years > 89 {
            dataset.insert(tags::PATIENT_AGE, Element::text(Vr::AS, "090Y"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;

    fn deidentifier(mode: UnknownTagMode) -> Deidentifier {
        Deidentifier::new(
            Arc::new(PhiPolicy::safe_harbor()),
            secret_string("unit-test-key".to_string()),
            mode,
        )
    }

    fn sample_dataset() -> Dataset {
        let mut dataset = Dataset::new();
        dataset.insert(tags::PATIENT_NAME, Element::text(Vr::PN, "John Doe"));
        dataset.insert(tags::PATIENT_ID, Element::text(Vr::LO, "12345"));
        dataset.insert(tags::PATIENT_BIRTH_DATE, Element::text(Vr::DA, "19830401"));
        dataset.insert(tags::STUDY_DATE, Element::text(Vr::DA, "20230615"));
        dataset.insert(tags::STUDY_TIME, Element::text(Vr::TM, "141530"));
        dataset.insert(tags::ACQUISITION_DATE, Element::text(Vr::DA, "20230615"));
        dataset.insert(tags::MODALITY, Element::text(Vr::CS, "CT"));
        dataset.insert(tags::ACCESSION_NUMBER, Element::text(Vr::SH, "ACC-9"));
        dataset
    }

    #[test]
    fn test_removal_and_date_shift() {
        let result = deidentifier(UnknownTagMode::Lenient)
            .deidentify(&sample_dataset(), None)
            .unwrap();

        assert!(!result.dataset.contains(tags::PATIENT_NAME));
        assert!(!result.dataset.contains(tags::PATIENT_BIRTH_DATE));
        assert!(result.removed_tags.contains(&tags::PATIENT_NAME));
        assert_eq!(result.dataset.string(tags::STUDY_DATE), "20230100");
        assert_eq!(result.dataset.string(tags::ACQUISITION_DATE), "20230101");
        assert_eq!(result.dataset.string(tags::STUDY_TIME), "000000");
        // Diagnostic fields survive
        assert_eq!(result.dataset.string(tags::MODALITY), "CT");
    }

    #[test]
    fn test_pseudonym_replaces_identifiers() {
        let result = deidentifier(UnknownTagMode::Lenient)
            .deidentify(&sample_dataset(), None)
            .unwrap();

        let new_id = result.dataset.string(tags::PATIENT_ID);
        assert_ne!(new_id, "12345");
        assert_eq!(new_id, result.pseudonym.as_str());
        assert_ne!(result.dataset.string(tags::ACCESSION_NUMBER), "ACC-9");
    }

    #[test]
    fn test_pseudonym_is_stable_across_calls() {
        let deid = deidentifier(UnknownTagMode::Lenient);
        let first = deid.deidentify(&sample_dataset(), None).unwrap();
        let second = deid.deidentify(&sample_dataset(), None).unwrap();
        assert_eq!(first.pseudonym, second.pseudonym);
        assert_ne!(first.pseudonym.as_str(), "12345");
    }

    #[test]
    fn test_idempotent_on_own_output() {
        let deid = deidentifier(UnknownTagMode::Lenient);
        let first = deid.deidentify(&sample_dataset(), None).unwrap();
        let second = deid.deidentify(&first.dataset, None).unwrap();

        assert!(second.removed_tags.is_empty());
        assert_eq!(second.pseudonym, first.pseudonym);
        assert_eq!(second.dataset, first.dataset);
    }

    #[test]
    fn test_explicit_override() {
        let result = deidentifier(UnknownTagMode::Lenient)
            .deidentify(&sample_dataset(), Some("subject-007"))
            .unwrap();
        assert_eq!(result.pseudonym.as_str(), "subject-007");
        assert_eq!(result.dataset.string(tags::PATIENT_ID), "subject-007");
    }

    #[test]
    fn test_explicit_override_must_differ_from_source() {
        let err = deidentifier(UnknownTagMode::Lenient)
            .deidentify(&sample_dataset(), Some("12345"))
            .unwrap_err();
        assert_eq!(err, DeidentifyError::InvalidOverride);
    }

    #[test]
    fn test_unknown_tag_lenient_counts() {
        let mut dataset = sample_dataset();
        dataset.insert(Tag::new(0x0009, 0x0011), Element::new(Vr::UN, vec![1, 2]));

        let result = deidentifier(UnknownTagMode::Lenient)
            .deidentify(&dataset, None)
            .unwrap();
        assert_eq!(result.skipped_unknown, 1);
    }

    #[test]
    fn test_unknown_tag_strict_fails() {
        let mut dataset = sample_dataset();
        let private = Tag::new(0x0009, 0x0011);
        dataset.insert(private, Element::new(Vr::UN, vec![1, 2]));

        let err = deidentifier(UnknownTagMode::Strict)
            .deidentify(&dataset, None)
            .unwrap_err();
        assert_eq!(err, DeidentifyError::UnsupportedTag { tag: private });
    }

    #[test]
    fn test_age_capped_over_89() {
        let mut dataset = sample_dataset();
        dataset.insert(tags::PATIENT_AGE, Element::text(Vr::AS, "094Y"));

        let result = deidentifier(UnknownTagMode::Lenient)
            .deidentify(&dataset, None)
            .unwrap();
        assert_eq!(result.dataset.string(tags::PATIENT_AGE), "090Y");
    }

    #[test]
    fn test_age_under_90_untouched() {
        let mut dataset = sample_dataset();
        dataset.insert(tags::PATIENT_AGE, Element::text(Vr::AS, "065Y"));

        let result = deidentifier(UnknownTagMode::Lenient)
            .deidentify(&dataset, None)
            .unwrap();
        assert_eq!(result.dataset.string(tags::PATIENT_AGE), "065Y");
    }

    #[test]
    fn test_input_is_not_mutated() {
        let dataset = sample_dataset();
        let snapshot = dataset.clone();
        let _ = deidentifier(UnknownTagMode::Lenient)
            .deidentify(&dataset, None)
            .unwrap();
        assert_eq!(dataset, snapshot);
    }
}
