//! Metadata record validation
//!
//! Checks a [`MetadataRecord`] against its field contracts and aggregates
//! every violation into one result. Collecting the complete error set is a
//! design requirement: downstream failure reporting must show every problem
//! in a single pass, so nothing here fails fast.

use crate::domain::metadata::MetadataRecord;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// One field contract violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Dotted path of the offending field, e.g. `patient.id`
    pub field: String,
    /// Human-readable description of the violation
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Outcome of validating one record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// All violations found, in field order
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    /// Returns true when no contract was violated
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Joins all violations into one summary line
    pub fn summary(&self) -> String {
        self.errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(ValidationError::new(field, message));
    }
}

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{8}$").expect("static regex"))
}

fn time_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{6}(\.\d{1,6})?$").expect("static regex"))
}

fn age_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{3})([DWMY])$").expect("static regex"))
}

/// Validates a metadata record against its field contracts
///
/// Never mutates its input and always returns the complete violation set.
pub fn validate(record: &MetadataRecord) -> ValidationResult {
    let mut result = ValidationResult::default();

    check_identifier(&mut result, "patient.id", &record.patient.id);
    check_uid(&mut result, "study.uid", &record.study.uid, true);
    check_uid(&mut result, "series.uid", &record.series.uid, true);
    check_uid(
        &mut result,
        "image.sop_instance_uid",
        &record.image.sop_instance_uid,
        true,
    );
    check_uid(
        &mut result,
        "image.sop_class_uid",
        &record.image.sop_class_uid,
        false,
    );

    check_date(&mut result, "patient.birth_date", &record.patient.birth_date);
    check_date(&mut result, "study.date", &record.study.date);
    check_time(&mut result, "study.time", &record.study.time);
    check_sex(&mut result, &record.patient.sex);
    check_age(&mut result, &record.patient.age);

    check_non_negative(&mut result, "series.number", record.series.number);
    check_non_negative(&mut result, "image.instance_number", record.image.instance_number);
    check_dimension(&mut result, "image.rows", record.image.rows);
    check_dimension(&mut result, "image.columns", record.image.columns);
    check_dimension(&mut result, "image.bits_allocated", record.image.bits_allocated);
    check_dimension(&mut result, "image.bits_stored", record.image.bits_stored);

    if let (Some(allocated), Some(stored)) =
        (record.image.bits_allocated, record.image.bits_stored)
    {
        if stored > allocated {
            result.push(
                "image.bits_stored",
                format!("bits stored ({stored}) exceeds bits allocated ({allocated})"),
            );
        }
    }

    if let Some((row, col)) = record.image.pixel_spacing {
        if row <= 0.0 || col <= 0.0 {
            result.push("image.pixel_spacing", "spacing components must be positive");
        }
    }

    result
}

fn check_identifier(result: &mut ValidationResult, field: &str, value: &str) {
    if value.is_empty() {
        result.push(field, "identifier must not be empty");
        return;
    }
    if value.chars().any(|c| c.is_control()) {
        result.push(field, "identifier contains non-printable characters");
    }
}

fn check_uid(result: &mut ValidationResult, field: &str, value: &str, required: bool) {
    if value.is_empty() {
        if required {
            result.push(field, "identifier must not be empty");
        }
        return;
    }
    let well_formed = value.chars().all(|c| c.is_ascii_digit() || c == '.')
        && !value.starts_with('.')
        && !value.ends_with('.')
        && !value.contains("..");
    if !well_formed {
        result.push(field, "UID must be digits and dots with valid placement");
    }
}

fn check_date(result: &mut ValidationResult, field: &str, value: &str) {
    if !value.is_empty() && !date_re().is_match(value) {
        result.push(field, format!("date '{value}' is not an 8-digit YYYYMMDD string"));
    }
}

fn check_time(result: &mut ValidationResult, field: &str, value: &str) {
    if !value.is_empty() && !time_re().is_match(value) {
        result.push(field, format!("time '{value}' is not an HHMMSS string"));
    }
}

fn check_sex(result: &mut ValidationResult, value: &str) {
    if !value.is_empty() && !matches!(value, "M" | "F" | "O") {
        result.push("patient.sex", format!("sex code '{value}' is not one of M, F, O"));
    }
}

/// Upper bounds per age unit, all roughly 150 years
fn age_bound(unit: &str) -> u32 {
    match unit {
        "D" => 54_750,
        "W" => 7_800,
        "M" => 1_800,
        _ => 150,
    }
}

fn check_age(result: &mut ValidationResult, value: &str) {
    if value.is_empty() {
        return;
    }
    match age_re().captures(value) {
        Some(caps) => {
            let number: u32 = caps[1].parse().unwrap_or(0);
            let unit = &caps[2];
            if number > age_bound(unit) {
                result.push(
                    "patient.age",
                    format!("age '{value}' exceeds the plausible bound for unit {unit}"),
                );
            }
        }
        None => result.push(
            "patient.age",
            format!("age '{value}' is not in DICOM nnnU form"),
        ),
    }
}

fn check_non_negative(result: &mut ValidationResult, field: &str, value: Option<i32>) {
    if let Some(v) = value {
        if v < 0 {
            result.push(field, format!("value {v} must be non-negative"));
        }
    }
}

fn check_dimension(result: &mut ValidationResult, field: &str, value: Option<u16>) {
    if let Some(v) = value {
        if v == 0 {
            result.push(field, "dimension must be at least 1");
        }
    }
}
