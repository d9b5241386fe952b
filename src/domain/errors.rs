//! Domain error types
//!
//! The error hierarchy for Aperture. Every component reports through a
//! domain-specific type; third-party error types never cross module
//! boundaries.

use crate::domain::tag::Tag;
use thiserror::Error;

/// Main Aperture error type
///
/// The primary error type used throughout the application. It wraps the
/// component-specific errors and carries enough context for the workflow's
/// failure routing to classify them.
#[derive(Debug, Error)]
pub enum ApertureError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// DICOM stream parsing errors
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Metadata extraction errors
    #[error("Extract error: {0}")]
    Extract(#[from] ExtractError),

    /// De-identification errors
    #[error("De-identification error: {0}")]
    Deidentify(#[from] DeidentifyError),

    /// Aggregated metadata validation failure
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Object store errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Execution tracking errors
    #[error("Tracking error: {0}")]
    Tracking(#[from] TrackingError),

    /// Workflow orchestration errors
    #[error("Workflow error: {0}")]
    Workflow(String),

    /// Secure delivery errors
    #[error("Delivery error: {0}")]
    Delivery(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Errors raised while parsing a DICOM stream
///
/// All of these are malformed-input conditions. They are business failures
/// and are never retried.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    /// Stream shorter than the 128-byte preamble plus magic marker
    #[error("stream too short for DICOM preamble: {length} bytes")]
    MissingPreamble { length: usize },

    /// The DICM magic marker is absent after the preamble
    #[error("missing DICM magic marker, found {found:?}")]
    BadMagic { found: [u8; 4] },

    /// The stream ended inside a tag, length, or value field
    #[error("truncated stream at offset {offset}, needed {needed} more bytes")]
    Truncated { offset: usize, needed: usize },

    /// A two-byte VR code that is not a known value representation
    #[error("invalid value representation {bytes:?} for tag {tag}")]
    InvalidVr { tag: Tag, bytes: [u8; 2] },

    /// An undefined length on a tag that does not allow one
    #[error("unsupported undefined length for tag {tag}")]
    UndefinedLength { tag: Tag },
}

/// Errors raised while mapping a dataset to a metadata record
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractError {
    /// A mandatory identifier tag is absent or empty
    ///
    /// Carries the DICOM keyword of the first missing identifier, checked
    /// in order: PatientID, StudyInstanceUID, SeriesInstanceUID,
    /// SOPInstanceUID.
    #[error("missing required tag: {name}")]
    MissingRequiredTag { name: &'static str },
}

/// Errors raised during de-identification
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeidentifyError {
    /// An unknown value representation on a tag outside the policy table,
    /// rejected in strict mode
    #[error("unsupported tag {tag} with unknown value representation")]
    UnsupportedTag { tag: Tag },

    /// An explicit pseudonym override that equals the source identifier
    #[error("explicit pseudonym must differ from the source identifier")]
    InvalidOverride,

    /// The configured pseudonym key is empty
    #[error("pseudonym key must not be empty")]
    EmptyKey,
}

/// Object store collaborator errors
///
/// Faults from this collaborator are classified as transient by the
/// workflow's retry policy.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// Requested object does not exist
    #[error("object not found: {key}")]
    NotFound { key: String },

    /// The backing store reported a fault
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// HTTP gateway fault
    #[error("gateway error {status}: {message}")]
    Gateway { status: u16, message: String },

    /// Local filesystem fault
    #[error("I/O failure: {0}")]
    Io(String),
}

/// Execution tracking collaborator errors
#[derive(Debug, Clone, Error)]
pub enum TrackingError {
    /// The execution identifier is not known to the tracker
    #[error("unknown execution: {id}")]
    UnknownExecution { id: String },

    /// The tracker reported a fault
    #[error("tracker unavailable: {0}")]
    Unavailable(String),
}

impl From<std::io::Error> for ApertureError {
    fn from(err: std::io::Error) -> Self {
        ApertureError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ApertureError {
    fn from(err: serde_json::Error) -> Self {
        ApertureError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for ApertureError {
    fn from(err: toml::de::Error) -> Self {
        ApertureError::Configuration(format!("TOML parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tag::tags;

    #[test]
    fn test_parse_error_conversion() {
        let err = ParseError::MissingPreamble { length: 12 };
        let top: ApertureError = err.into();
        assert!(matches!(top, ApertureError::Parse(_)));
    }

    #[test]
    fn test_missing_tag_names_field() {
        let err = ExtractError::MissingRequiredTag {
            name: "SeriesInstanceUID",
        };
        assert!(err.to_string().contains("SeriesInstanceUID"));
    }

    #[test]
    fn test_unsupported_tag_display() {
        let err = DeidentifyError::UnsupportedTag {
            tag: tags::PATIENT_ID,
        };
        assert!(err.to_string().contains("(0010,0020)"));
    }

    #[test]
    fn test_storage_not_found_display() {
        let err = StorageError::NotFound {
            key: "incoming/ct-001.dcm".to_string(),
        };
        assert_eq!(err.to_string(), "object not found: incoming/ct-001.dcm");
    }

    #[test]
    fn test_errors_implement_std_error() {
        let err = ApertureError::Workflow("bad transition".to_string());
        let _: &dyn std::error::Error = &err;
    }
}
