//! Core domain types and models
//!
//! Everything in this module is free of I/O: error hierarchy, identifier
//! newtypes, tag/VR primitives, and the metadata record model.

pub mod errors;
pub mod ids;
pub mod metadata;
pub mod result;
pub mod tag;

pub use errors::{
    ApertureError, DeidentifyError, ExtractError, ParseError, StorageError, TrackingError,
};
pub use ids::{ExecutionId, ObjectKey};
pub use metadata::{Acquisition, ImageInfo, MetadataRecord, PatientInfo, SeriesInfo, StudyInfo};
pub use result::Result;
pub use tag::{Tag, Vr};
