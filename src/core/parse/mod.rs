//! DICOM header parsing and serialization
//!
//! The ingestion half of the metadata extractor: a reader for the Part-10
//! header region, the in-memory dataset it produces, and a writer that
//! serializes a cleaned dataset back to bytes.

pub mod dataset;
pub mod reader;
pub mod writer;

pub use dataset::{Dataset, Element};
pub use reader::{parse, transfer_syntax};
pub use writer::write;
