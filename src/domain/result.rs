//! Result alias used across the crate

use crate::domain::errors::ApertureError;

/// Convenience alias binding [`ApertureError`] as the error type
pub type Result<T> = std::result::Result<T, ApertureError>;
