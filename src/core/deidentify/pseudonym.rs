//! Keyed pseudonym derivation
//!
//! Replaces a real identifier with a stable substitute derived by
//! HMAC-SHA256 under a configured secret key. Derivation is deterministic
//! (same input, same output, across calls and concurrent executions) and
//! one-way: without the key there is no path back to the source identifier.

use crate::domain::errors::DeidentifyError;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;

type HmacSha256 = Hmac<Sha256>;

/// Number of hex characters kept from the MAC output
const PSEUDONYM_LEN: usize = 16;

/// A derived pseudonymous identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pseudonym(String);

impl Pseudonym {
    /// Wraps an already-derived or externally supplied pseudonym
    pub(crate) fn from_value(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the pseudonym as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Pseudonym {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Derives the pseudonym for a source identifier
///
/// The output never equals the input: should the truncated MAC ever match
/// the source exactly, the candidate is extended by one character, which
/// changes its length and so cannot collide. Both paths are deterministic.
///
/// # Errors
///
/// Returns [`DeidentifyError::EmptyKey`] when the key has no bytes.
pub fn derive(key: &[u8], source: &str) -> Result<Pseudonym, DeidentifyError> {
    if key.is_empty() {
        return Err(DeidentifyError::EmptyKey);
    }

    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| DeidentifyError::EmptyKey)?;
    mac.update(source.as_bytes());
    let digest = mac.finalize().into_bytes();
    let candidate = hex::encode(&digest[..PSEUDONYM_LEN / 2]);

    if candidate == source {
        return Ok(Pseudonym(format!("{candidate}0")));
    }
    Ok(Pseudonym(candidate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derivation_is_stable() {
        let first = derive(b"test-key", "12345").unwrap();
        let second = derive(b"test-key", "12345").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_derivation_differs_from_source() {
        let pseudonym = derive(b"test-key", "12345").unwrap();
        assert_ne!(pseudonym.as_str(), "12345");
        assert_eq!(pseudonym.as_str().len(), PSEUDONYM_LEN);
    }

    #[test]
    fn test_distinct_sources_get_distinct_pseudonyms() {
        let a = derive(b"test-key", "patient-a").unwrap();
        let b = derive(b"test-key", "patient-b").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_key_changes_output() {
        let a = derive(b"key-one", "12345").unwrap();
        let b = derive(b"key-two", "12345").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_empty_key_rejected() {
        assert_eq!(derive(b"", "12345").unwrap_err(), DeidentifyError::EmptyKey);
    }
}
