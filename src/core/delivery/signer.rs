//! Signed URL construction
//!
//! Access URLs carry the object key, an expiry timestamp, and an
//! HMAC-SHA256 signature over both under the delivery signing key. The
//! gateway fronting the object store re-derives the signature to authorize
//! a download; nothing here talks to the network.

use crate::config::SecretString;
use crate::domain::errors::ApertureError;
use crate::domain::result::Result;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use secrecy::ExposeSecret;
use sha2::Sha256;
use url::Url;

type HmacSha256 = Hmac<Sha256>;

/// Builds and signs time-limited access URLs
pub struct UrlSigner {
    base_url: Url,
    signing_key: SecretString,
}

impl UrlSigner {
    /// Creates a signer for a delivery base URL
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the base URL does not parse.
    pub fn new(base_url: &str, signing_key: SecretString) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ApertureError::Configuration(format!("invalid delivery base URL: {e}")))?;
        Ok(Self {
            base_url,
            signing_key,
        })
    }

    /// Signs an access URL for an object key expiring at a Unix timestamp
    pub fn sign(&self, object_key: &str, expires_at: i64) -> Result<String> {
        let signature = self.signature_for(object_key, expires_at)?;

        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                ApertureError::Configuration("delivery base URL cannot carry a path".to_string())
            })?;
            for segment in object_key.split('/') {
                segments.push(segment);
            }
        }
        url.query_pairs_mut()
            .append_pair("expires", &expires_at.to_string())
            .append_pair("signature", &signature);
        Ok(url.into())
    }

    /// Verifies a signature produced by [`sign`](Self::sign)
    pub fn verify(&self, object_key: &str, expires_at: i64, signature: &str) -> bool {
        self.signature_for(object_key, expires_at)
            .map(|expected| expected == signature)
            .unwrap_or(false)
    }

    fn signature_for(&self, object_key: &str, expires_at: i64) -> Result<String> {
        let key = self.signing_key.expose_secret();
        let mut mac = HmacSha256::new_from_slice(key.as_ref().as_bytes())
            .map_err(|_| ApertureError::Delivery("signing key must not be empty".to_string()))?;
        mac.update(object_key.as_bytes());
        mac.update(b"\n");
        mac.update(expires_at.to_string().as_bytes());
        Ok(URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
    }
}
