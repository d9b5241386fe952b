//! HTTP gateway object store
//!
//! Talks to a pre-authorized storage gateway over plain REST semantics:
//! GET/PUT on `{base}/{key}`, HEAD for existence, and `{base}?prefix=` for
//! listing (a JSON array of keys). Object metadata travels as
//! `x-aperture-meta-*` request headers.

use crate::adapters::storage::traits::{ObjectMetadata, ObjectStore};
use crate::config::SecretString;
use crate::domain::errors::StorageError;
use crate::domain::result::Result;
use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::ExposeSecret;

const META_HEADER_PREFIX: &str = "x-aperture-meta-";

/// HTTP-backed [`ObjectStore`]
pub struct HttpStore {
    base_url: String,
    client: reqwest::Client,
    bearer_token: Option<SecretString>,
}

impl HttpStore {
    /// Creates a store for a gateway base URL
    pub fn new(base_url: impl Into<String>, bearer_token: Option<SecretString>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            bearer_token,
        }
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.bearer_token {
            Some(token) => request.bearer_auth(token.expose_secret().as_ref()),
            None => request,
        }
    }

    fn transport_error(err: reqwest::Error) -> StorageError {
        StorageError::Unavailable(err.to_string())
    }

    fn status_error(status: StatusCode, key: &str) -> StorageError {
        StorageError::Gateway {
            status: status.as_u16(),
            message: format!("unexpected status for {key}"),
        }
    }
}

#[async_trait]
impl ObjectStore for HttpStore {
    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let response = self
            .authorize(self.client.get(self.object_url(key)))
            .send()
            .await
            .map_err(Self::transport_error)?;

        match response.status() {
            StatusCode::OK => {
                let bytes = response.bytes().await.map_err(Self::transport_error)?;
                Ok(bytes.to_vec())
            }
            StatusCode::NOT_FOUND => Err(StorageError::NotFound {
                key: key.to_string(),
            }
            .into()),
            status => Err(Self::status_error(status, key).into()),
        }
    }

    async fn put(&self, key: &str, bytes: Vec<u8>, metadata: ObjectMetadata) -> Result<()> {
        let mut request = self
            .authorize(self.client.put(self.object_url(key)))
            .body(bytes);
        for (name, value) in &metadata {
            request = request.header(format!("{META_HEADER_PREFIX}{name}"), value.as_str());
        }

        let response = request.send().await.map_err(Self::transport_error)?;
        if !response.status().is_success() {
            return Err(Self::status_error(response.status(), key).into());
        }
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let response = self
            .authorize(self.client.head(self.object_url(key)))
            .send()
            .await
            .map_err(Self::transport_error)?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(Self::status_error(status, key).into()),
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let response = self
            .authorize(self.client.get(&self.base_url).query(&[("prefix", prefix)]))
            .send()
            .await
            .map_err(Self::transport_error)?;

        if response.status() != StatusCode::OK {
            return Err(Self::status_error(response.status(), prefix).into());
        }

        let keys: Vec<String> = response.json().await.map_err(Self::transport_error)?;
        Ok(keys)
    }
}
