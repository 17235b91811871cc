//! Client for the external image-hosting provider.
//!
//! The provider owns blob lifetime; this module only speaks its HTTP API.
//! Handlers never touch it directly — `ImageService` coordinates it with the
//! metadata store. The trait boundary exists so tests can swap in an
//! in-memory double.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use serde::Deserialize;
use sha1::{Digest, Sha1};
use thiserror::Error;
use tracing::debug;

/// Result of a successful blob upload.
#[derive(Debug, Clone)]
pub struct StoredBlob {
    /// Publicly resolvable URL of the blob.
    pub url: String,
    /// Provider-internal identifier, needed for later deletion.
    pub public_id: String,
}

#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("provider rejected request ({status}): {message}")]
    Provider { status: u16, message: String },
    #[error("provider returned an unreadable response: {0}")]
    MalformedResponse(String),
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

pub type ObjectStoreResult<T> = Result<T, ObjectStoreError>;

/// Remote blob storage as seen by this service: upload bytes, delete by id.
///
/// No partial-failure coordination happens here. A caller that uploads and
/// then fails to persist metadata is responsible for any compensating
/// delete it wants to attempt.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload a blob under `folder`, returning its URL and provider id.
    async fn upload(
        &self,
        folder: &str,
        content_type: &str,
        data: Bytes,
    ) -> ObjectStoreResult<StoredBlob>;

    /// Delete a blob by its provider id. Deleting an already-absent blob is
    /// surfaced as a provider error, not silently swallowed.
    async fn delete(&self, public_id: &str) -> ObjectStoreResult<()>;
}

/// Cloudinary-backed implementation of [`ObjectStore`].
///
/// Uses the signed upload API: each request carries the sorted parameter
/// string hashed with SHA-1 and the account secret.
#[derive(Clone)]
pub struct CloudinaryClient {
    http: reqwest::Client,
    cloud_name: String,
    api_key: String,
    api_secret: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

impl CloudinaryClient {
    pub fn new(cloud_name: String, api_key: String, api_secret: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            cloud_name,
            api_key,
            api_secret,
        }
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "https://api.cloudinary.com/v1_1/{}/image/{}",
            self.cloud_name, action
        )
    }

    /// Sign request parameters the way the provider expects: parameters
    /// sorted by key, joined as `k=v` pairs with `&`, secret appended, the
    /// whole string hashed with SHA-1 and hex-encoded.
    fn sign(&self, params: &[(&str, &str)]) -> String {
        let mut sorted: Vec<_> = params.to_vec();
        sorted.sort_by_key(|(k, _)| *k);
        let to_sign = sorted
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha1::new();
        hasher.update(to_sign.as_bytes());
        hasher.update(self.api_secret.as_bytes());
        hex::encode(hasher.finalize())
    }

    async fn read_provider_error(response: reqwest::Response) -> ObjectStoreError {
        let status = response.status().as_u16();
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "no response body".into());
        ObjectStoreError::Provider { status, message }
    }
}

#[async_trait]
impl ObjectStore for CloudinaryClient {
    async fn upload(
        &self,
        folder: &str,
        content_type: &str,
        data: Bytes,
    ) -> ObjectStoreResult<StoredBlob> {
        let timestamp = Utc::now().timestamp().to_string();
        let signature = self.sign(&[("folder", folder), ("timestamp", &timestamp)]);

        let file_part = reqwest::multipart::Part::bytes(data.to_vec())
            .file_name("image")
            .mime_str(content_type)?;
        let form = reqwest::multipart::Form::new()
            .part("file", file_part)
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", folder.to_string())
            .text("signature", signature);

        let response = self
            .http
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::read_provider_error(response).await);
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|err| ObjectStoreError::MalformedResponse(err.to_string()))?;

        debug!(public_id = %body.public_id, "uploaded blob to provider");
        Ok(StoredBlob {
            url: body.secure_url,
            public_id: body.public_id,
        })
    }

    async fn delete(&self, public_id: &str) -> ObjectStoreResult<()> {
        let timestamp = Utc::now().timestamp().to_string();
        let signature = self.sign(&[("public_id", public_id), ("timestamp", &timestamp)]);

        let form = reqwest::multipart::Form::new()
            .text("public_id", public_id.to_string())
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp)
            .text("signature", signature);

        let response = self
            .http
            .post(self.endpoint("destroy"))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::read_provider_error(response).await);
        }

        let body: DestroyResponse = response
            .json()
            .await
            .map_err(|err| ObjectStoreError::MalformedResponse(err.to_string()))?;

        // The destroy API reports "not found" with HTTP 200.
        if body.result != "ok" {
            return Err(ObjectStoreError::Provider {
                status: 200,
                message: format!("destroy returned `{}`", body.result),
            });
        }

        debug!(public_id, "deleted blob from provider");
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> CloudinaryClient {
        CloudinaryClient::new("demo".into(), "key123".into(), "secret456".into())
    }

    #[test]
    fn signature_is_hex_sha1_sized_and_deterministic() {
        let c = client();
        let a = c.sign(&[("folder", "simple-image-crud"), ("timestamp", "1700000000")]);
        let b = c.sign(&[("timestamp", "1700000000"), ("folder", "simple-image-crud")]);

        // Parameter order must not matter; the provider sorts by key.
        assert_eq!(a, b);
        assert_eq!(a.len(), 40);
        assert!(a.chars().all(|ch| ch.is_ascii_hexdigit()));
    }

    #[test]
    fn signature_depends_on_secret() {
        let a = client().sign(&[("timestamp", "1700000000")]);
        let other = CloudinaryClient::new("demo".into(), "key123".into(), "other".into());
        let b = other.sign(&[("timestamp", "1700000000")]);
        assert_ne!(a, b);
    }

    #[test]
    fn endpoint_embeds_cloud_name() {
        assert_eq!(
            client().endpoint("upload"),
            "https://api.cloudinary.com/v1_1/demo/image/upload"
        );
    }
}
