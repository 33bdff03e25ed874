//! Object storage collaborator
//!
//! The pipeline talks to storage through [`ObjectStore`]. [`SupabaseStorage`]
//! implements it against the Supabase storage REST API.

use crate::error::{MergeError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

/// Signed URL lifetime used when configuration does not override it
pub const DEFAULT_SIGNED_URL_TTL: Duration = Duration::from_secs(15 * 60);

/// Upload and sign operations the pipeline needs from object storage
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under `key`
    ///
    /// # Errors
    ///
    /// Returns `MergeError::Storage` when the service rejects the upload.
    async fn upload(&self, bucket: &str, key: &str, bytes: Bytes, content_type: &str, upsert: bool) -> Result<()>;

    /// Issue a time-limited download URL for an existing object
    ///
    /// # Errors
    ///
    /// Returns `MergeError::Storage` when the service refuses to sign.
    async fn create_signed_url(&self, bucket: &str, key: &str, ttl: Duration) -> Result<String>;
}

/// Connection settings for a Supabase project
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Project base URL, e.g. `https://xyz.supabase.co`
    pub url: String,
    /// Service-role key sent as bearer token and `apikey`
    pub service_key: String,
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("url", &self.url)
            .field("service_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct SignRequest {
    #[serde(rename = "expiresIn")]
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct SignResponse {
    #[serde(rename = "signedURL", alias = "signedUrl")]
    signed_url: String,
}

/// Supabase storage client
#[derive(Debug, Clone)]
pub struct SupabaseStorage {
    client: Client,
    base_url: String,
    service_key: String,
}

impl SupabaseStorage {
    /// # Errors
    /// - Failed to create HTTP client
    pub fn new(config: &StorageConfig) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| MergeError::internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            service_key: config.service_key.clone(),
        })
    }

    fn object_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, bucket, key)
    }

    fn sign_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/storage/v1/object/sign/{}/{}", self.base_url, bucket, key)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header(AUTHORIZATION, format!("Bearer {}", self.service_key))
            .header("apikey", &self.service_key)
    }

    /// Turn the relative `signedURL` into an absolute download link
    fn absolute_signed_url(&self, signed: &str) -> String {
        if signed.starts_with("http://") || signed.starts_with("https://") {
            signed.to_string()
        } else {
            format!("{}/storage/v1/{}", self.base_url, signed.trim_start_matches('/'))
        }
    }
}

async fn reject(operation: &str, response: reqwest::Response) -> MergeError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    error!(operation, status = %status, body = %body, "storage request rejected");
    MergeError::storage_status_error(operation, status.as_u16(), &body)
}

#[async_trait]
impl ObjectStore for SupabaseStorage {
    async fn upload(&self, bucket: &str, key: &str, bytes: Bytes, content_type: &str, upsert: bool) -> Result<()> {
        let size = bytes.len();
        let response = self
            .authorized(self.client.post(self.object_url(bucket, key)))
            .header(CONTENT_TYPE, content_type)
            .header("x-upsert", if upsert { "true" } else { "false" })
            .body(bytes)
            .send()
            .await
            .map_err(|e| MergeError::storage(format!("upload request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(reject("upload", response).await);
        }

        debug!(bucket, key, size, "uploaded object");
        Ok(())
    }

    async fn create_signed_url(&self, bucket: &str, key: &str, ttl: Duration) -> Result<String> {
        let response = self
            .authorized(self.client.post(self.sign_url(bucket, key)))
            .json(&SignRequest {
                expires_in: ttl.as_secs(),
            })
            .send()
            .await
            .map_err(|e| MergeError::storage(format!("sign request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(reject("sign", response).await);
        }

        let signed: SignResponse = response
            .json()
            .await
            .map_err(|e| MergeError::storage(format!("malformed sign response: {e}")))?;

        debug!(bucket, key, ttl_secs = ttl.as_secs(), "created signed url");
        Ok(self.absolute_signed_url(&signed.signed_url))
    }
}
