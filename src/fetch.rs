//! Source image downloading
//!
//! The pipeline only depends on the [`ImageSource`] trait; [`HttpImageFetcher`]
//! is the production implementation over `reqwest`.

use crate::error::{MergeError, Result};
use crate::types::EncodedImage;
use async_trait::async_trait;
use bytes::BytesMut;
use reqwest::header::ACCEPT;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// Hard limit for one source download
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(20);

/// Largest source image body accepted
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 32 * 1024 * 1024;

const ACCEPT_IMAGES: &str = "image/*, */*";
const LOG_URL_CHARS: usize = 50;

/// Anything that can produce the bytes behind an image URL
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Fetch the raw bytes of `url`
    ///
    /// # Errors
    ///
    /// Returns `MergeError::Download` on network failure, timeout or a
    /// non-success status.
    async fn fetch(&self, url: &str) -> Result<EncodedImage>;
}

/// Downloads images with a bounded timeout and body size
#[derive(Debug, Clone)]
pub struct HttpImageFetcher {
    client: Client,
    timeout: Duration,
    max_bytes: usize,
}

impl HttpImageFetcher {
    /// Create a fetcher with the default 20 second timeout
    ///
    /// # Errors
    /// - Failed to create HTTP client
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_FETCH_TIMEOUT)
    }

    /// Create a fetcher with a custom timeout
    ///
    /// # Errors
    /// - Failed to create HTTP client
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MergeError::internal(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            timeout,
            max_bytes: DEFAULT_MAX_IMAGE_BYTES,
        })
    }

    /// Cap the accepted body size
    #[must_use]
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    fn too_large(&self, url: &str, size: u64) -> MergeError {
        warn!(url = %truncate_for_log(url), size, limit = self.max_bytes, "image body too large");
        MergeError::download(format!(
            "image body of {size} bytes exceeds the {} byte limit",
            self.max_bytes
        ))
    }
}

#[async_trait]
impl ImageSource for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<EncodedImage> {
        debug!(url = %truncate_for_log(url), "downloading image");

        let mut response = self
            .client
            .get(url)
            .header(ACCEPT, ACCEPT_IMAGES)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| {
                warn!(url = %truncate_for_log(url), error = %e, "image download failed");
                MergeError::download(describe_reqwest_error(&e))
            })?;

        let limit = self.max_bytes as u64;
        if let Some(length) = response.content_length().filter(|&length| length > limit) {
            return Err(self.too_large(url, length));
        }

        // The cap also holds for chunked bodies without Content-Length
        let mut body = BytesMut::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| {
            warn!(url = %truncate_for_log(url), error = %e, "reading image body failed");
            MergeError::download(describe_reqwest_error(&e))
        })? {
            if (body.len() + chunk.len()) as u64 > limit {
                return Err(self.too_large(url, (body.len() + chunk.len()) as u64));
            }
            body.extend_from_slice(&chunk);
        }

        let image = EncodedImage::new(body.freeze());
        if image.is_empty() {
            return Err(MergeError::download("upstream returned an empty body"));
        }

        debug!(url = %truncate_for_log(url), bytes = image.len(), "downloaded image");
        Ok(image)
    }
}

fn describe_reqwest_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        format!("request timed out: {error}")
    } else if let Some(status) = error.status() {
        format!("upstream responded with status {status}")
    } else {
        error.to_string()
    }
}

/// First 50 characters of a URL, for log lines
pub fn truncate_for_log(url: &str) -> String {
    match url.char_indices().nth(LOG_URL_CHARS) {
        Some((idx, _)) => format!("{}...", url.get(..idx).unwrap_or(url)),
        None => url.to_string(),
    }
}
