//! Request pipeline shared by every HTTP endpoint
//!
//! `MergeService` owns the configuration and the two external collaborators
//! (image source and object store) and runs fetch → transform → upload → sign
//! with early return on the first failure. Nothing is retried and nothing is
//! rolled back: an object uploaded before a signing failure stays in storage.

use crate::compose::{CompositionStrategy, StrategyKind};
use crate::config::ServiceConfig;
use crate::error::{MergeError, Result};
use crate::fetch::{truncate_for_log, HttpImageFetcher, ImageSource};
use crate::storage::{ObjectStore, SupabaseStorage};
use crate::threshold;
use crate::types::{object_key, EncodedImage, ObjectKind, ThresholdParam};
use instant::Instant;
use std::sync::Arc;
use tracing::{info, instrument};

const PNG_CONTENT_TYPE: &str = "image/png";

/// Stateless merge pipeline; cheap to clone and share between requests
#[derive(Clone)]
pub struct MergeService {
    config: Arc<ServiceConfig>,
    source: Arc<dyn ImageSource>,
    store: Arc<dyn ObjectStore>,
    strategy: Arc<dyn CompositionStrategy>,
}

impl std::fmt::Debug for MergeService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MergeService")
            .field("config", &self.config)
            .field("strategy", &self.strategy.name())
            .finish_non_exhaustive()
    }
}

impl MergeService {
    /// Wire the service with injected collaborators
    pub fn new(config: ServiceConfig, source: Arc<dyn ImageSource>, store: Arc<dyn ObjectStore>) -> Self {
        let strategy = config.strategy.build();
        Self {
            config: Arc::new(config),
            source,
            store,
            strategy,
        }
    }

    /// Wire the service with the reqwest fetcher and Supabase storage
    ///
    /// # Errors
    /// - Invalid configuration
    /// - Failed to create HTTP clients
    pub fn from_config(config: ServiceConfig) -> Result<Self> {
        config.validate()?;
        let source = Arc::new(HttpImageFetcher::with_timeout(config.fetch_timeout)?);
        let store = Arc::new(SupabaseStorage::new(&config.storage)?);
        Ok(Self::new(config, source, store))
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn strategy_kind(&self) -> StrategyKind {
        self.config.strategy
    }

    pub fn api_key(&self) -> &str {
        &self.config.api_key
    }

    /// Download both garments, compose them, upload the PNG and sign it
    ///
    /// # Errors
    /// - `Validation` when either URL is empty
    /// - `Download`, `Composition` or `Storage` from the failing stage
    #[instrument(skip_all, fields(strategy = self.strategy.name()))]
    pub async fn merge_clothes(&self, upper_url: &str, lower_url: &str) -> Result<String> {
        if upper_url.trim().is_empty() || lower_url.trim().is_empty() {
            return Err(MergeError::validation("upperUrl and lowerUrl required"));
        }

        let start = Instant::now();
        info!(
            upper = %truncate_for_log(upper_url),
            lower = %truncate_for_log(lower_url),
            "processing merge request"
        );

        let (upper, lower) = futures::try_join!(self.source.fetch(upper_url), self.source.fetch(lower_url))?;
        info!(
            upper_bytes = upper.len(),
            lower_bytes = lower.len(),
            "images downloaded, merging"
        );

        let merged = self.compose(upper, lower).await?;
        let url = self.publish(merged, ObjectKind::Merged).await?;

        info!(elapsed_ms = start.elapsed().as_millis() as u64, "merge completed");
        Ok(url)
    }

    /// Download one image, threshold it, upload the PNG and sign it
    ///
    /// # Errors
    /// - `Validation` when the URL is empty
    /// - `Download`, `Threshold` or `Storage` from the failing stage
    #[instrument(skip_all, fields(threshold = threshold.value()))]
    pub async fn remove_background(&self, image_url: &str, threshold: ThresholdParam) -> Result<String> {
        if image_url.trim().is_empty() {
            return Err(MergeError::validation("imageUrl required"));
        }

        let start = Instant::now();
        info!(image = %truncate_for_log(image_url), "processing background removal request");

        let image = self.source.fetch(image_url).await?;
        let processed = tokio::task::spawn_blocking(move || threshold::remove_background(&image, threshold))
            .await
            .map_err(|e| MergeError::threshold(format!("worker task failed: {e}")))??;

        let url = self.publish(processed, ObjectKind::BackgroundRemoved).await?;
        info!(elapsed_ms = start.elapsed().as_millis() as u64, "background removal completed");
        Ok(url)
    }

    /// Run the configured strategy on the blocking pool
    pub async fn compose(&self, upper: EncodedImage, lower: EncodedImage) -> Result<EncodedImage> {
        let strategy = Arc::clone(&self.strategy);
        let target_width = self.config.target_width;
        tokio::task::spawn_blocking(move || strategy.compose(&upper, &lower, target_width))
            .await
            .map_err(|e| MergeError::composition(format!("worker task failed: {e}")))?
    }

    async fn publish(&self, image: EncodedImage, kind: ObjectKind) -> Result<String> {
        let key = object_key(&self.config.upload_prefix, kind);
        info!(key = %key, bytes = image.len(), "uploading image");

        self.store
            .upload(&self.config.bucket, &key, image.into_bytes(), PNG_CONTENT_TYPE, false)
            .await?;

        self.store
            .create_signed_url(&self.config.bucket, &key, self.config.signed_url_ttl)
            .await
    }
}
