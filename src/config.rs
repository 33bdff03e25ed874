//! Configuration for the merge service

use crate::compose::layout::{MAX_TARGET_WIDTH, MIN_TARGET_WIDTH};
use crate::compose::StrategyKind;
use crate::error::{MergeError, Result};
use crate::fetch::DEFAULT_FETCH_TIMEOUT;
use crate::storage::{StorageConfig, DEFAULT_SIGNED_URL_TTL};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BUCKET: &str = "merged-images";
pub const DEFAULT_UPLOAD_PREFIX: &str = "merged";
pub const DEFAULT_TARGET_WIDTH: u32 = 1024;

/// Everything a [`crate::service::MergeService`] needs, loaded once at start
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Shared secret expected in `x-merge-api-key` or `Authorization: Bearer`
    pub api_key: String,

    /// Storage bucket receiving results
    pub bucket: String,

    /// Key prefix for uploaded objects
    pub upload_prefix: String,

    /// Output canvas width in pixels
    pub target_width: u32,

    /// Layout policy for `/merge-clothes`
    pub strategy: StrategyKind,

    /// Lifetime of returned signed URLs
    pub signed_url_ttl: Duration,

    /// Per-download timeout
    pub fetch_timeout: Duration,

    /// Object storage connection
    pub storage: StorageConfig,
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("api_key", &"<redacted>")
            .field("bucket", &self.bucket)
            .field("upload_prefix", &self.upload_prefix)
            .field("target_width", &self.target_width)
            .field("strategy", &self.strategy)
            .field("signed_url_ttl", &self.signed_url_ttl)
            .field("fetch_timeout", &self.fetch_timeout)
            .field("storage", &self.storage)
            .finish()
    }
}

impl ServiceConfig {
    #[must_use]
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::new()
    }

    /// Validate the configuration
    ///
    /// # Errors
    /// - Empty API key, bucket or storage URL
    /// - Target width outside the supported range
    /// - Zero TTL or timeout
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(MergeError::invalid_config("merge API key must not be empty"));
        }
        if self.bucket.trim().is_empty() {
            return Err(MergeError::invalid_config("bucket name must not be empty"));
        }
        if self.storage.url.trim().is_empty() {
            return Err(MergeError::invalid_config("storage URL must not be empty"));
        }
        if self.storage.service_key.trim().is_empty() {
            return Err(MergeError::invalid_config("storage service key must not be empty"));
        }
        if !(MIN_TARGET_WIDTH..=MAX_TARGET_WIDTH).contains(&self.target_width) {
            return Err(MergeError::config_value_error(
                "target width",
                self.target_width,
                &format!("{MIN_TARGET_WIDTH}-{MAX_TARGET_WIDTH}"),
            ));
        }
        if self.signed_url_ttl.is_zero() {
            return Err(MergeError::invalid_config("signed URL TTL must be positive"));
        }
        if self.fetch_timeout.is_zero() {
            return Err(MergeError::invalid_config("fetch timeout must be positive"));
        }
        Ok(())
    }
}

/// Builder for [`ServiceConfig`]
#[derive(Debug)]
pub struct ServiceConfigBuilder {
    config: ServiceConfig,
}

impl Default for ServiceConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: ServiceConfig {
                api_key: String::new(),
                bucket: DEFAULT_BUCKET.to_string(),
                upload_prefix: DEFAULT_UPLOAD_PREFIX.to_string(),
                target_width: DEFAULT_TARGET_WIDTH,
                strategy: StrategyKind::default(),
                signed_url_ttl: DEFAULT_SIGNED_URL_TTL,
                fetch_timeout: DEFAULT_FETCH_TIMEOUT,
                storage: StorageConfig {
                    url: String::new(),
                    service_key: String::new(),
                },
            },
        }
    }

    #[must_use]
    pub fn api_key<S: Into<String>>(mut self, api_key: S) -> Self {
        self.config.api_key = api_key.into();
        self
    }

    #[must_use]
    pub fn bucket<S: Into<String>>(mut self, bucket: S) -> Self {
        self.config.bucket = bucket.into();
        self
    }

    #[must_use]
    pub fn upload_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.config.upload_prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn target_width(mut self, width: u32) -> Self {
        self.config.target_width = width;
        self
    }

    #[must_use]
    pub fn strategy(mut self, strategy: StrategyKind) -> Self {
        self.config.strategy = strategy;
        self
    }

    #[must_use]
    pub fn signed_url_ttl(mut self, ttl: Duration) -> Self {
        self.config.signed_url_ttl = ttl;
        self
    }

    #[must_use]
    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.config.fetch_timeout = timeout;
        self
    }

    #[must_use]
    pub fn storage<U: Into<String>, K: Into<String>>(mut self, url: U, service_key: K) -> Self {
        self.config.storage = StorageConfig {
            url: url.into(),
            service_key: service_key.into(),
        };
        self
    }

    /// Build and validate
    ///
    /// # Errors
    /// See [`ServiceConfig::validate`].
    pub fn build(self) -> Result<ServiceConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
