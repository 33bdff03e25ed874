//! Configuration conversion utilities for CLI arguments

use crate::cli::main_impl::Cli;
use crate::config::ServiceConfig;
use anyhow::{Context, Result};
use std::time::Duration;

/// Convert CLI arguments to a validated `ServiceConfig`
pub(crate) struct CliConfigBuilder;

impl CliConfigBuilder {
    pub(crate) fn from_cli(cli: &Cli) -> Result<ServiceConfig> {
        ServiceConfig::builder()
            .api_key(cli.api_key.trim())
            .storage(cli.supabase_url.trim(), cli.supabase_service_role_key.trim())
            .bucket(cli.bucket.trim())
            .upload_prefix(cli.upload_prefix.trim())
            .target_width(cli.target_width)
            .strategy(cli.strategy)
            .signed_url_ttl(Duration::from_secs(cli.signed_url_ttl_secs))
            .fetch_timeout(Duration::from_secs(cli.fetch_timeout_secs))
            .build()
            .context("Invalid service configuration")
    }
}
