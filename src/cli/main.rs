//! Merge service entry point
//!
//! Parses arguments (each with an environment fallback), installs the tracing
//! subscriber and runs the HTTP server until shutdown.

use super::config::CliConfigBuilder;
use crate::compose::StrategyKind;
use crate::config::{DEFAULT_BUCKET, DEFAULT_TARGET_WIDTH, DEFAULT_UPLOAD_PREFIX};
use crate::service::MergeService;
use crate::tracing_config::{init_service_tracing, TracingFormat};
use anyhow::{Context, Result};
use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use tracing::info;

/// Garment image merge service
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "garment-merge")]
pub struct Cli {
    /// Address to bind
    #[arg(long, env = "MERGE_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 4000)]
    pub port: u16,

    /// Shared secret expected in x-merge-api-key or Authorization: Bearer
    #[arg(long, env = "MERGE_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Supabase project URL
    #[arg(long, env = "SUPABASE_URL")]
    pub supabase_url: String,

    /// Supabase service-role key
    #[arg(long, env = "SUPABASE_SERVICE_ROLE_KEY", hide_env_values = true)]
    pub supabase_service_role_key: String,

    /// Storage bucket receiving results
    #[arg(long, env = "BUCKET_NAME", default_value = DEFAULT_BUCKET)]
    pub bucket: String,

    /// Key prefix for uploaded objects
    #[arg(long, env = "UPLOAD_PREFIX", default_value = DEFAULT_UPLOAD_PREFIX)]
    pub upload_prefix: String,

    /// Output canvas width in pixels
    #[arg(long, env = "TARGET_WIDTH", default_value_t = DEFAULT_TARGET_WIDTH)]
    pub target_width: u32,

    /// Composition strategy (stack, stack-rgba, fixed-aspect)
    #[arg(long, env = "COMPOSITION_STRATEGY", default_value_t = StrategyKind::FixedAspect)]
    pub strategy: StrategyKind,

    /// Lifetime of returned signed URLs, in seconds
    #[arg(long, env = "SIGNED_URL_TTL_SECS", default_value_t = 900)]
    pub signed_url_ttl_secs: u64,

    /// Per-download timeout, in seconds
    #[arg(long, env = "FETCH_TIMEOUT_SECS", default_value_t = 20)]
    pub fetch_timeout_secs: u64,

    /// Log output format (console, compact, json)
    #[arg(long, env = "LOG_FORMAT", default_value = "console")]
    pub log_format: TracingFormat,

    /// Enable verbose logging (-v: DEBUG, -vv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Main entry point for the service binary
pub async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_service_tracing(cli.verbose, cli.log_format)
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;

    let config = CliConfigBuilder::from_cli(&cli)?;
    info!(config = ?config, "configuration loaded");

    let service = MergeService::from_config(config).context("Failed to initialise merge service")?;
    crate::server::serve(service, cli.bind_addr())
        .await
        .context("Server failed")?;

    Ok(())
}
