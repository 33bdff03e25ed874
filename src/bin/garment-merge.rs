//! Garment Merge service binary
//!
//! Runs the HTTP merge service configured from arguments and environment.

#[cfg(feature = "cli")]
use garment_merge::cli;

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::main().await
}

#[cfg(not(feature = "cli"))]
fn main() {
    panic!("CLI feature not enabled. Please rebuild with --features cli");
}
