//! Threadkeep CLI binary.

use anyhow::Result;
use threadkeep::cli::Cli;
use tracing_subscriber::EnvFilter;

/// Main entry point for the threadkeep CLI.
///
/// Uses tokio's current_thread runtime; SQLite work is moved to the blocking
/// pool, so one runtime thread is enough.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Logs go to stderr so JSON output on stdout stays parseable.
    // Example: RUST_LOG=threadkeep=debug threadkeep post list
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("threadkeep=info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    tracing::debug!("Starting threadkeep CLI");

    let cli = Cli::parse_args();
    cli.execute().await?;

    tracing::debug!("Threadkeep CLI completed successfully");
    Ok(())
}
