use anyhow::{anyhow, Context, Result};
use tracing_subscriber::EnvFilter;

/// Diagnostics go to stderr alongside the progress bar. `RUST_LOG` wins over `verbose`.
pub fn init_logging(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .try_init()
        .map_err(|e| anyhow!("{}", e))
        .context("failed to initialise logging")
}
