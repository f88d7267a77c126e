mod cli;
mod commands;
mod downloader;
mod error;
mod logging;
mod models;
mod progress;
mod range;
mod retry;
mod stats;
mod utils;

#[cfg(test)]
mod test_server;

use anyhow::{Context, Result};
use clap::Parser;

use crate::cli::{parse_datetime, validate_range, Args};
use crate::commands::DownloadOptions;
use crate::retry::RetryPolicy;

fn main() -> Result<()> {
    let args = Args::parse();
    crate::logging::init_logging(args.verbose)?;

    // Input errors surface before any runtime or network work starts.
    let start = parse_datetime(&args.start)?;
    let end = parse_datetime(&args.end)?;
    validate_range(start, end)?;

    let options = DownloadOptions {
        output_dir: args.output,
        workers: usize::from(args.workers),
        base_url: args.base_url,
        retry: RetryPolicy {
            max_attempts: args.retries,
            ..RetryPolicy::default()
        },
        ..DownloadOptions::default()
    };

    let rt = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    rt.block_on(async {
        tokio::select! {
            summary = crate::commands::run_downloads(start, end, options) => summary.map(|_| ()),
            _ = tokio::signal::ctrl_c() => {
                eprintln!("\nDownload interrupted by user");
                std::process::exit(1);
            }
        }
    })
}
