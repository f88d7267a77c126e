use anyhow::Result;
use chrono::NaiveDateTime;
use futures::stream::{FuturesUnordered, StreamExt};
use reqwest::Client;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, info};

use crate::downloader::{build_client, Downloader, REQUEST_TIMEOUT};
use crate::models::{DownloadResult, Summary};
use crate::progress::{progress_bar, Reporter, POLL_INTERVAL};
use crate::range::{generate_work_items, WorkItem, DEFAULT_BASE_URL};
use crate::retry::RetryPolicy;
use crate::stats::DownloadStats;

#[derive(Debug, Clone)]
pub struct DownloadOptions {
    pub output_dir: PathBuf,
    pub workers: usize,
    pub base_url: String,
    pub retry: RetryPolicy,
    pub request_timeout: Duration,
    pub progress_interval: Duration,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("work/archives"),
            workers: 10,
            base_url: DEFAULT_BASE_URL.to_string(),
            retry: RetryPolicy::default(),
            request_timeout: REQUEST_TIMEOUT,
            progress_interval: POLL_INTERVAL,
        }
    }
}

pub async fn run_downloads(
    start: NaiveDateTime,
    end: NaiveDateTime,
    options: DownloadOptions,
) -> Result<Summary> {
    let items = generate_work_items(&options.base_url, start, end);

    if items.is_empty() {
        println!("No archives to download for the given date range.");
        return Ok(Summary::default());
    }

    println!("Found {} archives to download", items.len());
    println!("Date range: {} to {}", start, end);
    println!("Output directory: {}", options.output_dir.display());
    println!();

    let client = build_client(options.request_timeout);
    let summary = download_archives(items, &options, client).await;

    info!(
        succeeded = summary.success_count,
        failed = summary.fail_count,
        bytes = summary.total_bytes,
        "run finished"
    );
    println!();
    println!("{}", summary);
    Ok(summary)
}

/// Fetch every item through a pool of `options.workers` slots and tally the results.
pub async fn download_archives(
    items: Vec<WorkItem>,
    options: &DownloadOptions,
    client: Client,
) -> Summary {
    let total_items = items.len();
    if total_items == 0 {
        return Summary::default();
    }

    let stats = Arc::new(DownloadStats::new());
    let downloader = Arc::new(Downloader::new(
        client,
        options.output_dir.clone(),
        stats.clone(),
        options.retry.clone(),
        options.request_timeout,
    ));
    let workers = options.workers.max(1);
    let semaphore = Arc::new(Semaphore::new(workers));
    info!(items = total_items, workers, "starting downloads");

    let pb = progress_bar(total_items as u64);
    let reporter = Reporter::spawn(pb.clone(), stats.clone(), options.progress_interval);

    let mut pending = FuturesUnordered::new();
    for item in items {
        let downloader_clone = downloader.clone();
        let semaphore_clone = semaphore.clone();
        let url_for_log = item.url.clone();

        let handle = tokio::spawn(async move {
            let _permit = match semaphore_clone.acquire().await {
                Ok(permit) => permit,
                Err(_) => {
                    return DownloadResult::failed(item.url, "Worker pool closed".to_string())
                }
            };
            downloader_clone.download_file(&item).await
        });
        pending.push(async move { (url_for_log, handle.await) });
    }

    let mut success_count = 0;
    let mut fail_count = 0;
    while let Some((url, joined)) = pending.next().await {
        let result = joined.unwrap_or_else(|e| {
            DownloadResult::failed(url, format!("Worker crashed: {}", e))
        });

        if result.success {
            success_count += 1;
            debug!(url = %result.url, bytes = result.bytes_transferred, "{}", result.message);
        } else {
            fail_count += 1;
            debug!(url = %result.url, "download failed");
            pb.suspend(|| eprintln!("{}", result.message));
        }
        pb.inc(1);
    }

    reporter.stop().await;
    pb.finish();

    let elapsed_secs = stats.start_time().elapsed().as_secs_f64();
    let total_downloaded = stats.total_mib();
    let average_speed = if elapsed_secs > 0.0 {
        total_downloaded / elapsed_secs
    } else {
        0.0
    };

    Summary {
        total_items,
        success_count,
        fail_count,
        total_bytes: stats.total_bytes(),
        total_downloaded,
        elapsed_secs,
        average_speed,
    }
}
