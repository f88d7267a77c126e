use futures::TryStreamExt;
use reqwest::Client;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_util::io::StreamReader;
use tracing::debug;

use crate::error::{FetchError, RetryError};
use crate::models::DownloadResult;
use crate::range::WorkItem;
use crate::retry::{retry, RetryPolicy};
use crate::stats::DownloadStats;
use crate::utils::get_filename_from_url;

pub const CHUNK_SIZE: usize = 32 * 1024;
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub fn build_client(timeout: Duration) -> Client {
    Client::builder()
        .user_agent(concat!("gharchive-dl/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(timeout)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Fetches single archives into `output_dir`, reporting bytes into the shared stats.
pub struct Downloader {
    client: Client,
    output_dir: PathBuf,
    stats: Arc<DownloadStats>,
    policy: RetryPolicy,
    timeout: Duration,
}

impl Downloader {
    pub fn new(
        client: Client,
        output_dir: PathBuf,
        stats: Arc<DownloadStats>,
        policy: RetryPolicy,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            output_dir,
            stats,
            policy,
            timeout,
        }
    }

    pub async fn download_file(&self, item: &WorkItem) -> DownloadResult {
        let url = item.url.clone();
        let filename = match get_filename_from_url(&url) {
            Ok(name) => name,
            Err(e) => return DownloadResult::failed(url, format!("Error downloading {}: {}", item.url, e)),
        };
        let filepath = self.output_dir.join(&filename);

        if fs::try_exists(&filepath).await.unwrap_or(false) {
            debug!(file = %filename, bucket = %item.bucket, "already present, skipping");
            return DownloadResult::succeeded(url, format!("Already exists: {}", filename), 0);
        }

        let outcome = retry(&self.policy, |attempt| {
            debug!(file = %filename, attempt = attempt + 1, "requesting");
            self.fetch_once(&url, &filepath)
        })
        .await;

        match outcome {
            Ok(size) => {
                debug!(file = %filename, bytes = size, "downloaded");
                DownloadResult::succeeded(url, format!("Downloaded: {}", filename), size)
            }
            Err(RetryError::Exhausted { attempts, last }) => DownloadResult::failed(
                url,
                format!("Failed after {} attempts: {} - {}", attempts, filename, last),
            ),
            Err(RetryError::Terminal(e)) => {
                DownloadResult::failed(url, format!("Error downloading {}: {}", filename, e))
            }
        }
    }

    /// One attempt: request, then stream the body to `filepath` in fixed-size chunks.
    async fn fetch_once(&self, url: &str, filepath: &Path) -> Result<u64, FetchError> {
        let response = tokio::time::timeout(self.timeout, self.client.get(url).send())
            .await
            .map_err(|_| FetchError::Timeout(self.timeout))??
            .error_for_status()?;

        fs::create_dir_all(&self.output_dir).await?;

        let body = response
            .bytes_stream()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e));
        let reader = StreamReader::new(body);
        tokio::pin!(reader);
        let mut file = File::create(filepath).await?;
        let mut buffer = vec![0u8; CHUNK_SIZE];
        let mut downloaded_size: u64 = 0;

        loop {
            let n = read_chunk(&mut reader, &mut buffer, self.timeout).await?;
            if n == 0 {
                break;
            }
            file.write_all(&buffer[..n]).await?;
            self.stats.add_bytes(n as u64);
            downloaded_size += n as u64;
        }

        file.flush().await?;
        Ok(downloaded_size)
    }
}

/// Fill `buffer` as far as the stream allows; a short read only happens at end of body.
async fn read_chunk<R>(reader: &mut R, buffer: &mut [u8], timeout: Duration) -> Result<usize, FetchError>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buffer.len() {
        let n = tokio::time::timeout(timeout, reader.read(&mut buffer[filled..]))
            .await
            .map_err(|_| FetchError::Timeout(timeout))?
            .map_err(FetchError::Stream)?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}
