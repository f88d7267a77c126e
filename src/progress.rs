use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::stats::DownloadStats;
use crate::utils::format_size;

pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

pub fn progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::with_draw_target(Some(total), ProgressDrawTarget::stderr_with_hz(5));
    let style = ProgressStyle::default_bar()
        .template("{prefix}: {percent:>3}%|{wide_bar}| {pos}/{len} [{elapsed_precise}<{eta_precise}, {msg}]")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb.set_prefix("Downloading");
    pb
}

pub fn status_line(stats: &DownloadStats) -> String {
    format!(
        "{:.1} MiB/s, Total: {}",
        stats.speed(),
        format_size(stats.total_mib())
    )
}

/// Background task that samples the stats into the bar until stopped.
pub struct Reporter {
    stop: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl Reporter {
    pub fn spawn(pb: ProgressBar, stats: Arc<DownloadStats>, interval: Duration) -> Self {
        let (stop, mut stopped) = oneshot::channel();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                pb.set_message(status_line(&stats));
                tokio::select! {
                    _ = &mut stopped => break,
                    _ = ticker.tick() => {}
                }
            }
            pb.set_message(status_line(&stats));
        });
        Self { stop, handle }
    }

    /// Signal the loop and wait for it to render its last sample.
    pub async fn stop(self) {
        let _ = self.stop.send(());
        let _ = self.handle.await;
    }
}
