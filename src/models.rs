use std::fmt;

use crate::utils::format_size;

/// Outcome of one work item. Exactly one is produced per item.
#[derive(Debug, Clone)]
pub struct DownloadResult {
    pub url: String,
    pub success: bool,
    pub message: String,
    pub bytes_transferred: u64,
}

impl DownloadResult {
    pub fn succeeded(url: String, message: String, bytes_transferred: u64) -> Self {
        Self {
            url,
            success: true,
            message,
            bytes_transferred,
        }
    }

    pub fn failed(url: String, message: String) -> Self {
        Self {
            url,
            success: false,
            message,
            bytes_transferred: 0,
        }
    }
}

/// Totals for a finished run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    pub total_items: usize,
    pub success_count: usize,
    pub fail_count: usize,
    pub total_bytes: u64,
    /// MiB
    pub total_downloaded: f64,
    pub elapsed_secs: f64,
    /// MiB/s
    pub average_speed: f64,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Download complete!")?;
        writeln!(f, "Successful: {}", self.success_count)?;
        writeln!(f, "Failed: {}", self.fail_count)?;
        writeln!(f, "Total: {}", self.total_items)?;
        writeln!(f, "Total downloaded: {}", format_size(self.total_downloaded))?;
        writeln!(f, "Total time: {:.1} seconds", self.elapsed_secs)?;
        write!(f, "Average speed: {:.1} MiB/s", self.average_speed)
    }
}
