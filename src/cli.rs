use anyhow::{anyhow, bail, Result};
use chrono::{NaiveDate, NaiveDateTime};
use clap::Parser;
use std::path::PathBuf;

use crate::range::DEFAULT_BASE_URL;

const EXAMPLES: &str = "\
Examples:
  gharchive-dl \"2024-01-01\" \"2024-01-02\"
  gharchive-dl \"2024-01-01 10:00:00\" \"2024-01-01 12:00:00\"
  gharchive-dl \"2024-01-01T10\" \"2024-01-01T12\" -w 20
  gharchive-dl \"2024-01-01\" \"2024-01-02\" -o /path/to/archives";

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Download GHArchive files between two datetime ranges",
    after_help = EXAMPLES
)]
pub struct Args {
    /// Start datetime (e.g. '2024-01-01' or '2024-01-01 10:00:00')
    pub start: String,

    /// End datetime (e.g. '2024-01-02' or '2024-01-01 12:00:00')
    pub end: String,

    /// Output directory
    #[arg(short = 'o', long = "output", default_value = "work/archives")]
    pub output: PathBuf,

    /// Number of parallel download workers
    #[arg(short = 'w', long, default_value_t = 10, value_parser = clap::value_parser!(u16).range(1..))]
    pub workers: u16,

    /// Attempts per file before giving up
    #[arg(short = 'r', long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..))]
    pub retries: u32,

    /// Archive host
    #[arg(long = "base-url", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Log debug output to stderr
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H",
];

/// Parse one of the accepted datetime spellings; a bare date means midnight.
pub fn parse_datetime(input: &str) -> Result<NaiveDateTime> {
    let input = input.trim();
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = parse_with(input, fmt) {
            return Ok(dt);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return Ok(dt);
        }
    }
    Err(anyhow!("Unable to parse datetime: {}", input))
}

// chrono refuses to build a datetime without minutes, so hour-only formats get ":00" appended.
fn parse_with(input: &str, fmt: &str) -> chrono::ParseResult<NaiveDateTime> {
    if fmt.ends_with("%H") {
        NaiveDateTime::parse_from_str(&format!("{}:00", input), &format!("{}:%M", fmt))
    } else {
        NaiveDateTime::parse_from_str(input, fmt)
    }
}

pub fn validate_range(start: NaiveDateTime, end: NaiveDateTime) -> Result<()> {
    if start > end {
        bail!("Start datetime must be before end datetime");
    }
    Ok(())
}
