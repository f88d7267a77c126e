use chrono::{Duration, NaiveDateTime, Timelike};

pub const DEFAULT_BASE_URL: &str = "https://data.gharchive.org";

/// One hourly archive to fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkItem {
    pub url: String,
    pub bucket: NaiveDateTime,
}

pub fn truncate_to_hour(dt: NaiveDateTime) -> NaiveDateTime {
    dt.date()
        .and_hms_opt(dt.hour(), 0, 0)
        .unwrap_or(dt)
}

/// Archive URL for an hour bucket, e.g. `<base>/2024-01-01-9.json.gz`.
pub fn archive_url(base_url: &str, bucket: NaiveDateTime) -> String {
    format!(
        "{}/{}-{}.json.gz",
        base_url.trim_end_matches('/'),
        bucket.format("%Y-%m-%d"),
        bucket.hour()
    )
}

/// Every hour bucket from `start` (rounded down) up to and including the last bucket
/// that begins at or before `end`, in ascending order.
pub fn generate_work_items(base_url: &str, start: NaiveDateTime, end: NaiveDateTime) -> Vec<WorkItem> {
    let mut items = Vec::new();
    let mut current = truncate_to_hour(start);
    while current <= end {
        items.push(WorkItem {
            url: archive_url(base_url, current),
            bucket: current,
        });
        current += Duration::hours(1);
    }
    items
}
