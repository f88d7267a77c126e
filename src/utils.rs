use url::Url;

use crate::error::FetchError;

/// Last path segment of `url_str`, used as the on-disk name.
pub fn get_filename_from_url(url_str: &str) -> Result<String, FetchError> {
    let url = Url::parse(url_str).map_err(|_| FetchError::BadUrl(url_str.to_string()))?;

    if let Some(segments) = url.path_segments() {
        if let Some(filename) = segments.last() {
            if !filename.is_empty() {
                return Ok(filename.to_string());
            }
        }
    }

    Err(FetchError::BadUrl(url_str.to_string()))
}

/// Human-readable size from a MiB figure; switches to GiB at 1024 MiB.
pub fn format_size(size_in_mib: f64) -> String {
    if size_in_mib < 1024.0 {
        format!("{:.1} MiB", size_in_mib)
    } else {
        format!("{:.1} GiB", size_in_mib / 1024.0)
    }
}
