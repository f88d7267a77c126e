use std::io;
use std::time::Duration;
use thiserror::Error;

/// Failure of a single attempt to fetch one archive.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection dropped: {0}")]
    Stream(io::Error),

    #[error("{0}")]
    Io(#[from] io::Error),

    #[error("no filename in url: {0}")]
    BadUrl(String),
}

impl FetchError {
    /// Network-side failures are worth another attempt; local ones are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FetchError::Http(_) | FetchError::Timeout(_) | FetchError::Stream(_)
        )
    }
}

#[derive(Debug, Error)]
pub enum RetryError {
    #[error("failed after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: FetchError },

    #[error(transparent)]
    Terminal(FetchError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_io_is_terminal() {
        let err = FetchError::from(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        assert!(!err.is_retryable());
        assert!(!FetchError::BadUrl("https://host/".into()).is_retryable());
    }

    #[test]
    fn network_side_is_retryable() {
        assert!(FetchError::Timeout(Duration::from_secs(30)).is_retryable());
        let dropped = io::Error::new(io::ErrorKind::ConnectionReset, "reset");
        assert!(FetchError::Stream(dropped).is_retryable());
    }

    #[test]
    fn exhausted_names_attempts_and_cause() {
        let err = RetryError::Exhausted {
            attempts: 3,
            last: FetchError::Timeout(Duration::from_secs(30)),
        };
        assert_eq!(err.to_string(), "failed after 3 attempts: timed out after 30s");
    }
}
