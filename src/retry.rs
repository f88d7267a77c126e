use std::future::Future;
use std::time::Duration;
use tracing::debug;

use crate::error::{FetchError, RetryError};

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Wait before the attempt following attempt `k` (0-indexed): `base * 2^k`.
    pub fn delay(&self, k: u32) -> Duration {
        self.base_delay.saturating_mul(2_u32.saturating_pow(k))
    }
}

enum State {
    Attempting(u32),
    Backoff(u32),
}

/// Run `op` until it succeeds, fails terminally, or the policy's attempts run out.
///
/// `op` receives the 0-based attempt index. No sleep follows the last attempt.
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, RetryError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut state = State::Attempting(0);

    loop {
        state = match state {
            State::Attempting(k) => match op(k).await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_retryable() => return Err(RetryError::Terminal(e)),
                Err(e) if k + 1 >= max_attempts => {
                    return Err(RetryError::Exhausted {
                        attempts: max_attempts,
                        last: e,
                    })
                }
                Err(e) => {
                    debug!(attempt = k + 1, error = %e, "attempt failed");
                    State::Backoff(k)
                }
            },
            State::Backoff(k) => {
                let wait = policy.delay(k);
                debug!(?wait, "backing off");
                tokio::time::sleep(wait).await;
                State::Attempting(k + 1)
            }
        };
    }
}
