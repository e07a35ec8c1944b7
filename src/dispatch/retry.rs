//! Retry with exponential backoff
//!
//! Used for external actions and anything else that talks to a
//! rate-limited remote. The curve is base * 2^(attempt-1).

use std::future::Future;
use std::time::Duration;

use log::warn;

/// Retry settings
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts (1 = no retry)
    pub attempts: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { attempts: 3, base_delay: Duration::from_millis(500) }
    }
}

impl RetryPolicy {
    /// Delay before the given retry (1-based)
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(retry.saturating_sub(1)))
    }
}

/// Run `op` until it succeeds or attempts are exhausted
///
/// The last error is returned when every attempt failed; intermediate
/// failures are logged, not surfaced.
pub async fn with_backoff<T, F, Fut>(
    policy: RetryPolicy,
    what: &str,
    mut op: F,
) -> anyhow::Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let attempts = policy.attempts.max(1);
    let mut last_err = None;
    for attempt in 1..=attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                warn!("{what} failed (attempt {attempt}/{attempts}): {err}");
                last_err = Some(err);
                if attempt < attempts {
                    tokio::time::sleep(policy.delay_for(attempt)).await;
                }
            }
        }
    }
    Err(last_err.unwrap_or_else(|| anyhow::anyhow!("{what} failed")))
}
