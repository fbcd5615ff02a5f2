//! Rate-limit aware retry for provider calls.

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

pub const RATE_LIMIT_STATUS: u16 = 429;

/// Anything that may carry an HTTP-like status code.
pub trait RateLimitSignal {
    fn status_code(&self) -> Option<u16>;
}

pub fn is_rate_limited<E: RateLimitSignal + ?Sized>(error: &E) -> bool {
    error.status_code() == Some(RATE_LIMIT_STATUS)
}

/// Awaitable delay, injectable so tests can skip real waits.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Retries only on rate-limit signals, with delay `base_delay * 2^attempt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts = `max_retries + 1`.
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        RetryPolicy { max_retries, base_delay }
    }

    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Run `operation` until it succeeds, fails with anything other than a
    /// rate-limit signal, or the retry budget is spent.
    pub async fn run<T, E, F, Fut>(&self, sleeper: &dyn Sleeper, label: &str, mut operation: F) -> Result<T, E>
    where
        E: RateLimitSignal + std::fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if is_rate_limited(&e) && attempt < self.max_retries => {
                    let delay = self.delay_for_attempt(attempt);
                    warn!(
                        "{} rate limited (attempt {}/{}), retrying in {:?}",
                        label,
                        attempt + 1,
                        self.max_retries + 1,
                        delay
                    );
                    crate::observability::metrics::PROVIDER_RETRIES.inc();
                    sleeper.sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
