//! Retry policy and executor for backend model calls.
//!
//! Classification is status-driven: 429 retries under `retry_on_rate_limit`,
//! 5xx under `retry_on_server_error`, 408 and status-less transport failures
//! under `retry_on_timeout`. Everything else fails fast. Delays grow
//! exponentially up to `max_delay`, except that a server-provided
//! `retry_after` hint is honored verbatim.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::error::OrchestratorError;

/// Retry configuration for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the initial attempt; 2 allows up to three calls total.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on computed delays.
    pub max_delay: Duration,
    /// Growth factor between consecutive delays.
    pub backoff_multiplier: f64,
    /// Randomize each computed delay downward to spread out retries.
    pub jitter: bool,
    /// Retry HTTP 429.
    pub retry_on_rate_limit: bool,
    /// Retry HTTP 5xx.
    pub retry_on_server_error: bool,
    /// Retry HTTP 408 and transport failures without a status.
    pub retry_on_timeout: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryPolicy {
    /// Default policy: two retries, 1s initial delay doubling up to 60s,
    /// jitter on, all retryable classes enabled.
    pub const fn new() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(60),
            backoff_multiplier: 2.0,
            jitter: true,
            retry_on_rate_limit: true,
            retry_on_server_error: true,
            retry_on_timeout: true,
        }
    }

    /// Policy that never retries.
    pub const fn none() -> Self {
        let mut policy = Self::new();
        policy.max_retries = 0;
        policy
    }

    /// Set the retry count.
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the delay before the first retry.
    pub const fn with_initial_delay(mut self, initial_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self
    }

    /// Set the delay cap.
    pub const fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Set the backoff growth factor.
    pub const fn with_backoff_multiplier(mut self, backoff_multiplier: f64) -> Self {
        self.backoff_multiplier = backoff_multiplier;
        self
    }

    /// Enable or disable jitter.
    pub const fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Enable or disable retrying HTTP 429.
    pub const fn with_retry_on_rate_limit(mut self, enabled: bool) -> Self {
        self.retry_on_rate_limit = enabled;
        self
    }

    /// Enable or disable retrying HTTP 5xx.
    pub const fn with_retry_on_server_error(mut self, enabled: bool) -> Self {
        self.retry_on_server_error = enabled;
        self
    }

    /// Enable or disable retrying timeouts and transport failures.
    pub const fn with_retry_on_timeout(mut self, enabled: bool) -> Self {
        self.retry_on_timeout = enabled;
        self
    }

    /// Decide whether attempt `attempt` (0-based) may be retried given the
    /// failure's HTTP status. `None` means a transport-level failure with no
    /// status, which falls under the timeout class.
    pub fn should_retry(&self, attempt: u32, status: Option<u16>) -> bool {
        if attempt >= self.max_retries {
            return false;
        }
        match status {
            Some(429) => self.retry_on_rate_limit,
            Some(408) | None => self.retry_on_timeout,
            Some(code) if (500..=599).contains(&code) => self.retry_on_server_error,
            Some(_) => false,
        }
    }

    /// Delay before retrying attempt `attempt` (0-based). A server hint is
    /// used verbatim, even beyond `max_delay`.
    pub fn delay(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        if let Some(hint) = retry_after {
            return hint;
        }
        let exp = self.initial_delay.as_millis() as f64 * self.backoff_multiplier.powi(attempt as i32);
        let capped = Duration::from_millis(exp.min(self.max_delay.as_millis() as f64) as u64);
        if self.jitter {
            add_jitter(capped)
        } else {
            capped
        }
    }
}

/// Scale a delay into [50%, 100%] of the computed bound.
fn add_jitter(delay: Duration) -> Duration {
    let factor = rand::thread_rng().gen_range(0.5..=1.0);
    delay.mul_f64(factor)
}

/// Run `operation` until it succeeds, the error is not retryable, or the
/// policy's attempt budget runs out. Sleeps between attempts per
/// [`RetryPolicy::delay`].
pub async fn execute_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, OrchestratorError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, OrchestratorError>>,
{
    let mut attempt: u32 = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !err.is_retryable() || !policy.should_retry(attempt, err.status_code()) {
                    return Err(err);
                }
                let delay = policy.delay(attempt, err.retry_after());
                tracing::warn!(
                    attempt = attempt + 1,
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "retrying model call"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
