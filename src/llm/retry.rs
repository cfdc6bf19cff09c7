//! Bounded exponential-backoff retry.
//!
//! [`RetryPolicy::run`] re-invokes a whole async operation until it succeeds
//! or `max_attempts` is reached.  The delay before attempt *n* (n ≥ 2) is
//! `base_delay × 2^(n-2)`: with the defaults that is 1 s, then 2 s.
//!
//! Every failure is treated the same way.  An invalid credential or a
//! rate-limit response uses the full attempt budget just like a dropped
//! connection, and the last error is returned exactly as the operation
//! produced it.

use std::future::Future;
use std::time::Duration;

// ---------------------------------------------------------------------------
// RetryPolicy
// ---------------------------------------------------------------------------

/// Attempt budget and backoff base for one network call.
///
/// # Example
/// ```rust
/// use std::time::Duration;
/// use voice_memo::llm::RetryPolicy;
///
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.delay_before(2), Duration::from_millis(1000));
/// assert_eq!(policy.delay_before(3), Duration::from_millis(2000));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.  Values below 1 behave as 1.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles for each later attempt.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Single attempt, no sleeping.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Delay slept before `attempt` (1-based).  Zero for the first attempt.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt < 2 {
            return Duration::ZERO;
        }
        let factor = 1u32.checked_shl(attempt - 2).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Run `operation` until it succeeds or the attempt budget is spent.
    ///
    /// On exhaustion the error from the final attempt is returned unwrapped.
    pub async fn run<T, E, F, Fut>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt >= max_attempts => {
                    log::warn!("retry: giving up after {attempt} attempt(s): {err}");
                    return Err(err);
                }
                Err(err) => {
                    attempt += 1;
                    let delay = self.delay_before(attempt);
                    log::debug!(
                        "retry: attempt {} failed ({err}); retrying in {} ms",
                        attempt - 1,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
