//! Timeout + bounded retry wrapper used around every external call.
//!
//! Each attempt runs under `tokio::time::timeout`. Transient failures (timeouts,
//! connection errors, 429, 5xx) back off exponentially: base, 2×base, 4×base, …
//! Permanent failures return on the first attempt.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Errors that can flow through [`RetryPolicy::run`].
pub trait Retryable {
    /// Whether another attempt could plausibly succeed.
    fn is_transient(&self) -> bool;

    /// Builds the error reported when an attempt exceeds its time budget.
    fn timed_out(after: Duration) -> Self;
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    timeout: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, timeout: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            timeout,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    fn backoff(&self, attempt: u32) -> Duration {
        // attempt >= 1 here
        self.base_delay.saturating_mul(1u32 << (attempt - 1).min(16))
    }

    /// Runs `op` until it succeeds, fails permanently, or attempts run out.
    /// `what` names the call in log lines.
    pub async fn run<T, E, F, Fut>(&self, what: &str, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + Display,
    {
        let mut last_error: Option<E> = None;

        for attempt in 0..self.max_attempts {
            if attempt > 0 {
                let delay = self.backoff(attempt);
                warn!(
                    "{} attempt {} failed, retrying after {}ms...",
                    what,
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            match tokio::time::timeout(self.timeout, op()).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(e)) if !e.is_transient() => return Err(e),
                Ok(Err(e)) => {
                    warn!("{what} failed: {e}");
                    last_error = Some(e);
                }
                Err(_) => {
                    warn!("{what} timed out after {}s", self.timeout.as_secs_f32());
                    last_error = Some(E::timed_out(self.timeout));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| E::timed_out(self.timeout)))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[derive(Debug, PartialEq)]
    enum TestError {
        Flaky,
        Fatal,
        TimedOut,
    }

    impl Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{self:?}")
        }
    }

    impl Retryable for TestError {
        fn is_transient(&self) -> bool {
            !matches!(self, TestError::Fatal)
        }

        fn timed_out(_after: Duration) -> Self {
            TestError::TimedOut
        }
    }

    fn policy() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_millis(100), Duration::from_secs(1))
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_error_is_retried_until_success() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<u32, TestError> = policy()
            .run("flaky call", move || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(TestError::Flaky)
                } else {
                    Ok(n)
                }
            })
            .await;
        assert_eq!(result, Ok(2));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_error_stops_immediately() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), TestError> = policy()
            .run("fatal call", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(TestError::Fatal)
            })
            .await;
        assert_eq!(result, Err(TestError::Fatal));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_call_times_out_each_attempt() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), TestError> = policy()
            .run("hung call", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                std::future::pending::<Result<(), TestError>>().await
            })
            .await;
        assert_eq!(result, Err(TestError::TimedOut));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_backoff_doubles() {
        let p = policy();
        assert_eq!(p.backoff(1), Duration::from_millis(100));
        assert_eq!(p.backoff(2), Duration::from_millis(200));
        assert_eq!(p.backoff(3), Duration::from_millis(400));
    }

    #[test]
    fn test_zero_attempts_is_clamped_to_one() {
        let p = RetryPolicy::new(0, Duration::ZERO, Duration::from_secs(1));
        assert_eq!(p.max_attempts(), 1);
    }
}
