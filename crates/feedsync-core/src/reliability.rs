//! Retry policies
//!
//! Declarative retry for async operations. A [`RetryPolicy`] bounds the total
//! number of invocations and picks a [`Backoff`] between them. The attempt
//! count is deterministic: an always-failing operation under a policy of
//! `max_attempts = 3` runs exactly three times.
//!
//! Errors decide for themselves whether another attempt is worthwhile through
//! [`RetryableError`]. Cancellation short-circuits the loop without sleeping,
//! and dropping the returned future stops it at the next suspension point.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// Classification hook consulted by [`RetryPolicy`] after each failure.
pub trait RetryableError {
    /// Whether another attempt may succeed.
    fn is_retryable(&self) -> bool;

    /// Whether the failure is a cancellation of the surrounding task.
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Delay schedule between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Backoff {
    /// Retry immediately
    None,
    /// Same delay before every retry
    Fixed(Duration),
    /// `base * 2^retry`, capped at `max`
    Exponential {
        /// Delay before the first retry
        base: Duration,
        /// Upper bound for any single delay
        max: Duration,
    },
    /// Exponential with up to 10% random jitter, capped at `max`
    ExponentialWithJitter {
        /// Delay before the first retry
        base: Duration,
        /// Upper bound for any single delay
        max: Duration,
    },
}

impl Backoff {
    /// Delay before retry number `retry` (zero-based: 0 precedes the second attempt).
    pub fn delay(&self, retry: u32) -> Duration {
        match *self {
            Backoff::None => Duration::ZERO,
            Backoff::Fixed(delay) => delay,
            Backoff::Exponential { base, max } => exponential(base, retry).min(max),
            Backoff::ExponentialWithJitter { base, max } => {
                use rand::Rng;

                let delay = exponential(base, retry);
                let jitter = (delay.as_millis() as f64 * 0.1 * rand::thread_rng().gen::<f64>()) as u64;
                (delay + Duration::from_millis(jitter)).min(max)
            }
        }
    }
}

fn exponential(base: Duration, retry: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(retry))
}

/// Retry policy configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total number of invocations, including the first (values below 1 act as 1)
    pub max_attempts: u32,
    /// Delay schedule between attempts
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// Three attempts with exponential backoff from 100ms, capped at 2s.
    pub fn exponential() -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::Exponential {
                base: Duration::from_millis(100),
                max: Duration::from_secs(2),
            },
        }
    }

    /// Three attempts with a fixed delay.
    pub fn fixed(delay: Duration) -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::Fixed(delay),
        }
    }

    /// A single attempt.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            backoff: Backoff::None,
        }
    }

    /// Set the total number of attempts
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Replace the backoff schedule
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Enable or disable jitter on an exponential schedule
    pub fn with_jitter(mut self, enable: bool) -> Self {
        self.backoff = match (self.backoff, enable) {
            (Backoff::Exponential { base, max }, true) => {
                Backoff::ExponentialWithJitter { base, max }
            }
            (Backoff::ExponentialWithJitter { base, max }, false) => {
                Backoff::Exponential { base, max }
            }
            (other, _) => other,
        };
        self
    }

    /// Execute an async operation under this policy.
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: RetryableError,
    {
        self.execute_with_context(operation).await.result
    }

    /// Execute an async operation and report how many attempts it took.
    pub async fn execute_with_context<F, Fut, T, E>(&self, mut operation: F) -> RetryOutcome<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: RetryableError,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempts = 0;
        let mut total_backoff = Duration::ZERO;

        loop {
            attempts += 1;
            match operation().await {
                Ok(value) => {
                    return RetryOutcome {
                        result: Ok(value),
                        attempts,
                        total_backoff,
                    };
                }
                Err(err) => {
                    if err.is_cancelled() || !err.is_retryable() || attempts >= max_attempts {
                        return RetryOutcome {
                            result: Err(err),
                            attempts,
                            total_backoff,
                        };
                    }

                    let delay = self.backoff.delay(attempts - 1);
                    tracing::trace!(attempt = attempts, ?delay, "attempt failed, backing off");
                    total_backoff += delay;
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::exponential()
    }
}

/// Result of a retried operation with statistics
#[derive(Debug, Clone)]
pub struct RetryOutcome<T, E> {
    /// Final result (success or last failure)
    pub result: Result<T, E>,
    /// Number of invocations made
    pub attempts: u32,
    /// Total time spent sleeping between attempts
    pub total_backoff: Duration,
}

impl<T, E> RetryOutcome<T, E> {
    /// Check if the operation eventually succeeded
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Get the result
    pub fn into_result(self) -> Result<T, E> {
        self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FeedsError;
    use assert_matches::assert_matches;

    #[test]
    fn exponential_delay_is_capped() {
        let backoff = Backoff::Exponential {
            base: Duration::from_millis(100),
            max: Duration::from_millis(350),
        };
        assert_eq!(backoff.delay(0), Duration::from_millis(100));
        assert_eq!(backoff.delay(1), Duration::from_millis(200));
        assert_eq!(backoff.delay(2), Duration::from_millis(350));
        assert_eq!(backoff.delay(40), Duration::from_millis(350));
    }

    #[test]
    fn jitter_stays_within_bounds() {
        let backoff = Backoff::ExponentialWithJitter {
            base: Duration::from_millis(100),
            max: Duration::from_secs(10),
        };
        for _ in 0..50 {
            let delay = backoff.delay(1);
            assert!(delay >= Duration::from_millis(200));
            assert!(delay <= Duration::from_millis(220));
        }
    }

    #[test]
    fn with_jitter_toggles_exponential_only() {
        let policy = RetryPolicy::exponential().with_jitter(true);
        assert_matches!(policy.backoff, Backoff::ExponentialWithJitter { .. });
        let policy = RetryPolicy::fixed(Duration::from_millis(5)).with_jitter(true);
        assert_eq!(policy.backoff, Backoff::Fixed(Duration::from_millis(5)));
    }

    #[tokio::test(start_paused = true)]
    async fn always_failing_operation_runs_exactly_max_attempts() {
        let mut calls = 0u32;
        let outcome = RetryPolicy::exponential()
            .with_max_attempts(3)
            .execute_with_context(|| {
                calls += 1;
                async { Err::<(), _>(FeedsError::network("down")) }
            })
            .await;

        assert_eq!(calls, 3);
        assert_eq!(outcome.attempts, 3);
        assert_eq!(outcome.result, Err(FeedsError::network("down")));
        assert_eq!(outcome.total_backoff, Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failures() {
        let mut calls = 0u32;
        let result = RetryPolicy::fixed(Duration::from_millis(10))
            .execute(|| {
                calls += 1;
                let attempt = calls;
                async move {
                    if attempt < 2 {
                        Err(FeedsError::network("flaky"))
                    } else {
                        Ok(attempt)
                    }
                }
            })
            .await;

        assert_eq!(result, Ok(2));
        assert_eq!(calls, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_and_cancelled_failures_are_not_retried() {
        for err in [FeedsError::not_found("gone"), FeedsError::Cancelled] {
            let mut calls = 0u32;
            let expected = err.clone();
            let result = RetryPolicy::exponential()
                .with_max_attempts(5)
                .execute(|| {
                    calls += 1;
                    let err = err.clone();
                    async move { Err::<(), _>(err) }
                })
                .await;
            assert_eq!(calls, 1);
            assert_eq!(result, Err(expected));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn zero_attempts_still_runs_once() {
        let mut calls = 0u32;
        let _ = RetryPolicy::none()
            .with_max_attempts(0)
            .execute(|| {
                calls += 1;
                async { Err::<(), _>(FeedsError::network("down")) }
            })
            .await;
        assert_eq!(calls, 1);
    }
}
