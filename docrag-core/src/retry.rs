//! Retry with exponential backoff for transient failures.
//!
//! The policy is an explicit value passed into the components that talk to
//! remote services. Whether an error is retried is decided by
//! [`RagError::is_transient`]; exhaustion surfaces as
//! [`RagError::RetriesExhausted`] so callers can tell a spent budget apart
//! from a single fatal failure.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::{RagError, Result};

/// Attempt budget and backoff window for one class of remote calls.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first. 3 means two retries.
    pub max_attempts: u32,
    /// Delay after the first failed attempt; doubles per retry.
    pub base_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            max_delay,
        }
    }

    /// Policy for embedding API calls: 3 attempts, backoff 2s doubling,
    /// capped at 10s.
    pub fn embedding() -> Self {
        Self::new(3, Duration::from_secs(2), Duration::from_secs(10))
    }

    /// Policy for vector store writes and searches: 3 attempts, backoff 1s
    /// doubling, capped at 5s.
    pub fn store() -> Self {
        Self::new(3, Duration::from_secs(1), Duration::from_secs(5))
    }

    /// Delay to sleep after a failed attempt. `attempt` is 1-based, so the
    /// first retry waits `base_delay`, the next twice that, capped at
    /// `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }

    /// Run `call` until it succeeds, fails with a non-transient error, or
    /// the attempt budget is spent.
    pub async fn run<T, F, Fut>(&self, operation: &'static str, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1u32;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(err) if !err.is_transient() => return Err(err),
                Err(err) => {
                    if attempt >= self.max_attempts {
                        return Err(RagError::RetriesExhausted {
                            attempts: attempt,
                            last: Box::new(err),
                        });
                    }
                    let delay = self.delay_for(attempt);
                    warn!(
                        operation,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "transient failure, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn transient() -> RagError {
        RagError::Search {
            message: "backend unavailable".into(),
            transient: true,
        }
    }

    fn fatal() -> RagError {
        RagError::Search {
            message: "malformed query".into(),
            transient: false,
        }
    }

    #[test]
    fn delays_double_and_cap() {
        let embedding = RetryPolicy::embedding();
        assert_eq!(embedding.delay_for(1), Duration::from_secs(2));
        assert_eq!(embedding.delay_for(2), Duration::from_secs(4));
        assert_eq!(embedding.delay_for(5), Duration::from_secs(10));

        let store = RetryPolicy::store();
        assert_eq!(store.delay_for(1), Duration::from_secs(1));
        assert_eq!(store.delay_for(2), Duration::from_secs(2));
        assert_eq!(store.delay_for(4), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_without_retry() {
        let calls = AtomicU32::new(0);
        let result = RetryPolicy::embedding()
            .run("embed", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(42u32) }
            })
            .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_then_succeeds() {
        let calls = AtomicU32::new(0);
        let result = RetryPolicy::embedding()
            .run("embed", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(transient())
                    } else {
                        Ok("done")
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_after_exactly_three_attempts_with_growing_delay() {
        let calls = AtomicU32::new(0);
        let started = tokio::time::Instant::now();
        let result: Result<()> = RetryPolicy::embedding()
            .run("embed", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(transient()) }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result {
            Err(RagError::RetriesExhausted { attempts, last }) => {
                assert_eq!(attempts, 3);
                assert!(last.is_transient());
            }
            other => panic!("expected exhaustion, got {other:?}"),
        }
        // 2s after the first failure, 4s after the second.
        assert_eq!(started.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn fatal_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let started = tokio::time::Instant::now();
        let result: Result<()> = RetryPolicy::store()
            .run("upsert", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(fatal()) }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(RagError::Search { .. })));
        assert_eq!(started.elapsed(), Duration::ZERO);
    }
}
