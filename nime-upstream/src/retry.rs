//! Bounded retry on rate limiting.
//!
//! A fixed wait between attempts and a hard cap on the number of attempts.
//! The metadata API resets its rate window about once a second.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use nime_core::constants::{DEFAULT_MAX_RETRIES, RETRY_INTERVAL_MS};
use nime_core::error::{NimeError, Result};

/// Fixed-interval retry policy for [`NimeError::RateLimited`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, the first one included
    pub max_retries: u32,
    /// Wait between attempts
    pub interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            interval: Duration::from_millis(RETRY_INTERVAL_MS),
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with the default one-second interval.
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// Overrides the wait between attempts.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Runs `attempt` until it returns anything other than
    /// [`NimeError::RateLimited`], or the attempt budget is spent.
    ///
    /// A budget of zero still makes one attempt.
    pub async fn run<T, F, Fut>(&self, resource: &str, mut attempt: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.max_retries.max(1);
        let mut attempts = 0u32;

        loop {
            attempts += 1;

            match attempt().await {
                Err(NimeError::RateLimited(reason)) => {
                    if attempts >= max_attempts {
                        warn!(resource, attempts, reason = %reason, "Giving up after repeated rate limiting");
                        return Err(NimeError::MaxRetriesExceeded { attempts });
                    }

                    warn!(
                        resource,
                        attempt = attempts,
                        max_attempts,
                        "Received 429 Too Many Requests, retrying in {:?}",
                        self.interval
                    );
                    tokio::time::sleep(self.interval).await;
                }
                other => return other,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    /// Fails with 429 for the first `limited` calls, then succeeds.
    async fn flaky(calls: &AtomicU32, limited: u32) -> Result<&'static str> {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        if n < limited {
            Err(NimeError::RateLimited("429".into()))
        } else {
            Ok("payload")
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_n_plus_one_attempts() {
        let calls = AtomicU32::new(0);
        let start = Instant::now();

        let result = RetryPolicy::default().run("21", || flaky(&calls, 3)).await;

        assert_eq!(result.unwrap(), "payload");
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausts_budget() {
        let calls = AtomicU32::new(0);

        let result = RetryPolicy::default().run("21", || flaky(&calls, u32::MAX)).await;

        assert!(matches!(result, Err(NimeError::MaxRetriesExceeded { attempts: 10 })));
        assert_eq!(calls.load(Ordering::SeqCst), DEFAULT_MAX_RETRIES);
    }

    #[tokio::test(start_paused = true)]
    async fn test_budget_boundary() {
        let calls = AtomicU32::new(0);
        let ok = RetryPolicy::new(5).run("x", || flaky(&calls, 4)).await;
        assert!(ok.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 5);

        let calls = AtomicU32::new(0);
        let err = RetryPolicy::new(5).run("x", || flaky(&calls, 5)).await;
        assert!(matches!(err, Err(NimeError::MaxRetriesExceeded { attempts: 5 })));
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let start = Instant::now();

        let result: Result<()> = RetryPolicy::default()
            .run("21", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(NimeError::UpstreamStatus {
                        status: 500,
                        reason: "boom".into(),
                    })
                }
            })
            .await;

        assert!(matches!(result, Err(NimeError::UpstreamStatus { status: 500, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_budget_makes_one_attempt() {
        let calls = AtomicU32::new(0);
        let result = RetryPolicy::new(0).run("x", || flaky(&calls, 1)).await;
        assert!(matches!(result, Err(NimeError::MaxRetriesExceeded { attempts: 1 })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
