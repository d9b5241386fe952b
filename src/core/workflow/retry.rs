//! Retry policy with exponential backoff
//!
//! Only transient failures retry. The default policy allows 3 attempts with
//! delays of 2s and 4s between them (the delay doubles each time and would
//! be 8s before a fourth attempt, which never happens at the default bound).
//! Business failures return immediately.

use crate::core::workflow::step::{StepFailure, StepResult};
use std::future::Future;
use std::time::Duration;

/// Attempt bound and backoff schedule for one step
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum attempts, counting the first
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles for each attempt after
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Creates a policy from an attempt bound and base delay
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Backoff delay after a given 1-based attempt number
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }

    /// Runs a step factory under this policy
    ///
    /// The factory is re-invoked for each attempt. Returns the final result
    /// and the number of attempts actually made.
    pub async fn run<T, F, Fut>(&self, mut step: F) -> (StepResult<T>, u32)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = StepResult<T>>,
    {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match step().await {
                Ok(value) => return (Ok(value), attempt),
                Err(failure) => {
                    if !failure.is_transient() || attempt >= self.max_attempts {
                        return (Err(failure), attempt);
                    }
                    let delay = self.delay_after(attempt);
                    tracing::warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %failure,
                        "Transient step failure, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_millis(5))
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(1), Duration::from_secs(2));
        assert_eq!(policy.delay_after(2), Duration::from_secs(4));
        assert_eq!(policy.delay_after(3), Duration::from_secs(8));
    }

    #[tokio::test]
    async fn test_transient_retries_up_to_bound() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let (result, attempts) = fast_policy()
            .run(|| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(StepFailure::transient("StorageError", "down"))
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_business_failure_never_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let (result, attempts) = fast_policy()
            .run(|| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(StepFailure::business("ParseError", "bad magic"))
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let (result, attempts) = fast_policy()
            .run(|| {
                let counter = counter.clone();
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    if n < 2 {
                        Err(StepFailure::transient("StorageError", "down"))
                    } else {
                        Ok(42u32)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts, 3);
    }
}
