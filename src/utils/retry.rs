//! Bounded exponential backoff with cancellation

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Retry schedule for calls to network-bound collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub factor: f64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay_ms: 500,
            factor: 2.0,
            max_delay_ms: 8_000,
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after the given failed attempt (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let millis = self.base_delay_ms as f64 * self.factor.max(1.0).powi(exponent);
        Duration::from_millis(millis.min(self.max_delay_ms as f64) as u64)
    }
}

/// Why a retried operation gave up
#[derive(Debug, Clone, PartialEq)]
pub enum RetryError<E> {
    /// The error was not worth retrying
    Permanent(E),
    /// Every attempt failed with a transient error
    Exhausted { attempts: u32, last: E },
    Cancelled,
}

impl<E> RetryError<E> {
    /// Collapse into the underlying error, mapping cancellation with `on_cancel`
    pub fn into_inner(self, on_cancel: impl FnOnce() -> E) -> E {
        match self {
            RetryError::Permanent(err) => err,
            RetryError::Exhausted { last, .. } => last,
            RetryError::Cancelled => on_cancel(),
        }
    }
}

/// Run `op` until it succeeds, fails permanently, runs out of attempts, or is cancelled.
///
/// `is_transient` decides which errors are retried. Cancellation is observed
/// both while an attempt is in flight and while backing off.
pub async fn retry_with_backoff<T, E, F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    operation: &str,
    is_transient: impl Fn(&E) -> bool,
    mut op: F,
) -> Result<T, RetryError<E>>
where
    E: std::fmt::Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        let result = tokio::select! {
            res = op(attempt) => res,
            _ = cancel.cancelled() => return Err(RetryError::Cancelled),
        };

        let err = match result {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if !is_transient(&err) {
            debug!("{} failed permanently on attempt {}: {}", operation, attempt, err);
            return Err(RetryError::Permanent(err));
        }
        if attempt >= max_attempts {
            warn!("{} failed after {} attempts: {}", operation, attempt, err);
            return Err(RetryError::Exhausted {
                attempts: attempt,
                last: err,
            });
        }

        let delay = policy.delay_after(attempt);
        warn!(
            "{} attempt {}/{} failed: {}; retrying in {:?}",
            operation, attempt, max_attempts, err, delay
        );
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = cancel.cancelled() => return Err(RetryError::Cancelled),
        }
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay_ms: 1,
            factor: 2.0,
            max_delay_ms: 4,
        }
    }

    #[test]
    fn test_delay_grows_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(1), Duration::from_millis(500));
        assert_eq!(policy.delay_after(2), Duration::from_millis(1000));
        assert_eq!(policy.delay_after(3), Duration::from_millis(2000));
        assert_eq!(policy.delay_after(10), Duration::from_millis(8000));
    }

    #[tokio::test]
    async fn test_retries_transient_errors_until_success() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, RetryError<String>> = retry_with_backoff(
            &fast_policy(4),
            &CancellationToken::new(),
            "flaky call",
            |_: &String| true,
            |attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 3 {
                        Err("unavailable".to_string())
                    } else {
                        Ok(attempt)
                    }
                }
            },
        )
        .await;
        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), RetryError<String>> = retry_with_backoff(
            &fast_policy(4),
            &CancellationToken::new(),
            "broken call",
            |_: &String| false,
            |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("unreadable".to_string()) }
            },
        )
        .await;
        assert_eq!(result, Err(RetryError::Permanent("unreadable".to_string())));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let result: Result<(), RetryError<String>> = retry_with_backoff(
            &fast_policy(3),
            &CancellationToken::new(),
            "down call",
            |_: &String| true,
            |_| async { Err("down".to_string()) },
        )
        .await;
        assert_eq!(
            result,
            Err(RetryError::Exhausted {
                attempts: 3,
                last: "down".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_cancelled_token_stops_retrying() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result: Result<(), RetryError<String>> = retry_with_backoff(
            &fast_policy(3),
            &cancel,
            "cancelled call",
            |_: &String| true,
            |_| std::future::pending::<Result<(), String>>(),
        )
        .await;
        assert_eq!(result, Err(RetryError::Cancelled));
    }
}
