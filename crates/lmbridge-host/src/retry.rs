//! Bounded retry with a retryable-error classifier.
//!
//! The operation receives the attempt index, so callers can vary their
//! input per attempt (the port-bind loop tries `base_port + attempt`).
//! Attempts are strictly sequential; the delay sits between them.

use std::future::Future;
use std::time::Duration;

/// Bounded attempt count and inter-attempt delay.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub attempts: u32,
    /// Delay between attempts.
    pub delay: Duration,
}

/// Run `op` until it succeeds, the classifier declines, or attempts are
/// exhausted. The last error is returned as-is.
pub async fn with_policy<T, E, Op, Fut, Cl>(
    policy: RetryPolicy,
    mut op: Op,
    retryable: Cl,
) -> Result<T, E>
where
    Op: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    Cl: Fn(&E) -> bool,
{
    let mut attempt = 0;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) if attempt + 1 < policy.attempts && retryable(&err) => {
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy(attempts: u32) -> RetryPolicy {
        RetryPolicy {
            attempts,
            delay: Duration::from_millis(300),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn first_success_needs_no_retry() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, &str> = with_policy(
            policy(5),
            |attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move { Ok(attempt) }
            },
            |_| true,
        )
        .await;
        assert_eq!(result, Ok(0));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_success_passing_attempt_index() {
        let result: Result<u32, &str> = with_policy(
            policy(5),
            |attempt| async move {
                if attempt < 3 { Err("busy") } else { Ok(attempt) }
            },
            |_| true,
        )
        .await;
        assert_eq!(result, Ok(3));
    }

    #[tokio::test(start_paused = true)]
    async fn non_retryable_error_aborts_immediately() {
        let calls = AtomicU32::new(0);
        let result: Result<(), &str> = with_policy(
            policy(5),
            |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("fatal") }
            },
            |err| *err != "fatal",
        )
        .await;
        assert_eq!(result, Err("fatal"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_returns_the_last_error() {
        let calls = AtomicU32::new(0);
        let result: Result<(), String> = with_policy(
            policy(4),
            |attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move { Err(format!("attempt {attempt}")) }
            },
            |_| true,
        )
        .await;
        assert_eq!(result, Err("attempt 3".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }
}
