//! Bounded Retry
//!
//! One retry loop for every backend call that may fail transiently. Only
//! errors the caller classifies as transient are retried; everything else
//! returns immediately.

use std::future::Future;
use std::time::Duration;

use serde::{Serialize, Deserialize};
use tracing::debug;

/// Delay schedule between attempts. `attempt` is 1-based and names the
/// attempt that just failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Backoff {
    /// Same delay every time.
    Fixed {
        /// Delay in milliseconds.
        delay_ms: u64,
    },
    /// `step_ms * attempt`.
    Linear {
        /// Step in milliseconds.
        step_ms: u64,
    },
    /// `base_ms * 2^(attempt - 1)`.
    Exponential {
        /// First delay in milliseconds.
        base_ms: u64,
    },
}

impl Backoff {
    /// Delay after the given failed attempt.
    pub fn delay_ms(&self, attempt: u32) -> u64 {
        let attempt = attempt.max(1);
        match *self {
            Backoff::Fixed { delay_ms } => delay_ms,
            Backoff::Linear { step_ms } => step_ms.saturating_mul(attempt as u64),
            Backoff::Exponential { base_ms } => {
                base_ms.saturating_mul(1u64.checked_shl(attempt - 1).unwrap_or(u64::MAX))
            }
        }
    }
}

/// Retry policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first. Zero behaves like one.
    pub max_attempts: u32,
    /// Delay schedule.
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// Single attempt.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            backoff: Backoff::Fixed { delay_ms: 0 },
        }
    }

    /// Token verification: 3 attempts, 1s then 2s.
    pub fn auth_verify() -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::Exponential { base_ms: 1000 },
        }
    }

    /// Session key issuance: 3 attempts, 250ms then 500ms.
    pub fn session_key() -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::Exponential { base_ms: 250 },
        }
    }

    /// Delay after the given failed attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.backoff.delay_ms(attempt))
    }
}

/// Run `op` until it succeeds, fails permanently, or attempts run out.
pub async fn retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    mut op: F,
    is_transient: impl Fn(&E) -> bool,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < max_attempts && is_transient(&err) => {
                let delay = policy.delay_for(attempt);
                debug!("Attempt {}/{} failed ({}), retrying in {:?}", attempt, max_attempts, err, delay);
                tokio::time::sleep(delay).await;
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
    use tokio::time::Instant;

    #[derive(Debug, PartialEq)]
    enum TestError {
        Flaky,
        Fatal,
    }

    impl std::fmt::Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{:?}", self)
        }
    }

    fn transient(e: &TestError) -> bool {
        *e == TestError::Flaky
    }

    #[test]
    fn test_backoff_schedules() {
        let auth = RetryPolicy::auth_verify();
        assert_eq!(auth.backoff, Backoff::Exponential { base_ms: 1000 });
        assert_eq!(auth.delay_for(1), Duration::from_millis(1000));
        assert_eq!(auth.delay_for(2), Duration::from_millis(2000));

        let linear = Backoff::Linear { step_ms: 1000 };
        assert_eq!(linear.delay_ms(3), 3000);
        assert_eq!(Backoff::Fixed { delay_ms: 40 }.delay_ms(5), 40);

        let exp = RetryPolicy::session_key();
        assert_eq!(exp.delay_for(1), Duration::from_millis(250));
        assert_eq!(exp.delay_for(2), Duration::from_millis(500));
        assert_eq!(exp.delay_for(3), Duration::from_millis(1000));

        assert_eq!(Backoff::Exponential { base_ms: 1 }.delay_ms(200), u64::MAX);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_attempts() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let start = Instant::now();

        let result: Result<(), _> = retry(
            &RetryPolicy::auth_verify(),
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(TestError::Flaky)
            },
            transient,
        ).await;

        assert_eq!(result, Err(TestError::Flaky));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let waited = start.elapsed();
        assert!(waited >= Duration::from_millis(3000) && waited < Duration::from_millis(3100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_on_second_attempt() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let start = Instant::now();

        let result = retry(
            &RetryPolicy::session_key(),
            move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(TestError::Flaky)
                } else {
                    Ok(7)
                }
            },
            transient,
        ).await;

        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        let waited = start.elapsed();
        assert!(waited >= Duration::from_millis(250) && waited < Duration::from_millis(350));
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_error_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = retry(
            &RetryPolicy::auth_verify(),
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(TestError::Fatal)
            },
            transient,
        ).await;

        assert_eq!(result, Err(TestError::Fatal));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
