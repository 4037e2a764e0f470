//! Retry orchestration.

use crate::config::RetryConfig;
use mediarr_core::{ClassifiedError, Result};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// What to do after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait, then attempt again
    Retry(Duration),
    /// Surface the error to the caller
    GiveUp,
}

/// Retry bookkeeping for one logical call.
///
/// `attempt` is the 1-based number of the attempt in flight. The backoff
/// step only advances on failures that use exponential backoff, so waits
/// requested by a 429 do not grow later backoffs.
#[derive(Debug, Clone)]
pub struct RetryState<'a> {
    config: &'a RetryConfig,
    retry_allowed: bool,
    attempt: u32,
    backoff_step: u32,
}

impl<'a> RetryState<'a> {
    /// Start a new call; `retry_allowed` is false for non-idempotent requests
    #[must_use]
    pub const fn new(config: &'a RetryConfig, retry_allowed: bool) -> Self {
        Self {
            config,
            retry_allowed,
            attempt: 1,
            backoff_step: 0,
        }
    }

    /// Number of the attempt in flight
    #[must_use]
    pub const fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Record a failed attempt and decide what comes next
    pub fn on_failure(&mut self, error: &ClassifiedError) -> RetryDecision {
        if !self.retry_allowed || !error.is_retryable() || self.attempt > self.config.max_retries
        {
            return RetryDecision::GiveUp;
        }

        let delay = match error.retry_after() {
            Some(wait) if self.config.max_retry_after.is_some_and(|limit| wait > limit) => {
                return RetryDecision::GiveUp;
            }
            Some(wait) => wait,
            None => {
                self.backoff_step += 1;
                self.config.backoff_for(self.backoff_step)
            }
        };

        self.attempt += 1;
        RetryDecision::Retry(delay)
    }
}

/// Run `attempt` until it succeeds, fails with a non-retryable error, or the
/// retry budget is spent.
///
/// `attempt` receives the 1-based attempt number. Each attempt's future is
/// driven to completion (and dropped) before any backoff starts. No wait
/// follows the final attempt.
pub async fn run<T, F, Fut>(
    config: &RetryConfig,
    retry_allowed: bool,
    endpoint: &str,
    mut attempt: F,
) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut state = RetryState::new(config, retry_allowed);

    loop {
        let number = state.attempt();
        let error = match attempt(number).await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };

        match state.on_failure(&error) {
            RetryDecision::Retry(delay) => {
                warn!(
                    endpoint,
                    attempt = number,
                    kind = %error.kind(),
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "retrying after failure"
                );
                tokio::time::sleep(delay).await;
            }
            RetryDecision::GiveUp => {
                debug!(endpoint, attempts = number, kind = %error.kind(), "giving up");
                return Err(error);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediarr_core::ErrorKind;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use tokio::time::Instant;

    fn status(code: u16) -> ClassifiedError {
        ClassifiedError::from_status(code, "/test", None, "")
    }

    fn throttled(secs: u64) -> ClassifiedError {
        ClassifiedError::from_status(429, "/test", Some(secs), "")
    }

    #[test]
    fn test_backoff_delays_for_server_errors() {
        let config = RetryConfig::default();
        let mut state = RetryState::new(&config, true);
        let err = status(503);

        assert_eq!(state.on_failure(&err), RetryDecision::Retry(Duration::from_millis(2000)));
        assert_eq!(state.on_failure(&err), RetryDecision::Retry(Duration::from_millis(4000)));
        assert_eq!(state.on_failure(&err), RetryDecision::Retry(Duration::from_millis(5000)));
        assert_eq!(state.on_failure(&err), RetryDecision::GiveUp);
    }

    #[test]
    fn test_rate_limited_waits_retry_after() {
        let config = RetryConfig::default();
        let mut state = RetryState::new(&config, true);

        assert_eq!(
            state.on_failure(&throttled(5)),
            RetryDecision::Retry(Duration::from_millis(5000))
        );
        // the 429 did not advance the backoff
        assert_eq!(
            state.on_failure(&status(500)),
            RetryDecision::Retry(Duration::from_millis(2000))
        );
    }

    #[test]
    fn test_retry_after_cap() {
        let config = RetryConfig::default();
        let mut state = RetryState::new(&config, true);
        assert_eq!(
            state.on_failure(&throttled(86_400)),
            RetryDecision::Retry(Duration::from_secs(86_400))
        );

        let config = RetryConfig::default().max_retry_after(Duration::from_secs(60));
        let mut state = RetryState::new(&config, true);
        assert_eq!(
            state.on_failure(&throttled(60)),
            RetryDecision::Retry(Duration::from_secs(60))
        );
        assert_eq!(state.on_failure(&throttled(61)), RetryDecision::GiveUp);
    }

    #[test]
    fn test_non_retryable_gives_up_immediately() {
        let config = RetryConfig::default();
        for code in [400, 401, 403, 404, 422] {
            let mut state = RetryState::new(&config, true);
            assert_eq!(state.on_failure(&status(code)), RetryDecision::GiveUp);
        }
    }

    #[test]
    fn test_non_idempotent_never_retries() {
        let config = RetryConfig::default();
        let mut state = RetryState::new(&config, false);
        assert_eq!(state.on_failure(&status(503)), RetryDecision::GiveUp);
    }

    #[test]
    fn test_zero_retries() {
        let config = RetryConfig::default().max_retries(0);
        let mut state = RetryState::new(&config, true);
        assert_eq!(state.on_failure(&status(500)), RetryDecision::GiveUp);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_503_makes_four_attempts_with_capped_backoff() {
        let config = RetryConfig::default().max_retries(3);
        let started = Instant::now();
        let attempts_at = Mutex::new(Vec::new());

        let result: Result<()> = run(&config, true, "/test", |_| {
            attempts_at.lock().unwrap().push(started.elapsed());
            async { Err(status(503)) }
        })
        .await;

        assert_eq!(result.unwrap_err().kind(), ErrorKind::ServerError);
        let attempts_at = attempts_at.into_inner().unwrap();
        assert_eq!(
            attempts_at,
            [
                Duration::ZERO,
                Duration::from_millis(2000),
                Duration::from_millis(6000),
                Duration::from_millis(11000),
            ]
        );
        // no dangling wait after the last attempt
        assert_eq!(started.elapsed(), Duration::from_millis(11000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_401_makes_one_attempt() {
        let config = RetryConfig::default().max_retries(5);
        let calls = AtomicU32::new(0);

        let result: Result<()> = run(&config, true, "/test", |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(status(401)) }
        })
        .await;

        assert!(result.unwrap_err().is_auth_error());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_429_waits_exactly_retry_after() {
        let config = RetryConfig::default();
        let started = Instant::now();

        let value = run(&config, true, "/test", |attempt| async move {
            if attempt == 1 {
                Err(throttled(5))
            } else {
                Ok(attempt)
            }
        })
        .await
        .unwrap();

        assert_eq!(value, 2);
        assert_eq!(started.elapsed(), Duration::from_millis(5000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_recovers_after_two_failures() {
        let config = RetryConfig::default().max_retries(2);
        let started = Instant::now();

        let value = run(&config, true, "/test", |attempt| async move {
            if attempt < 3 {
                Err(status(500))
            } else {
                Ok("done")
            }
        })
        .await
        .unwrap();

        assert_eq!(value, "done");
        assert_eq!(started.elapsed(), Duration::from_millis(2000 + 4000));
    }
}
