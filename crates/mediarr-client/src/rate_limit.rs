//! Per-client request start limiter.

use governor::{DefaultDirectRateLimiter, Quota};
use std::num::NonZeroU32;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Limits how often requests through one client may start.
///
/// The default mode spaces releases at least `interval` apart, measured
/// between consecutive releases. It keeps no credit across idle periods, so
/// it never lets requests through faster than the configured rate. Waiters
/// are released in the order they called [`RateLimiter::acquire`].
///
/// With a burst size, a GCRA token bucket is used instead: up to `burst`
/// requests may start back to back, refilling at the same sustained rate.
pub struct RateLimiter {
    mode: Mode,
}

enum Mode {
    Spacing {
        interval: Duration,
        // tokio's mutex queues waiters fairly, which gives FIFO release
        last_release: Mutex<Option<Instant>>,
    },
    Burst(DefaultDirectRateLimiter),
}

impl RateLimiter {
    /// Evenly spaced releases, `interval` apart
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            mode: Mode::Spacing {
                interval,
                last_release: Mutex::new(None),
            },
        }
    }

    /// Token bucket with `burst` cells refilling one per `interval`
    #[must_use]
    pub fn with_burst(interval: Duration, burst: NonZeroU32) -> Self {
        let quota = Quota::with_period(interval)
            .unwrap_or_else(|| Quota::per_second(NonZeroU32::MAX))
            .allow_burst(burst);

        Self {
            mode: Mode::Burst(governor::RateLimiter::direct(quota)),
        }
    }

    /// Wait until this caller may start a request.
    ///
    /// Cannot fail, only delay. Dropping the returned future before it
    /// completes gives up the slot without consuming it.
    pub async fn acquire(&self) {
        match &self.mode {
            Mode::Spacing {
                interval,
                last_release,
            } => {
                let mut last = last_release.lock().await;
                if let Some(previous) = *last {
                    tokio::time::sleep_until(previous + *interval).await;
                }
                *last = Some(Instant::now());
            }
            Mode::Burst(limiter) => limiter.until_ready().await,
        }
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.mode {
            Mode::Spacing { interval, .. } => f
                .debug_struct("RateLimiter")
                .field("interval", interval)
                .finish(),
            Mode::Burst(_) => f.debug_struct("RateLimiter").field("burst", &true).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn assert_near(actual: Duration, expected: Duration) {
        assert!(
            actual >= expected && actual < expected + Duration::from_millis(5),
            "expected ~{expected:?}, got {actual:?}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_acquire_is_immediate() {
        let limiter = RateLimiter::new(Duration::from_millis(500));
        let start = Instant::now();
        limiter.acquire().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_consecutive_releases_are_spaced() {
        for rate in [1.0_f64, 2.0, 3.0, 7.0, 10.0, 50.0] {
            let interval = Duration::from_secs_f64(1.0 / rate);
            let limiter = RateLimiter::new(interval);

            let mut releases = Vec::new();
            for _ in 0..5 {
                limiter.acquire().await;
                releases.push(Instant::now());
            }

            for pair in releases.windows(2) {
                assert!(
                    pair[1] - pair[0] >= interval,
                    "rate {rate}: releases {:?} apart",
                    pair[1] - pair[0]
                );
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_burst_after_idle() {
        let limiter = RateLimiter::new(Duration::from_millis(500));
        limiter.acquire().await;

        tokio::time::sleep(Duration::from_secs(10)).await;

        let start = Instant::now();
        limiter.acquire().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
        limiter.acquire().await;
        assert_near(start.elapsed(), Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_released_in_order() {
        let limiter = Arc::new(RateLimiter::new(Duration::from_millis(100)));
        let start = Instant::now();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        let mut handles = Vec::new();
        for id in 0..5u32 {
            let limiter = Arc::clone(&limiter);
            let tx = tx.clone();
            handles.push(tokio::spawn(async move {
                limiter.acquire().await;
                tx.send((id, start.elapsed())).unwrap();
            }));
            // let each task reach the lock before spawning the next
            tokio::task::yield_now().await;
        }
        drop(tx);
        for handle in handles {
            handle.await.unwrap();
        }

        let mut order = Vec::new();
        while let Some(entry) = rx.recv().await {
            order.push(entry);
        }

        let ids: Vec<u32> = order.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, [0, 1, 2, 3, 4]);
        for (i, (_, at)) in order.iter().enumerate() {
            assert_near(*at, Duration::from_millis(100) * u32::try_from(i).unwrap());
        }
    }

    #[tokio::test]
    async fn test_burst_mode_allows_back_to_back_starts() {
        let limiter = RateLimiter::with_burst(
            Duration::from_secs(1),
            NonZeroU32::new(3).unwrap(),
        );

        let start = std::time::Instant::now();
        for _ in 0..3 {
            limiter.acquire().await;
        }
        assert!(start.elapsed() < Duration::from_millis(500));
    }
}
