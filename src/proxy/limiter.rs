//! Outbound request rate limiting
//!
//! One `RateLimiter` instance is shared by every caller issuing requests in
//! a session. The grant timestamp lives behind a single async mutex, so
//! callers serialize in lock-acquisition order; no further fairness is
//! guaranteed.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Enforces a minimum interval between outbound calls
pub struct RateLimiter {
    min_interval: Duration,
    last_grant: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Creates a limiter allowing at most `max_per_second` grants per second
    pub fn new(max_per_second: f64) -> Self {
        let max_per_second = if max_per_second > 0.0 {
            max_per_second
        } else {
            1.0
        };
        Self {
            min_interval: Duration::from_secs_f64(1.0 / max_per_second),
            last_grant: Mutex::new(None),
        }
    }

    /// Suspends until at least `1/max_per_second` seconds have elapsed since
    /// the previous grant, then records the new grant time.
    ///
    /// The mutex is held across the sleep so that waiters are granted in the
    /// order they acquired the lock.
    pub async fn wait(&self) {
        let mut last = self.last_grant.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}
