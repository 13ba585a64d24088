use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::{sleep_until, Instant};

use super::RateLimiter;

/// Enforces a minimum gap between consecutive requests. The gap runs from the later of the last
/// request being issued and it completing. The first request is never delayed.
pub struct IntervalRateLimiter {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl IntervalRateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

#[async_trait]
impl RateLimiter for IntervalRateLimiter {
    async fn wait(&self) {
        let last = *self.last.lock();

        if let Some(last) = last {
            sleep_until(last + self.interval).await;
        }

        *self.last.lock() = Some(Instant::now());
    }

    fn mark(&self) {
        *self.last.lock() = Some(Instant::now());
    }
}
