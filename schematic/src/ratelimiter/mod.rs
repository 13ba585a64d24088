mod interval_ratelimiter;
pub use interval_ratelimiter::IntervalRateLimiter;

use async_trait::async_trait;

/// Paces outbound mutations. `wait` is awaited before every request, and `mark` is called once
/// a request has completed.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    async fn wait(&self);

    /// Records that a request just completed.
    fn mark(&self);
}
