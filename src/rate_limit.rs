use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Outbound request budget shared by all data collaborators.
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Maximum requests per minute
    pub requests_per_minute: u32,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: 120,
        }
    }
}

pub type OutboundRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Create a new rate limiter. A zero budget is clamped to one request per minute.
pub fn create_rate_limiter(config: RateLimiterConfig) -> OutboundRateLimiter {
    let per_minute = NonZeroU32::new(config.requests_per_minute).unwrap_or_else(|| {
        tracing::warn!("requests_per_minute must be non-zero, clamping to 1");
        NonZeroU32::MIN
    });
    Arc::new(RateLimiter::direct(Quota::per_minute(per_minute)))
}
