//! Upstream request throttling.
//!
//! Historical backfills touch the provider once per ticker per day; the
//! throttle keeps that polite enough to stay under public rate limits.

use std::num::NonZeroU32;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};

/// Process-wide pacing for provider requests.
pub struct RequestThrottle {
    limiter: DefaultDirectRateLimiter,
}

impl RequestThrottle {
    pub fn per_minute(rate: NonZeroU32) -> Self {
        Self {
            limiter: RateLimiter::direct(Quota::per_minute(rate)),
        }
    }

    /// Wait until the next request is allowed.
    pub async fn acquire(&self) {
        self.limiter.until_ready().await;
    }

    /// Non-blocking probe, used by tests.
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }
}

impl Default for RequestThrottle {
    fn default() -> Self {
        let rate = NonZeroU32::new(120).expect("default throttle rate is nonzero");
        Self::per_minute(rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_requests_up_to_the_quota() {
        let throttle = RequestThrottle::per_minute(NonZeroU32::new(2).unwrap());
        assert!(throttle.try_acquire());
        assert!(throttle.try_acquire());
        assert!(!throttle.try_acquire());
    }
}
