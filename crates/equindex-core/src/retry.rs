//! Retry policy with exponential backoff and jitter.

use std::time::Duration;

/// Backoff strategy between retry attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    Fixed {
        delay: Duration,
    },
    /// Delay grows as `base * factor^attempt`, capped at `max`.
    Exponential {
        base: Duration,
        factor: f64,
        max: Duration,
        /// Apply random jitter of +/- 50% to each delay.
        jitter: bool,
    },
}

impl Default for Backoff {
    fn default() -> Self {
        Self::Exponential {
            base: Duration::from_millis(500),
            factor: 2.0,
            max: Duration::from_secs(30),
            jitter: true,
        }
    }
}

impl Backoff {
    /// Delay for a 0-based retry attempt.
    pub fn delay(self, attempt: u32) -> Duration {
        match self {
            Self::Fixed { delay } => delay,
            Self::Exponential {
                base,
                factor,
                max,
                jitter,
            } => {
                let scale = factor.powi(attempt as i32);
                let seconds = (base.as_secs_f64() * scale).min(max.as_secs_f64());
                let mut delay = Duration::from_secs_f64(seconds);

                if jitter {
                    let jitter_ms = (delay.as_millis() as f64 * 0.5) as u64;
                    let offset = fastrand::u64(0..=(jitter_ms * 2));
                    let total_ms =
                        delay.as_millis() as i64 + (offset as i64 - jitter_ms as i64);
                    delay = Duration::from_millis(total_ms.max(0) as u64);
                }

                delay
            }
        }
    }
}

/// Retry policy applied to upstream fetches.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts = `max_retries + 1`.
    pub max_retries: u32,
    pub backoff: Backoff,
    /// HTTP status codes that warrant another attempt.
    pub retry_on_status: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 4,
            backoff: Backoff::default(),
            retry_on_status: vec![408, 429, 500, 502, 503, 504],
        }
    }
}

impl RetryConfig {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn should_retry_status(&self, status: u16) -> bool {
        self.retry_on_status.contains(&status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponential_backoff_caps_at_max() {
        let backoff = Backoff::Exponential {
            base: Duration::from_millis(100),
            factor: 10.0,
            max: Duration::from_secs(2),
            jitter: false,
        };
        assert_eq!(backoff.delay(0), Duration::from_millis(100));
        assert_eq!(backoff.delay(1), Duration::from_secs(1));
        assert_eq!(backoff.delay(5), Duration::from_secs(2));
    }

    #[test]
    fn jitter_stays_within_half_delay() {
        let backoff = Backoff::Exponential {
            base: Duration::from_millis(1000),
            factor: 1.0,
            max: Duration::from_secs(5),
            jitter: true,
        };
        for attempt in 0..32 {
            let delay = backoff.delay(attempt);
            assert!(delay >= Duration::from_millis(500));
            assert!(delay <= Duration::from_millis(1500));
        }
    }

    #[test]
    fn default_policy_retries_rate_limit_status() {
        let config = RetryConfig::default();
        assert!(config.should_retry_status(429));
        assert!(!config.should_retry_status(404));
    }
}
