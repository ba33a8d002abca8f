//! Exponential backoff with optional jitter.

use std::time::Duration;

use rand::Rng;

use crate::config::RetryConfig;

/// Calculate the exponential delay before retry number `retry` (1-based),
/// capped at `max_ms`.
pub fn calculate_backoff(retry: u32, base_ms: u64, max_ms: u64) -> Duration {
    if retry == 0 {
        return Duration::from_millis(0);
    }

    let exponential_base = 2u64.saturating_pow(retry - 1);
    let delay_ms = base_ms.saturating_mul(exponential_base);

    Duration::from_millis(delay_ms.min(max_ms))
}

/// Add up to `ratio` of the delay as random jitter.
pub fn apply_jitter(delay: Duration, ratio: f64) -> Duration {
    let delay_ms = delay.as_millis() as u64;
    let jitter_range = (delay_ms as f64 * ratio) as u64;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };
    Duration::from_millis(delay_ms + jitter)
}

/// Delay schedule for one operation's attempts.
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter_ratio: f64,
}

impl BackoffPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            base_delay_ms: config.base_delay_ms,
            max_delay_ms: config.max_delay_ms,
            jitter_ratio: config.jitter_ratio,
        }
    }

    /// Delay before attempt `attempt` (1-based): nothing before the first,
    /// `base * 2^(attempt - 2)` before every later one.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        let delay = calculate_backoff(
            attempt.saturating_sub(1),
            self.base_delay_ms,
            self.max_delay_ms,
        );
        apply_jitter(delay, self.jitter_ratio)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_calculation() {
        assert_eq!(calculate_backoff(0, 100, 2000), Duration::ZERO);
        assert_eq!(calculate_backoff(1, 100, 2000).as_millis(), 100);
        assert_eq!(calculate_backoff(2, 100, 2000).as_millis(), 200);
        assert_eq!(calculate_backoff(10, 100, 1000).as_millis(), 1000);
        assert_eq!(calculate_backoff(80, u64::MAX, u64::MAX).as_millis(), u64::MAX as u128);
    }

    #[test]
    fn test_default_schedule_doubles_from_one_second() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.delay_before(1), Duration::ZERO);
        assert_eq!(policy.delay_before(2), Duration::from_millis(1000));
        assert_eq!(policy.delay_before(3), Duration::from_millis(2000));
        assert_eq!(policy.delay_before(4), Duration::from_millis(4000));
    }

    #[test]
    fn test_jitter_stays_in_range() {
        let policy = BackoffPolicy {
            base_delay_ms: 1000,
            max_delay_ms: 10_000,
            jitter_ratio: 0.1,
        };
        for _ in 0..50 {
            let delay = policy.delay_before(2).as_millis();
            assert!((1000..1100).contains(&delay), "{delay}");
        }
    }
}
