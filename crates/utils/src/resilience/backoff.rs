//! Backoff curve configuration

use super::types::RetryOn;
use std::time::Duration;

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(60);
const DEFAULT_MULTIPLIER: f64 = 2.0;

/// Delay before retrying after failed attempt `attempt` (1-based):
/// `min(base * multiplier^(attempt-1), max)`
pub fn backoff_delay(attempt: u32, base: Duration, max: Duration, multiplier: f64) -> Duration {
    let exponent = attempt.saturating_sub(1);
    let exponent = i32::try_from(exponent).unwrap_or(i32::MAX);
    let secs = base.as_secs_f64() * multiplier.powi(exponent);

    if !secs.is_finite() || secs >= max.as_secs_f64() {
        return max;
    }
    Duration::from_secs_f64(secs).min(max)
}

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct BackoffConfig {
    /// Total attempts including the first one, at least 1
    pub max_attempts: u32,
    /// Delay after the first failure
    pub base_delay: Duration,
    /// Cap on any single delay
    pub max_delay: Duration,
    /// Growth factor between consecutive delays, greater than 1
    pub multiplier: f64,
    /// Whether to retry on specific error types
    pub retry_on: RetryOn,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            multiplier: DEFAULT_MULTIPLIER,
            retry_on: RetryOn::Transient,
        }
    }
}

impl BackoffConfig {
    /// Preset for network-facing collaborators (catalog and code-host APIs)
    pub fn network() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(60),
            multiplier: 2.0,
            retry_on: RetryOn::Transient,
        }
    }

    /// Single attempt, never retries
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn with_retry_on(mut self, retry_on: RetryOn) -> Self {
        self.retry_on = retry_on;
        self
    }

    /// Delay after failed attempt `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        backoff_delay(attempt, self.base_delay, self.max_delay, self.multiplier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_network_preset_curve() {
        let config = BackoffConfig::network();
        assert_eq!(config.delay_for(1), Duration::from_secs(2));
        assert_eq!(config.delay_for(2), Duration::from_secs(4));
        assert_eq!(config.delay_for(3), Duration::from_secs(8));
        assert_eq!(config.delay_for(10), Duration::from_secs(60));
    }

    #[test]
    fn test_huge_attempt_saturates_at_cap() {
        let delay = backoff_delay(u32::MAX, Duration::from_millis(10), Duration::from_secs(5), 3.0);
        assert_eq!(delay, Duration::from_secs(5));
    }

    proptest! {
        #[test]
        fn delay_matches_closed_form(
            attempt in 1u32..20,
            base_ms in 1u64..5_000,
            max_ms in 1u64..600_000,
            multiplier in 1.01f64..4.0,
        ) {
            let base = Duration::from_millis(base_ms);
            let max = Duration::from_millis(max_ms);
            let expected = (base_ms as f64 * multiplier.powi(attempt as i32 - 1)).min(max_ms as f64);
            let actual = backoff_delay(attempt, base, max, multiplier).as_secs_f64() * 1000.0;
            prop_assert!((actual - expected).abs() < 1e-3 * expected.max(1.0));
        }

        #[test]
        fn delay_is_monotonic(
            attempt in 1u32..30,
            base_ms in 1u64..5_000,
            max_ms in 1u64..600_000,
            multiplier in 1.01f64..4.0,
        ) {
            let base = Duration::from_millis(base_ms);
            let max = Duration::from_millis(max_ms);
            prop_assert!(
                backoff_delay(attempt, base, max, multiplier)
                    <= backoff_delay(attempt + 1, base, max, multiplier)
            );
        }

        #[test]
        fn delay_never_exceeds_cap(
            attempt in 1u32..200,
            base_ms in 1u64..5_000,
            max_ms in 1u64..600_000,
            multiplier in 1.01f64..10.0,
        ) {
            let max = Duration::from_millis(max_ms);
            prop_assert!(backoff_delay(attempt, Duration::from_millis(base_ms), max, multiplier) <= max);
        }
    }
}
