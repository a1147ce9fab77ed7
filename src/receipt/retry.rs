//! Bounded retry with jittered exponential backoff

use std::time::Duration;

use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, first call included
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Delay after failed attempt `attempt` (1-based), before jitter
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exponent = 2_u32.saturating_pow(attempt.saturating_sub(1));
        let base_ms = u64::try_from(self.initial_backoff.as_millis()).unwrap_or(u64::MAX);
        let max_ms = u64::try_from(self.max_backoff.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(base_ms.saturating_mul(u64::from(exponent)).min(max_ms))
    }
}

/// Spreads retries of concurrent callers apart
pub trait BackoffJitter: Send + Sync {
    fn jittered_delay(&self, base: Duration, attempt: u32) -> Duration;
}

/// Adds up to a quarter of the base delay, uniformly at random
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomJitter;

impl BackoffJitter for RandomJitter {
    fn jittered_delay(&self, base: Duration, _attempt: u32) -> Duration {
        let base_ms = u64::try_from(base.as_millis()).unwrap_or(u64::MAX);
        let max_extra = base_ms / 4;
        let extra = if max_extra == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=max_extra)
        };
        Duration::from_millis(base_ms.saturating_add(extra))
    }
}

/// Uses the base delay unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct NoJitter;

impl BackoffJitter for NoJitter {
    fn jittered_delay(&self, base: Duration, _attempt: u32) -> Duration {
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_and_capped() {
        let policy = RetryPolicy {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(350),
        };
        assert_eq!(policy.base_delay(1), Duration::from_millis(100));
        assert_eq!(policy.base_delay(2), Duration::from_millis(200));
        assert_eq!(policy.base_delay(3), Duration::from_millis(350));
        assert_eq!(policy.base_delay(40), Duration::from_millis(350));
    }

    #[test]
    fn test_random_jitter_bounds() {
        let base = Duration::from_millis(400);
        for attempt in 1..50 {
            let delay = RandomJitter.jittered_delay(base, attempt);
            assert!(delay >= base);
            assert!(delay <= Duration::from_millis(500));
        }
        assert_eq!(
            RandomJitter.jittered_delay(Duration::from_millis(2), 1),
            Duration::from_millis(2)
        );
    }
}
