//! Circuit breaker for the receipt renderer
//!
//! `Closed → Open` after `failure_threshold` consecutive failures. While open,
//! calls are refused until `open_cooldown` has elapsed; then exactly one probe
//! is admitted (`HalfOpen`). A successful probe closes the breaker, a failed
//! one reopens it. A probe that never reports back (its future was dropped)
//! stops blocking once `open_cooldown` has passed since it was admitted.

use std::time::Duration;

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerConfig {
    /// Consecutive failures required to open the breaker
    pub failure_threshold: u32,
    /// How long the breaker stays open before admitting a probe
    pub open_cooldown: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            open_cooldown: Duration::from_secs(30),
        }
    }
}

/// Externally visible breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Inner {
    Closed { consecutive_failures: u32 },
    Open { opened_at: DateTime<Utc> },
    HalfOpen { probe_started: DateTime<Utc> },
}

#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    config: BreakerConfig,
    state: Inner,
}

impl CircuitBreaker {
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config: BreakerConfig {
                failure_threshold: config.failure_threshold.max(1),
                open_cooldown: config.open_cooldown,
            },
            state: Inner::Closed {
                consecutive_failures: 0,
            },
        }
    }

    /// Whether one call may go through now
    pub fn admit(&mut self, now: DateTime<Utc>) -> bool {
        let since = match self.state {
            Inner::Closed { .. } => return true,
            Inner::Open { opened_at } => opened_at,
            Inner::HalfOpen { probe_started } => probe_started,
        };
        if !cooldown_elapsed(since, now, self.config.open_cooldown) {
            return false;
        }
        self.state = Inner::HalfOpen { probe_started: now };
        true
    }

    pub fn record_success(&mut self) {
        self.state = Inner::Closed {
            consecutive_failures: 0,
        };
    }

    pub fn record_failure(&mut self, now: DateTime<Utc>) {
        self.state = match self.state {
            Inner::Closed {
                consecutive_failures,
            } => {
                let failures = consecutive_failures.saturating_add(1);
                if failures >= self.config.failure_threshold {
                    Inner::Open { opened_at: now }
                } else {
                    Inner::Closed {
                        consecutive_failures: failures,
                    }
                }
            }
            Inner::HalfOpen { .. } => Inner::Open { opened_at: now },
            open @ Inner::Open { .. } => open,
        };
    }

    pub fn state(&self) -> BreakerState {
        match self.state {
            Inner::Closed { .. } => BreakerState::Closed,
            Inner::Open { .. } => BreakerState::Open,
            Inner::HalfOpen { .. } => BreakerState::HalfOpen,
        }
    }
}

fn cooldown_elapsed(opened_at: DateTime<Utc>, now: DateTime<Utc>, cooldown: Duration) -> bool {
    let Ok(cooldown) = chrono::Duration::from_std(cooldown) else {
        return true;
    };
    now >= opened_at + cooldown
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 1, 9, 0, 0).unwrap()
    }

    fn breaker() -> CircuitBreaker {
        CircuitBreaker::new(BreakerConfig {
            failure_threshold: 3,
            open_cooldown: Duration::from_secs(30),
        })
    }

    #[test]
    fn test_opens_after_threshold() {
        let mut b = breaker();
        for _ in 0..2 {
            assert!(b.admit(t0()));
            b.record_failure(t0());
            assert_eq!(b.state(), BreakerState::Closed);
        }
        b.record_failure(t0());
        assert_eq!(b.state(), BreakerState::Open);
        assert!(!b.admit(t0() + chrono::Duration::seconds(29)));
    }

    #[test]
    fn test_success_resets_failure_count() {
        let mut b = breaker();
        b.record_failure(t0());
        b.record_failure(t0());
        b.record_success();
        b.record_failure(t0());
        assert_eq!(b.state(), BreakerState::Closed);
    }

    #[test]
    fn test_half_open_admits_single_probe() {
        let mut b = breaker();
        for _ in 0..3 {
            b.record_failure(t0());
        }
        let later = t0() + chrono::Duration::seconds(30);
        assert!(b.admit(later));
        assert_eq!(b.state(), BreakerState::HalfOpen);
        assert!(!b.admit(later));

        b.record_success();
        assert_eq!(b.state(), BreakerState::Closed);
        assert!(b.admit(later));
    }

    #[test]
    fn test_failed_probe_reopens() {
        let mut b = breaker();
        for _ in 0..3 {
            b.record_failure(t0());
        }
        let later = t0() + chrono::Duration::seconds(31);
        assert!(b.admit(later));
        b.record_failure(later);
        assert_eq!(b.state(), BreakerState::Open);
        assert!(!b.admit(later + chrono::Duration::seconds(29)));
        assert!(b.admit(later + chrono::Duration::seconds(30)));
    }

    #[test]
    fn test_abandoned_half_open_call_released_after_cooldown() {
        let mut b = breaker();
        for _ in 0..3 {
            b.record_failure(t0());
        }
        let probe_at = t0() + chrono::Duration::seconds(30);
        assert!(b.admit(probe_at));
        // The probe never reports success or failure
        assert!(!b.admit(probe_at + chrono::Duration::seconds(29)));
        assert_eq!(b.state(), BreakerState::HalfOpen);

        let retry_at = probe_at + chrono::Duration::seconds(30);
        assert!(b.admit(retry_at));
        assert!(!b.admit(retry_at));
        b.record_success();
        assert_eq!(b.state(), BreakerState::Closed);
    }

    #[test]
    fn test_zero_threshold_treated_as_one() {
        let mut b = CircuitBreaker::new(BreakerConfig {
            failure_threshold: 0,
            open_cooldown: Duration::from_secs(1),
        });
        b.record_failure(t0());
        assert_eq!(b.state(), BreakerState::Open);
    }
}
