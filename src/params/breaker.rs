//! Circuit breaker for outbound dependency calls
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: dependency assumed down, calls rejected without touching it
//! - Half-Open: cooldown elapsed, probe traffic allowed
//!
//! # State Transitions
//! ```text
//! Closed → Open: consecutive failures reach the threshold
//! Open → Half-Open: cooldown elapses, no explicit action needed
//! Half-Open → Closed: one successful probe
//! Half-Open → Open: one failed probe
//! ```
//!
//! Counters use atomics only; state reads are lock-free and safe from any
//! number of concurrent call paths. A transport-level failure can force the
//! breaker open directly via [`CircuitBreaker::force_open`], independent of
//! the consecutive-failure count.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

impl std::fmt::Display for BreakerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Open => write!(f, "open"),
            Self::HalfOpen => write!(f, "half_open"),
        }
    }
}

pub struct CircuitBreaker {
    /// Consecutive qualifying failures since the last success.
    failures: AtomicU32,
    /// Monotonic microseconds when the open period ends (0 = not open).
    open_until_us: AtomicU64,
    threshold: u32,
    cooldown: Duration,
    epoch: Instant,
}

impl CircuitBreaker {
    pub fn new(threshold: u32, cooldown: Duration) -> Self {
        Self {
            failures: AtomicU32::new(0),
            open_until_us: AtomicU64::new(0),
            threshold,
            cooldown,
            epoch: Instant::now(),
        }
    }

    /// Current state (lock-free read).
    pub fn state(&self) -> BreakerState {
        let open_until = self.open_until_us.load(Ordering::Acquire);
        if open_until > 0 && self.now_us() < open_until {
            return BreakerState::Open;
        }
        if self.failures.load(Ordering::Acquire) >= self.threshold {
            // Cooldown elapsed but no success recorded yet.
            return BreakerState::HalfOpen;
        }
        BreakerState::Closed
    }

    /// Whether a call may proceed. Closed and Half-Open both allow traffic.
    pub fn allow(&self) -> bool {
        self.state() != BreakerState::Open
    }

    /// Seconds until an open breaker starts probing. 0.0 when not open.
    pub fn remaining_open_secs(&self) -> f64 {
        let open_until = self.open_until_us.load(Ordering::Acquire);
        let now_us = self.now_us();
        if open_until == 0 || now_us >= open_until {
            return 0.0;
        }
        (open_until - now_us) as f64 / 1_000_000.0
    }

    pub fn failure_count(&self) -> u32 {
        self.failures.load(Ordering::Acquire)
    }

    /// A success closes the breaker and resets the failure count.
    pub fn record_success(&self) {
        self.failures.store(0, Ordering::Release);
        self.open_until_us.store(0, Ordering::Release);
    }

    /// A qualifying failure; opens the breaker once the threshold is reached
    /// (and re-opens it on a failed half-open probe).
    pub fn record_failure(&self) {
        let new_count = self.failures.fetch_add(1, Ordering::AcqRel) + 1;
        if new_count >= self.threshold {
            self.open(self.cooldown);
        }
    }

    /// Force the breaker open immediately, regardless of the consecutive
    /// failure count. Used when the dependency is unreachable at the
    /// transport level.
    pub fn force_open(&self) {
        self.failures.store(self.threshold, Ordering::Release);
        self.open(self.cooldown);
    }

    fn open(&self, cooldown: Duration) {
        let open_until = self.now_us() + cooldown.as_micros().min(u64::MAX as u128) as u64;
        self.open_until_us.store(open_until, Ordering::Release);
    }

    fn now_us(&self) -> u64 {
        self.epoch.elapsed().as_micros().min(u64::MAX as u128) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_breaker() -> CircuitBreaker {
        CircuitBreaker::new(3, Duration::from_millis(50))
    }

    #[test]
    fn test_starts_closed() {
        let cb = fast_breaker();
        assert_eq!(cb.state(), BreakerState::Closed);
        assert!(cb.allow());
    }

    #[test]
    fn test_opens_after_threshold_consecutive_failures() {
        let cb = fast_breaker();
        cb.record_failure();
        cb.record_failure();
        assert_eq!(cb.state(), BreakerState::Closed);

        cb.record_failure();
        assert_eq!(cb.state(), BreakerState::Open);
        assert!(!cb.allow());
        assert!(cb.remaining_open_secs() > 0.0);
    }

    #[test]
    fn test_success_resets_failure_count() {
        let cb = fast_breaker();
        cb.record_failure();
        cb.record_failure();
        cb.record_success();
        assert_eq!(cb.failure_count(), 0);

        // Two more failures are not enough to trip after the reset.
        cb.record_failure();
        cb.record_failure();
        assert_eq!(cb.state(), BreakerState::Closed);
    }

    #[test]
    fn test_half_open_after_cooldown_then_closes_on_success() {
        let cb = fast_breaker();
        for _ in 0..3 {
            cb.record_failure();
        }
        assert_eq!(cb.state(), BreakerState::Open);

        std::thread::sleep(Duration::from_millis(70));
        assert_eq!(cb.state(), BreakerState::HalfOpen);
        assert!(cb.allow());

        cb.record_success();
        assert_eq!(cb.state(), BreakerState::Closed);
    }

    #[test]
    fn test_half_open_reopens_on_failed_probe() {
        let cb = fast_breaker();
        for _ in 0..3 {
            cb.record_failure();
        }
        std::thread::sleep(Duration::from_millis(70));
        assert_eq!(cb.state(), BreakerState::HalfOpen);

        cb.record_failure();
        assert_eq!(cb.state(), BreakerState::Open);
    }

    #[test]
    fn test_force_open_trips_immediately() {
        let cb = fast_breaker();
        assert_eq!(cb.state(), BreakerState::Closed);

        cb.force_open();
        assert_eq!(cb.state(), BreakerState::Open);
        assert!(!cb.allow());
    }
}
