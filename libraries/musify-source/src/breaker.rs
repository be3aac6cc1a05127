//! Circuit breaker guarding one provider
//!
//! ```text
//! closed --threshold consecutive failures--> open
//! open --cooldown elapsed--> half-open
//! half-open --success--> closed
//! half-open --failure--> open
//! ```
//!
//! A failure is a whole resolution giving up, retries included, not a single
//! attempt. While open, calls are refused without touching the endpoint.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

/// Circuit position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    /// Calls go through
    Closed,

    /// Calls are refused until the cooldown passes
    Open,

    /// Cooldown passed; the next outcome closes or reopens the circuit
    HalfOpen,
}

/// Consecutive-failure circuit breaker
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,

    /// Failures that open the circuit; 0 disables the breaker
    threshold: u32,

    cooldown: Duration,
    inner: Mutex<BreakerInner>,
}

#[derive(Debug)]
struct BreakerInner {
    state: BreakerState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, threshold: u32, cooldown: Duration) -> Self {
        Self {
            name: name.into(),
            threshold,
            cooldown,
            inner: Mutex::new(BreakerInner {
                state: BreakerState::Closed,
                consecutive_failures: 0,
                opened_at: None,
            }),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.threshold > 0
    }

    pub fn state(&self) -> BreakerState {
        let mut inner = self.lock();
        self.refresh(&mut inner);
        inner.state
    }

    /// Whether a call may go through now
    pub fn allow(&self) -> bool {
        if !self.is_enabled() {
            return true;
        }

        let mut inner = self.lock();
        self.refresh(&mut inner);
        inner.state != BreakerState::Open
    }

    /// Time left before an open circuit turns half-open
    pub fn remaining_cooldown(&self) -> Option<Duration> {
        let inner = self.lock();
        if inner.state != BreakerState::Open {
            return None;
        }
        let opened_at = inner.opened_at?;
        self.cooldown.checked_sub(opened_at.elapsed())
    }

    pub fn record_success(&self) {
        let mut inner = self.lock();
        if inner.state != BreakerState::Closed {
            info!(breaker = %self.name, "Circuit closed");
        }
        inner.state = BreakerState::Closed;
        inner.consecutive_failures = 0;
        inner.opened_at = None;
    }

    pub fn record_failure(&self) {
        if !self.is_enabled() {
            return;
        }

        let mut inner = self.lock();
        inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);

        let trip = match inner.state {
            BreakerState::Closed => inner.consecutive_failures >= self.threshold,
            BreakerState::HalfOpen => true,
            // A call that started before the circuit opened
            BreakerState::Open => false,
        };

        if trip {
            inner.state = BreakerState::Open;
            inner.opened_at = Some(Instant::now());
            warn!(
                breaker = %self.name,
                consecutive_failures = inner.consecutive_failures,
                cooldown_ms = self.cooldown.as_millis() as u64,
                "Circuit open, refusing calls until cooldown passes"
            );
        }
    }

    fn refresh(&self, inner: &mut BreakerInner) {
        let cooled_down = inner
            .opened_at
            .is_some_and(|opened_at| opened_at.elapsed() >= self.cooldown);

        if inner.state == BreakerState::Open && cooled_down {
            inner.state = BreakerState::HalfOpen;
            info!(breaker = %self.name, "Circuit half-open, letting calls through");
        }
    }

    fn lock(&self) -> MutexGuard<'_, BreakerInner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker() -> CircuitBreaker {
        CircuitBreaker::new("test", 3, Duration::from_secs(10))
    }

    #[tokio::test(start_paused = true)]
    async fn opens_after_threshold_consecutive_failures() {
        let breaker = breaker();

        breaker.record_failure();
        breaker.record_failure();
        assert!(breaker.allow());

        breaker.record_failure();
        assert_eq!(breaker.state(), BreakerState::Open);
        assert!(!breaker.allow());
        assert_eq!(breaker.remaining_cooldown(), Some(Duration::from_secs(10)));
    }

    #[tokio::test(start_paused = true)]
    async fn success_resets_the_count() {
        let breaker = breaker();

        breaker.record_failure();
        breaker.record_failure();
        breaker.record_success();
        breaker.record_failure();
        breaker.record_failure();

        assert_eq!(breaker.state(), BreakerState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn half_open_after_cooldown() {
        let breaker = breaker();
        for _ in 0..3 {
            breaker.record_failure();
        }

        tokio::time::advance(Duration::from_secs(9)).await;
        assert!(!breaker.allow());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(breaker.allow());
        assert_eq!(breaker.state(), BreakerState::HalfOpen);

        breaker.record_success();
        assert_eq!(breaker.state(), BreakerState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_trial_reopens() {
        let breaker = breaker();
        for _ in 0..3 {
            breaker.record_failure();
        }
        tokio::time::advance(Duration::from_secs(10)).await;
        assert!(breaker.allow());

        breaker.record_failure();

        assert_eq!(breaker.state(), BreakerState::Open);
        assert_eq!(breaker.remaining_cooldown(), Some(Duration::from_secs(10)));
    }

    #[tokio::test]
    async fn zero_threshold_never_opens() {
        let breaker = CircuitBreaker::new("off", 0, Duration::from_secs(10));
        for _ in 0..10 {
            breaker.record_failure();
        }

        assert!(breaker.allow());
        assert_eq!(breaker.state(), BreakerState::Closed);
    }
}
