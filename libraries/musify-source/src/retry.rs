//! Backoff schedule between resolution attempts

use rand::Rng;
use std::time::Duration;

/// Exponential backoff with optional jitter
///
/// Retry `k` (0-based) waits `min(base * 2^k, max)`. With jitter the wait is
/// drawn uniformly from the upper half of that window, so concurrent players
/// don't hammer the upstream in lockstep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,

    /// Delay before the first retry
    pub base_delay: Duration,

    /// Ceiling for any single delay
    pub max_delay: Duration,

    /// Randomize delays
    pub jitter: bool,
}

impl RetryPolicy {
    /// Total attempts including the first one
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Un-jittered delay before retry `retry`
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Delay to actually sleep before retry `retry`
    pub fn backoff(&self, retry: u32) -> Duration {
        let delay = self.delay_for(retry);
        if !self.jitter || delay.is_zero() {
            return delay;
        }

        let ceiling = delay.as_millis() as u64;
        let floor = ceiling / 2;
        Duration::from_millis(rand::thread_rng().gen_range(floor..=ceiling))
    }

    /// Sum of un-jittered delays across all retries
    pub fn max_total_delay(&self) -> Duration {
        (0..self.max_retries).map(|retry| self.delay_for(retry)).sum()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(2),
            jitter: true,
        }
    }
}
