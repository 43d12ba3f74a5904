use common::constants::{BACKOFF_BASE_MS, BACKOFF_JITTER, BACKOFF_MAX_MS};
use rand::{thread_rng, Rng};
use std::time::Duration;

/// Exponential reconnect delay: `min(base * 2^attempt, max)` scaled by a
/// symmetric random jitter, never exceeding `max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    pub base: Duration,
    pub max: Duration,
    /// Fraction of the delay, e.g. `0.2` for ±20%.
    pub jitter: f64,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(BACKOFF_BASE_MS),
            Duration::from_millis(BACKOFF_MAX_MS),
            BACKOFF_JITTER,
        )
    }
}

impl Backoff {
    pub fn new(base: Duration, max: Duration, jitter: f64) -> Self {
        Self { base, max, jitter }
    }

    pub fn delay(&self, attempt: u32) -> Duration {
        let sample = thread_rng().gen_range(-1.0..=1.0);
        self.delay_with_sample(attempt, sample)
    }

    /// Delay for a given jitter sample in `[-1, 1]`.
    pub fn delay_with_sample(&self, attempt: u32, sample: f64) -> Duration {
        let base_ms = self.base.as_millis() as u64;
        let max_ms = self.max.as_millis() as u64;
        let multiplier = 1u64.checked_shl(attempt.min(63)).unwrap_or(u64::MAX);
        let capped = base_ms.saturating_mul(multiplier).min(max_ms);

        let jitter = self.jitter.clamp(0.0, 1.0) * sample.clamp(-1.0, 1.0);
        let jittered = (capped as f64 * (1.0 + jitter)).floor();
        let millis = jittered.clamp(0.0, max_ms as f64) as u64;
        Duration::from_millis(millis)
    }

    pub fn expected_delay(&self, attempt: u32) -> Duration {
        self.delay_with_sample(attempt, 0.0)
    }
}
