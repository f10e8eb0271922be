use std::time::Duration;

use rand::Rng;

/// Backoff policy for provider attempts within one batch.
///
/// Modeled as a plain value injected into the orchestrator so tests can
/// substitute a zero-delay policy instead of waiting out real backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts per batch (first try included).
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(10),
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Zero-delay policy for tests. Keeps the attempt count, drops the waits.
    pub fn zeroed() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            jitter: false,
        }
    }

    /// Delay to sleep before attempt `attempt` (1-based; attempt 0 is the
    /// first try and never waits). Exponential: base, 2*base, 4*base, ...
    /// capped at `max_delay`, plus up to 50% random jitter.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let exp = attempt.saturating_sub(1).min(16);
        let raw = self
            .base_delay
            .saturating_mul(1u32 << exp)
            .min(self.max_delay);
        if !self.jitter || raw.is_zero() {
            return raw;
        }
        let half = (raw.as_millis() / 2) as u64;
        let extra = rand::thread_rng().gen_range(0..=half);
        raw + Duration::from_millis(extra)
    }
}
