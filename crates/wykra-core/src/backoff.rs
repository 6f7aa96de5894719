//! Bounded exponential back-off schedule.

use std::time::Duration;

/// Exponential schedule: `initial * 2^attempt`, never above `max_interval`.
///
/// | attempt | delay (initial = 1 s, max = 8 s) |
/// |---------|----------------------------------|
/// | 0       | 1 s                              |
/// | 1       | 2 s                              |
/// | 2       | 4 s                              |
/// | 3+      | 8 s                              |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub initial: Duration,
    pub max_interval: Duration,
}

impl BackoffPolicy {
    #[must_use]
    pub fn new(initial: Duration, max_interval: Duration) -> Self {
        Self {
            initial,
            max_interval: max_interval.max(initial),
        }
    }

    /// Delay before the retry that follows `attempt` (zero-based).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.min(20);
        self.initial
            .checked_mul(factor)
            .unwrap_or(self.max_interval)
            .min(self.max_interval)
    }

    /// Sum of the first `attempts` delays.
    #[must_use]
    pub fn total_for(&self, attempts: u32) -> Duration {
        (0..attempts).map(|a| self.delay_for(a)).sum()
    }
}
