use std::time::Duration;

use crate::config::{RECONNECT_BASE_MS, RECONNECT_MAX_ATTEMPTS, RECONNECT_MAX_MS};

/// Exponential reconnect policy: `base * 2^(attempt - 1)`, capped at `max`,
/// for at most `max_attempts` attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub base: Duration,
    pub max: Duration,
    pub max_attempts: u32,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(RECONNECT_BASE_MS),
            max: Duration::from_millis(RECONNECT_MAX_MS),
            max_attempts: RECONNECT_MAX_ATTEMPTS,
        }
    }
}

impl Backoff {
    /// Delay before the 1-based `attempt`, `None` once the attempts are used up.
    pub fn delay(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.max_attempts {
            return None;
        }

        let factor = 2u32.checked_pow(attempt - 1).unwrap_or(u32::MAX);

        Some(
            self.base
                .checked_mul(factor)
                .map_or(self.max, |delay| delay.min(self.max)),
        )
    }
}
