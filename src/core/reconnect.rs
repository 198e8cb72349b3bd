use std::time::Duration;

use super::types::WsReconnectStrategy;

/// Doubling backoff with a ceiling and a bounded number of attempts.
///
/// Attempt `n` (1-indexed) waits `min(base * 2^(n-1), max)`.
#[derive(Clone, Debug)]
pub struct ExponentialBackoffReconnect {
    base: Duration,
    max: Duration,
    max_attempts: u32,
}

impl ExponentialBackoffReconnect {
    pub const DEFAULT_BASE: Duration = Duration::from_secs(1);
    pub const DEFAULT_MAX: Duration = Duration::from_secs(30);
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

    pub fn new(base: Duration, max: Duration, max_attempts: u32) -> Self {
        Self {
            base,
            max: max.max(base),
            max_attempts,
        }
    }
}

impl Default for ExponentialBackoffReconnect {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_BASE,
            Self::DEFAULT_MAX,
            Self::DEFAULT_MAX_ATTEMPTS,
        )
    }
}

impl WsReconnectStrategy for ExponentialBackoffReconnect {
    fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base
            .checked_mul(1u32 << exponent)
            .unwrap_or(self.max)
            .min(self.max)
    }

    fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}
