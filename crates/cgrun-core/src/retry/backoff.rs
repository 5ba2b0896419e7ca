use std::time::Duration;

/// Capped exponential backoff without jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    /// Delay after the first failed attempt.
    pub base_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl Backoff {
    pub fn new(base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            base_delay,
            max_delay,
        }
    }

    /// Delay before the attempt following `attempt` (1-based):
    /// `min(base * 2^(attempt-1), max)`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        delay_for(attempt, self.base_delay, self.max_delay)
    }
}

/// `min(base * 2^(attempt-1), max)`. Attempt 0 is treated like attempt 1.
///
/// Doubles with saturation and stops once the cap is reached, so large
/// attempt numbers neither overflow nor loop long.
pub fn delay_for(attempt: u32, base_delay: Duration, max_delay: Duration) -> Duration {
    let mut delay = base_delay;
    for _ in 1..attempt {
        if delay.is_zero() || delay >= max_delay {
            break;
        }
        delay = delay.saturating_mul(2);
    }
    delay.min(max_delay)
}
