//! Backoff suspension, behind a trait so tests never wait on the wall clock.

use std::time::{Duration, Instant};

use crate::control::CancelToken;

/// How a backoff wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepOutcome {
    Elapsed,
    Cancelled,
}

/// Blocks the calling thread for a backoff delay.
pub trait Sleeper {
    fn sleep(&mut self, delay: Duration) -> SleepOutcome;
}

impl<S: Sleeper + ?Sized> Sleeper for &mut S {
    fn sleep(&mut self, delay: Duration) -> SleepOutcome {
        (**self).sleep(delay)
    }
}

/// Uninterruptible `std::thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, delay: Duration) -> SleepOutcome {
        std::thread::sleep(delay);
        SleepOutcome::Elapsed
    }
}

/// Sleeps in short slices and returns early once the token is cancelled.
#[derive(Debug, Clone)]
pub struct CancellableSleeper {
    token: CancelToken,
    poll_interval: Duration,
}

impl CancellableSleeper {
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

    pub fn new(token: CancelToken) -> Self {
        Self {
            token,
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval.max(Duration::from_millis(1));
        self
    }
}

impl Sleeper for CancellableSleeper {
    fn sleep(&mut self, delay: Duration) -> SleepOutcome {
        // None: the delay is past what `Instant` can represent; only cancellation ends it.
        let deadline = Instant::now().checked_add(delay);
        loop {
            if self.token.is_cancelled() {
                return SleepOutcome::Cancelled;
            }
            let slice = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return SleepOutcome::Elapsed;
                    }
                    self.poll_interval.min(deadline - now)
                }
                None => self.poll_interval,
            };
            std::thread::sleep(slice);
        }
    }
}
