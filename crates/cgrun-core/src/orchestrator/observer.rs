use std::time::Duration;

use super::outcome::Attempt;
use crate::remote::RemoteError;
use crate::retry::ErrorCategory;

/// Progress side channel. Every callback defaults to a no-op, and nothing an
/// observer does can change the outcome of a run.
pub trait AttemptObserver {
    fn attempt_started(&mut self, _attempt: u32, _max_attempts: u32) {}

    /// `category` is `None` for a successful attempt.
    fn attempt_finished(&mut self, _attempt: &Attempt, _category: Option<ErrorCategory>) {}

    fn retry_scheduled(&mut self, _attempt: u32, _delay: Duration) {}

    fn giving_up(&mut self, _attempt: u32, _error: &RemoteError, _category: ErrorCategory) {}

    fn backoff_cancelled(&mut self, _attempt: u32) {}
}

/// Observer that ignores everything.
impl AttemptObserver for () {}
