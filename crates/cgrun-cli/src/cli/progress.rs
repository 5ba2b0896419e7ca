//! `--verbose` progress lines for `cgrun run`.

use std::io::Write;
use std::time::Duration;

use cgrun_core::orchestrator::{Attempt, AttemptObserver};
use cgrun_core::remote::RemoteError;
use cgrun_core::retry::ErrorCategory;

/// Writes one line per orchestrator event. Write errors are ignored.
pub struct StderrProgress<W: Write> {
    out: W,
}

impl<W: Write> StderrProgress<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> AttemptObserver for StderrProgress<W> {
    fn attempt_started(&mut self, attempt: u32, max_attempts: u32) {
        let _ = writeln!(self.out, "Attempt {attempt}/{max_attempts}...");
    }

    fn attempt_finished(&mut self, attempt: &Attempt, category: Option<ErrorCategory>) {
        if let (Some(err), Some(category)) = (&attempt.error, category) {
            let _ = writeln!(
                self.out,
                "  Error (code={}, category={}): {}",
                err.code, category, err.message
            );
        }
    }

    fn retry_scheduled(&mut self, _attempt: u32, delay: Duration) {
        let _ = writeln!(self.out, "  Retrying in {:.1}s...", delay.as_secs_f64());
    }

    fn giving_up(&mut self, _attempt: u32, _error: &RemoteError, category: ErrorCategory) {
        let _ = writeln!(self.out, "  Not retrying ({category} error)");
    }

    fn backoff_cancelled(&mut self, _attempt: u32) {
        let _ = writeln!(self.out, "  Cancelled while waiting to retry");
    }
}
