//! Run control: a shared cancellation token checked during backoff waits.
//!
//! The token is cloned into a [`CancellableSleeper`](crate::orchestrator::CancellableSleeper);
//! any other holder (signal handler, supervising thread) can call
//! [`CancelToken::cancel`] and the pending wait returns early.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable flag shared between the orchestrator and whoever may abort it.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}
