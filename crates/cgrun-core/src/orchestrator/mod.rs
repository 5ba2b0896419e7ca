//! Execution orchestrator.
//!
//! Runs attempts strictly one after another: a success ends the run
//! immediately, a failure is classified and either retried after a capped
//! exponential delay or reported as the final outcome.

mod observer;
mod outcome;
mod run;
mod sleep;

pub use observer::AttemptObserver;
pub use outcome::{Attempt, ExecutionOutcome};
pub use run::Orchestrator;
pub use sleep::{CancellableSleeper, SleepOutcome, Sleeper, ThreadSleeper};
