//! Deterministic collaborators for orchestrator tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::time::Duration;

use cgrun_core::orchestrator::{Attempt, AttemptObserver, SleepOutcome, Sleeper};
use cgrun_core::remote::{ExecutionRequest, Payload, RawOutcome, RemoteError, RemoteExecutor};
use cgrun_core::retry::{ErrorCategory, ErrorCode};

/// Replays a fixed list of outcomes, one per attempt; repeats the last one when exhausted.
pub struct ScriptedExecutor {
    script: VecDeque<RawOutcome>,
    last: Option<RawOutcome>,
    pub calls: u32,
    pub requests: Vec<ExecutionRequest>,
}

impl ScriptedExecutor {
    pub fn new(script: Vec<RawOutcome>) -> Self {
        Self {
            script: script.into(),
            last: None,
            calls: 0,
            requests: Vec::new(),
        }
    }
}

impl RemoteExecutor for ScriptedExecutor {
    fn execute(&mut self, request: &ExecutionRequest) -> RawOutcome {
        self.calls += 1;
        self.requests.push(request.clone());
        let next = self
            .script
            .pop_front()
            .or_else(|| self.last.clone())
            .expect("scripted executor needs at least one outcome");
        self.last = Some(next.clone());
        next
    }
}

pub fn fail(code: i64, message: &str) -> RawOutcome {
    RawOutcome::Failure(RemoteError::new(ErrorCode(code), message))
}

pub fn ok(result: &str) -> RawOutcome {
    RawOutcome::Success(Payload {
        result: Some(result.to_string()),
        stdout: format!("{result}\n"),
        stderr: String::new(),
        execution_time: 0.25,
    })
}

/// Records requested delays instead of sleeping.
#[derive(Default)]
pub struct RecordingSleeper {
    pub delays: Vec<Duration>,
    /// Report cancellation on this (1-based) sleep call.
    pub cancel_on: Option<usize>,
}

impl Sleeper for RecordingSleeper {
    fn sleep(&mut self, delay: Duration) -> SleepOutcome {
        self.delays.push(delay);
        if self.cancel_on == Some(self.delays.len()) {
            SleepOutcome::Cancelled
        } else {
            SleepOutcome::Elapsed
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Started(u32, u32),
    Finished(u32, Option<ErrorCategory>),
    Retry(u32, Duration),
    GaveUp(u32, ErrorCategory),
    Cancelled(u32),
}

#[derive(Default)]
pub struct RecordingObserver {
    pub events: Vec<Event>,
    pub attempts: Vec<Attempt>,
}

impl AttemptObserver for RecordingObserver {
    fn attempt_started(&mut self, attempt: u32, max_attempts: u32) {
        self.events.push(Event::Started(attempt, max_attempts));
    }

    fn attempt_finished(&mut self, attempt: &Attempt, category: Option<ErrorCategory>) {
        self.attempts.push(attempt.clone());
        self.events.push(Event::Finished(attempt.index, category));
    }

    fn retry_scheduled(&mut self, attempt: u32, delay: Duration) {
        self.events.push(Event::Retry(attempt, delay));
    }

    fn giving_up(&mut self, attempt: u32, _error: &RemoteError, category: ErrorCategory) {
        self.events.push(Event::GaveUp(attempt, category));
    }

    fn backoff_cancelled(&mut self, attempt: u32) {
        self.events.push(Event::Cancelled(attempt));
    }
}
