//! Attempt loop: execute, classify, decide, back off, repeat.

use std::time::Instant;

use super::observer::AttemptObserver;
use super::outcome::{Attempt, ExecutionOutcome};
use super::sleep::{SleepOutcome, Sleeper, ThreadSleeper};
use crate::remote::{ExecutionRequest, RawOutcome, RemoteError, RemoteExecutor};
use crate::retry::{ErrorCode, RetryDecision, RetryPolicy};

/// Drives one request to a single [`ExecutionOutcome`], one attempt at a time.
#[derive(Debug)]
pub struct Orchestrator<E, S = ThreadSleeper> {
    executor: E,
    sleeper: S,
    policy: RetryPolicy,
}

impl<E: RemoteExecutor> Orchestrator<E, ThreadSleeper> {
    pub fn new(executor: E, policy: RetryPolicy) -> Self {
        Self {
            executor,
            sleeper: ThreadSleeper,
            policy,
        }
    }
}

impl<E: RemoteExecutor, S: Sleeper> Orchestrator<E, S> {
    pub fn with_sleeper<T: Sleeper>(self, sleeper: T) -> Orchestrator<E, T> {
        Orchestrator {
            executor: self.executor,
            sleeper,
            policy: self.policy,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn sleeper(&self) -> &S {
        &self.sleeper
    }

    pub fn run(&mut self, request: &ExecutionRequest) -> ExecutionOutcome {
        self.run_observed(request, &mut ())
    }

    /// Never fails: operational errors end up in `ExecutionOutcome::Failed`.
    pub fn run_observed(
        &mut self,
        request: &ExecutionRequest,
        observer: &mut dyn AttemptObserver,
    ) -> ExecutionOutcome {
        let max_attempts = self.policy.max_attempts();
        let mut last_error: Option<RemoteError> = None;

        for attempt in 1..=max_attempts {
            observer.attempt_started(attempt, max_attempts);
            tracing::info!(attempt, max_attempts, mode = %request.mode, "starting attempt");

            let started = Instant::now();
            let raw = self.executor.execute(request);
            let elapsed = started.elapsed();

            let error = match raw {
                RawOutcome::Success(payload) => {
                    let record = Attempt {
                        index: attempt,
                        error: None,
                        elapsed,
                    };
                    observer.attempt_finished(&record, None);
                    tracing::info!(attempt, elapsed_ms = elapsed.as_millis() as u64, "attempt succeeded");
                    return ExecutionOutcome::Succeeded {
                        payload,
                        attempts: attempt,
                    };
                }
                RawOutcome::Failure(error) => error,
            };

            let category = self.policy.classify(error.code);
            let record = Attempt {
                index: attempt,
                error: Some(error.clone()),
                elapsed,
            };
            observer.attempt_finished(&record, Some(category));
            tracing::warn!(
                attempt,
                code = error.code.0,
                %category,
                message = %error.message,
                "attempt failed"
            );

            match self.policy.decide(attempt, error.code) {
                RetryDecision::NoRetry => {
                    observer.giving_up(attempt, &error, category);
                    tracing::info!(attempt, %category, "not retrying");
                    return ExecutionOutcome::Failed {
                        error,
                        attempts: attempt,
                    };
                }
                RetryDecision::RetryAfter(delay) => {
                    observer.retry_scheduled(attempt, delay);
                    tracing::info!(attempt, delay_ms = delay.as_millis() as u64, "backing off");
                    if self.sleeper.sleep(delay) == SleepOutcome::Cancelled {
                        observer.backoff_cancelled(attempt);
                        tracing::info!(attempt, "backoff cancelled");
                        return ExecutionOutcome::Failed {
                            error: RemoteError::new(
                                error.code,
                                format!("cancelled during backoff: {}", error.message),
                            ),
                            attempts: attempt,
                        };
                    }
                    last_error = Some(error);
                }
            }
        }

        // Only reachable if the policy allowed a retry on the final attempt.
        let error = last_error
            .unwrap_or_else(|| RemoteError::new(ErrorCode::INTERNAL, "no attempt was made"));
        ExecutionOutcome::Failed {
            error,
            attempts: max_attempts,
        }
    }
}
