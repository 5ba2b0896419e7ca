//! Retry and backoff policy.
//!
//! This module encapsulates error classification (transient, resource,
//! code, auth, unknown) and capped exponential backoff so the orchestrator
//! makes every retry decision through one consistent policy.

mod backoff;
mod classify;
mod policy;

pub use backoff::{delay_for, Backoff};
pub use classify::{
    classify, ClassifierError, ErrorCategory, ErrorClassifier, ErrorCode, NON_RETRYABLE_CODES,
    RESOURCE_CODES, TRANSIENT_CODES,
};
pub use policy::{should_retry, AttemptLimit, CategoryLimits, RetryDecision, RetryPolicy};
