//! Single remote execution attempt.
//!
//! A [`RemoteExecutor`] runs the submitted code once and always answers with a
//! [`RawOutcome`]: collaborator failures, timeouts, spawn errors and unreadable
//! responses are all normalized into a [`RemoteError`] before the retry layer
//! sees them.

mod command;
mod decode;

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::retry::ErrorCode;

pub use command::{CommandExecutor, DEFAULT_TIMEOUT_BUFFER};
pub use decode::{decode_response, normalize_decode_error, DecodeError, RAW_PREFIX_LIMIT};

/// Execution mode offered by the collaborator. Opaque to the retry engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecMode {
    #[default]
    Kernel,
    Terminal,
}

impl fmt::Display for ExecMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecMode::Kernel => f.write_str("kernel"),
            ExecMode::Terminal => f.write_str("terminal"),
        }
    }
}

/// One logical execution request. Reused unchanged for every attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    pub code: String,
    /// Per-attempt timeout handed to the collaborator.
    pub timeout: Duration,
    pub mode: ExecMode,
}

impl ExecutionRequest {
    pub fn new(code: impl Into<String>, timeout: Duration, mode: ExecMode) -> Self {
        Self {
            code: code.into(),
            timeout,
            mode,
        }
    }
}

/// Fields reported by a successful execution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload {
    pub result: Option<String>,
    pub stdout: String,
    pub stderr: String,
    /// Remote execution time in seconds.
    pub execution_time: f64,
}

/// Normalized failure: what the retry layer classifies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteError {
    pub code: ErrorCode,
    pub message: String,
}

impl RemoteError {
    /// An empty message is replaced so a failure always explains itself.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            "Unknown error".to_string()
        } else {
            message
        };
        Self { code, message }
    }

    pub fn timeout() -> Self {
        Self::new(ErrorCode::TIMEOUT, "Execution timeout")
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

/// Result of exactly one attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum RawOutcome {
    Success(Payload),
    Failure(RemoteError),
}

impl RawOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RawOutcome::Success(_))
    }
}

/// Runs one attempt against the remote runtime.
///
/// Implementations must not panic or return platform errors: every failure
/// becomes `RawOutcome::Failure`.
pub trait RemoteExecutor {
    fn execute(&mut self, request: &ExecutionRequest) -> RawOutcome;
}

impl<E: RemoteExecutor + ?Sized> RemoteExecutor for &mut E {
    fn execute(&mut self, request: &ExecutionRequest) -> RawOutcome {
        (**self).execute(request)
    }
}

impl<E: RemoteExecutor + ?Sized> RemoteExecutor for Box<E> {
    fn execute(&mut self, request: &ExecutionRequest) -> RawOutcome {
        (**self).execute(request)
    }
}
