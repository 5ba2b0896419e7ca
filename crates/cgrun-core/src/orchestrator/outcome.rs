//! Per-attempt records and the terminal outcome of one request.

use std::time::Duration;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::remote::{Payload, RemoteError};

/// One finished attempt. Created once, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct Attempt {
    /// 1-based.
    pub index: u32,
    /// `None` when the attempt succeeded.
    pub error: Option<RemoteError>,
    pub elapsed: Duration,
}

impl Attempt {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Exactly one per request. Only the final attempt's error and the attempt
/// count survive; earlier failures are not kept.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    Succeeded { payload: Payload, attempts: u32 },
    Failed { error: RemoteError, attempts: u32 },
}

impl ExecutionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionOutcome::Succeeded { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            ExecutionOutcome::Succeeded { attempts, .. }
            | ExecutionOutcome::Failed { attempts, .. } => *attempts,
        }
    }

    pub fn payload(&self) -> Option<&Payload> {
        match self {
            ExecutionOutcome::Succeeded { payload, .. } => Some(payload),
            ExecutionOutcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&RemoteError> {
        match self {
            ExecutionOutcome::Succeeded { .. } => None,
            ExecutionOutcome::Failed { error, .. } => Some(error),
        }
    }

    /// Process exit status: 0 on success, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }
}

/// `{success, result, stdout, stderr, executionTime, attempts}` on success,
/// `{success, error: {code, message}, attempts}` on failure.
impl Serialize for ExecutionOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ExecutionOutcome::Succeeded { payload, attempts } => {
                let mut s = serializer.serialize_struct("ExecutionOutcome", 6)?;
                s.serialize_field("success", &true)?;
                s.serialize_field("result", &payload.result)?;
                s.serialize_field("stdout", &payload.stdout)?;
                s.serialize_field("stderr", &payload.stderr)?;
                s.serialize_field("executionTime", &payload.execution_time)?;
                s.serialize_field("attempts", attempts)?;
                s.end()
            }
            ExecutionOutcome::Failed { error, attempts } => {
                let mut s = serializer.serialize_struct("ExecutionOutcome", 3)?;
                s.serialize_field("success", &false)?;
                s.serialize_field("error", error)?;
                s.serialize_field("attempts", attempts)?;
                s.end()
            }
        }
    }
}
