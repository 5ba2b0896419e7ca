//! Decode the collaborator's `--json` output.

use serde::Deserialize;
use serde_json::Value;

use super::{Payload, RawOutcome, RemoteError};
use crate::retry::ErrorCode;

/// How much of an undecodable response is echoed into the error message.
pub const RAW_PREFIX_LIMIT: usize = 200;
/// How much captured stderr is appended to a decode failure.
const STDERR_LIMIT: usize = 500;

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Invalid JSON response: empty output")]
    Empty,
    #[error("Invalid JSON response: {prefix}")]
    InvalidJson {
        prefix: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    success: bool,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    stdout: Option<String>,
    #[serde(default)]
    stderr: Option<String>,
    #[serde(default, rename = "executionTime")]
    execution_time: Option<f64>,
    #[serde(default)]
    error: Option<WireError>,
}

#[derive(Debug, Default, Deserialize)]
struct WireError {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
}

/// Decode one response. A well-formed `success: false` response is `Ok(Failure)`;
/// only output that does not have the expected shape is an `Err`.
pub fn decode_response(raw: &str) -> Result<RawOutcome, DecodeError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DecodeError::Empty);
    }
    let wire: WireResponse =
        serde_json::from_str(trimmed).map_err(|source| DecodeError::InvalidJson {
            prefix: bounded(raw, RAW_PREFIX_LIMIT),
            source,
        })?;

    if wire.success {
        return Ok(RawOutcome::Success(Payload {
            result: wire.result.and_then(render_result),
            stdout: wire.stdout.unwrap_or_default(),
            stderr: wire.stderr.unwrap_or_default(),
            execution_time: wire.execution_time.unwrap_or(0.0),
        }));
    }

    let error = wire.error.unwrap_or_default();
    Ok(RawOutcome::Failure(RemoteError::new(
        error.code.map(ErrorCode).unwrap_or(ErrorCode::INTERNAL),
        error.message.unwrap_or_default(),
    )))
}

/// Turn a decode failure into the uniform failure shape, appending whatever
/// the collaborator wrote to stderr.
pub fn normalize_decode_error(err: &DecodeError, stderr: &str) -> RemoteError {
    let mut message = err.to_string();
    let stderr = stderr.trim();
    if !stderr.is_empty() {
        message.push_str("; stderr: ");
        message.push_str(&bounded(stderr, STDERR_LIMIT));
    }
    RemoteError::new(ErrorCode::INTERNAL, message)
}

fn render_result(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn bounded(s: &str, limit: usize) -> String {
    s.chars().take(limit).collect()
}
