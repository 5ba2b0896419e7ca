//! Outcome rendering: JSON envelope or human-readable text.

use anyhow::Result;
use cgrun_core::orchestrator::ExecutionOutcome;

/// Text destined for stdout and stderr.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Rendered {
    pub stdout: String,
    pub stderr: String,
}

pub fn render_json(outcome: &ExecutionOutcome) -> Result<String> {
    Ok(serde_json::to_string_pretty(outcome)?)
}

pub fn render_text(outcome: &ExecutionOutcome, verbose: bool) -> Rendered {
    let mut r = Rendered::default();
    match outcome {
        ExecutionOutcome::Succeeded { payload, attempts } => {
            if !payload.stdout.is_empty() {
                r.stdout.push_str(payload.stdout.trim_end_matches('\n'));
                r.stdout.push('\n');
            }
            if let Some(result) = payload.result.as_deref().filter(|s| !s.is_empty()) {
                r.stdout.push_str(&format!("Result: {result}\n"));
            }
            if verbose {
                r.stderr.push_str(&format!(
                    "\nCompleted in {:.2}s ({} attempt(s))\n",
                    payload.execution_time, attempts
                ));
            }
        }
        ExecutionOutcome::Failed { error, attempts } => {
            r.stderr.push_str(&format!("Error: {}\n", error.message));
            if verbose {
                r.stderr.push_str(&format!("  Error code: {}\n", error.code));
                r.stderr.push_str(&format!("  Attempts: {attempts}\n"));
            }
        }
    }
    r
}
