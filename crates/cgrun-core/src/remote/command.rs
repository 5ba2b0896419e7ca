//! Run the collaborator CLI (`lecoder-cgpu run --json ...`) as a child process.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use wait_timeout::ChildExt;

use super::decode::{decode_response, normalize_decode_error};
use super::{ExecMode, ExecutionRequest, RawOutcome, RemoteError, RemoteExecutor};
use crate::retry::ErrorCode;

/// Added to the logical timeout so a hung collaborator is told apart from
/// remote code that legitimately ran long.
pub const DEFAULT_TIMEOUT_BUFFER: Duration = Duration::from_secs(30);

/// Executes each attempt by spawning the collaborator and decoding its stdout.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    program: PathBuf,
    timeout_buffer: Duration,
}

struct Captured {
    stdout: String,
    stderr: String,
}

impl CommandExecutor {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout_buffer: DEFAULT_TIMEOUT_BUFFER,
        }
    }

    pub fn with_timeout_buffer(mut self, buffer: Duration) -> Self {
        self.timeout_buffer = buffer;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Arguments passed to the collaborator for one attempt.
    pub fn args(request: &ExecutionRequest) -> Vec<String> {
        let mut args = vec!["run".to_string(), "--json".to_string()];
        if request.mode == ExecMode::Kernel {
            args.push("--kernel".to_string());
        }
        args.push("--timeout".to_string());
        args.push(timeout_secs(request.timeout).to_string());
        args.push(request.code.clone());
        args
    }

    fn run(&self, request: &ExecutionRequest) -> Result<Captured, RemoteError> {
        let mut child = Command::new(&self.program)
            .args(Self::args(request))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                tracing::error!(program = %self.program.display(), error = %e, "failed to spawn collaborator");
                RemoteError::new(
                    ErrorCode::INTERNAL,
                    format!("failed to start {}: {e}", self.program.display()),
                )
            })?;

        let started = Instant::now();
        let deadline = request.timeout.saturating_add(self.timeout_buffer);

        // Drain both pipes while waiting so a chatty child cannot block on a full pipe.
        let (tx, rx) = mpsc::channel();
        let mut pending = 0;
        if let Some(pipe) = child.stdout.take() {
            drain(pipe, Stream::Stdout, tx.clone());
            pending += 1;
        }
        if let Some(pipe) = child.stderr.take() {
            drain(pipe, Stream::Stderr, tx.clone());
            pending += 1;
        }
        drop(tx);

        match child.wait_timeout(deadline) {
            Ok(Some(status)) => {
                tracing::debug!(exit_code = status.code(), "collaborator exited");
            }
            Ok(None) => {
                tracing::warn!(
                    deadline_secs = deadline.as_secs_f64(),
                    "collaborator exceeded deadline, killing process"
                );
                reap(&mut child);
                return Err(RemoteError::timeout());
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to wait for collaborator");
                reap(&mut child);
                return Err(RemoteError::new(
                    ErrorCode::INTERNAL,
                    format!("failed to wait for {}: {e}", self.program.display()),
                ));
            }
        }

        // The child has exited, but a process it left behind may still hold the pipes open.
        let mut captured = Captured {
            stdout: String::new(),
            stderr: String::new(),
        };
        while pending > 0 {
            match rx.recv_timeout(deadline.saturating_sub(started.elapsed())) {
                Ok((stream, bytes)) => {
                    pending -= 1;
                    let text = String::from_utf8_lossy(&bytes).into_owned();
                    match stream {
                        Stream::Stdout => captured.stdout = text,
                        Stream::Stderr => captured.stderr = text,
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    tracing::warn!(
                        deadline_secs = deadline.as_secs_f64(),
                        "collaborator output still open past deadline"
                    );
                    return Err(RemoteError::timeout());
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        Ok(captured)
    }
}

impl RemoteExecutor for CommandExecutor {
    fn execute(&mut self, request: &ExecutionRequest) -> RawOutcome {
        let started = Instant::now();
        let captured = match self.run(request) {
            Ok(c) => c,
            Err(e) => return RawOutcome::Failure(e),
        };
        tracing::debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            stdout_bytes = captured.stdout.len(),
            "collaborator finished"
        );
        match decode_response(&captured.stdout) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(error = %e, "undecodable collaborator response");
                RawOutcome::Failure(normalize_decode_error(&e, &captured.stderr))
            }
        }
    }
}

/// Whole seconds, rounded up so a sub-second timeout is never sent as 0.
fn timeout_secs(timeout: Duration) -> u64 {
    timeout.as_secs() + u64::from(timeout.subsec_nanos() > 0)
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

fn drain<R: Read + Send + 'static>(mut pipe: R, stream: Stream, tx: Sender<(Stream, Vec<u8>)>) {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        let _ = tx.send((stream, buf));
    });
}

fn reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}
