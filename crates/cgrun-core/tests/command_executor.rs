//! CommandExecutor against small shell scripts standing in for the collaborator CLI.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use cgrun_core::orchestrator::Orchestrator;
use cgrun_core::remote::{CommandExecutor, ExecMode, ExecutionRequest, RawOutcome, RemoteExecutor};
use cgrun_core::retry::{Backoff, ErrorCode, RetryPolicy};
use tempfile::{tempdir, TempDir};

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

fn request(timeout: Duration) -> ExecutionRequest {
    ExecutionRequest::new("print(1)", timeout, ExecMode::Kernel)
}

fn scratch() -> TempDir {
    tempdir().unwrap()
}

#[test]
fn decodes_success_response() {
    let dir = scratch();
    let tool = write_script(
        dir.path(),
        "tool",
        r#"echo '{"success":true,"result":"1","stdout":"1\n","executionTime":0.2}'"#,
    );
    match CommandExecutor::new(tool).execute(&request(Duration::from_secs(10))) {
        RawOutcome::Success(p) => {
            assert_eq!(p.result.as_deref(), Some("1"));
            assert_eq!(p.stdout, "1\n");
        }
        other => panic!("expected success, got {other:?}"),
    }
}

#[test]
fn passes_arguments_in_order() {
    let dir = scratch();
    let args_file = dir.path().join("args.txt");
    let tool = write_script(
        dir.path(),
        "tool",
        &format!(
            "printf '%s\\n' \"$@\" > '{}'\necho '{{\"success\":true}}'",
            args_file.display()
        ),
    );
    let outcome = CommandExecutor::new(tool).execute(&request(Duration::from_secs(7)));
    assert!(outcome.is_success());
    let args = fs::read_to_string(&args_file).unwrap();
    assert_eq!(args, "run\n--json\n--kernel\n--timeout\n7\nprint(1)\n");
}

#[test]
fn collaborator_failure_is_passed_through() {
    let dir = scratch();
    let tool = write_script(
        dir.path(),
        "tool",
        r#"echo '{"success":false,"error":{"code":1104,"message":"Session limit reached"}}'
exit 1"#,
    );
    match CommandExecutor::new(tool).execute(&request(Duration::from_secs(10))) {
        RawOutcome::Failure(e) => {
            assert_eq!(e.code, ErrorCode(1104));
            assert_eq!(e.message, "Session limit reached");
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[test]
fn garbage_output_normalized_with_stderr() {
    let dir = scratch();
    let tool = write_script(
        dir.path(),
        "tool",
        "echo 'Traceback (most recent call last)'\necho 'token expired' >&2",
    );
    match CommandExecutor::new(tool).execute(&request(Duration::from_secs(10))) {
        RawOutcome::Failure(e) => {
            assert_eq!(e.code, ErrorCode::INTERNAL);
            assert!(e.message.starts_with("Invalid JSON response: Traceback"));
            assert!(e.message.contains("stderr: token expired"));
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[test]
fn hung_collaborator_times_out() {
    let dir = scratch();
    let tool = write_script(dir.path(), "tool", "exec sleep 30");
    let mut exec = CommandExecutor::new(tool).with_timeout_buffer(Duration::from_millis(200));
    let started = Instant::now();
    match exec.execute(&request(Duration::ZERO)) {
        RawOutcome::Failure(e) => {
            assert_eq!(e.code, ErrorCode::TIMEOUT);
            assert_eq!(e.message, "Execution timeout");
        }
        other => panic!("expected timeout, got {other:?}"),
    }
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[test]
fn pipe_held_by_background_process_times_out() {
    let dir = scratch();
    // The collaborator exits at once, but its background child inherits stdout.
    let tool = write_script(
        dir.path(),
        "tool",
        "echo '{\"success\":true}'\nsleep 30 &\nexit 0",
    );
    let mut exec = CommandExecutor::new(tool).with_timeout_buffer(Duration::from_millis(200));
    let started = Instant::now();
    match exec.execute(&request(Duration::ZERO)) {
        RawOutcome::Failure(e) => assert_eq!(e.code, ErrorCode::TIMEOUT),
        other => panic!("expected timeout, got {other:?}"),
    }
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[test]
fn orchestrator_retries_real_process() {
    let dir = scratch();
    let counter = dir.path().join("count");
    // Fails with a transient code until the third invocation.
    let tool = write_script(
        dir.path(),
        "tool",
        &format!(
            r#"n=$(cat '{c}' 2>/dev/null || echo 0)
n=$((n + 1))
echo "$n" > '{c}'
if [ "$n" -lt 3 ]; then
  echo '{{"success":false,"error":{{"code":1101,"message":"Connection timeout"}}}}'
else
  echo '{{"success":true,"result":"ok"}}'
fi"#,
            c = counter.display()
        ),
    );
    let policy = RetryPolicy::new(5, Backoff::new(Duration::from_millis(1), Duration::from_millis(5)));
    let mut orch = Orchestrator::new(CommandExecutor::new(tool), policy);
    let outcome = orch.run(&request(Duration::from_secs(10)));

    assert!(outcome.is_success());
    assert_eq!(outcome.attempts(), 3);
    assert_eq!(fs::read_to_string(&counter).unwrap().trim(), "3");
}
