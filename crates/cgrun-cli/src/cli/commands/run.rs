//! `cgrun run` – execute code with retries and render the outcome.

use std::fs;
use std::io::{self, Write};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use cgrun_core::config::CgrunConfig;
use cgrun_core::orchestrator::Orchestrator;
use cgrun_core::remote::{CommandExecutor, ExecMode, ExecutionRequest};
use cgrun_core::retry::RetryPolicy;

use crate::cli::progress::StderrProgress;
use crate::cli::render::{render_json, render_text};
use crate::cli::RunArgs;

/// Everything a run needs, after merging flags over config.
#[derive(Debug)]
pub(crate) struct Resolved {
    pub policy: RetryPolicy,
    pub request: ExecutionRequest,
    pub executor: CommandExecutor,
}

pub(crate) fn resolve(cfg: &CgrunConfig, args: &RunArgs) -> Result<Resolved> {
    let code = match (&args.code, &args.file) {
        (_, Some(path)) => {
            fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?
        }
        (Some(code), None) => code.clone(),
        (None, None) => bail!("either CODE or --file is required"),
    };

    let mut retry = cfg.retry_or_default();
    if let Some(n) = args.max_attempts {
        retry.max_attempts = n;
    }
    if let Some(s) = args.base_delay {
        retry.base_delay_secs = s;
    }
    if let Some(s) = args.max_delay {
        retry.max_delay_secs = s;
    }
    let policy = retry.policy()?;

    let mode = if args.terminal {
        ExecMode::Terminal
    } else {
        cfg.mode
    };
    let timeout = args
        .timeout
        .map(Duration::from_secs)
        .unwrap_or_else(|| cfg.timeout());

    let mut executor = cfg.executor();
    if let Some(tool) = &args.tool {
        executor = CommandExecutor::new(tool)
            .with_timeout_buffer(Duration::from_secs(cfg.timeout_buffer_secs));
    }

    Ok(Resolved {
        policy,
        request: ExecutionRequest::new(code, timeout, mode),
        executor,
    })
}

/// Run to completion and print the outcome. Returns the process exit code.
pub fn run_execute(cfg: &CgrunConfig, args: &RunArgs) -> Result<i32> {
    let Resolved {
        policy,
        request,
        executor,
    } = resolve(cfg, args)?;
    tracing::info!(
        tool = %executor.program().display(),
        mode = %request.mode,
        max_attempts = policy.max_attempts(),
        "run requested"
    );

    let mut orchestrator = Orchestrator::new(executor, policy);
    let outcome = if args.verbose {
        let mut progress = StderrProgress::new(io::stderr());
        orchestrator.run_observed(&request, &mut progress)
    } else {
        orchestrator.run(&request)
    };

    if args.json {
        println!("{}", render_json(&outcome)?);
    } else {
        let rendered = render_text(&outcome, args.verbose);
        io::stdout().write_all(rendered.stdout.as_bytes())?;
        io::stderr().write_all(rendered.stderr.as_bytes())?;
    }
    Ok(outcome.exit_code())
}
