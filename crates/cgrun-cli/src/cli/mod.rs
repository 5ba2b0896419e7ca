//! CLI for cgrun.

mod commands;
mod progress;
mod render;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use cgrun_core::config;
use std::path::PathBuf;

use commands::{run_classify, run_config, run_execute};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "cgrun")]
#[command(about = "Run code on a remote notebook runtime with automatic retry", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Execute code remotely, retrying transient failures with exponential backoff.
    Run(RunArgs),

    /// Show the retry category of one or more error codes.
    Classify {
        /// Collaborator error codes.
        #[arg(required = true, allow_negative_numbers = true)]
        codes: Vec<i64>,
    },

    /// Print the config file path and the effective configuration.
    Config,
}

/// Flags for `cgrun run`. Unset options fall back to config.toml.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Code to execute.
    pub code: Option<String>,

    /// Read code from a file instead.
    #[arg(short, long, value_name = "PATH", conflicts_with = "code")]
    pub file: Option<PathBuf>,

    /// Maximum attempts, including the first.
    #[arg(short = 'r', long, alias = "max-retries", value_name = "N")]
    pub max_attempts: Option<u32>,

    /// Per-attempt execution timeout in seconds.
    #[arg(short, long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Base delay for exponential backoff, in seconds.
    #[arg(long, value_name = "SECS")]
    pub base_delay: Option<f64>,

    /// Upper bound on any backoff delay, in seconds.
    #[arg(long, value_name = "SECS")]
    pub max_delay: Option<f64>,

    /// Use terminal mode instead of kernel mode.
    #[arg(long)]
    pub terminal: bool,

    /// Collaborator executable to invoke.
    #[arg(long, value_name = "PATH")]
    pub tool: Option<String>,

    /// Report each attempt on stderr.
    #[arg(short, long)]
    pub verbose: bool,

    /// Print the outcome as JSON.
    #[arg(long)]
    pub json: bool,
}

impl CliCommand {
    /// Returns the process exit code.
    pub fn run_from_args() -> Result<i32> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Run(args) => run_execute(&cfg, &args),
            CliCommand::Classify { codes } => {
                run_classify(&cfg, &codes)?;
                Ok(0)
            }
            CliCommand::Config => {
                run_config(&cfg)?;
                Ok(0)
            }
        }
    }
}

#[cfg(test)]
mod tests;
