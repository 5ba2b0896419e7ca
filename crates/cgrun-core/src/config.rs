use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::remote::{CommandExecutor, ExecMode};
use crate::retry::{AttemptLimit, Backoff, CategoryLimits, RetryPolicy};

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of attempts per request (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff.
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: f64,
    /// Resource failures are retried only while the attempt number is below this (0 = never).
    pub resource_attempt_cap: u32,
    /// Unrecognized failures are retried only while the attempt number is below this (0 = never).
    pub unknown_attempt_cap: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_secs: 1.0,
            max_delay_secs: 60.0,
            resource_attempt_cap: 3,
            unknown_attempt_cap: 2,
        }
    }
}

impl RetryConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            bail!("retry.max_attempts must be at least 1");
        }
        for (name, v) in [
            ("retry.base_delay_secs", self.base_delay_secs),
            ("retry.max_delay_secs", self.max_delay_secs),
        ] {
            if !v.is_finite() || v < 0.0 {
                bail!("{name} must be a finite, non-negative number of seconds (got {v})");
            }
        }
        Ok(())
    }

    pub fn backoff(&self) -> Result<Backoff> {
        self.validate()?;
        Ok(Backoff::new(
            Duration::try_from_secs_f64(self.base_delay_secs).context("retry.base_delay_secs")?,
            Duration::try_from_secs_f64(self.max_delay_secs).context("retry.max_delay_secs")?,
        ))
    }

    pub fn limits(&self) -> CategoryLimits {
        CategoryLimits {
            resource: cap(self.resource_attempt_cap),
            unknown: cap(self.unknown_attempt_cap),
            ..CategoryLimits::default()
        }
    }

    pub fn policy(&self) -> Result<RetryPolicy> {
        Ok(RetryPolicy::new(self.max_attempts, self.backoff()?).with_limits(self.limits()))
    }
}

fn cap(n: u32) -> AttemptLimit {
    if n == 0 {
        AttemptLimit::Never
    } else {
        AttemptLimit::Below(n)
    }
}

/// Global configuration loaded from `~/.config/cgrun/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CgrunConfig {
    /// Collaborator executable (name on PATH or absolute path).
    pub tool: String,
    /// Execution mode passed to the collaborator.
    #[serde(default)]
    pub mode: ExecMode,
    /// Per-attempt timeout in seconds.
    pub timeout_secs: u64,
    /// Extra seconds allowed for the collaborator process on top of the timeout.
    #[serde(default = "default_timeout_buffer_secs")]
    pub timeout_buffer_secs: u64,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

fn default_timeout_buffer_secs() -> u64 {
    30
}

impl Default for CgrunConfig {
    fn default() -> Self {
        Self {
            tool: "lecoder-cgpu".to_string(),
            mode: ExecMode::Kernel,
            timeout_secs: 300,
            timeout_buffer_secs: default_timeout_buffer_secs(),
            retry: None,
        }
    }
}

impl CgrunConfig {
    pub fn retry_or_default(&self) -> RetryConfig {
        self.retry.clone().unwrap_or_default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.tool.trim().is_empty() {
            bail!("tool must not be empty");
        }
        self.retry_or_default().validate()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn executor(&self) -> CommandExecutor {
        CommandExecutor::new(&self.tool)
            .with_timeout_buffer(Duration::from_secs(self.timeout_buffer_secs))
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("cgrun")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<CgrunConfig> {
    load_or_init_at(&config_path()?)
}

pub fn load_or_init_at(path: &Path) -> Result<CgrunConfig> {
    if !path.exists() {
        let default_cfg = CgrunConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml).with_context(|| format!("write {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: CgrunConfig =
        toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::ErrorCode;

    #[test]
    fn default_config_values() {
        let cfg = CgrunConfig::default();
        assert_eq!(cfg.tool, "lecoder-cgpu");
        assert_eq!(cfg.mode, ExecMode::Kernel);
        assert_eq!(cfg.timeout_secs, 300);
        assert_eq!(cfg.timeout_buffer_secs, 30);
        assert!(cfg.retry.is_none());
        assert_eq!(cfg.retry_or_default(), RetryConfig::default());
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = CgrunConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: CgrunConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn config_toml_custom_values() {
        let toml = r#"
            tool = "/opt/bin/lecoder-cgpu"
            mode = "terminal"
            timeout_secs = 600

            [retry]
            max_attempts = 5
            base_delay_secs = 0.5
        "#;
        let cfg: CgrunConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.mode, ExecMode::Terminal);
        assert_eq!(cfg.timeout_buffer_secs, 30);
        let retry = cfg.retry.as_ref().unwrap();
        assert_eq!(retry.max_attempts, 5);
        assert!((retry.base_delay_secs - 0.5).abs() < 1e-9);
        // Unset fields fall back to defaults.
        assert!((retry.max_delay_secs - 60.0).abs() < 1e-9);
        assert_eq!(retry.unknown_attempt_cap, 2);
    }

    #[test]
    fn retry_config_builds_policy() {
        let retry = RetryConfig {
            max_attempts: 10,
            unknown_attempt_cap: 0,
            ..RetryConfig::default()
        };
        let policy = retry.policy().unwrap();
        assert_eq!(policy.max_attempts(), 10);
        assert!(!policy.should_retry(ErrorCode(9999), 1));
        assert!(policy.should_retry(ErrorCode(1104), 2));
        assert!(!policy.should_retry(ErrorCode(1104), 3));
        assert_eq!(policy.backoff.delay_for(1), Duration::from_secs(1));
    }

    #[test]
    fn invalid_retry_values_rejected() {
        let zero = RetryConfig {
            max_attempts: 0,
            ..RetryConfig::default()
        };
        assert!(zero.validate().is_err());
        let negative = RetryConfig {
            base_delay_secs: -1.0,
            ..RetryConfig::default()
        };
        assert!(negative.policy().is_err());
        let nan = RetryConfig {
            max_delay_secs: f64::NAN,
            ..RetryConfig::default()
        };
        assert!(nan.validate().is_err());
    }

    #[test]
    fn load_or_init_creates_then_reads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let created = load_or_init_at(&path).unwrap();
        assert!(path.exists());
        let loaded = load_or_init_at(&path).unwrap();
        assert_eq!(created, loaded);
    }

    #[test]
    fn load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "tool = \"x\"\ntimeout_secs = 1\n[retry]\nmax_attempts = 0\n",
        )
        .unwrap();
        assert!(load_or_init_at(&path).is_err());
    }
}
