//! `cgrun config` – print the config path and effective settings.

use anyhow::Result;
use cgrun_core::config::{self, CgrunConfig};

pub fn run_config(cfg: &CgrunConfig) -> Result<()> {
    println!("# {}", config::config_path()?.display());
    print!("{}", effective_toml(cfg)?);
    Ok(())
}

/// Config with the retry section filled in, so defaults are visible.
pub(crate) fn effective_toml(cfg: &CgrunConfig) -> Result<String> {
    let effective = CgrunConfig {
        retry: Some(cfg.retry_or_default()),
        ..cfg.clone()
    };
    Ok(toml::to_string_pretty(&effective)?)
}
