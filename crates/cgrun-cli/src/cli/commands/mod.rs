//! CLI command handlers, one per file.

mod classify;
mod config;
mod run;

pub use classify::run_classify;
pub use config::run_config;
pub use run::run_execute;

#[cfg(test)]
pub(crate) use classify::classify_table;
#[cfg(test)]
pub(crate) use config::effective_toml;
#[cfg(test)]
pub(crate) use run::resolve;
