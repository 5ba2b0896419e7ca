pub mod config;
pub mod logging;

pub mod control;
pub mod orchestrator;
pub mod remote;
pub mod retry;
