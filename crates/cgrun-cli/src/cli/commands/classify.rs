//! `cgrun classify` – show how error codes are treated by the retry policy.

use anyhow::Result;
use cgrun_core::config::CgrunConfig;
use cgrun_core::retry::{ErrorCode, RetryPolicy};

pub fn run_classify(cfg: &CgrunConfig, codes: &[i64]) -> Result<()> {
    let policy = cfg.retry_or_default().policy()?;
    print!("{}", classify_table(&policy, codes));
    Ok(())
}

pub(crate) fn classify_table(policy: &RetryPolicy, codes: &[i64]) -> String {
    let mut out = format!("{:<8} {:<10} {}\n", "CODE", "CATEGORY", "FIRST FAILURE");
    for &code in codes {
        let code = ErrorCode(code);
        let action = if policy.should_retry(code, 1) {
            "retry"
        } else {
            "stop"
        };
        out.push_str(&format!(
            "{:<8} {:<10} {}\n",
            code.to_string(),
            policy.classify(code).as_str(),
            action
        ));
    }
    out
}
