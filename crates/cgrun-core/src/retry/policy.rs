use std::time::Duration;

use super::backoff::Backoff;
use super::classify::{classify, ErrorCategory, ErrorClassifier, ErrorCode};

/// How many attempts a category may consume before retries stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptLimit {
    /// Retry until the global ceiling.
    Unbounded,
    /// Retry only while the completed attempt index is below this value.
    Below(u32),
    /// Never retry.
    Never,
}

impl AttemptLimit {
    fn permits(&self, attempt: u32) -> bool {
        match *self {
            AttemptLimit::Unbounded => true,
            AttemptLimit::Below(n) => attempt < n,
            AttemptLimit::Never => false,
        }
    }
}

/// Per-category retry budgets, independent of the global `max_attempts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryLimits {
    pub transient: AttemptLimit,
    pub resource: AttemptLimit,
    pub unknown: AttemptLimit,
    pub code: AttemptLimit,
    pub auth: AttemptLimit,
}

impl Default for CategoryLimits {
    fn default() -> Self {
        Self {
            transient: AttemptLimit::Unbounded,
            // At most two retries.
            resource: AttemptLimit::Below(3),
            // At most one retry.
            unknown: AttemptLimit::Below(2),
            code: AttemptLimit::Never,
            auth: AttemptLimit::Never,
        }
    }
}

impl CategoryLimits {
    pub fn limit_for(&self, category: ErrorCategory) -> AttemptLimit {
        match category {
            ErrorCategory::Transient => self.transient,
            ErrorCategory::Resource => self.resource,
            ErrorCategory::Unknown => self.unknown,
            ErrorCategory::Code => self.code,
            ErrorCategory::Auth => self.auth,
        }
    }
}

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Do not retry this error.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Category-aware retry policy with capped exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first). Never below 1.
    max_attempts: u32,
    pub limits: CategoryLimits,
    pub backoff: Backoff,
    classifier: ErrorClassifier,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Backoff::default())
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            limits: CategoryLimits::default(),
            backoff,
            classifier: ErrorClassifier::shared().clone(),
        }
    }

    pub fn with_limits(mut self, limits: CategoryLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_classifier(mut self, classifier: ErrorClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn classify(&self, code: ErrorCode) -> ErrorCategory {
        self.classifier.classify(code)
    }

    /// Whether another attempt is allowed after `attempt` (1-based) failed with `code`.
    /// The global ceiling always wins over the category budget.
    pub fn should_retry(&self, code: ErrorCode, attempt: u32) -> bool {
        if attempt >= self.max_attempts {
            return false;
        }
        self.limits.limit_for(self.classify(code)).permits(attempt)
    }

    /// Combine `should_retry` and the backoff schedule.
    pub fn decide(&self, attempt: u32, code: ErrorCode) -> RetryDecision {
        if self.should_retry(code, attempt) {
            RetryDecision::RetryAfter(self.backoff.delay_for(attempt))
        } else {
            RetryDecision::NoRetry
        }
    }
}

/// `should_retry` with the standard classifier and default category limits.
pub fn should_retry(code: ErrorCode, attempt: u32, max_attempts: u32) -> bool {
    if attempt >= max_attempts {
        return false;
    }
    CategoryLimits::default()
        .limit_for(classify(code))
        .permits(attempt)
}
