//! Classify collaborator error codes into retry categories.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use serde::Serialize;

/// Numeric error code reported by the remote collaborator, or synthesized locally
/// when the collaborator could not be run or its response could not be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ErrorCode(pub i64);

impl ErrorCode {
    /// Response could not be decoded, or the collaborator could not be started.
    pub const INTERNAL: ErrorCode = ErrorCode(0);
    /// The collaborator did not finish before the process deadline.
    pub const TIMEOUT: ErrorCode = ErrorCode(1203);
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ErrorCode {
    fn from(code: i64) -> Self {
        ErrorCode(code)
    }
}

/// Coarse classification of a failure, used to pick a retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Network or session hiccup (connection timeout, websocket error, rate limit).
    Transient,
    /// Quota or memory exhaustion; may clear after a pause.
    Resource,
    /// Defect in the submitted code. Never retried.
    Code,
    /// Credential or permission failure. Never retried.
    Auth,
    /// Anything not in a known set.
    Unknown,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Transient => "transient",
            ErrorCategory::Resource => "resource",
            ErrorCategory::Code => "code",
            ErrorCategory::Auth => "auth",
            ErrorCategory::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection timeout, websocket error, runtime terminated, rate limited, API unavailable.
pub const TRANSIENT_CODES: [i64; 5] = [1101, 1103, 1105, 1401, 1402];
/// Session limit reached, memory exhausted.
pub const RESOURCE_CODES: [i64; 2] = [1104, 1204];
/// Auth failures (below 1200) and code failures (1200 and above).
pub const NON_RETRYABLE_CODES: [i64; 8] = [1001, 1002, 1003, 1004, 1201, 1202, 1205, 1206];

/// Non-retryable codes at or above this value are `Code`, the rest are `Auth`.
const CODE_CATEGORY_THRESHOLD: i64 = 1200;

/// Returned when the code sets handed to [`ErrorClassifier::from_sets`] overlap.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("error code {code} is listed as both {first} and {second}")]
pub struct ClassifierError {
    pub code: ErrorCode,
    pub first: ErrorCategory,
    pub second: ErrorCategory,
}

/// Read-only code → category table, built once and then only queried.
#[derive(Debug, Clone)]
pub struct ErrorClassifier {
    table: BTreeMap<i64, ErrorCategory>,
}

impl ErrorClassifier {
    /// Classifier for the collaborator's documented error codes.
    pub fn standard() -> Self {
        Self::from_sets(&TRANSIENT_CODES, &RESOURCE_CODES, &NON_RETRYABLE_CODES)
            .unwrap_or_else(|_| unreachable!("built-in code sets are disjoint"))
    }

    /// Process-wide standard classifier, built on first use.
    pub fn shared() -> &'static ErrorClassifier {
        static STANDARD: OnceLock<ErrorClassifier> = OnceLock::new();
        STANDARD.get_or_init(Self::standard)
    }

    /// Build a classifier from explicit sets. The sets must be pairwise disjoint.
    /// Non-retryable codes split into `Code` (>= 1200) and `Auth` (< 1200).
    pub fn from_sets(
        transient: &[i64],
        resource: &[i64],
        non_retryable: &[i64],
    ) -> Result<Self, ClassifierError> {
        let mut table = BTreeMap::new();
        let tagged = transient
            .iter()
            .map(|&c| (c, ErrorCategory::Transient))
            .chain(resource.iter().map(|&c| (c, ErrorCategory::Resource)))
            .chain(non_retryable.iter().map(|&c| {
                let cat = if c >= CODE_CATEGORY_THRESHOLD {
                    ErrorCategory::Code
                } else {
                    ErrorCategory::Auth
                };
                (c, cat)
            }));
        for (code, category) in tagged {
            if let Some(&existing) = table.get(&code) {
                if existing != category {
                    return Err(ClassifierError {
                        code: ErrorCode(code),
                        first: existing,
                        second: category,
                    });
                }
                continue;
            }
            table.insert(code, category);
        }
        Ok(Self { table })
    }

    /// Total: every code maps to exactly one category.
    pub fn classify(&self, code: ErrorCode) -> ErrorCategory {
        self.table
            .get(&code.0)
            .copied()
            .unwrap_or(ErrorCategory::Unknown)
    }
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::standard()
    }
}

/// Classify with the standard code table.
pub fn classify(code: ErrorCode) -> ErrorCategory {
    ErrorClassifier::shared().classify(code)
}
