//! Test case trait and the results a case body can produce.

use std::fmt::Debug;

use async_trait::async_trait;
use thiserror::Error;

/// Error kind reported for assertion failures.
pub const ASSERTION_KIND: &str = "AssertionError";

/// Why a case body did not pass.
#[derive(Debug, Error)]
pub enum CaseError {
    /// The case's own verification did not hold. Reported as FAIL.
    #[error("{message}")]
    Assertion { message: String },

    /// The case declined to run. Reported as SKIP.
    #[error("skipped: {reason}")]
    Skipped { reason: String },

    /// The case aborted for any other reason. Reported as ERROR.
    #[error("{kind}: {message}")]
    Fault { kind: String, message: String },
}

impl CaseError {
    pub fn assertion(message: impl Into<String>) -> Self {
        CaseError::Assertion {
            message: message.into(),
        }
    }

    pub fn skip(reason: impl Into<String>) -> Self {
        CaseError::Skipped {
            reason: reason.into(),
        }
    }

    pub fn fault(kind: impl Into<String>, message: impl Into<String>) -> Self {
        CaseError::Fault {
            kind: kind.into(),
            message: message.into(),
        }
    }
}

impl From<anyhow::Error> for CaseError {
    fn from(e: anyhow::Error) -> Self {
        CaseError::fault("Error", format!("{e:#}"))
    }
}

impl From<std::io::Error> for CaseError {
    fn from(e: std::io::Error) -> Self {
        CaseError::fault("IoError", e.to_string())
    }
}

pub type CaseResult = Result<(), CaseError>;

/// Fail with `message` unless `condition` holds.
pub fn check(condition: bool, message: impl Into<String>) -> CaseResult {
    if condition {
        Ok(())
    } else {
        Err(CaseError::assertion(message))
    }
}

/// Fail with "expected X got Y" unless the values are equal.
pub fn check_eq<T: PartialEq + Debug>(actual: &T, expected: &T) -> CaseResult {
    if actual == expected {
        Ok(())
    } else {
        Err(CaseError::assertion(format!(
            "expected {:?} got {:?}",
            expected, actual
        )))
    }
}

/// A single runnable test.
#[async_trait]
pub trait TestCase: Send + Sync {
    /// Short name, unique within its suite.
    fn name(&self) -> &str;

    /// Human-readable summary shown in the report.
    fn description(&self) -> Option<&str> {
        None
    }

    async fn run(&self) -> CaseResult;
}
