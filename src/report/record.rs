//! Per-test records and their terminal outcomes.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

/// Placeholder shown when a test carries no description.
pub const NO_DESCRIPTION: &str = "No description";

const DEFAULT_ERROR_KIND: &str = "Error";
const DEFAULT_ERROR_MESSAGE: &str = "(no message)";

/// Terminal outcome bucket of a single test.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Pass,
    Fail,
    Error,
    Skip,
}

impl Outcome {
    /// Fixed label used in rows, summaries and comparisons.
    pub fn label(self) -> &'static str {
        match self {
            Outcome::Pass => "PASS",
            Outcome::Fail => "FAIL",
            Outcome::Error => "ERROR",
            Outcome::Skip => "SKIP",
        }
    }

    /// FAIL and ERROR both count against the run.
    pub fn is_failure(self) -> bool {
        matches!(self, Outcome::Fail | Outcome::Error)
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Error classification attached to FAIL and ERROR outcomes.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorDetail {
    pub kind: String,
    pub message: String,
}

impl ErrorDetail {
    /// Build a detail, replacing blank parts with placeholders so both are
    /// always non-empty.
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        let kind = kind.into();
        let message = message.into();
        Self {
            kind: if kind.trim().is_empty() {
                DEFAULT_ERROR_KIND.to_string()
            } else {
                kind
            },
            message: if message.trim().is_empty() {
                DEFAULT_ERROR_MESSAGE.to_string()
            } else {
                message
            },
        }
    }
}

impl std::fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// How a test ended. Error detail exists only on the failing variants.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "outcome")]
pub enum Resolution {
    #[serde(rename = "PASS")]
    Passed,
    #[serde(rename = "FAIL")]
    Failed(ErrorDetail),
    #[serde(rename = "ERROR")]
    Errored(ErrorDetail),
    #[serde(rename = "SKIP")]
    Skipped { reason: String },
}

impl Resolution {
    pub fn outcome(&self) -> Outcome {
        match self {
            Resolution::Passed => Outcome::Pass,
            Resolution::Failed(_) => Outcome::Fail,
            Resolution::Errored(_) => Outcome::Error,
            Resolution::Skipped { .. } => Outcome::Skip,
        }
    }

    pub fn error_detail(&self) -> Option<&ErrorDetail> {
        match self {
            Resolution::Failed(detail) | Resolution::Errored(detail) => Some(detail),
            Resolution::Passed | Resolution::Skipped { .. } => None,
        }
    }
}

/// One test case's identity, timing and (once resolved) outcome.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TestRecord {
    pub identifier: String,
    pub description: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    #[serde(rename = "duration_secs", serialize_with = "serialize_secs")]
    pub duration: Option<Duration>,
    pub resolution: Option<Resolution>,
}

impl TestRecord {
    /// A record for a test that has just started.
    pub fn started(
        identifier: impl Into<String>,
        description: Option<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            description,
            started_at: Some(at),
            duration: None,
            resolution: None,
        }
    }

    /// A record for a terminal event whose start was never observed.
    pub fn unstarted(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            description: None,
            started_at: None,
            duration: None,
            resolution: None,
        }
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.resolution.as_ref().map(Resolution::outcome)
    }

    pub fn error_detail(&self) -> Option<&ErrorDetail> {
        self.resolution.as_ref().and_then(Resolution::error_detail)
    }

    pub fn is_resolved(&self) -> bool {
        self.resolution.is_some()
    }

    /// Description text, or the placeholder when absent or blank.
    pub fn description_or_default(&self) -> &str {
        match self.description.as_deref() {
            Some(text) if !text.trim().is_empty() => text,
            _ => NO_DESCRIPTION,
        }
    }

    /// Set the terminal outcome. Returns `false` (and changes nothing) if the
    /// record was already resolved.
    pub fn resolve(&mut self, resolution: Resolution, at: DateTime<Utc>) -> bool {
        if self.resolution.is_some() {
            return false;
        }

        self.duration = match (&resolution, self.started_at) {
            (Resolution::Skipped { .. }, _) => Some(Duration::ZERO),
            // Clock skew yields a negative span; treat it as zero.
            (_, Some(start)) => Some((at - start).to_std().unwrap_or(Duration::ZERO)),
            (_, None) => None,
        };
        self.resolution = Some(resolution);
        true
    }
}

fn serialize_secs<S: Serializer>(duration: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
    match duration {
        Some(d) => s.serialize_some(&d.as_secs_f64()),
        None => s.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_error_detail_blank_parts_get_placeholders() {
        let detail = ErrorDetail::new("  ", "");
        assert_eq!(detail.kind, "Error");
        assert_eq!(detail.message, "(no message)");
        assert_eq!(detail.to_string(), "Error: (no message)");
    }

    #[test]
    fn test_resolve_computes_duration_from_start() {
        let mut record = TestRecord::started("suite.test_a", None, t0());
        let end = t0() + chrono::Duration::milliseconds(500);
        assert!(record.resolve(Resolution::Passed, end));
        assert_eq!(record.duration, Some(Duration::from_millis(500)));
        assert_eq!(record.outcome(), Some(Outcome::Pass));
        assert!(record.error_detail().is_none());
    }

    #[test]
    fn test_resolve_only_once() {
        let mut record = TestRecord::started("suite.test_a", None, t0());
        assert!(record.resolve(Resolution::Passed, t0()));
        let second = Resolution::Failed(ErrorDetail::new("AssertionError", "late"));
        assert!(!record.resolve(second, t0()));
        assert_eq!(record.outcome(), Some(Outcome::Pass));
    }

    #[test]
    fn test_skip_duration_is_zero() {
        let mut record = TestRecord::started("suite.test_c", None, t0());
        let later = t0() + chrono::Duration::seconds(3);
        record.resolve(
            Resolution::Skipped {
                reason: "missing credentials".into(),
            },
            later,
        );
        assert_eq!(record.duration, Some(Duration::ZERO));

        let mut unstarted = TestRecord::unstarted("suite.test_d");
        unstarted.resolve(
            Resolution::Skipped {
                reason: "no start".into(),
            },
            later,
        );
        assert_eq!(unstarted.duration, Some(Duration::ZERO));
    }

    #[test]
    fn test_unstarted_failure_has_no_duration() {
        let mut record = TestRecord::unstarted("suite.test_b");
        record.resolve(
            Resolution::Errored(ErrorDetail::new("RuntimeError", "boom")),
            t0(),
        );
        assert_eq!(record.duration, None);
        assert_eq!(record.error_detail().map(|d| d.kind.as_str()), Some("RuntimeError"));
    }

    #[test]
    fn test_negative_span_clamps_to_zero() {
        let mut record = TestRecord::started("suite.test_a", None, t0());
        record.resolve(Resolution::Passed, t0() - chrono::Duration::seconds(1));
        assert_eq!(record.duration, Some(Duration::ZERO));
    }

    #[test]
    fn test_description_placeholder() {
        let mut record = TestRecord::started("a.b", Some("   ".into()), t0());
        assert_eq!(record.description_or_default(), NO_DESCRIPTION);
        record.description = Some("Test running commands".into());
        assert_eq!(record.description_or_default(), "Test running commands");
    }

    #[test]
    fn test_resolution_serializes_with_outcome_tag() {
        let json = serde_json::to_value(Resolution::Failed(ErrorDetail::new(
            "AssertionError",
            "expected 1 got 2",
        )))
        .unwrap();
        assert_eq!(json["outcome"], "FAIL");
        assert_eq!(json["kind"], "AssertionError");
        assert_eq!(json["message"], "expected 1 got 2");
    }
}
