//! Run-level aggregation over the recorded tests.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::record::{Outcome, TestRecord};

/// Counts per outcome bucket plus the records they were derived from.
///
/// `incomplete` holds tests that started but never reached a terminal event.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct RunSummary {
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub skipped: usize,
    pub incomplete: usize,
    pub records: Vec<TestRecord>,
}

impl RunSummary {
    pub fn from_records(records: Vec<TestRecord>) -> Self {
        let mut summary = Self::default();
        for record in &records {
            match record.outcome() {
                Some(Outcome::Pass) => summary.passed += 1,
                Some(Outcome::Fail) => summary.failed += 1,
                Some(Outcome::Error) => summary.errored += 1,
                Some(Outcome::Skip) => summary.skipped += 1,
                None => summary.incomplete += 1,
            }
        }
        summary.records = records;
        summary
    }

    pub fn total(&self) -> usize {
        self.records.len()
    }

    /// The combined bucket shown as "Failed" in the summary line.
    pub fn failed_or_errored(&self) -> usize {
        self.failed + self.errored
    }

    pub fn is_success(&self) -> bool {
        self.failed_or_errored() == 0
    }

    /// Process exit status: non-zero iff any test failed or errored.
    pub fn exit_code(&self) -> u8 {
        if self.is_success() {
            0
        } else {
            1
        }
    }

    /// FAIL and ERROR records, in start order.
    pub fn failures(&self) -> impl Iterator<Item = &TestRecord> {
        self.records
            .iter()
            .filter(|r| r.outcome().is_some_and(Outcome::is_failure))
    }
}

/// Machine-readable form of a finished run.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub suite: String,
    pub generated_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub skipped: usize,
    pub incomplete: usize,
    pub success: bool,
    pub records: Vec<TestRecord>,
}

impl RunReport {
    pub fn new(suite: impl Into<String>, summary: RunSummary, generated_at: DateTime<Utc>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            suite: suite.into(),
            generated_at,
            total: summary.total(),
            passed: summary.passed,
            failed: summary.failed,
            errored: summary.errored,
            skipped: summary.skipped,
            incomplete: summary.incomplete,
            success: summary.is_success(),
            records: summary.records,
        }
    }
}
