//! In-memory accumulation of test records for one run.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::listener::TestListener;
use super::record::{ErrorDetail, Resolution, TestRecord};
use super::summary::RunSummary;

/// Source of "now" for start and terminal timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to. Used for replaying timestamped
/// event logs and in tests.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = at;
    }

    pub fn advance(&self, by: std::time::Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        if let Ok(delta) = chrono::Duration::from_std(by) {
            *now += delta;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[derive(Debug, Default)]
struct RecorderState {
    records: Vec<TestRecord>,
    index: HashMap<String, usize>,
}

impl RecorderState {
    fn slot(&mut self, identifier: &str) -> &mut TestRecord {
        let pos = match self.index.get(identifier) {
            Some(&pos) => pos,
            None => {
                debug!(test = identifier, "terminal event without start; creating record");
                self.records.push(TestRecord::unstarted(identifier));
                let pos = self.records.len() - 1;
                self.index.insert(identifier.to_string(), pos);
                pos
            }
        };
        &mut self.records[pos]
    }
}

/// Collects one [`TestRecord`] per test, in start order.
///
/// Cloning shares the same underlying collection. A single mutex guards all
/// records; tests run sequentially, so contention is negligible.
#[derive(Clone)]
pub struct Recorder {
    state: Arc<Mutex<RecorderState>>,
    clock: Arc<dyn Clock>,
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Recorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recorder")
            .field("records", &self.lock().records.len())
            .finish_non_exhaustive()
    }
}

impl Recorder {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(Mutex::new(RecorderState::default())),
            clock,
        }
    }

    // A panic while holding the lock cannot leave a record half-written,
    // so a poisoned guard is still usable.
    fn lock(&self) -> MutexGuard<'_, RecorderState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Snapshot of all records, in start order.
    pub fn records(&self) -> Vec<TestRecord> {
        self.lock().records.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().records.is_empty()
    }

    /// Derive the run summary from the current records.
    pub fn summary(&self) -> RunSummary {
        RunSummary::from_records(self.records())
    }

    fn resolve(&self, identifier: &str, resolution: Resolution) {
        let at = self.clock.now();
        let mut state = self.lock();
        let record = state.slot(identifier);
        let outcome = resolution.outcome();
        if !record.resolve(resolution, at) {
            warn!(
                test = identifier,
                ignored = %outcome,
                existing = ?record.outcome(),
                "test already resolved; ignoring second terminal event"
            );
        }
    }
}

impl TestListener for Recorder {
    fn on_test_start(&self, identifier: &str, description: Option<&str>) {
        let at = self.clock.now();
        let description = description.map(str::to_string);
        let mut state = self.lock();

        if let Some(&pos) = state.index.get(identifier) {
            warn!(test = identifier, "duplicate test identifier; overwriting start time");
            let record = &mut state.records[pos];
            record.started_at = Some(at);
            record.description = description;
            return;
        }

        state
            .records
            .push(TestRecord::started(identifier, description, at));
        let pos = state.records.len() - 1;
        state.index.insert(identifier.to_string(), pos);
    }

    fn on_test_pass(&self, identifier: &str) {
        self.resolve(identifier, Resolution::Passed);
    }

    fn on_test_fail(&self, identifier: &str, kind: &str, message: &str) {
        self.resolve(identifier, Resolution::Failed(ErrorDetail::new(kind, message)));
    }

    fn on_test_error(&self, identifier: &str, kind: &str, message: &str) {
        self.resolve(identifier, Resolution::Errored(ErrorDetail::new(kind, message)));
    }

    fn on_test_skip(&self, identifier: &str, reason: &str) {
        self.resolve(
            identifier,
            Resolution::Skipped {
                reason: reason.to_string(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::record::Outcome;
    use chrono::TimeZone;
    use std::time::Duration;

    fn manual() -> (Recorder, ManualClock) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 10, 19, 9, 30, 0).unwrap());
        (Recorder::with_clock(Arc::new(clock.clone())), clock)
    }

    #[test]
    fn test_records_kept_in_start_order() {
        let (recorder, clock) = manual();
        recorder.on_test_start("suite.test_a", Some("first"));
        recorder.on_test_start("suite.test_b", Some("second"));
        clock.advance(Duration::from_millis(200));
        // b resolves before a; order must still follow starts.
        recorder.on_test_pass("suite.test_b");
        clock.advance(Duration::from_millis(300));
        recorder.on_test_pass("suite.test_a");

        let ids: Vec<_> = recorder
            .records()
            .into_iter()
            .map(|r| r.identifier)
            .collect();
        assert_eq!(ids, vec!["suite.test_a", "suite.test_b"]);
    }

    #[test]
    fn test_durations_follow_clock() {
        let (recorder, clock) = manual();
        recorder.on_test_start("suite.test_a", None);
        clock.advance(Duration::from_millis(500));
        recorder.on_test_pass("suite.test_a");
        recorder.on_test_start("suite.test_b", None);
        clock.advance(Duration::from_millis(200));
        recorder.on_test_fail("suite.test_b", "AssertionError", "expected 1 got 2");

        let records = recorder.records();
        assert_eq!(records[0].duration, Some(Duration::from_millis(500)));
        assert_eq!(records[1].duration, Some(Duration::from_millis(200)));
        assert_eq!(records[1].outcome(), Some(Outcome::Fail));
    }

    #[test]
    fn test_second_terminal_event_is_ignored() {
        let (recorder, _clock) = manual();
        recorder.on_test_start("suite.test_a", None);
        recorder.on_test_pass("suite.test_a");
        recorder.on_test_error("suite.test_a", "RuntimeError", "teardown blew up");

        let records = recorder.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].outcome(), Some(Outcome::Pass));
        assert!(records[0].error_detail().is_none());
    }

    #[test]
    fn test_duplicate_start_overwrites_timing_in_place() {
        let (recorder, clock) = manual();
        recorder.on_test_start("suite.test_a", Some("old"));
        recorder.on_test_start("suite.test_b", None);
        clock.advance(Duration::from_secs(5));
        recorder.on_test_start("suite.test_a", Some("new"));
        clock.advance(Duration::from_secs(1));
        recorder.on_test_pass("suite.test_a");

        let records = recorder.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].identifier, "suite.test_a");
        assert_eq!(records[0].description.as_deref(), Some("new"));
        assert_eq!(records[0].duration, Some(Duration::from_secs(1)));
    }

    #[test]
    fn test_skip_without_start_creates_record() {
        let (recorder, _clock) = manual();
        recorder.on_test_skip("suite.test_c", "missing credentials");

        let records = recorder.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].outcome(), Some(Outcome::Skip));
        assert_eq!(records[0].duration, Some(Duration::ZERO));
        assert!(records[0].started_at.is_none());
    }

    #[test]
    fn test_clones_share_records() {
        let recorder = Recorder::new();
        let other = recorder.clone();
        other.on_test_start("suite.test_a", None);
        other.on_test_pass("suite.test_a");
        assert_eq!(recorder.len(), 1);
        assert!(!recorder.is_empty());
    }

    #[test]
    fn test_concurrent_writers_on_distinct_ids() {
        let recorder = Recorder::new();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let recorder = recorder.clone();
                std::thread::spawn(move || {
                    let id = format!("suite.test_{i}");
                    recorder.on_test_start(&id, None);
                    recorder.on_test_pass(&id);
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let summary = recorder.summary();
        assert_eq!(summary.total(), 8);
        assert_eq!(summary.passed, 8);
    }
}
