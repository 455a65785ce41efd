//! Replay of JSON-lines event logs written by an external test driver.
//!
//! One event per line, tagged by `"event"`:
//!
//! ```text
//! {"event":"start","id":"sdk.test_commands","description":"Run commands","at":"2026-10-19T12:00:00Z"}
//! {"event":"fail","id":"sdk.test_commands","kind":"AssertionError","message":"expected 0 got 1"}
//! ```

use std::io::BufRead;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::report::{ManualClock, TestListener};

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to read event log: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: malformed event: {source}")]
    Malformed {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// A single lifecycle event. `at` pins the event's timestamp; without it the
/// wall clock at replay time is used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    Start {
        id: String,
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        at: Option<DateTime<Utc>>,
    },
    Pass {
        id: String,
        #[serde(default)]
        at: Option<DateTime<Utc>>,
    },
    Fail {
        id: String,
        kind: String,
        message: String,
        #[serde(default)]
        at: Option<DateTime<Utc>>,
    },
    Error {
        id: String,
        kind: String,
        message: String,
        #[serde(default)]
        at: Option<DateTime<Utc>>,
    },
    Skip {
        id: String,
        reason: String,
        #[serde(default)]
        at: Option<DateTime<Utc>>,
    },
}

impl Event {
    pub fn at(&self) -> Option<DateTime<Utc>> {
        match self {
            Event::Start { at, .. }
            | Event::Pass { at, .. }
            | Event::Fail { at, .. }
            | Event::Error { at, .. }
            | Event::Skip { at, .. } => *at,
        }
    }

    /// Deliver this event to a listener.
    pub fn dispatch(&self, listener: &dyn TestListener) {
        match self {
            Event::Start {
                id, description, ..
            } => listener.on_test_start(id, description.as_deref()),
            Event::Pass { id, .. } => listener.on_test_pass(id),
            Event::Fail {
                id, kind, message, ..
            } => listener.on_test_fail(id, kind, message),
            Event::Error {
                id, kind, message, ..
            } => listener.on_test_error(id, kind, message),
            Event::Skip { id, reason, .. } => listener.on_test_skip(id, reason),
        }
    }
}

/// Parse a whole event log. Blank lines are ignored.
pub fn parse_events(reader: impl BufRead) -> Result<Vec<Event>, ReplayError> {
    let mut events = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let event = serde_json::from_str(&line).map_err(|source| ReplayError::Malformed {
            line: idx + 1,
            source,
        })?;
        events.push(event);
    }
    debug!(count = events.len(), "parsed event log");
    Ok(events)
}

/// Feed events to `listener` in order, moving `clock` to each event's
/// timestamp first.
///
/// An event without `at` keeps the clock where the last timestamped event
/// left it. Only before the first timestamped event does the clock follow
/// the current time.
pub fn replay(events: &[Event], clock: &ManualClock, listener: &dyn TestListener) {
    let mut pinned = false;
    for event in events {
        match event.at() {
            Some(at) => {
                clock.set(at);
                pinned = true;
            }
            None if !pinned => clock.set(Utc::now()),
            None => {}
        }
        event.dispatch(listener);
    }
}
