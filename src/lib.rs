//! sandboxsuite -- test-run recorder and tabular reporter for sandbox SDK
//! test suites.
//!
//! A test driver (the built-in [`runner`], or an external one writing a
//! [`replay`] log) reports lifecycle events to a [`report::Recorder`], and the
//! finished run is rendered as a table with a summary line and a failure
//! section.

pub mod config;
pub mod preflight;
pub mod replay;
pub mod report;
pub mod runner;

use std::io::BufRead;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;

use crate::config::SuiteConfig;
use crate::report::{Fanout, ManualClock, Recorder, RunSummary, TracingListener};
use crate::runner::{ProgressListener, Runner};

/// Replay an event log and return the resulting summary.
pub fn replay_log(reader: impl BufRead) -> Result<RunSummary> {
    let events = replay::parse_events(reader).context("failed to load event log")?;
    tracing::info!(events = events.len(), "replaying event log");

    let clock = ManualClock::new(Utc::now());
    let recorder = Recorder::with_clock(Arc::new(clock.clone()));
    let listeners = Fanout::new().with(recorder.clone()).with(TracingListener);
    replay::replay(&events, &clock, &listeners);

    Ok(recorder.summary())
}

/// Run the preflight suite, optionally printing live progress to stderr.
pub async fn run_preflight(config: &SuiteConfig, progress: bool) -> RunSummary {
    let suite = preflight::suite(config);
    let recorder = Recorder::new();

    // Progress must precede tracing, or log lines split "name ... ok".
    let mut listeners = Fanout::new().with(recorder.clone());
    if progress {
        listeners = listeners.with(ProgressListener::stderr());
    }
    let listeners = listeners.with(TracingListener);

    Runner::new(&config.run)
        .without_required_env()
        .run(&suite, &listeners)
        .await;

    recorder.summary()
}
