//! Tabular text rendering of a finished run.
//!
//! Rendering is a pure function of the summary, the options and the supplied
//! timestamp, so rendering the same run twice yields the same bytes.

use std::borrow::Cow;
use std::time::Duration;

use chrono::{DateTime, Local};

use super::record::TestRecord;
use super::style::{paint_for, Paint};
use super::summary::RunSummary;

const RESULT_WIDTH: usize = 10;
const TIME_WIDTH: usize = 10;
const ELLIPSIS: &str = "...";
const NOT_AVAILABLE: &str = "N/A";
const INCOMPLETE: &str = "INCOMPLETE";

/// Layout and presentation knobs for [`render`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub title: String,
    /// Width of the `=` and `-` rules.
    pub width: usize,
    pub name_width: usize,
    /// Descriptions longer than this are cut to `width - 3` chars plus "...".
    pub description_width: usize,
    pub color: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            title: "SANDBOX SDK TEST REPORT".to_string(),
            width: 100,
            name_width: 30,
            description_width: 48,
            color: false,
        }
    }
}

/// Render the full report: header, one row per test, summary line and, when
/// anything failed, the failure section.
pub fn render(summary: &RunSummary, opts: &RenderOptions, generated_at: &DateTime<Local>) -> String {
    let heavy = "=".repeat(opts.width);
    let light = "-".repeat(opts.width);
    let mut out = String::new();

    out.push_str(&heavy);
    out.push('\n');
    let title = format!(
        "{} - {}",
        opts.title,
        generated_at.format("%Y-%m-%d %H:%M:%S")
    );
    out.push_str(&Paint::Bold.apply(&title, opts.color));
    out.push('\n');
    out.push_str(&heavy);
    out.push('\n');

    out.push_str(&format!(
        "{:<nw$} {:<rw$} {:<tw$} DESCRIPTION\n",
        "TEST NAME",
        "RESULT",
        "TIME (s)",
        nw = opts.name_width,
        rw = RESULT_WIDTH,
        tw = TIME_WIDTH,
    ));
    out.push_str(&light);
    out.push('\n');

    for record in &summary.records {
        out.push_str(&render_row(record, opts));
        out.push('\n');
    }

    out.push_str(&light);
    out.push('\n');
    out.push_str(&render_summary_line(summary, opts.color));
    out.push('\n');

    if summary.failed_or_errored() > 0 {
        out.push('\n');
        out.push_str(&Paint::Bold.apply("FAILURES AND ERRORS", opts.color));
        out.push('\n');
        out.push_str(&light);
        out.push('\n');
        for record in summary.failures() {
            out.push_str(&render_failure(record, opts.color));
            out.push('\n');
        }
    }

    out.push_str(&heavy);
    out.push('\n');
    out
}

/// One table row. Padding is computed on the bare label so color codes never
/// shift the columns.
pub fn render_row(record: &TestRecord, opts: &RenderOptions) -> String {
    let outcome = record.outcome();
    let label = outcome.map_or(INCOMPLETE, |o| o.label());
    let padded_label = format!("{:<width$}", label, width = RESULT_WIDTH);
    let painted = paint_for(outcome).apply(&padded_label, opts.color);

    format!(
        "{:<nw$} {} {:<tw$} {}",
        short_name(&record.identifier),
        painted,
        format_duration(record.duration),
        truncate_description(record.description_or_default(), opts.description_width),
        nw = opts.name_width,
        tw = TIME_WIDTH,
    )
    .trim_end()
    .to_string()
}

/// `SUMMARY: Total: N, Passed: P, Failed: F, Skipped: S`; FAIL and ERROR are
/// combined under "Failed".
pub fn render_summary_line(summary: &RunSummary, color: bool) -> String {
    let count = |n: usize, paint: Paint| {
        if n > 0 {
            paint.apply(&n.to_string(), color)
        } else {
            "0".to_string()
        }
    };

    let mut line = format!(
        "SUMMARY: Total: {}, Passed: {}, Failed: {}, Skipped: {}",
        summary.total(),
        count(summary.passed, Paint::Green),
        count(summary.failed_or_errored(), Paint::Red),
        count(summary.skipped, Paint::Yellow),
    );
    if summary.incomplete > 0 {
        line.push_str(&format!(
            ", Incomplete: {}",
            count(summary.incomplete, Paint::Bold)
        ));
    }
    line
}

fn render_failure(record: &TestRecord, color: bool) -> String {
    let outcome = record.outcome();
    let label = paint_for(outcome).apply(outcome.map_or(INCOMPLETE, |o| o.label()), color);
    match record.error_detail() {
        Some(detail) => format!("{} in {}: {}", label, record.identifier, detail),
        None => format!("{} in {}", label, record.identifier),
    }
}

/// Trailing component of an identifier after its last `.` or `:`. Falls back
/// to the whole identifier when that component is empty.
pub fn short_name(identifier: &str) -> &str {
    match identifier.rsplit(['.', ':']).next() {
        Some(tail) if !tail.is_empty() => tail,
        _ => identifier,
    }
}

/// Three decimals of seconds, or "N/A" for a missing or zero duration.
pub fn format_duration(duration: Option<Duration>) -> String {
    match duration {
        Some(d) if !d.is_zero() => format!("{:.3}", d.as_secs_f64()),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// Cut to `max_chars` (never narrower than the ellipsis), replacing the tail
/// with "..." when the text does not fit.
///
/// Length is measured on the text as given. Line breaks, tabs and other
/// control characters are swapped one-for-one with spaces so a row stays on
/// one line without changing its length.
pub fn truncate_description(text: &str, max_chars: usize) -> Cow<'_, str> {
    let max_chars = max_chars.max(ELLIPSIS.len());
    let flat: Cow<'_, str> = if text.chars().any(char::is_control) {
        Cow::Owned(
            text.chars()
                .map(|c| if c.is_control() { ' ' } else { c })
                .collect(),
        )
    } else {
        Cow::Borrowed(text)
    };

    if flat.chars().count() <= max_chars {
        return flat;
    }

    let keep = max_chars - ELLIPSIS.len();
    let mut cut: String = flat.chars().take(keep).collect();
    cut.push_str(ELLIPSIS);
    Cow::Owned(cut)
}
