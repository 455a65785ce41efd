//! Test-run recording and reporting.
//!
//! A driver reports lifecycle events through [`TestListener`]; the
//! [`Recorder`] accumulates them into [`TestRecord`]s and [`render`] turns the
//! finished [`RunSummary`] into a table.

pub mod listener;
pub mod record;
pub mod recorder;
pub mod render;
pub mod style;
pub mod summary;

pub use listener::{Fanout, TestListener, TracingListener};
pub use record::{ErrorDetail, Outcome, Resolution, TestRecord};
pub use recorder::{Clock, ManualClock, Recorder, SystemClock};
pub use render::{render, RenderOptions};
pub use style::ColorChoice;
pub use summary::{RunReport, RunSummary};
