//! Terminal presentation hints. Pure functions applied only while rendering.

use std::ffi::OsStr;
use std::io::IsTerminal;

use serde::{Deserialize, Serialize};

use super::record::Outcome;

const RESET: &str = "\x1b[0m";

/// A presentation hint for a piece of report text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paint {
    Plain,
    Bold,
    Green,
    Red,
    Yellow,
}

impl Paint {
    fn code(self) -> Option<&'static str> {
        match self {
            Paint::Plain => None,
            Paint::Bold => Some("\x1b[1m"),
            Paint::Green => Some("\x1b[92m"),
            Paint::Red => Some("\x1b[91m"),
            Paint::Yellow => Some("\x1b[93m"),
        }
    }

    /// Wrap `text` in the escape sequence when `enabled`.
    pub fn apply(self, text: &str, enabled: bool) -> String {
        match (enabled, self.code()) {
            (true, Some(code)) => format!("{code}{text}{RESET}"),
            _ => text.to_string(),
        }
    }
}

/// Hint for an outcome label; `None` is a test that never finished.
pub fn paint_for(outcome: Option<Outcome>) -> Paint {
    match outcome {
        Some(Outcome::Pass) => Paint::Green,
        Some(Outcome::Fail) | Some(Outcome::Error) => Paint::Red,
        Some(Outcome::Skip) => Paint::Yellow,
        None => Paint::Plain,
    }
}

/// User-facing color preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    /// Decide whether to emit escape codes. `Auto` honours `NO_COLOR` and
    /// only colors a terminal stdout.
    pub fn enabled(self) -> bool {
        match self {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => auto_enabled(
                std::env::var_os("NO_COLOR").as_deref(),
                std::io::stdout().is_terminal(),
            ),
        }
    }
}

/// `NO_COLOR` set to anything non-empty disables color; otherwise color
/// follows whether stdout is a terminal.
fn auto_enabled(no_color: Option<&OsStr>, is_terminal: bool) -> bool {
    no_color.map_or(true, OsStr::is_empty) && is_terminal
}
