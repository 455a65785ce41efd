//! Live per-test progress lines, in the familiar verbose test-runner style:
//!
//! ```text
//! test_commands (sandbox.test_commands) ... ok
//! test_s3 (sandbox.test_s3) ... skipped 'missing credentials'
//! ```

use std::io::Write;
use std::sync::Mutex;

use crate::report::render::short_name;
use crate::report::TestListener;

pub struct ProgressListener<W: Write + Send> {
    out: Mutex<W>,
}

impl ProgressListener<std::io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(std::io::stderr())
    }
}

impl<W: Write + Send> ProgressListener<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|e| e.into_inner())
    }

    // Progress output is best-effort; a closed stream must not abort the run.
    fn emit(&self, text: &str, newline: bool) {
        let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
        let _ = out.write_all(text.as_bytes());
        if newline {
            let _ = out.write_all(b"\n");
        }
        let _ = out.flush();
    }
}

impl<W: Write + Send> TestListener for ProgressListener<W> {
    fn on_test_start(&self, identifier: &str, _description: Option<&str>) {
        self.emit(
            &format!("{} ({}) ... ", short_name(identifier), identifier),
            false,
        );
    }

    fn on_test_pass(&self, _identifier: &str) {
        self.emit("ok", true);
    }

    fn on_test_fail(&self, _identifier: &str, _kind: &str, _message: &str) {
        self.emit("FAIL", true);
    }

    fn on_test_error(&self, _identifier: &str, _kind: &str, _message: &str) {
        self.emit("ERROR", true);
    }

    fn on_test_skip(&self, _identifier: &str, reason: &str) {
        self.emit(&format!("skipped '{reason}'"), true);
    }
}
