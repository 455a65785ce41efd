//! Observer interface between a test driver and whatever watches the run.

use tracing::{debug, info, warn};

/// Lifecycle callbacks invoked by a test driver, in temporal order: one start
/// followed by exactly one terminal event per test.
pub trait TestListener: Send + Sync {
    fn on_test_start(&self, identifier: &str, description: Option<&str>);

    fn on_test_pass(&self, identifier: &str);

    /// The test's own assertion did not hold.
    fn on_test_fail(&self, identifier: &str, kind: &str, message: &str);

    /// The test aborted for a reason other than an assertion.
    fn on_test_error(&self, identifier: &str, kind: &str, message: &str);

    fn on_test_skip(&self, identifier: &str, reason: &str);
}

/// Forwards every event to each listener, in registration order.
#[derive(Default)]
pub struct Fanout {
    listeners: Vec<Box<dyn TestListener>>,
}

impl Fanout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, listener: impl TestListener + 'static) -> Self {
        self.listeners.push(Box::new(listener));
        self
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl TestListener for Fanout {
    fn on_test_start(&self, identifier: &str, description: Option<&str>) {
        for l in &self.listeners {
            l.on_test_start(identifier, description);
        }
    }

    fn on_test_pass(&self, identifier: &str) {
        for l in &self.listeners {
            l.on_test_pass(identifier);
        }
    }

    fn on_test_fail(&self, identifier: &str, kind: &str, message: &str) {
        for l in &self.listeners {
            l.on_test_fail(identifier, kind, message);
        }
    }

    fn on_test_error(&self, identifier: &str, kind: &str, message: &str) {
        for l in &self.listeners {
            l.on_test_error(identifier, kind, message);
        }
    }

    fn on_test_skip(&self, identifier: &str, reason: &str) {
        for l in &self.listeners {
            l.on_test_skip(identifier, reason);
        }
    }
}

/// Emits one structured `tracing` event per lifecycle call.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingListener;

impl TestListener for TracingListener {
    fn on_test_start(&self, identifier: &str, description: Option<&str>) {
        debug!(test = identifier, ?description, "test started");
    }

    fn on_test_pass(&self, identifier: &str) {
        info!(test = identifier, outcome = "PASS", "test finished");
    }

    fn on_test_fail(&self, identifier: &str, kind: &str, message: &str) {
        warn!(test = identifier, outcome = "FAIL", kind, message, "test finished");
    }

    fn on_test_error(&self, identifier: &str, kind: &str, message: &str) {
        warn!(test = identifier, outcome = "ERROR", kind, message, "test finished");
    }

    fn on_test_skip(&self, identifier: &str, reason: &str) {
        info!(test = identifier, outcome = "SKIP", reason, "test finished");
    }
}
