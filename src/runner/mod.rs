//! Sequential async suite runner.
//!
//! Runs each case in turn, classifies its result into PASS/FAIL/ERROR/SKIP
//! and reports it through a [`TestListener`].

pub mod case;
pub mod progress;

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use tracing::{debug, info, warn};

use crate::config::RunConfig;
use crate::report::TestListener;

pub use case::{check, check_eq, CaseError, CaseResult, TestCase, ASSERTION_KIND};
pub use progress::ProgressListener;

/// A named, ordered collection of test cases.
pub struct Suite {
    name: String,
    cases: Vec<Box<dyn TestCase>>,
}

impl Suite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cases: Vec::new(),
        }
    }

    pub fn with_case(mut self, case: impl TestCase + 'static) -> Self {
        self.cases.push(Box::new(case));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// Qualified identifier of a case: `<suite>.<case>`.
    pub fn identifier(&self, case: &dyn TestCase) -> String {
        format!("{}.{}", self.name, case.name())
    }
}

/// What a run did, independent of how the listener recorded it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Cases that were started.
    pub started: usize,
    /// True when fail-fast stopped the run before every case started.
    pub stopped_early: bool,
}

/// Drives a [`Suite`] one case at a time.
#[derive(Debug, Clone)]
pub struct Runner {
    fail_fast: bool,
    case_timeout: Option<Duration>,
    required_env: Vec<String>,
}

impl Runner {
    pub fn new(config: &RunConfig) -> Self {
        Self {
            fail_fast: config.fail_fast,
            case_timeout: config.case_timeout(),
            required_env: config.required_env.clone(),
        }
    }

    /// Run every case regardless of the configured required variables.
    pub fn without_required_env(mut self) -> Self {
        self.required_env.clear();
        self
    }

    pub async fn run(&self, suite: &Suite, listener: &dyn TestListener) -> RunStats {
        info!(suite = suite.name(), cases = suite.len(), "starting suite");

        let missing = missing_env(&self.required_env);
        for var in &missing {
            warn!(var = %var, "required environment variable is not set");
        }
        let skip_reason = (!missing.is_empty()).then(|| {
            format!(
                "Missing required environment variables ({})",
                missing.join(" or ")
            )
        });

        let mut stats = RunStats::default();
        for (pos, case) in suite.cases.iter().enumerate() {
            let identifier = suite.identifier(case.as_ref());
            listener.on_test_start(&identifier, case.description());
            stats.started += 1;

            let result = match &skip_reason {
                Some(reason) => Err(CaseError::skip(reason.clone())),
                None => self.execute(case.as_ref()).await,
            };

            let failed = dispatch(listener, &identifier, result);
            if failed && self.fail_fast && pos + 1 < suite.len() {
                info!(test = %identifier, "fail-fast: stopping after first failure");
                stats.stopped_early = true;
                break;
            }
        }

        info!(suite = suite.name(), started = stats.started, "suite finished");
        stats
    }

    async fn execute(&self, case: &dyn TestCase) -> CaseResult {
        let body = AssertUnwindSafe(case.run()).catch_unwind();
        let outcome = match self.case_timeout {
            Some(limit) => match tokio::time::timeout(limit, body).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    return Err(CaseError::fault(
                        "Timeout",
                        format!("exceeded {:.3}s time limit", limit.as_secs_f64()),
                    ))
                }
            },
            None => body.await,
        };

        match outcome {
            Ok(result) => result,
            Err(payload) => Err(CaseError::fault("Panic", panic_message(payload.as_ref()))),
        }
    }
}

/// Forward a case result to the listener. Returns true for FAIL and ERROR.
fn dispatch(listener: &dyn TestListener, identifier: &str, result: CaseResult) -> bool {
    match result {
        Ok(()) => {
            listener.on_test_pass(identifier);
            false
        }
        Err(CaseError::Assertion { message }) => {
            listener.on_test_fail(identifier, ASSERTION_KIND, &message);
            true
        }
        Err(CaseError::Fault { kind, message }) => {
            listener.on_test_error(identifier, &kind, &message);
            true
        }
        Err(CaseError::Skipped { reason }) => {
            debug!(test = identifier, %reason, "case skipped");
            listener.on_test_skip(identifier, &reason);
            false
        }
    }
}

/// Required variables that are unset or blank, in the given order.
pub fn missing_env(required: &[String]) -> Vec<String> {
    required
        .iter()
        .filter(|var| std::env::var(var).map_or(true, |v| v.trim().is_empty()))
        .cloned()
        .collect()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "test body panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{Outcome, Recorder};
    use async_trait::async_trait;

    struct Scripted {
        name: &'static str,
        result: fn() -> CaseResult,
    }

    #[async_trait]
    impl TestCase for Scripted {
        fn name(&self) -> &str {
            self.name
        }

        fn description(&self) -> Option<&str> {
            Some("scripted case")
        }

        async fn run(&self) -> CaseResult {
            (self.result)()
        }
    }

    struct Sleeper;

    #[async_trait]
    impl TestCase for Sleeper {
        fn name(&self) -> &str {
            "test_sleeps"
        }

        async fn run(&self) -> CaseResult {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(())
        }
    }

    fn config() -> RunConfig {
        RunConfig {
            fail_fast: false,
            case_timeout_secs: 5,
            required_env: Vec::new(),
        }
    }

    fn outcomes(recorder: &Recorder) -> Vec<(String, Option<Outcome>)> {
        recorder
            .records()
            .into_iter()
            .map(|r| {
                let outcome = r.outcome();
                (r.identifier, outcome)
            })
            .collect()
    }

    fn mixed_suite() -> Suite {
        Suite::new("sandbox")
            .with_case(Scripted {
                name: "test_lifecycle",
                result: || Ok(()),
            })
            .with_case(Scripted {
                name: "test_filesystem",
                result: || check_eq(&2, &1),
            })
            .with_case(Scripted {
                name: "test_commands",
                result: || Err(CaseError::fault("ConnectionError", "sandbox unreachable")),
            })
            .with_case(Scripted {
                name: "test_s3",
                result: || Err(CaseError::skip("missing credentials")),
            })
    }

    #[tokio::test]
    async fn test_classifies_results() {
        let recorder = Recorder::new();
        let stats = Runner::new(&config()).run(&mixed_suite(), &recorder).await;
        assert_eq!(stats.started, 4);
        assert!(!stats.stopped_early);

        assert_eq!(
            outcomes(&recorder),
            vec![
                ("sandbox.test_lifecycle".to_string(), Some(Outcome::Pass)),
                ("sandbox.test_filesystem".to_string(), Some(Outcome::Fail)),
                ("sandbox.test_commands".to_string(), Some(Outcome::Error)),
                ("sandbox.test_s3".to_string(), Some(Outcome::Skip)),
            ]
        );

        let records = recorder.records();
        let fail = records[1].error_detail().unwrap();
        assert_eq!(fail.kind, "AssertionError");
        assert_eq!(fail.message, "expected 1 got 2");
        assert_eq!(records[0].description.as_deref(), Some("scripted case"));
    }

    #[tokio::test]
    async fn test_fail_fast_stops_after_first_failure() {
        let recorder = Recorder::new();
        let cfg = RunConfig {
            fail_fast: true,
            ..config()
        };
        let stats = Runner::new(&cfg).run(&mixed_suite(), &recorder).await;
        assert_eq!(stats.started, 2);
        assert!(stats.stopped_early);
        assert_eq!(recorder.len(), 2);
    }

    #[tokio::test]
    async fn test_panic_is_reported_as_error() {
        let suite = Suite::new("sandbox").with_case(Scripted {
            name: "test_panics",
            result: || panic!("sandbox handle dropped"),
        });
        let recorder = Recorder::new();
        Runner::new(&config()).run(&suite, &recorder).await;

        let records = recorder.records();
        let detail = records[0].error_detail().unwrap();
        assert_eq!(records[0].outcome(), Some(Outcome::Error));
        assert_eq!(detail.kind, "Panic");
        assert_eq!(detail.message, "sandbox handle dropped");
    }

    #[tokio::test]
    async fn test_timeout_is_reported_as_error() {
        let cfg = RunConfig {
            case_timeout_secs: 1,
            ..config()
        };
        let suite = Suite::new("sandbox").with_case(Sleeper);
        let recorder = Recorder::new();
        Runner::new(&cfg).run(&suite, &recorder).await;

        let records = recorder.records();
        assert_eq!(records[0].outcome(), Some(Outcome::Error));
        assert_eq!(records[0].error_detail().unwrap().kind, "Timeout");
    }

    #[tokio::test]
    async fn test_missing_env_skips_every_case() {
        let cfg = RunConfig {
            required_env: vec!["SANDBOXSUITE_TEST_SURELY_UNSET_VAR".to_string()],
            ..config()
        };
        let recorder = Recorder::new();
        Runner::new(&cfg).run(&mixed_suite(), &recorder).await;

        let summary = recorder.summary();
        assert_eq!(summary.skipped, 4);
        assert!(summary.is_success());
        match &summary.records[0].resolution {
            Some(crate::report::Resolution::Skipped { reason }) => assert_eq!(
                reason,
                "Missing required environment variables (SANDBOXSUITE_TEST_SURELY_UNSET_VAR)"
            ),
            other => panic!("unexpected {other:?}"),
        }

        let recorder = Recorder::new();
        Runner::new(&cfg)
            .without_required_env()
            .run(&mixed_suite(), &recorder)
            .await;
        assert_eq!(recorder.summary().skipped, 1);
    }

    #[test]
    fn test_runs_under_block_on() {
        let recorder = Recorder::new();
        let suite = Suite::new("sandbox").with_case(Scripted {
            name: "test_ok",
            result: || Ok(()),
        });
        let stats = tokio_test::block_on(Runner::new(&config()).run(&suite, &recorder));
        assert_eq!(stats.started, 1);
        assert!(recorder.summary().is_success());
    }
}
