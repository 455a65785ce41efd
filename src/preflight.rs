//! Environment readiness checks run before a sandbox suite.

use async_trait::async_trait;

use crate::config::{ReportConfig, SuiteConfig};
use crate::runner::{check, CaseError, CaseResult, Suite, TestCase};

pub const SUITE_NAME: &str = "preflight";

/// Smallest description column that still fits one character plus "...".
const MIN_DESCRIPTION_WIDTH: usize = 4;

/// Build the preflight suite for the given configuration.
pub fn suite(config: &SuiteConfig) -> Suite {
    let mut suite = Suite::new(SUITE_NAME);
    for var in &config.run.required_env {
        suite = suite.with_case(EnvVarIsSet::new(var));
    }
    suite.with_case(ReportLayoutIsValid {
        report: config.report.clone(),
    })
}

/// Fails when an environment variable is unset or blank.
pub struct EnvVarIsSet {
    var: String,
    name: String,
    description: String,
}

impl EnvVarIsSet {
    pub fn new(var: &str) -> Self {
        Self {
            var: var.to_string(),
            name: format!("{}_is_set", var.to_ascii_lowercase()),
            description: format!("Check that {var} is set in the environment"),
        }
    }
}

#[async_trait]
impl TestCase for EnvVarIsSet {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> Option<&str> {
        Some(&self.description)
    }

    async fn run(&self) -> CaseResult {
        match std::env::var(&self.var) {
            Ok(value) => check(!value.trim().is_empty(), format!("{} is set but blank", self.var)),
            Err(std::env::VarError::NotPresent) => {
                Err(CaseError::assertion(format!("{} is not set", self.var)))
            }
            Err(e @ std::env::VarError::NotUnicode(_)) => {
                Err(CaseError::fault("EnvError", format!("{}: {e}", self.var)))
            }
        }
    }
}

/// Fails when the configured table layout cannot render rows sensibly.
pub struct ReportLayoutIsValid {
    report: ReportConfig,
}

#[async_trait]
impl TestCase for ReportLayoutIsValid {
    fn name(&self) -> &str {
        "report_layout_is_valid"
    }

    fn description(&self) -> Option<&str> {
        Some("Check that the report column widths are usable")
    }

    async fn run(&self) -> CaseResult {
        check(self.report.width > 0, "report width must be positive")?;
        check(self.report.name_width > 0, "name column width must be positive")?;
        check(
            self.report.description_width >= MIN_DESCRIPTION_WIDTH,
            format!(
                "description width {} cannot fit the truncation marker (minimum {})",
                self.report.description_width, MIN_DESCRIPTION_WIDTH
            ),
        )
    }
}
