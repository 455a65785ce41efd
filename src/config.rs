//! TOML configuration for sandboxsuite.
//!
//! Every section has compiled-in defaults, so an empty file (or no file at
//! all) is a valid configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::report::{ColorChoice, RenderOptions};

/// Environment variable naming an alternative config file.
pub const CONFIG_ENV: &str = "SANDBOXSUITE_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG: &str = "sandboxsuite.toml";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuiteConfig {
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SuiteConfig {
    /// Load configuration from a TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Try, in order:
    /// 1. The path in the `SANDBOXSUITE_CONFIG` environment variable.
    /// 2. `./sandboxsuite.toml`.
    /// 3. Compiled-in defaults.
    pub fn load_or_default() -> Self {
        if let Ok(env_path) = std::env::var(CONFIG_ENV) {
            let path = Path::new(&env_path);
            match Self::load(path) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "SANDBOXSUITE_CONFIG set but file could not be loaded, trying fallback"
                    );
                }
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG);
        if local.exists() {
            match Self::load(&local) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    warn!(
                        path = %local.display(),
                        error = %e,
                        "local config file exists but could not be loaded, using defaults"
                    );
                }
            }
        }

        debug!("no config file found, using compiled-in defaults");
        Self::default()
    }

    /// An explicitly requested file must load; otherwise fall back through
    /// [`SuiteConfig::load_or_default`].
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => Ok(Self::load_or_default()),
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Table layout and presentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Title printed above the table, followed by the run timestamp.
    pub title: String,
    /// Width of the horizontal rules.
    pub width: usize,
    /// Column width for the short test name.
    pub name_width: usize,
    /// Descriptions longer than this are truncated with "...".
    pub description_width: usize,
    pub color: ColorChoice,
}

impl Default for ReportConfig {
    fn default() -> Self {
        let layout = RenderOptions::default();
        Self {
            title: layout.title,
            width: layout.width,
            name_width: layout.name_width,
            description_width: layout.description_width,
            color: ColorChoice::Auto,
        }
    }
}

impl ReportConfig {
    /// Build render options; `force_plain` wins over the configured color.
    pub fn render_options(&self, force_plain: bool) -> RenderOptions {
        RenderOptions {
            title: self.title.clone(),
            width: self.width,
            name_width: self.name_width,
            description_width: self.description_width,
            color: !force_plain && self.color.enabled(),
        }
    }
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// Suite runner behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Stop after the first FAIL or ERROR.
    pub fail_fast: bool,
    /// Per-case time limit in seconds. `0` disables it.
    pub case_timeout_secs: u64,
    /// Variables that must be set (and non-blank) for cases to run at all.
    pub required_env: Vec<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            fail_fast: false,
            case_timeout_secs: 3600,
            required_env: vec!["E2B_API_KEY".to_string(), "TEMPLATE_ID".to_string()],
        }
    }
}

impl RunConfig {
    pub fn case_timeout(&self) -> Option<Duration> {
        (self.case_timeout_secs > 0).then(|| Duration::from_secs(self.case_timeout_secs))
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing filter when `RUST_LOG` is unset.
    pub level: String,
    /// Emit logs as JSON lines instead of human-readable text.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
