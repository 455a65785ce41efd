use std::io::BufReader;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::{Local, Utc};
use clap::{Parser, Subcommand};

use sandboxsuite::config::SuiteConfig;
use sandboxsuite::report::{self, RunReport, RunSummary};

#[derive(Parser)]
#[command(
    name = "sandboxsuite",
    about = "Test-run recorder and tabular reporter for sandbox SDK test suites",
    version,
    long_about = None
)]
struct Cli {
    /// Config file (defaults to $SANDBOXSUITE_CONFIG, then ./sandboxsuite.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a JSON-lines event log from a test driver and print the report
    Replay {
        /// Event log path, or "-" for stdin
        #[arg(long, default_value = "-")]
        events: String,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Check the environment (API key, template id, report layout)
    Preflight {
        /// Suppress live per-test progress on stderr
        #[arg(long)]
        quiet: bool,

        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(clap::Args)]
struct OutputArgs {
    /// JSON output for machine parsing
    #[arg(long)]
    json: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

/// Stderr subscriber used only while the config file is being located, so
/// load warnings are not dropped before the configured subscriber exists.
fn bootstrap_subscriber() -> impl tracing::Subscriber + Send + Sync {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .finish()
}

fn init_tracing(config: &SuiteConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter);
    if config.logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn emit(suite: &str, summary: RunSummary, output: &OutputArgs, config: &SuiteConfig) -> Result<ExitCode> {
    let code = ExitCode::from(summary.exit_code());
    if output.json {
        let report = RunReport::new(suite, summary, Utc::now());
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let opts = config.report.render_options(output.no_color);
        print!("{}", report::render(&summary, &opts, &Local::now()));
    }
    Ok(code)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = tracing::subscriber::with_default(bootstrap_subscriber(), || {
        SuiteConfig::resolve(cli.config.as_deref())
    })?;
    init_tracing(&config);
    tracing::debug!(?config, "effective configuration");

    match cli.command {
        Commands::Replay { events, output } => {
            tracing::info!(%events, "Replaying event log");
            let summary = if events == "-" {
                sandboxsuite::replay_log(std::io::stdin().lock())?
            } else {
                let file = std::fs::File::open(&events)
                    .with_context(|| format!("failed to open event log: {events}"))?;
                sandboxsuite::replay_log(BufReader::new(file))?
            };
            emit("replay", summary, &output, &config)
        }
        Commands::Preflight { quiet, output } => {
            tracing::info!("Running preflight checks");
            let summary = sandboxsuite::run_preflight(&config, !quiet).await;
            emit(sandboxsuite::preflight::SUITE_NAME, summary, &output, &config)
        }
    }
}
