//! Run command - Run the scenarios of a suite file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use terravet_iac::{Suite, SUITE_FILE};
use terravet_runner::RetryPolicy;

use super::{build_runner, report, OutputFormat};

#[derive(Args)]
pub struct RunArgs {
    /// Suite file
    #[arg(short, long, default_value = SUITE_FILE)]
    suite: PathBuf,

    /// Only run scenarios whose name contains this text
    #[arg(short, long)]
    filter: Option<String>,

    /// Maximum number of scenarios in flight
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Terraform binary (overrides the suite)
    #[arg(long, env = "TERRAVET_BINARY")]
    binary: Option<String>,

    /// Disable retries of transient errors
    #[arg(long)]
    no_retry: bool,

    /// Log commands instead of running them
    #[arg(long)]
    dry_run: bool,

    /// Forward tool output to the log as it is produced
    #[arg(long)]
    stream: bool,
}

pub async fn execute(args: RunArgs) -> Result<()> {
    let suite = Suite::load(&args.suite)
        .with_context(|| format!("Failed to load suite {:?}", args.suite))?;

    let mut options = suite.terraform.clone();
    if let Some(binary) = args.binary {
        options = options.binary(binary);
    }
    if args.no_retry {
        options = options.retry(RetryPolicy::none());
    }
    if args.stream {
        options = options.stream_logs(true);
    }

    let scenarios = match &args.filter {
        Some(pattern) => suite.filter(pattern),
        None => suite.scenarios.clone(),
    };
    if scenarios.is_empty() {
        anyhow::bail!(
            "No scenarios match '{}'",
            args.filter.as_deref().unwrap_or_default()
        );
    }

    if args.jobs == Some(0) {
        anyhow::bail!("--jobs must be at least 1");
    }

    let runner = build_runner(options, args.dry_run, args.jobs.or(suite.jobs)).await?;
    info!(
        "Running {} of {} scenario(s) from {:?} with {}",
        scenarios.len(),
        suite.scenarios.len(),
        args.suite,
        runner.terraform().options().binary
    );

    let result = runner
        .run_all(&scenarios)
        .await
        .context("Failed to run scenarios")?;

    report::finish(&result, args.format)
}
