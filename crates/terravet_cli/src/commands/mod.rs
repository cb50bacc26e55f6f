//! CLI command definitions.
//!
//! This module defines the command structure for the terravet CLI and the
//! pieces the subcommands share.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use thiserror::Error;
use tracing::info;

use terravet_iac::{ScenarioRunner, TerraformOptions, TerraformRunner};
use terravet_runner::{LocalRunner, LocalRunnerOptions};

pub mod check;
pub mod list;
pub mod report;
pub mod run;

/// terravet - Terraform configuration validation scenarios
#[derive(Parser)]
#[command(name = "terravet")]
#[command(version, about = "terravet - Terraform configuration validation scenarios")]
#[command(long_about = r#"
terravet runs `terraform init` and `terraform validate` against module
directories and reports pass/fail per named scenario.

COMMANDS:
  run    → Run the scenarios of a suite file
  list   → List the scenarios of a suite file
  check  → Validate a single directory

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments or suite
  3 - Scenario failures
  4 - Terraform not available
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the scenarios of a suite
    Run(run::RunArgs),

    /// List the scenarios of a suite
    List(list::ListArgs),

    /// Run init and validate against one directory
    Check(check::CheckArgs),
}

/// Report output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// One or more scenarios did not meet their expectation.
#[derive(Debug, Error)]
#[error("{failed} of {total} scenario(s) failed")]
pub struct FailedScenarios {
    pub failed: usize,
    pub total: usize,
}

/// The configured tool binary cannot be run.
#[derive(Debug, Error)]
#[error("Terraform binary '{0}' is not available")]
pub struct ToolUnavailable(pub String);

/// Build a scenario runner on the local host, checking the tool first
/// unless this is a dry run.
pub async fn build_runner(
    options: TerraformOptions,
    dry_run: bool,
    jobs: Option<usize>,
) -> Result<ScenarioRunner> {
    let mut local_options = LocalRunnerOptions::new();
    if dry_run {
        local_options = local_options.dry_run();
    }

    let binary = options.binary.clone();
    let terraform = TerraformRunner::new(Arc::new(LocalRunner::new(local_options)), options)
        .context("Invalid terraform options")?;

    if !dry_run {
        if !terraform.is_available().await? {
            return Err(ToolUnavailable(binary).into());
        }
        let version = terraform.version().await?;
        info!("Using {}", version);
    }

    let runner = ScenarioRunner::new(terraform);
    Ok(match jobs {
        Some(jobs) => runner.with_jobs(jobs),
        None => runner,
    })
}
