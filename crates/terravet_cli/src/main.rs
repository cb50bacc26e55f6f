//! terravet CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments or suite
//! - 3: Scenario failures
//! - 4: Terraform not available

use std::process::ExitCode;

use clap::Parser;
use terravet_iac::IacError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::{Cli, Commands, FailedScenarios, ToolUnavailable};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const SCENARIO_FAILURE: u8 = 3;
    pub const TOOL_UNAVAILABLE: u8 = 4;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        "terravet=debug"
    } else if cli.quiet {
        "error"
    } else {
        "terravet=info"
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,{}", default_level)));

    // Logging may already be initialized; continue either way
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    let result = match cli.command {
        Commands::Run(args) => commands::run::execute(args).await,
        Commands::List(args) => commands::list::execute(args).await,
        Commands::Check(args) => commands::check::execute(args).await,
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            if exit_code != ExitCodes::SCENARIO_FAILURE {
                eprintln!("❌ Error: {:#}", e);
            }
            ExitCode::from(exit_code)
        }
    }
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    if e.downcast_ref::<FailedScenarios>().is_some() {
        return ExitCodes::SCENARIO_FAILURE;
    }
    if e.downcast_ref::<ToolUnavailable>().is_some() {
        return ExitCodes::TOOL_UNAVAILABLE;
    }

    for cause in e.chain() {
        match cause.downcast_ref::<IacError>() {
            Some(IacError::InvalidSuite(_))
            | Some(IacError::DuplicateScenario(_))
            | Some(IacError::Yaml(_)) => return ExitCodes::INVALID_ARGS,
            Some(IacError::TerraformNotAvailable(_)) => return ExitCodes::TOOL_UNAVAILABLE,
            _ => {}
        }
    }

    ExitCodes::GENERAL_ERROR
}
