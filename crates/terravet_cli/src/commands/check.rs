//! Check command - Run init and validate against one directory.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, ValueEnum};

use terravet_iac::{Expectation, Scenario, TerraformOptions};
use terravet_runner::RetryPolicy;

use super::{build_runner, report, OutputFormat};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Expect {
    Pass,
    Fail,
}

impl From<Expect> for Expectation {
    fn from(expect: Expect) -> Self {
        match expect {
            Expect::Pass => Expectation::Pass,
            Expect::Fail => Expectation::Fail,
        }
    }
}

#[derive(Args)]
pub struct CheckArgs {
    /// Configuration directory
    dir: PathBuf,

    /// Expected outcome
    #[arg(short, long, value_enum, default_value_t = Expect::Pass)]
    expect: Expect,

    /// Terraform binary
    #[arg(long, env = "TERRAVET_BINARY", default_value = "terraform")]
    binary: String,

    /// Per-invocation timeout in seconds (0 = none)
    #[arg(long, default_value_t = 0)]
    timeout: u64,

    /// Disable retries of transient errors
    #[arg(long)]
    no_retry: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

pub async fn execute(args: CheckArgs) -> Result<()> {
    let mut options = TerraformOptions::new()
        .binary(args.binary)
        .timeout(args.timeout);
    if args.no_retry {
        options = options.retry(RetryPolicy::none());
    }

    let name = args
        .dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| args.dir.display().to_string());
    let scenario = Scenario::new(name, args.dir).expect(Expectation::from(args.expect));

    let runner = build_runner(options, false, Some(1)).await?;
    let result = runner.run_all(&[scenario]).await?;

    report::finish(&result, args.format)
}
