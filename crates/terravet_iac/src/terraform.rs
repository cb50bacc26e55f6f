//! Terraform runner.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use terravet_runner::{ProcessRunner, Retrier, ToolCommand};

use crate::error::{IacError, IacResult};
use crate::options::TerraformOptions;

/// Result of a Terraform operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerraformResult {
    pub success: bool,
    pub output: String,
    pub exit_code: i64,
    /// Attempts made, including retries of transient errors
    pub attempts: u32,
}

/// Terraform runner that executes commands through a [`ProcessRunner`].
pub struct TerraformRunner {
    runner: Arc<dyn ProcessRunner>,
    options: TerraformOptions,
    retrier: Retrier,
}

impl TerraformRunner {
    /// Create a new Terraform runner.
    ///
    /// Fails if a retryable error pattern does not compile.
    pub fn new(runner: Arc<dyn ProcessRunner>, options: TerraformOptions) -> IacResult<Self> {
        let retrier = Retrier::new(&options.retry)?;
        Ok(Self {
            runner,
            options,
            retrier,
        })
    }

    pub fn options(&self) -> &TerraformOptions {
        &self.options
    }

    /// Check if the configured binary can be run.
    pub async fn is_available(&self) -> IacResult<bool> {
        Ok(self.runner.is_available(&self.options.binary).await?)
    }

    /// First line of `terraform version`.
    pub async fn version(&self) -> IacResult<String> {
        self.runner
            .version(&self.options.binary)
            .await
            .map_err(|e| IacError::TerraformNotAvailable(e.to_string()))
    }

    /// Run terraform init.
    pub async fn init(&self, working_dir: &Path) -> IacResult<TerraformResult> {
        info!("Running terraform init in {:?}", working_dir);
        self.run_command(working_dir, &["init", "-input=false", "-upgrade=false"])
            .await
    }

    /// Run terraform validate.
    pub async fn validate(&self, working_dir: &Path) -> IacResult<TerraformResult> {
        info!("Running terraform validate in {:?}", working_dir);
        self.run_command(working_dir, &["validate"]).await
    }

    /// Run init followed by validate, failing on the first unsuccessful step.
    pub async fn init_and_validate(&self, working_dir: &Path) -> IacResult<()> {
        let init = self.init(working_dir).await?;
        if !init.success {
            return Err(IacError::InitFailed(init.output));
        }

        let validate = self.validate(working_dir).await?;
        if !validate.success {
            return Err(IacError::ValidationFailed(validate.output));
        }

        Ok(())
    }

    /// Build the command line for a subcommand.
    pub fn command(&self, working_dir: &Path, args: &[&str]) -> ToolCommand {
        let mut command = ToolCommand::new(&self.options.binary)
            .args(args.iter().copied())
            .working_dir(working_dir)
            .clear_env(self.options.clear_env)
            .envs(self.options.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        if self.options.no_color {
            command = command.arg("-no-color");
        }
        command
    }

    async fn run_command(&self, working_dir: &Path, args: &[&str]) -> IacResult<TerraformResult> {
        let command = self.command(working_dir, args);
        debug!("Executing {}", command.display());

        let retried = self
            .retrier
            .run(self.runner.as_ref(), &command, &self.options.run_config())
            .await?;

        Ok(TerraformResult {
            success: retried.result.success(),
            output: retried.result.combined_output(),
            exit_code: retried.result.exit_code,
            attempts: retried.attempts,
        })
    }
}
