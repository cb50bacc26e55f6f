//! # terravet_runner
//!
//! External tool execution wrapper for terravet.
//!
//! This crate runs command-line tools (Terraform and compatible binaries)
//! as child processes and captures their exit status and output.
//!
//! # Features
//!
//! - **Local Runner**: tokio-based process execution with optional timeout
//! - **Dry-Run Mode**: Log commands without execution
//! - **Retries**: Bounded retries for transient, pattern-matched failures
//! - **Mock Runner**: For testing without the real tool installed
//!
//! # Example
//!
//! ```rust,no_run
//! use terravet_runner::{LocalRunner, ProcessRunner, RunConfig, ToolCommand};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runner = LocalRunner::default();
//!
//!     let command = ToolCommand::new("terraform")
//!         .args(["validate", "-no-color"])
//!         .working_dir("modules/vpc/v0");
//!
//!     let result = runner.run(&command, &RunConfig::default()).await?;
//!     println!("Exit code: {}", result.exit_code);
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod local;
pub mod mock;
pub mod retry;
pub mod runner;

pub use config::{RunConfig, ToolCommand};
pub use error::{RunnerError, RunnerResult};
pub use local::{LocalRunner, LocalRunnerOptions, LogStream};
pub use mock::{CapturedCall, MockResponse, MockRunner};
pub use retry::{RetriedExecution, Retrier, RetryPolicy, DEFAULT_RETRYABLE_ERRORS};
pub use runner::{ExecutionResult, ProcessRunner};
