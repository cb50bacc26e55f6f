//! # terravet_iac
//!
//! Terraform configuration validation scenarios for terravet.
//!
//! This crate runs `terraform init` and `terraform validate` against
//! module directories and reports pass/fail per named scenario.
//!
//! ## Features
//!
//! - Init and validate through any [`terravet_runner::ProcessRunner`]
//! - Bounded retries for transient provider/registry errors
//! - Concurrent scenario execution with definition-ordered reports
//! - YAML suite files with directories relative to the suite
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use terravet_iac::{Scenario, ScenarioRunner, TerraformOptions, TerraformRunner};
//! use terravet_runner::LocalRunner;
//!
//! # async fn run() -> terravet_iac::IacResult<()> {
//! let terraform = TerraformRunner::new(Arc::new(LocalRunner::default()), TerraformOptions::default())?;
//! let runner = ScenarioRunner::new(terraform);
//!
//! let report = runner
//!     .run_all(&[
//!         Scenario::new("ValidConfiguration", "modules/vpc/v0"),
//!         Scenario::new("Malformed", "fixtures/malformed").expect(false),
//!     ])
//!     .await?;
//! assert!(report.passed());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod options;
pub mod scenario;
pub mod suite;
pub mod terraform;
pub mod tree;
pub mod validator;

pub use error::{IacError, IacResult};
pub use options::TerraformOptions;
pub use scenario::{
    ensure_unique_names, Expectation, FailureKind, Outcome, Scenario, ScenarioFailure,
    ScenarioReport, SuiteReport,
};
pub use suite::{Suite, SUITE_FILE};
pub use terraform::{TerraformResult, TerraformRunner};
pub use tree::ConfigTree;
pub use validator::ScenarioRunner;
