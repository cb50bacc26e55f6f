//! Tests against a real Terraform binary.
//!
//! Fixture tests need no providers and run whenever `terraform` is on
//! PATH (they skip otherwise). The VPC module tests download the AWS
//! provider and are ignored by default:
//!
//! ```text
//! cargo test -p terravet_iac --test terraform_tests -- --ignored
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use terravet_iac::{
    FailureKind, IacError, Outcome, Scenario, ScenarioRunner, TerraformOptions, TerraformRunner,
};
use terravet_runner::LocalRunner;

fn source_dir(relative: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join(relative)
}

/// Copy a module into a scratch directory so `init` does not write into
/// the repository.
fn scratch_copy(source: &Path) -> TempDir {
    let scratch = tempfile::tempdir().unwrap();
    for entry in fs::read_dir(source).unwrap() {
        let entry = entry.unwrap();
        if entry.file_type().unwrap().is_file() {
            fs::copy(entry.path(), scratch.path().join(entry.file_name())).unwrap();
        }
    }
    scratch
}

async fn local_terraform() -> Option<TerraformRunner> {
    let runner = TerraformRunner::new(Arc::new(LocalRunner::default()), TerraformOptions::default())
        .unwrap();
    if runner.is_available().await.unwrap_or(false) {
        Some(runner)
    } else {
        eprintln!("terraform is not on PATH, skipping");
        None
    }
}

#[tokio::test]
async fn test_minimal_fixture_validates() {
    let Some(terraform) = local_terraform().await else { return };
    let module = scratch_copy(&source_dir("tests/fixtures/minimal"));

    terraform.init_and_validate(module.path()).await.unwrap();
}

#[tokio::test]
async fn test_malformed_fixture_fails_validate() {
    let Some(terraform) = local_terraform().await else { return };
    let module = scratch_copy(&source_dir("tests/fixtures/malformed"));

    let err = terraform.init_and_validate(module.path()).await.unwrap_err();
    assert!(matches!(err, IacError::ValidationFailed(_)));

    let runner = ScenarioRunner::new(terraform);
    let report = runner
        .run_scenario(&Scenario::new("MalformedDeclaration", module.path()))
        .await;
    assert_eq!(report.outcome, Outcome::Fail(FailureKind::Validation));
}

#[tokio::test]
async fn test_missing_directory_fails_init() {
    let Some(terraform) = local_terraform().await else { return };
    let scratch = tempfile::tempdir().unwrap();

    let runner = ScenarioRunner::new(terraform);
    let report = runner
        .run_scenario(&Scenario::new("Missing", scratch.path().join("v0")))
        .await;
    assert_eq!(report.outcome, Outcome::Fail(FailureKind::Initialization));
}

#[tokio::test]
#[ignore = "requires terraform on PATH and access to the provider registry"]
async fn test_vpc_v0_validation() {
    let terraform = local_terraform().await.expect("terraform on PATH");
    let module = scratch_copy(&source_dir("../../modules/vpc/v0"));

    terraform.init_and_validate(module.path()).await.unwrap();
}

#[tokio::test]
#[ignore = "requires terraform on PATH and access to the provider registry"]
async fn test_vpc_inputs() {
    let terraform = local_terraform().await.expect("terraform on PATH");
    let module = scratch_copy(&source_dir("../../modules/vpc/v0"));

    let runner = ScenarioRunner::new(terraform);
    let report = runner
        .run_all(&[
            Scenario::new("ValidConfiguration", module.path()).expect(true),
            Scenario::new("ValidWithNATGateway", module.path()).expect(true),
        ])
        .await
        .unwrap();

    for scenario in &report.scenarios {
        assert!(scenario.passed(), "{}: {:?}", scenario.name, scenario.failure);
    }
}
