//! Mock process runner for testing.
//!
//! Provides a configurable mock implementation of the ProcessRunner trait
//! for use in tests without requiring the real tool on PATH.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::config::{RunConfig, ToolCommand};
use crate::error::{RunnerError, RunnerResult};
use crate::runner::{ExecutionResult, ProcessRunner};

/// Predefined mock response for a process execution.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub exit_code: i64,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
}

impl MockResponse {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
            duration_ms: 100,
        }
    }

    pub fn failure(exit_code: i64, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: String::new(),
            stderr: stderr.into(),
            duration_ms: 100,
        }
    }

    pub fn with_duration(mut self, ms: u64) -> Self {
        self.duration_ms = ms;
        self
    }
}

/// Captured call information for verification.
#[derive(Debug, Clone)]
pub struct CapturedCall {
    pub method: String,
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    pub env: BTreeMap<String, String>,
}

impl CapturedCall {
    fn simple(method: &str, program: &str) -> Self {
        Self {
            method: method.to_string(),
            program: program.to_string(),
            args: Vec::new(),
            working_dir: None,
            env: BTreeMap::new(),
        }
    }

    pub fn subcommand(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }
}

/// Response rule keyed on subcommand and/or working directory.
#[derive(Debug, Clone)]
struct ResponseRule {
    subcommand: Option<String>,
    working_dir: Option<PathBuf>,
    response: MockResponse,
}

impl ResponseRule {
    fn matches(&self, command: &ToolCommand) -> bool {
        let subcommand_ok = self
            .subcommand
            .as_deref()
            .map_or(true, |s| command.subcommand() == Some(s));
        let dir_ok = self
            .working_dir
            .as_deref()
            .map_or(true, |d| command.working_dir.as_deref() == Some(d));
        subcommand_ok && dir_ok
    }
}

/// Mock process runner for testing.
///
/// Responses are resolved in order: the first matching rule, then the
/// next sequential response, then a plain success. Rules make concurrent
/// tests deterministic since they do not depend on call order.
#[derive(Clone)]
pub struct MockRunner {
    available: Arc<RwLock<bool>>,
    version: Arc<RwLock<String>>,
    rules: Arc<RwLock<Vec<ResponseRule>>>,
    responses: Arc<RwLock<Vec<MockResponse>>>,
    response_index: Arc<AtomicUsize>,
    captured_calls: Arc<RwLock<Vec<CapturedCall>>>,
    /// Simulated failure to return (as a string message for ExecutionFailed).
    simulate_failure: Arc<RwLock<Option<String>>>,
    /// Subcommands that time out, with the reported timeout in seconds.
    timeouts: Arc<RwLock<BTreeMap<String, u64>>>,
}

impl Default for MockRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRunner {
    /// Create a new mock runner.
    pub fn new() -> Self {
        Self {
            available: Arc::new(RwLock::new(true)),
            version: Arc::new(RwLock::new("Terraform v1.6.6".to_string())),
            rules: Arc::new(RwLock::new(Vec::new())),
            responses: Arc::new(RwLock::new(Vec::new())),
            response_index: Arc::new(AtomicUsize::new(0)),
            captured_calls: Arc::new(RwLock::new(Vec::new())),
            simulate_failure: Arc::new(RwLock::new(None)),
            timeouts: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Set whether the tool is available.
    pub fn set_available(self, available: bool) -> Self {
        *self.available.write() = available;
        self
    }

    /// Set the version string.
    pub fn set_version(self, version: impl Into<String>) -> Self {
        *self.version.write() = version.into();
        self
    }

    /// Respond to every call of `subcommand`.
    pub fn respond_to(self, subcommand: impl Into<String>, response: MockResponse) -> Self {
        self.rules.write().push(ResponseRule {
            subcommand: Some(subcommand.into()),
            working_dir: None,
            response,
        });
        self
    }

    /// Respond to `subcommand` only when run in `dir`.
    pub fn respond_in(
        self,
        dir: impl AsRef<Path>,
        subcommand: impl Into<String>,
        response: MockResponse,
    ) -> Self {
        self.rules.write().push(ResponseRule {
            subcommand: Some(subcommand.into()),
            working_dir: Some(dir.as_ref().to_path_buf()),
            response,
        });
        self
    }

    /// Add a sequential response.
    pub fn add_response(self, response: MockResponse) -> Self {
        self.responses.write().push(response);
        self
    }

    /// Set multiple sequential responses.
    pub fn with_responses(self, responses: Vec<MockResponse>) -> Self {
        *self.responses.write() = responses;
        self
    }

    /// Set a failure to simulate.
    pub fn simulate_failure(self, message: impl Into<String>) -> Self {
        *self.simulate_failure.write() = Some(message.into());
        self
    }

    /// Make every call of `subcommand` fail with [`RunnerError::Timeout`].
    pub fn time_out(self, subcommand: impl Into<String>, seconds: u64) -> Self {
        self.timeouts.write().insert(subcommand.into(), seconds);
        self
    }

    /// Clear all captured calls.
    pub fn clear_calls(&self) {
        self.captured_calls.write().clear();
    }

    /// Get all captured calls.
    pub fn get_calls(&self) -> Vec<CapturedCall> {
        self.captured_calls.read().clone()
    }

    /// Get the number of calls made.
    pub fn call_count(&self) -> usize {
        self.captured_calls.read().len()
    }

    /// Get `run` calls for a specific subcommand.
    pub fn get_subcommand_calls(&self, subcommand: &str) -> Vec<CapturedCall> {
        self.captured_calls
            .read()
            .iter()
            .filter(|c| c.method == "run" && c.subcommand() == Some(subcommand))
            .cloned()
            .collect()
    }

    /// Check if a subcommand was run.
    pub fn was_run(&self, subcommand: &str) -> bool {
        !self.get_subcommand_calls(subcommand).is_empty()
    }

    fn record_call(&self, call: CapturedCall) {
        self.captured_calls.write().push(call);
    }

    /// Sequential responses are consumed in order; the last one repeats.
    fn next_response(&self, command: &ToolCommand) -> MockResponse {
        if let Some(rule) = self.rules.read().iter().find(|r| r.matches(command)) {
            return rule.response.clone();
        }

        let responses = self.responses.read();
        if responses.is_empty() {
            return MockResponse::success("");
        }
        let index = self.response_index.fetch_add(1, Ordering::SeqCst);
        responses[index.min(responses.len() - 1)].clone()
    }

    fn check_failure(&self) -> RunnerResult<()> {
        if let Some(msg) = self.simulate_failure.read().clone() {
            return Err(RunnerError::ExecutionFailed(msg));
        }
        Ok(())
    }

    fn check_timeout(&self, command: &ToolCommand) -> RunnerResult<()> {
        let timeouts = self.timeouts.read();
        match command.subcommand().and_then(|s| timeouts.get(s)) {
            Some(seconds) => Err(RunnerError::Timeout(*seconds)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ProcessRunner for MockRunner {
    async fn is_available(&self, program: &str) -> RunnerResult<bool> {
        self.record_call(CapturedCall::simple("is_available", program));
        Ok(*self.available.read())
    }

    async fn version(&self, program: &str) -> RunnerResult<String> {
        self.record_call(CapturedCall::simple("version", program));
        self.check_failure()?;
        if !*self.available.read() {
            return Err(RunnerError::BinaryNotFound(program.to_string()));
        }
        Ok(self.version.read().clone())
    }

    async fn run(
        &self,
        command: &ToolCommand,
        _run_config: &RunConfig,
    ) -> RunnerResult<ExecutionResult> {
        self.record_call(CapturedCall {
            method: "run".to_string(),
            program: command.program.clone(),
            args: command.args.clone(),
            working_dir: command.working_dir.clone(),
            env: command.env.clone(),
        });

        self.check_failure()?;
        if !*self.available.read() {
            return Err(RunnerError::BinaryNotFound(command.program.clone()));
        }
        self.check_timeout(command)?;

        let response = self.next_response(command);
        let started_at = Utc::now();
        let finished_at = started_at + chrono::Duration::milliseconds(response.duration_ms as i64);

        Ok(ExecutionResult {
            execution_id: format!("mock-{}", uuid::Uuid::new_v4()),
            exit_code: response.exit_code,
            stdout: response.stdout,
            stderr: response.stderr,
            started_at,
            finished_at,
            duration_ms: response.duration_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terraform(subcommand: &str) -> ToolCommand {
        ToolCommand::new("terraform").arg(subcommand)
    }

    #[tokio::test]
    async fn test_mock_runner_basic() {
        let runner = MockRunner::new().add_response(MockResponse::success("test output"));

        let result = runner
            .run(&terraform("init"), &RunConfig::default())
            .await
            .unwrap();

        assert_eq!(result.exit_code, 0);
        assert_eq!(result.stdout, "test output");
    }

    #[tokio::test]
    async fn test_mock_runner_captures_calls() {
        let runner = MockRunner::new();

        let cmd = ToolCommand::new("terraform")
            .args(["validate", "-no-color"])
            .working_dir("/modules/vpc")
            .env("TF_LOG", "ERROR");

        let _ = runner.run(&cmd, &RunConfig::default()).await;

        let calls = runner.get_subcommand_calls("validate");
        assert_eq!(calls.len(), 1);

        let call = &calls[0];
        assert_eq!(call.program, "terraform");
        assert_eq!(call.args, vec!["validate".to_string(), "-no-color".to_string()]);
        assert_eq!(call.working_dir.as_deref(), Some(Path::new("/modules/vpc")));
        assert_eq!(call.env.get("TF_LOG"), Some(&"ERROR".to_string()));
    }

    #[tokio::test]
    async fn test_mock_runner_failure_simulation() {
        let runner = MockRunner::new().simulate_failure("simulated error");

        let result = runner.run(&terraform("init"), &RunConfig::default()).await;
        assert!(matches!(result, Err(RunnerError::ExecutionFailed(_))));
    }

    #[tokio::test]
    async fn test_mock_runner_sequential_responses_repeat_last() {
        let runner = MockRunner::new().with_responses(vec![
            MockResponse::success("first"),
            MockResponse::failure(1, "second failed"),
        ]);

        let r1 = runner.run(&terraform("init"), &RunConfig::default()).await.unwrap();
        assert_eq!(r1.stdout, "first");

        let r2 = runner.run(&terraform("init"), &RunConfig::default()).await.unwrap();
        assert_eq!(r2.exit_code, 1);

        let r3 = runner.run(&terraform("init"), &RunConfig::default()).await.unwrap();
        assert_eq!(r3.stderr, "second failed");
    }

    #[tokio::test]
    async fn test_mock_runner_rules_match_subcommand_and_dir() {
        let runner = MockRunner::new()
            .respond_in("/broken", "validate", MockResponse::failure(1, "Unsupported block type"))
            .respond_to("init", MockResponse::success("Terraform has been successfully initialized!"));

        let init = runner
            .run(&terraform("init").working_dir("/broken"), &RunConfig::default())
            .await
            .unwrap();
        assert!(init.success());

        let broken = runner
            .run(&terraform("validate").working_dir("/broken"), &RunConfig::default())
            .await
            .unwrap();
        assert_eq!(broken.exit_code, 1);

        let fine = runner
            .run(&terraform("validate").working_dir("/fine"), &RunConfig::default())
            .await
            .unwrap();
        assert!(fine.success());
    }

    #[tokio::test]
    async fn test_mock_runner_availability() {
        let available = MockRunner::new().set_available(true);
        assert!(available.is_available("terraform").await.unwrap());
        assert_eq!(available.version("terraform").await.unwrap(), "Terraform v1.6.6");

        let unavailable = MockRunner::new().set_available(false);
        assert!(!unavailable.is_available("terraform").await.unwrap());
        assert!(unavailable.version("terraform").await.is_err());
    }

    #[tokio::test]
    async fn test_mock_runner_timeout_per_subcommand() {
        let runner = MockRunner::new().time_out("validate", 30);

        let init = runner.run(&terraform("init"), &RunConfig::default()).await;
        assert!(init.unwrap().success());

        let validate = runner.run(&terraform("validate"), &RunConfig::default()).await;
        assert!(matches!(validate, Err(RunnerError::Timeout(30))));
        assert!(runner.was_run("validate"));
    }

    #[tokio::test]
    async fn test_mock_runner_duration_and_version() {
        let runner = MockRunner::new()
            .set_version("OpenTofu v1.6.0")
            .add_response(MockResponse::success("").with_duration(2500));

        let result = runner.run(&terraform("init"), &RunConfig::default()).await.unwrap();
        assert_eq!(result.duration_ms, 2500);
        assert_eq!((result.finished_at - result.started_at).num_milliseconds(), 2500);
        assert_eq!(runner.version("tofu").await.unwrap(), "OpenTofu v1.6.0");
    }

    #[tokio::test]
    async fn test_mock_runner_clear_calls() {
        let runner = MockRunner::new();
        let _ = runner.run(&terraform("init"), &RunConfig::default()).await;
        assert_eq!(runner.call_count(), 1);

        runner.clear_calls();
        assert_eq!(runner.call_count(), 0);
        assert!(!runner.was_run("init"));
    }
}
