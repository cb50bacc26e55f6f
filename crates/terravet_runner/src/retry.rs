//! Bounded retries for transient tool failures.
//!
//! A failed execution is retried only when its combined output matches one
//! of the configured retryable error patterns. Everything else propagates
//! after the first attempt.

use std::collections::BTreeMap;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{RunConfig, ToolCommand};
use crate::error::{RunnerError, RunnerResult};
use crate::runner::{ExecutionResult, ProcessRunner};

const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_TIME_BETWEEN_RETRIES_SECS: u64 = 5;

const TRANSIENT_NETWORK: &str = "Failed to retrieve plugin due to transient network error.";

/// Output patterns of known transient Terraform failures, with the reason
/// logged when one of them triggers a retry.
pub const DEFAULT_RETRYABLE_ERRORS: &[(&str, &str)] = &[
    (".*read: connection reset by peer.*", "Failed to reach helm charts repository."),
    (".*transport is closing.*", "Failed to reach Kubernetes API."),
    (".*unable to verify signature.*", TRANSIENT_NETWORK),
    (".*unable to verify checksum.*", TRANSIENT_NETWORK),
    (".*no provider exists with the given name.*", TRANSIENT_NETWORK),
    (".*registry service is unreachable.*", TRANSIENT_NETWORK),
    (".*Error installing provider.*", TRANSIENT_NETWORK),
    (".*Failed to query available provider packages.*", TRANSIENT_NETWORK),
    (".*timeout while waiting for plugin to start.*", TRANSIENT_NETWORK),
    (".*timed out waiting for server handshake.*", TRANSIENT_NETWORK),
    ("could not query provider registry for", TRANSIENT_NETWORK),
    (
        "Provider produced inconsistent result after apply",
        "Provider eventual consistency error.",
    ),
];

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_time_between_retries_secs() -> u64 {
    DEFAULT_TIME_BETWEEN_RETRIES_SECS
}

fn default_retryable_errors() -> BTreeMap<String, String> {
    DEFAULT_RETRYABLE_ERRORS
        .iter()
        .map(|(pattern, message)| (pattern.to_string(), message.to_string()))
        .collect()
}

/// Retry policy for external invocations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Additional attempts after the first one
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Pause between attempts
    #[serde(default = "default_time_between_retries_secs")]
    pub time_between_retries_secs: u64,
    /// Regex pattern -> reason
    #[serde(default = "default_retryable_errors")]
    pub retryable_errors: BTreeMap<String, String>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            time_between_retries_secs: DEFAULT_TIME_BETWEEN_RETRIES_SECS,
            retryable_errors: default_retryable_errors(),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            time_between_retries_secs: 0,
            retryable_errors: BTreeMap::new(),
        }
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn time_between_retries(mut self, seconds: u64) -> Self {
        self.time_between_retries_secs = seconds;
        self
    }

    pub fn retryable_error(mut self, pattern: impl Into<String>, message: impl Into<String>) -> Self {
        self.retryable_errors.insert(pattern.into(), message.into());
        self
    }
}

/// Execution result together with the number of attempts it took.
#[derive(Debug, Clone)]
pub struct RetriedExecution {
    pub result: ExecutionResult,
    pub attempts: u32,
}

/// Compiled form of a [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct Retrier {
    matchers: Vec<(Regex, String)>,
    max_retries: u32,
    delay: Duration,
}

impl Retrier {
    /// Compile the policy's patterns.
    pub fn new(policy: &RetryPolicy) -> RunnerResult<Self> {
        let matchers = policy
            .retryable_errors
            .iter()
            .map(|(pattern, message)| {
                Regex::new(pattern)
                    .map(|re| (re, message.clone()))
                    .map_err(|source| RunnerError::InvalidPattern {
                        pattern: pattern.clone(),
                        source,
                    })
            })
            .collect::<RunnerResult<Vec<_>>>()?;

        Ok(Self {
            matchers,
            max_retries: policy.max_retries,
            delay: Duration::from_secs(policy.time_between_retries_secs),
        })
    }

    /// Reason for the first retryable pattern found in `output`.
    pub fn retryable_reason(&self, output: &str) -> Option<&str> {
        self.matchers
            .iter()
            .find(|(re, _)| re.is_match(output))
            .map(|(_, message)| message.as_str())
    }

    /// Run `command`, retrying transient failures.
    pub async fn run(
        &self,
        runner: &dyn ProcessRunner,
        command: &ToolCommand,
        run_config: &RunConfig,
    ) -> RunnerResult<RetriedExecution> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let result = runner.run(command, run_config).await?;

            if result.success() || attempts > self.max_retries {
                return Ok(RetriedExecution { result, attempts });
            }

            let output = result.combined_output();
            let Some(reason) = self.retryable_reason(&output) else {
                debug!("{} failed with a non-retryable error", command.display());
                return Ok(RetriedExecution { result, attempts });
            };

            warn!(
                "{} failed: {} Retrying in {}s ({}/{})",
                command.display(),
                reason,
                self.delay.as_secs(),
                attempts,
                self.max_retries
            );
            tokio::time::sleep(self.delay).await;
        }
    }
}
