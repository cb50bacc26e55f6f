//! Terraform invocation options.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use terravet_runner::{RetryPolicy, RunConfig};

fn default_binary() -> String {
    "terraform".to_string()
}

fn default_true() -> bool {
    true
}

/// Everything the harness needs to know about the external tool.
///
/// Credentials and other tool environment travel in `env` so a scenario
/// run does not depend on the harness's own process environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerraformOptions {
    /// Binary to invoke (`terraform`, `tofu`, or a path)
    #[serde(default = "default_binary")]
    pub binary: String,
    /// Pass `-no-color` to every command
    #[serde(default = "default_true")]
    pub no_color: bool,
    /// Per-invocation timeout in seconds (0 = none)
    #[serde(default)]
    pub timeout_seconds: u64,
    /// Start the tool with an empty environment plus `env`
    #[serde(default)]
    pub clear_env: bool,
    /// Environment variables for the tool
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Retries for transient tool errors
    #[serde(default)]
    pub retry: RetryPolicy,
    /// Forward tool output to the log line by line
    #[serde(default)]
    pub stream_logs: bool,
}

impl Default for TerraformOptions {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            no_color: true,
            timeout_seconds: 0,
            clear_env: false,
            env: BTreeMap::new(),
            retry: RetryPolicy::default(),
            stream_logs: false,
        }
    }
}

impl TerraformOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn no_color(mut self, enabled: bool) -> Self {
        self.no_color = enabled;
        self
    }

    pub fn timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn clear_env(mut self, clear: bool) -> Self {
        self.clear_env = clear;
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    pub fn stream_logs(mut self, enabled: bool) -> Self {
        self.stream_logs = enabled;
        self
    }

    /// Run configuration applied to each invocation.
    pub fn run_config(&self) -> RunConfig {
        RunConfig::default()
            .timeout(self.timeout_seconds)
            .stream_logs(self.stream_logs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = TerraformOptions::default();
        assert_eq!(options.binary, "terraform");
        assert!(options.no_color);
        assert_eq!(options.timeout_seconds, 0);
        assert_eq!(options.retry, RetryPolicy::default());
    }

    #[test]
    fn test_deserialize_partial_yaml_uses_defaults() {
        let yaml = r#"
binary: tofu
env:
  AWS_REGION: eu-west-1
retry:
  max_retries: 1
"#;
        let options: TerraformOptions = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(options.binary, "tofu");
        assert!(options.no_color);
        assert_eq!(options.env.get("AWS_REGION"), Some(&"eu-west-1".to_string()));
        assert_eq!(options.retry.max_retries, 1);
        assert_eq!(options.retry.time_between_retries_secs, 5);
        assert!(!options.retry.retryable_errors.is_empty());
    }

    #[test]
    fn test_run_config() {
        let config = TerraformOptions::new().timeout(120).stream_logs(true).run_config();
        assert_eq!(config.timeout_seconds, 120);
        assert!(config.stream_logs);
    }
}
