//! Scenario model and reports.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{IacError, IacResult};

/// What a scenario expects the tool to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Expectation {
    #[default]
    Pass,
    Fail,
}

impl Expectation {
    /// Whether an observed outcome satisfies this expectation.
    ///
    /// Failures compare on pass/fail only, not on which step failed.
    pub fn is_met_by(&self, outcome: &Outcome) -> bool {
        matches!(
            (self, outcome),
            (Expectation::Pass, Outcome::Pass) | (Expectation::Fail, Outcome::Fail(_))
        )
    }
}

impl From<bool> for Expectation {
    fn from(expect_ok: bool) -> Self {
        if expect_ok {
            Expectation::Pass
        } else {
            Expectation::Fail
        }
    }
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expectation::Pass => write!(f, "pass"),
            Expectation::Fail => write!(f, "fail"),
        }
    }
}

/// The step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Initialization,
    Validation,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Initialization => write!(f, "initialization"),
            FailureKind::Validation => write!(f, "validation"),
        }
    }
}

/// What the tool actually reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "kind", rename_all = "lowercase")]
pub enum Outcome {
    Pass,
    Fail(FailureKind),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Pass => write!(f, "pass"),
            Outcome::Fail(kind) => write!(f, "fail ({})", kind),
        }
    }
}

/// A named test case pairing a configuration directory with an expectation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub target_dir: PathBuf,
    pub expected: Expectation,
}

impl Scenario {
    pub fn new(name: impl Into<String>, target_dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            target_dir: target_dir.into(),
            expected: Expectation::Pass,
        }
    }

    pub fn expect(mut self, expected: impl Into<Expectation>) -> Self {
        self.expected = expected.into();
        self
    }

    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }
}

/// Reject scenario lists that reuse a name.
pub fn ensure_unique_names(scenarios: &[Scenario]) -> IacResult<()> {
    let mut seen = HashSet::new();
    for scenario in scenarios {
        if !seen.insert(scenario.name.as_str()) {
            return Err(IacError::DuplicateScenario(scenario.name.clone()));
        }
    }
    Ok(())
}

/// Why a scenario did not pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScenarioFailure {
    Initialization { exit_code: i64, output: String },
    Validation { exit_code: i64, output: String },
    Assertion { expected: Expectation, actual: Outcome },
}

impl ScenarioFailure {
    /// Captured tool output, if any.
    pub fn output(&self) -> Option<&str> {
        match self {
            ScenarioFailure::Initialization { output, .. }
            | ScenarioFailure::Validation { output, .. } => Some(output),
            ScenarioFailure::Assertion { .. } => None,
        }
    }
}

impl fmt::Display for ScenarioFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioFailure::Initialization { exit_code, .. } => {
                write!(f, "initialization failed (exit code {})", exit_code)
            }
            ScenarioFailure::Validation { exit_code, .. } => {
                write!(f, "validation failed (exit code {})", exit_code)
            }
            ScenarioFailure::Assertion { expected, actual } => {
                write!(f, "expected {} but got {}", expected, actual)
            }
        }
    }
}

/// Result of running one scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub name: String,
    pub target_dir: PathBuf,
    pub expected: Expectation,
    pub outcome: Outcome,
    pub failure: Option<ScenarioFailure>,
    pub duration_ms: u64,
}

impl ScenarioReport {
    pub fn passed(&self) -> bool {
        self.failure.is_none()
    }
}

/// Result of running a set of scenarios.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub scenarios: Vec<ScenarioReport>,
}

impl SuiteReport {
    pub fn passed(&self) -> bool {
        self.scenarios.iter().all(ScenarioReport::passed)
    }

    pub fn passed_count(&self) -> usize {
        self.scenarios.iter().filter(|s| s.passed()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.scenarios.len() - self.passed_count()
    }

    pub fn get(&self, name: &str) -> Option<&ScenarioReport> {
        self.scenarios.iter().find(|s| s.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expectation_matching_is_binary() {
        assert!(Expectation::Pass.is_met_by(&Outcome::Pass));
        assert!(!Expectation::Pass.is_met_by(&Outcome::Fail(FailureKind::Validation)));
        assert!(Expectation::Fail.is_met_by(&Outcome::Fail(FailureKind::Initialization)));
        assert!(Expectation::Fail.is_met_by(&Outcome::Fail(FailureKind::Validation)));
        assert!(!Expectation::Fail.is_met_by(&Outcome::Pass));
    }

    #[test]
    fn test_expectation_from_bool() {
        assert_eq!(Expectation::from(true), Expectation::Pass);
        assert_eq!(Expectation::from(false), Expectation::Fail);

        let scenario = Scenario::new("Broken", "fixtures/broken").expect(false);
        assert_eq!(scenario.expected, Expectation::Fail);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let scenarios = vec![
            Scenario::new("ValidConfiguration", "v0"),
            Scenario::new("ValidWithNATGateway", "v0"),
            Scenario::new("ValidConfiguration", "v1"),
        ];

        let err = ensure_unique_names(&scenarios).unwrap_err();
        assert!(matches!(err, IacError::DuplicateScenario(ref name) if name == "ValidConfiguration"));
        assert!(ensure_unique_names(&scenarios[..2]).is_ok());
    }

    #[test]
    fn test_failure_display() {
        let failure = ScenarioFailure::Assertion {
            expected: Expectation::Fail,
            actual: Outcome::Pass,
        };
        assert_eq!(failure.to_string(), "expected fail but got pass");
        assert!(failure.output().is_none());

        let failure = ScenarioFailure::Validation {
            exit_code: 1,
            output: "Error: Unsupported block type".to_string(),
        };
        assert_eq!(failure.to_string(), "validation failed (exit code 1)");
        assert_eq!(failure.output(), Some("Error: Unsupported block type"));
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_string(&Outcome::Fail(FailureKind::Validation)).unwrap();
        assert_eq!(json, r#"{"status":"fail","kind":"validation"}"#);

        let json = serde_json::to_string(&Outcome::Pass).unwrap();
        assert_eq!(json, r#"{"status":"pass"}"#);
    }
}
