//! Suite files: scenarios plus tool options, in YAML.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{IacError, IacResult};
use crate::options::TerraformOptions;
use crate::scenario::{ensure_unique_names, Expectation, Scenario};

/// Default suite file name.
pub const SUITE_FILE: &str = "terravet.yaml";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SuiteFile {
    #[serde(default)]
    terraform: TerraformOptions,
    #[serde(default)]
    jobs: Option<usize>,
    #[serde(default)]
    scenarios: Vec<ScenarioEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScenarioEntry {
    name: String,
    dir: PathBuf,
    #[serde(default)]
    expect: Expectation,
}

/// A loaded suite with directories resolved.
#[derive(Debug, Clone)]
pub struct Suite {
    pub terraform: TerraformOptions,
    pub jobs: Option<usize>,
    pub scenarios: Vec<Scenario>,
}

impl Suite {
    /// Load a suite file. Relative scenario directories resolve against
    /// the directory containing the file.
    pub fn load(path: &Path) -> IacResult<Self> {
        debug!("Loading suite from {:?}", path);
        let content = fs::read_to_string(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_yaml(&content, base_dir)
    }

    /// Parse suite YAML, resolving relative directories against `base_dir`.
    pub fn from_yaml(yaml: &str, base_dir: &Path) -> IacResult<Self> {
        let file: SuiteFile = serde_yaml::from_str(yaml)?;

        if file.scenarios.is_empty() {
            return Err(IacError::InvalidSuite("no scenarios defined".to_string()));
        }
        if file.jobs == Some(0) {
            return Err(IacError::InvalidSuite("jobs must be at least 1".to_string()));
        }

        let scenarios = file
            .scenarios
            .into_iter()
            .map(|entry| {
                if entry.name.trim().is_empty() {
                    return Err(IacError::InvalidSuite(format!(
                        "scenario for {:?} has an empty name",
                        entry.dir
                    )));
                }
                let target_dir = if entry.dir.is_absolute() {
                    entry.dir
                } else {
                    base_dir.join(entry.dir)
                };
                Ok(Scenario::new(entry.name, target_dir).expect(entry.expect))
            })
            .collect::<IacResult<Vec<_>>>()?;

        ensure_unique_names(&scenarios)?;

        Ok(Self {
            terraform: file.terraform,
            jobs: file.jobs,
            scenarios,
        })
    }

    /// Scenarios whose name contains `pattern`.
    pub fn filter(&self, pattern: &str) -> Vec<Scenario> {
        self.scenarios
            .iter()
            .filter(|s| s.name.contains(pattern))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SUITE: &str = r#"
terraform:
  binary: tofu
  timeout_seconds: 300
jobs: 2
scenarios:
  - name: ValidConfiguration
    dir: modules/vpc/v0
  - name: ValidWithNATGateway
    dir: modules/vpc/v0
    expect: pass
  - name: MalformedDeclaration
    dir: /abs/malformed
    expect: fail
"#;

    #[test]
    fn test_from_yaml_resolves_dirs() {
        let suite = Suite::from_yaml(SUITE, Path::new("/repo")).unwrap();

        assert_eq!(suite.terraform.binary, "tofu");
        assert_eq!(suite.terraform.timeout_seconds, 300);
        assert_eq!(suite.jobs, Some(2));
        assert_eq!(suite.scenarios.len(), 3);
        assert_eq!(suite.scenarios[0].target_dir, PathBuf::from("/repo/modules/vpc/v0"));
        assert_eq!(suite.scenarios[0].expected, Expectation::Pass);
        assert_eq!(suite.scenarios[2].target_dir, PathBuf::from("/abs/malformed"));
        assert_eq!(suite.scenarios[2].expected, Expectation::Fail);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(SUITE_FILE);
        fs::write(&path, SUITE).unwrap();

        let suite = Suite::load(&path).unwrap();
        assert_eq!(suite.scenarios[0].target_dir, dir.path().join("modules/vpc/v0"));
    }

    #[test]
    fn test_filter() {
        let suite = Suite::from_yaml(SUITE, Path::new("/repo")).unwrap();
        let valid = suite.filter("Valid");
        assert_eq!(valid.len(), 2);
        assert!(suite.filter("Nothing").is_empty());
    }

    #[test]
    fn test_rejects_duplicates() {
        let yaml = r#"
scenarios:
  - name: A
    dir: one
  - name: A
    dir: two
"#;
        let err = Suite::from_yaml(yaml, Path::new(".")).unwrap_err();
        assert!(matches!(err, IacError::DuplicateScenario(_)));
    }

    #[test]
    fn test_rejects_empty_and_unknown() {
        let err = Suite::from_yaml("scenarios: []", Path::new(".")).unwrap_err();
        assert!(matches!(err, IacError::InvalidSuite(_)));

        let yaml = "scenarios:\n  - name: A\n    dir: one\n    expected: fail\n";
        let err = Suite::from_yaml(yaml, Path::new(".")).unwrap_err();
        assert!(matches!(err, IacError::Yaml(_)));

        let yaml = "jobs: 0\nscenarios:\n  - name: A\n    dir: one\n";
        let err = Suite::from_yaml(yaml, Path::new(".")).unwrap_err();
        assert!(matches!(err, IacError::InvalidSuite(_)));
    }
}
