//! Scenario validation runner.
//!
//! Each scenario runs `init` then `validate` against its target directory,
//! and the observed outcome is compared with the scenario's expectation.
//! Scenarios are polled concurrently up to a job limit; scenarios that
//! target the same directory run one after another.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures_util::stream::{self, StreamExt};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{IacError, IacResult};
use crate::scenario::{
    ensure_unique_names, FailureKind, Outcome, Scenario, ScenarioFailure, ScenarioReport,
    SuiteReport,
};
use crate::terraform::TerraformRunner;
use crate::tree::ConfigTree;

/// Exit code recorded when a step could not produce one.
const NO_EXIT_CODE: i64 = -1;

/// What running both steps produced, before comparing with the expectation.
struct Observation {
    outcome: Outcome,
    step_failure: Option<ScenarioFailure>,
}

impl Observation {
    fn pass() -> Self {
        Self {
            outcome: Outcome::Pass,
            step_failure: None,
        }
    }

    fn fail(kind: FailureKind, exit_code: i64, output: String) -> Self {
        let step_failure = match kind {
            FailureKind::Initialization => ScenarioFailure::Initialization { exit_code, output },
            FailureKind::Validation => ScenarioFailure::Validation { exit_code, output },
        };
        Self {
            outcome: Outcome::Fail(kind),
            step_failure: Some(step_failure),
        }
    }
}

fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Runs scenarios against a Terraform runner.
pub struct ScenarioRunner {
    terraform: Arc<TerraformRunner>,
    jobs: usize,
}

impl ScenarioRunner {
    pub fn new(terraform: TerraformRunner) -> Self {
        Self {
            terraform: Arc::new(terraform),
            jobs: default_jobs(),
        }
    }

    /// Maximum number of scenarios in flight at once.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    pub fn terraform(&self) -> &TerraformRunner {
        &self.terraform
    }

    /// Run a single scenario. Never fails: every problem becomes part of
    /// the report.
    pub async fn run_scenario(&self, scenario: &Scenario) -> ScenarioReport {
        let started = Instant::now();
        info!("Running scenario {} against {:?}", scenario.name, scenario.target_dir());

        let observation = self.observe(scenario.target_dir()).await;
        let failure = if scenario.expected.is_met_by(&observation.outcome) {
            None
        } else {
            Some(
                observation
                    .step_failure
                    .unwrap_or(ScenarioFailure::Assertion {
                        expected: scenario.expected,
                        actual: observation.outcome,
                    }),
            )
        };

        match &failure {
            None => info!("Scenario {} passed ({})", scenario.name, observation.outcome),
            Some(f) => error!("Scenario {} failed: {}", scenario.name, f),
        }

        ScenarioReport {
            name: scenario.name.clone(),
            target_dir: scenario.target_dir.clone(),
            expected: scenario.expected,
            outcome: observation.outcome,
            failure,
            duration_ms: started.elapsed().as_millis() as u64,
        }
    }

    /// Run all scenarios concurrently. Reports keep definition order.
    pub async fn run_all(&self, scenarios: &[Scenario]) -> IacResult<SuiteReport> {
        ensure_unique_names(scenarios)?;

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(
            "Run {}: {} scenario(s), {} at a time",
            run_id,
            scenarios.len(),
            self.jobs
        );

        let lanes: Vec<Vec<(usize, ScenarioReport)>> = stream::iter(lanes_by_dir(scenarios))
            .map(|lane| async move {
                let mut reports = Vec::with_capacity(lane.len());
                for (index, scenario) in lane {
                    reports.push((index, self.run_scenario(scenario).await));
                }
                reports
            })
            .buffer_unordered(self.jobs)
            .collect()
            .await;

        let mut indexed: Vec<(usize, ScenarioReport)> = lanes.into_iter().flatten().collect();
        indexed.sort_by_key(|(index, _)| *index);

        Ok(SuiteReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            scenarios: indexed.into_iter().map(|(_, report)| report).collect(),
        })
    }

    async fn observe(&self, dir: &Path) -> Observation {
        if !dir.is_dir() {
            return Observation::fail(
                FailureKind::Initialization,
                NO_EXIT_CODE,
                format!("Target directory not found: {}", dir.display()),
            );
        }

        match ConfigTree::scan(dir) {
            Ok(tree) if tree.is_empty() => {
                warn!("No configuration files in {:?}", dir)
            }
            Ok(tree) => debug!("{} configuration file(s) in {:?}", tree.len(), dir),
            Err(e) => warn!("Could not scan {:?}: {}", dir, e),
        }

        let init = match self.terraform.init(dir).await {
            Ok(result) => result,
            Err(e) => return step_error(FailureKind::Initialization, e),
        };
        if !init.success {
            return Observation::fail(FailureKind::Initialization, init.exit_code, init.output);
        }

        let validate = match self.terraform.validate(dir).await {
            Ok(result) => result,
            Err(e) => return step_error(FailureKind::Validation, e),
        };
        if !validate.success {
            return Observation::fail(FailureKind::Validation, validate.exit_code, validate.output);
        }

        Observation::pass()
    }
}

/// Group scenarios by target directory, keeping definition order within
/// each group. The tool writes its working data into the directory, so
/// scenarios sharing one must not overlap, however the path is spelled.
fn lanes_by_dir(scenarios: &[Scenario]) -> Vec<Vec<(usize, &Scenario)>> {
    let mut lanes: Vec<Vec<(usize, &Scenario)>> = Vec::new();
    let mut lane_of: HashMap<PathBuf, usize> = HashMap::new();

    for (index, scenario) in scenarios.iter().enumerate() {
        let lane = *lane_of.entry(lane_key(scenario.target_dir())).or_insert_with(|| {
            lanes.push(Vec::new());
            lanes.len() - 1
        });
        lanes[lane].push((index, scenario));
    }
    lanes
}

/// Canonical form of a target directory. Paths that cannot be resolved
/// (a missing directory) are used as written.
fn lane_key(dir: &Path) -> PathBuf {
    std::fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf())
}

/// The tool could not be run at all for this step.
fn step_error(kind: FailureKind, e: IacError) -> Observation {
    error!("{} step could not run: {}", kind, e);
    Observation::fail(kind, NO_EXIT_CODE, e.to_string())
}
