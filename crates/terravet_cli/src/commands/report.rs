//! Suite report rendering.

use anyhow::{Context, Result};

use terravet_iac::SuiteReport;

use super::{FailedScenarios, OutputFormat};

/// Lines of tool output shown per failed scenario in text mode.
const OUTPUT_TAIL_LINES: usize = 20;

/// Print the report and turn failures into a [`FailedScenarios`] error.
pub fn finish(report: &SuiteReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
            println!("{}", json);
        }
        OutputFormat::Text => print!("{}", render_text(report)),
    }

    if report.passed() {
        Ok(())
    } else {
        Err(FailedScenarios {
            failed: report.failed_count(),
            total: report.scenarios.len(),
        }
        .into())
    }
}

/// Human-readable report.
pub fn render_text(report: &SuiteReport) -> String {
    let mut out = String::new();

    for scenario in &report.scenarios {
        match &scenario.failure {
            None => out.push_str(&format!(
                "✅ {} ({}, {}ms)\n",
                scenario.name, scenario.outcome, scenario.duration_ms
            )),
            Some(failure) => {
                out.push_str(&format!("❌ {}: {}\n", scenario.name, failure));
                out.push_str(&format!("   dir: {}\n", scenario.target_dir.display()));
                if let Some(output) = failure.output() {
                    for line in tail(output, OUTPUT_TAIL_LINES) {
                        out.push_str(&format!("   | {}\n", line));
                    }
                }
            }
        }
    }

    out.push('\n');
    out.push_str(&format!(
        "Results: {} passed, {} failed (run {})\n",
        report.passed_count(),
        report.failed_count(),
        report.run_id
    ));
    out
}

fn tail(output: &str, n: usize) -> impl Iterator<Item = &str> {
    let lines: Vec<&str> = output.lines().filter(|l| !l.trim().is_empty()).collect();
    let skip = lines.len().saturating_sub(n);
    lines.into_iter().skip(skip)
}
