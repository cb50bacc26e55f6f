//! Local process runner.
//!
//! Spawns the external tool directly on the host with tokio, capturing
//! stdout and stderr concurrently so neither pipe can fill up and stall
//! the child.

use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, error, info};

use crate::config::{RunConfig, ToolCommand};
use crate::error::{RunnerError, RunnerResult};
use crate::runner::{ExecutionResult, ProcessRunner};

/// Output stream of a child process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStream {
    Stdout,
    Stderr,
}

impl std::fmt::Display for LogStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdout => write!(f, "stdout"),
            Self::Stderr => write!(f, "stderr"),
        }
    }
}

/// Local runner options.
#[derive(Debug, Clone, Default)]
pub struct LocalRunnerOptions {
    /// Dry-run mode (log commands without executing)
    pub dry_run: bool,
}

impl LocalRunnerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }
}

/// Runner that spawns processes on the local host.
#[derive(Debug, Clone, Default)]
pub struct LocalRunner {
    options: LocalRunnerOptions,
}

impl LocalRunner {
    pub fn new(options: LocalRunnerOptions) -> Self {
        Self { options }
    }

    /// Check if dry-run mode is enabled.
    pub fn is_dry_run(&self) -> bool {
        self.options.dry_run
    }

    fn build_command(command: &ToolCommand) -> Command {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = &command.working_dir {
            cmd.current_dir(dir);
        }
        if command.clear_env {
            cmd.env_clear();
        }
        cmd.envs(&command.env);
        cmd
    }

    fn spawn_error(program: &str, e: std::io::Error) -> RunnerError {
        if e.kind() == ErrorKind::NotFound {
            RunnerError::BinaryNotFound(format!("{}: {}", program, e))
        } else {
            RunnerError::ExecutionFailed(format!("Failed to spawn {}: {}", program, e))
        }
    }
}

async fn read_stream<R>(reader: R, stream: LogStream, stream_logs: bool) -> std::io::Result<String>
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    let mut output = String::new();
    while let Some(line) = lines.next_line().await? {
        if stream_logs {
            debug!(%stream, "{}", line);
        }
        output.push_str(&line);
        output.push('\n');
    }
    Ok(output)
}

#[async_trait]
impl ProcessRunner for LocalRunner {
    async fn is_available(&self, program: &str) -> RunnerResult<bool> {
        let status = Command::new(program)
            .arg("version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        Ok(status.map(|s| s.success()).unwrap_or(false))
    }

    async fn version(&self, program: &str) -> RunnerResult<String> {
        let output = Command::new(program)
            .arg("version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| Self::spawn_error(program, e))?;

        if output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            Ok(stdout.lines().next().unwrap_or_default().trim().to_string())
        } else {
            Err(RunnerError::ExecutionFailed(
                String::from_utf8_lossy(&output.stderr).to_string(),
            ))
        }
    }

    async fn run(
        &self,
        command: &ToolCommand,
        run_config: &RunConfig,
    ) -> RunnerResult<ExecutionResult> {
        let cmd_str = command.display();

        if self.options.dry_run {
            info!("[DRY-RUN] Would execute: {}", cmd_str);
            let now = Utc::now();
            return Ok(ExecutionResult {
                execution_id: "dry-run".to_string(),
                exit_code: 0,
                stdout: format!("[DRY-RUN] Command: {}", cmd_str),
                stderr: String::new(),
                started_at: now,
                finished_at: now,
                duration_ms: 0,
            });
        }

        debug!("Executing: {} (in {:?})", cmd_str, command.working_dir);

        let started_at = Utc::now();
        let mut child = Self::build_command(command)
            .spawn()
            .map_err(|e| Self::spawn_error(&command.program, e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| RunnerError::ExecutionFailed("stdout was not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| RunnerError::ExecutionFailed("stderr was not captured".to_string()))?;

        let stream_logs = run_config.stream_logs;
        let collect = async {
            let (stdout, stderr, status) = tokio::join!(
                read_stream(stdout, LogStream::Stdout, stream_logs),
                read_stream(stderr, LogStream::Stderr, stream_logs),
                child.wait(),
            );
            Ok::<_, std::io::Error>((stdout?, stderr?, status?))
        };

        let collected = if run_config.timeout_seconds > 0 {
            let limit = Duration::from_secs(run_config.timeout_seconds);
            let timed = tokio::time::timeout(limit, collect).await;
            match timed {
                Ok(collected) => collected,
                Err(_) => {
                    error!(
                        "{} timed out after {}s, killing process",
                        cmd_str, run_config.timeout_seconds
                    );
                    let _ = child.kill().await;
                    return Err(RunnerError::Timeout(run_config.timeout_seconds));
                }
            }
        } else {
            collect.await
        };

        let (stdout, stderr, status) = collected.map_err(|e| {
            RunnerError::ExecutionFailed(format!("Failed to wait for {}: {}", command.program, e))
        })?;

        let finished_at = Utc::now();
        let duration_ms = (finished_at - started_at).num_milliseconds().max(0) as u64;
        let exit_code = status.code().map(i64::from).unwrap_or(-1);

        debug!("{} exited with code {} after {}ms", cmd_str, exit_code, duration_ms);

        Ok(ExecutionResult {
            execution_id: uuid::Uuid::new_v4().to_string(),
            exit_code,
            stdout,
            stderr,
            started_at,
            finished_at,
            duration_ms,
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> ToolCommand {
        ToolCommand::new("sh").args(["-c", script])
    }

    #[tokio::test]
    async fn test_captures_exit_code_and_output() {
        let runner = LocalRunner::default();
        let result = runner
            .run(&sh("echo hello; echo oops >&2; exit 3"), &RunConfig::default())
            .await
            .unwrap();

        assert_eq!(result.exit_code, 3);
        assert!(!result.success());
        assert_eq!(result.stdout, "hello\n");
        assert_eq!(result.stderr, "oops\n");
        assert_eq!(result.combined_output(), "hello\n\noops\n");
    }

    #[tokio::test]
    async fn test_runs_in_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("main.tf"), "").unwrap();

        let runner = LocalRunner::default();
        let result = runner
            .run(&sh("ls").working_dir(dir.path()), &RunConfig::default())
            .await
            .unwrap();

        assert!(result.success());
        assert!(result.stdout.contains("main.tf"));
    }

    #[tokio::test]
    async fn test_applies_env() {
        let runner = LocalRunner::default();
        let cmd = sh("printf '%s' \"$TERRAVET_PROBE\"").env("TERRAVET_PROBE", "set");
        let result = runner.run(&cmd, &RunConfig::default()).await.unwrap();

        assert_eq!(result.stdout, "set\n");
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let runner = LocalRunner::default();
        let err = runner
            .run(&ToolCommand::new("terravet-no-such-binary"), &RunConfig::default())
            .await
            .unwrap_err();

        assert!(matches!(err, RunnerError::BinaryNotFound(_)));
        assert!(!runner.is_available("terravet-no-such-binary").await.unwrap());
    }

    #[tokio::test]
    async fn test_timeout_kills_process() {
        let runner = LocalRunner::default();
        let err = runner
            .run(&sh("sleep 10"), &RunConfig::default().timeout(1))
            .await
            .unwrap_err();

        assert!(matches!(err, RunnerError::Timeout(1)));
    }

    #[tokio::test]
    async fn test_dry_run_does_not_execute() {
        let runner = LocalRunner::new(LocalRunnerOptions::new().dry_run());
        assert!(runner.is_dry_run());

        let result = runner
            .run(&sh("exit 1"), &RunConfig::default())
            .await
            .unwrap();

        assert!(result.success());
        assert!(result.stdout.starts_with("[DRY-RUN]"));
    }
}
