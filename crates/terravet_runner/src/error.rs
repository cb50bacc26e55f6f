//! Error types for the runner module.

use thiserror::Error;

/// Result type alias for runner operations.
pub type RunnerResult<T> = Result<T, RunnerError>;

/// Errors that can occur while running an external tool.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Binary not found: {0}")]
    BinaryNotFound(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Process timeout after {0} seconds")]
    Timeout(u64),

    #[error("Invalid retryable error pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
