//! Error types for the redborder CLI.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for CLI commands.
#[derive(Error, Debug)]
pub enum CliError {
    /// A requested entity does not exist.
    #[error("Not found: {kind}")]
    NotFound { kind: NotFoundKind },

    /// An external dependency could not be reached.
    #[error("{endpoint} unreachable: {message}")]
    Unreachable { endpoint: String, message: String },

    /// A guard rail refused the requested operation.
    #[error("Policy violation: {kind}")]
    PolicyViolation { kind: PolicyKind },

    /// An external command or a batch of them failed.
    #[error("Execution failed: {message}")]
    ExecutionFailed { message: String },

    /// An external command exceeded its timeout.
    #[error("Command timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// Configuration-related errors.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Not-found error kinds.
#[derive(Error, Debug)]
pub enum NotFoundKind {
    #[error("node '{name}' is not a cluster member")]
    Node { name: String },

    #[error("service '{service}' not found on {node}")]
    Service { service: String, node: String },

    #[error("services list not found at {path}")]
    ServicesFile { path: PathBuf },

    #[error("check '{name}' does not exist")]
    Check { name: String },
}

/// Policy-violation kinds.
#[derive(Error, Debug)]
pub enum PolicyKind {
    #[error("service '{service}' is enabled on only {enabled_nodes} node(s) and cannot be disabled")]
    RedundancyFloor {
        service: String,
        enabled_nodes: usize,
    },

    #[error("PostgreSQL cannot be stopped or disabled on the primary node")]
    PostgresPrimary,
}

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Shorthand for an execution failure with a formatted message.
    pub fn execution(message: impl Into<String>) -> Self {
        CliError::ExecutionFailed {
            message: message.into(),
        }
    }

    /// Shorthand for an unreachable-dependency error.
    pub fn unreachable(endpoint: impl Into<String>, message: impl ToString) -> Self {
        CliError::Unreachable {
            endpoint: endpoint.into(),
            message: message.to_string(),
        }
    }
}
