//! CLI-specific error types and exit code mapping

use tfcheck_core::error::{ConfigError, ScenarioError, TfcheckError};

/// CLI-specific error type.
///
/// The `exit_code()` method maps errors to process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// At least one scenario failed. The report has already been rendered.
    #[error("{failed} of {total} scenarios failed")]
    ScenarioFailed { failed: usize, total: usize },

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                                  |
    /// |------|------------------------------------------|
    /// | 0    | Success, every scenario passed           |
    /// | 1    | A scenario failed, or a command error    |
    /// | 2    | Configuration error                      |
    /// | 10   | IO error                                 |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::Io(_) => 10,
            Self::Command(_) | Self::ScenarioFailed { .. } | Self::JsonSerialize(_) => 1,
        }
    }
}

impl From<TfcheckError> for CliError {
    fn from(e: TfcheckError) -> Self {
        match e {
            TfcheckError::Config(e) => Self::from(e),
            TfcheckError::Scenario(e) => Self::from(e),
            TfcheckError::Io(e) => Self::Io(e),
            TfcheckError::Terraform(msg) => Self::Command(msg),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}

impl From<ScenarioError> for CliError {
    fn from(e: ScenarioError) -> Self {
        match e {
            // selecting a scenario the configuration does not declare
            ScenarioError::Unknown(_) => Self::Config(e.to_string()),
            other => Self::Command(other.to_string()),
        }
    }
}
