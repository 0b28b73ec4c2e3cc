// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    /// Every problem found in a request, in discovery order
    #[error("Validation error: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("{0}")]
    AwsCli(#[from] crate::port::AwsCliError),

    #[error("Execution error: {0}")]
    Execution(#[from] crate::port::ExecutionError),

    /// The script ran and exited non-zero
    #[error("Script exited with code {exit_code}")]
    ScriptFailed {
        exit_code: i32,
        stdout: String,
        stderr: String,
    },

}

impl AppError {
    /// Single-message validation failure
    pub fn invalid(msg: impl Into<String>) -> Self {
        AppError::Validation(vec![msg.into()])
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
