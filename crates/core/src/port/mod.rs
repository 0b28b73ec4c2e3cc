// Port Layer - Interfaces for external dependencies

pub mod aws_cli;
pub mod id_provider; // For deterministic testing
pub mod script_executor;
pub mod time_provider;

// Re-exports
pub use aws_cli::{AwsCli, AwsCliError};
pub use id_provider::IdProvider;
pub use script_executor::{
    ExecutionError, ExecutionResult, ExecutionStatus, ScriptExecutor, ScriptRun,
};
pub use time_provider::TimeProvider;
