// VPC Endpoint Infrastructure - Process Adapters
// Implements: ScriptExecutor, AwsCli

pub mod aws_cli_adapter;
pub mod subprocess_executor;

pub use aws_cli_adapter::AwsCliAdapter;
pub use subprocess_executor::{InterpreterPaths, SubprocessExecutor, DEFAULT_ENV_ALLOWLIST};
