// Script Executor Port
// Abstraction for running a rendered script with a local interpreter

use crate::domain::ScriptDialect;
use async_trait::async_trait;
use thiserror::Error;

/// A script to run: content, requested file name, and interpreter dialect
#[derive(Debug, Clone)]
pub struct ScriptRun {
    pub content: String,
    pub script_name: String,
    pub dialect: ScriptDialect,
}

/// Result of a finished script run (any exit code)
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub status: ExecutionStatus,
    pub duration_ms: i64,
    /// Negative when the process was terminated by a signal (`-SIGNUM`)
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStatus {
    Success,
    Failed,
}

/// Execution errors (the script never produced an exit status)
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Spawn failed: {0}")]
    SpawnFailed(String),

    #[error("Script execution timed out after {0}ms")]
    Timeout(i64),

    #[error("Process killed: {0}")]
    Killed(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Script Executor trait
///
/// Implementations:
/// - SubprocessExecutor: writes the script to a scratch file and spawns the interpreter
/// - mocks::MockScriptExecutor: canned results for tests
#[async_trait]
pub trait ScriptExecutor: Send + Sync {
    /// Run a script to completion and capture its output
    ///
    /// # Errors
    /// - ExecutionError::SpawnFailed if the interpreter cannot be started
    /// - ExecutionError::Timeout if the run exceeds the configured timeout
    /// - ExecutionError::IoError if the scratch file cannot be written
    async fn run(&self, script: &ScriptRun) -> Result<ExecutionResult, ExecutionError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Mock executor behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Exit with the given code and output
        Exit {
            code: i32,
            stdout: String,
            stderr: String,
        },
        /// Interpreter could not be spawned
        SpawnFail(String),
        /// Timeout after N ms
        Timeout(i64),
    }

    /// Mock Script Executor for testing
    pub struct MockScriptExecutor {
        behavior: Arc<Mutex<MockBehavior>>,
        runs: Arc<Mutex<Vec<ScriptRun>>>,
    }

    impl MockScriptExecutor {
        pub fn new(behavior: MockBehavior) -> Self {
            Self {
                behavior: Arc::new(Mutex::new(behavior)),
                runs: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn new_success(stdout: impl Into<String>) -> Self {
            Self::new(MockBehavior::Exit {
                code: 0,
                stdout: stdout.into(),
                stderr: String::new(),
            })
        }

        pub fn new_exit(code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
            Self::new(MockBehavior::Exit {
                code,
                stdout: stdout.into(),
                stderr: stderr.into(),
            })
        }

        pub fn call_count(&self) -> usize {
            self.runs.lock().unwrap().len()
        }

        /// Scripts received so far, oldest first
        pub fn runs(&self) -> Vec<ScriptRun> {
            self.runs.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ScriptExecutor for MockScriptExecutor {
        async fn run(&self, script: &ScriptRun) -> Result<ExecutionResult, ExecutionError> {
            self.runs.lock().unwrap().push(script.clone());

            let behavior = self.behavior.lock().unwrap().clone();

            match behavior {
                MockBehavior::Exit {
                    code,
                    stdout,
                    stderr,
                } => Ok(ExecutionResult {
                    status: if code == 0 {
                        ExecutionStatus::Success
                    } else {
                        ExecutionStatus::Failed
                    },
                    duration_ms: 100,
                    exit_code: code,
                    stdout,
                    stderr,
                }),
                MockBehavior::SpawnFail(msg) => Err(ExecutionError::SpawnFailed(msg)),
                MockBehavior::Timeout(ms) => Err(ExecutionError::Timeout(ms)),
            }
        }
    }
}
