// Execute Use Case - run a previously generated script

use crate::application::constants::DEFAULT_SCRIPT_NAME;
use crate::domain::ScriptDialect;
use crate::error::{AppError, Result};
use crate::port::{ExecutionResult, ScriptExecutor, ScriptRun};
use serde::Deserialize;
use tracing::{info, warn};

/// Execute request (wire shape). `ps1_content` carries the script in any dialect.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecuteRequest {
    #[serde(default, alias = "script_content")]
    pub ps1_content: String,
    #[serde(default)]
    pub script_name: Option<String>,
    #[serde(default)]
    pub shell: Option<ScriptDialect>,
}

impl ExecuteRequest {
    /// Resolve name and dialect: explicit `shell` wins, else the name's extension decides
    pub fn into_run(self) -> ScriptRun {
        let script_name = self
            .script_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SCRIPT_NAME.to_string());
        let dialect = self
            .shell
            .unwrap_or_else(|| ScriptDialect::from_script_name(&script_name));

        ScriptRun {
            content: self.ps1_content,
            script_name,
            dialect,
        }
    }
}

/// Run the script; a non-zero exit status is an error carrying the captured output
pub async fn execute(executor: &dyn ScriptExecutor, req: ExecuteRequest) -> Result<ExecutionResult> {
    if req.ps1_content.trim().is_empty() {
        return Err(AppError::invalid(
            "ps1_content is required and cannot be empty",
        ));
    }

    let run = req.into_run();
    let result = executor.run(&run).await?;

    if result.exit_code != 0 {
        warn!(
            script_name = %run.script_name,
            exit_code = result.exit_code,
            duration_ms = result.duration_ms,
            "Script exited non-zero"
        );
        return Err(AppError::ScriptFailed {
            exit_code: result.exit_code,
            stdout: result.stdout,
            stderr: result.stderr,
        });
    }

    info!(
        script_name = %run.script_name,
        dialect = %run.dialect,
        duration_ms = result.duration_ms,
        "Script executed successfully"
    );

    Ok(result)
}
