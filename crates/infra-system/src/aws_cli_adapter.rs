// AWS CLI adapter
// Shells out to the `aws` binary for the calls the service makes itself
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use vpce_core::application::constants::DEFAULT_AWS_CLI_TIMEOUT;
use vpce_core::port::aws_cli::{AwsCli, AwsCliError};

/// Runs `aws` subcommands with a per-call timeout
pub struct AwsCliAdapter {
    program: String,
    timeout: Duration,
}

struct CliOutput {
    success: bool,
    stdout: String,
    stderr: String,
}

impl AwsCliAdapter {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            timeout: DEFAULT_AWS_CLI_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn run(&self, args: &[&str]) -> Result<CliOutput, AwsCliError> {
        let child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AwsCliError::Spawn(format!("{}: {}", self.program, e)))?;

        let output = match timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|e| AwsCliError::Spawn(e.to_string()))?,
            Err(_) => {
                warn!(program = %self.program, "AWS CLI call timed out");
                return Err(AwsCliError::Timeout(self.timeout.as_millis() as i64));
            }
        };

        Ok(CliOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
        })
    }
}

impl Default for AwsCliAdapter {
    fn default() -> Self {
        Self::new("aws")
    }
}

#[async_trait]
impl AwsCli for AwsCliAdapter {
    async fn configure_set(
        &self,
        key: &str,
        value: &str,
        profile: &str,
    ) -> Result<(), AwsCliError> {
        // Never log `value`: it may be a secret
        debug!(key, profile, "aws configure set");

        let out = self
            .run(&["configure", "set", key, value, "--profile", profile])
            .await
            .map_err(|e| match e {
                AwsCliError::Spawn(msg) => AwsCliError::Configure(msg),
                other => other,
            })?;

        if !out.success {
            return Err(AwsCliError::Configure(out.stderr));
        }
        Ok(())
    }

    async fn describe_route_tables(
        &self,
        vpc_id: &str,
        region: &str,
        profile: &str,
    ) -> Result<Vec<String>, AwsCliError> {
        let filter = format!("Name=vpc-id,Values={}", vpc_id);
        let out = self
            .run(&[
                "ec2",
                "describe-route-tables",
                "--filters",
                &filter,
                "--query",
                "RouteTables[].RouteTableId",
                "--region",
                region,
                "--profile",
                profile,
                "--output",
                "json",
            ])
            .await?;

        if !out.success {
            return Err(AwsCliError::DescribeRouteTables(out.stderr));
        }

        let ids: Vec<String> = serde_json::from_str(out.stdout.trim())
            .map_err(|e| AwsCliError::Parse(e.to_string()))?;

        info!(vpc_id, region, count = ids.len(), "Described route tables");
        Ok(ids)
    }
}
