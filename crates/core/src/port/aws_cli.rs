// AWS CLI Port
// The only two AWS CLI interactions the service performs outside of scripts

use async_trait::async_trait;
use thiserror::Error;

/// AWS CLI errors; messages carry the tool's stderr verbatim
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AwsCliError {
    #[error("AWS CLI configuration failed: {0}")]
    Configure(String),

    #[error("Failed to describe route tables: {0}")]
    DescribeRouteTables(String),

    #[error("Failed to launch AWS CLI: {0}")]
    Spawn(String),

    #[error("AWS CLI timed out after {0}ms")]
    Timeout(i64),

    #[error("Unexpected AWS CLI output: {0}")]
    Parse(String),
}

/// AWS CLI trait
#[async_trait]
pub trait AwsCli: Send + Sync {
    /// `aws configure set <key> <value> --profile <profile>`
    async fn configure_set(&self, key: &str, value: &str, profile: &str)
        -> Result<(), AwsCliError>;

    /// IDs of every route table in `vpc_id`
    async fn describe_route_tables(
        &self,
        vpc_id: &str,
        region: &str,
        profile: &str,
    ) -> Result<Vec<String>, AwsCliError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Records every `configure set` call; optionally fails on one key
    pub struct MockAwsCli {
        configured: Arc<Mutex<Vec<(String, String, String)>>>,
        fail_on_key: Option<(String, String)>,
        route_tables: Result<Vec<String>, String>,
    }

    impl MockAwsCli {
        pub fn new() -> Self {
            Self {
                configured: Arc::new(Mutex::new(Vec::new())),
                fail_on_key: None,
                route_tables: Ok(Vec::new()),
            }
        }

        /// Fail `configure set <key>` with the given stderr
        pub fn failing_on(key: impl Into<String>, stderr: impl Into<String>) -> Self {
            Self {
                fail_on_key: Some((key.into(), stderr.into())),
                ..Self::new()
            }
        }

        pub fn with_route_tables(route_tables: Vec<String>) -> Self {
            Self {
                route_tables: Ok(route_tables),
                ..Self::new()
            }
        }

        pub fn with_describe_error(stderr: impl Into<String>) -> Self {
            Self {
                route_tables: Err(stderr.into()),
                ..Self::new()
            }
        }

        /// `(key, value, profile)` triples in call order
        pub fn configured(&self) -> Vec<(String, String, String)> {
            self.configured.lock().unwrap().clone()
        }
    }

    impl Default for MockAwsCli {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl AwsCli for MockAwsCli {
        async fn configure_set(
            &self,
            key: &str,
            value: &str,
            profile: &str,
        ) -> Result<(), AwsCliError> {
            if let Some((fail_key, stderr)) = &self.fail_on_key {
                if fail_key == key {
                    return Err(AwsCliError::Configure(stderr.clone()));
                }
            }
            self.configured.lock().unwrap().push((
                key.to_string(),
                value.to_string(),
                profile.to_string(),
            ));
            Ok(())
        }

        async fn describe_route_tables(
            &self,
            _vpc_id: &str,
            _region: &str,
            _profile: &str,
        ) -> Result<Vec<String>, AwsCliError> {
            self.route_tables
                .clone()
                .map_err(AwsCliError::DescribeRouteTables)
        }
    }
}
