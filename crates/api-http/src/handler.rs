//! HTTP Method Handlers
//!
//! Implements the behavior of each route on top of the core use cases.

use crate::error::ApiError;
use crate::types::{
    ConfigureResponse, ExecuteResponse, GenerateResponse, HealthResponse, RegionsResponse,
    RootResponse, RouteTablesQuery, RouteTablesResponse, ValidateResponse,
};
use axum::http::StatusCode;
use serde_json::json;
use std::sync::Arc;
use tracing::warn;
use vpce_core::application::constants::{DEFAULT_AWS_PROFILE, DEFAULT_AWS_REGION};
use vpce_core::application::{
    configure, execute, generate, route_tables, validation, ConfigureRequest, EndpointRequest,
    ExecuteRequest,
};
use vpce_core::domain::ids::KNOWN_REGIONS;
use vpce_core::domain::ScriptDialect;
use vpce_core::error::AppError;
use vpce_core::port::{AwsCli, ScriptExecutor};

/// Values applied when a request leaves them out
#[derive(Debug, Clone)]
pub struct ServiceDefaults {
    pub aws_profile: String,
    pub aws_region: String,
    pub dialect: ScriptDialect,
}

impl Default for ServiceDefaults {
    fn default() -> Self {
        Self {
            aws_profile: DEFAULT_AWS_PROFILE.to_string(),
            aws_region: DEFAULT_AWS_REGION.to_string(),
            dialect: ScriptDialect::default(),
        }
    }
}

/// Handler with injected dependencies
pub struct ApiHandler {
    aws_cli: Arc<dyn AwsCli>,
    executor: Arc<dyn ScriptExecutor>,
    defaults: ServiceDefaults,
}

impl ApiHandler {
    pub fn new(
        aws_cli: Arc<dyn AwsCli>,
        executor: Arc<dyn ScriptExecutor>,
        defaults: ServiceDefaults,
    ) -> Self {
        Self {
            aws_cli,
            executor,
            defaults,
        }
    }

    /// GET /
    pub fn root(&self) -> RootResponse {
        RootResponse {
            message: "AWS VPC Endpoint Generator API".to_string(),
            version: vpce_core::VERSION.to_string(),
        }
    }

    /// GET /health
    pub fn health(&self) -> HealthResponse {
        HealthResponse {
            status: "healthy".to_string(),
        }
    }

    /// GET /api/regions
    pub fn regions(&self) -> RegionsResponse {
        RegionsResponse {
            regions: KNOWN_REGIONS.iter().map(|r| r.to_string()).collect(),
        }
    }

    /// POST /api/configure
    pub async fn configure(&self, req: ConfigureRequest) -> Result<ConfigureResponse, ApiError> {
        let outcome = configure::execute(self.aws_cli.as_ref(), &self.defaults.aws_profile, req)
            .await
            .map_err(|e| match e {
                AppError::Validation(errors) => ApiError::bad_request(errors.join("; ")),
                AppError::AwsCli(e) => {
                    warn!(error = %e, "AWS CLI configuration failed");
                    ApiError::bad_request(format!("AWS configuration failed: {}", e))
                }
                other => ApiError::from(other),
            })?;

        Ok(ConfigureResponse {
            success: true,
            message: "AWS CLI configured successfully".to_string(),
            details: outcome,
        })
    }

    /// POST /api/validate
    pub fn validate(&self, req: EndpointRequest) -> Result<ValidateResponse, ApiError> {
        validation::validate(&req).map_err(|e| match e {
            AppError::Validation(errors) => {
                ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, json!({ "errors": errors }))
            }
            other => ApiError::from(other),
        })?;

        Ok(ValidateResponse {
            success: true,
            message: "All inputs are valid".to_string(),
        })
    }

    /// POST /api/generate
    pub fn generate(&self, req: EndpointRequest) -> Result<GenerateResponse, ApiError> {
        let script = generate::execute(&req, self.defaults.dialect)?;

        Ok(GenerateResponse {
            success: true,
            ps1_content: script.content,
            file_path: None,
            command: script.command,
            shell: script.dialect,
            script_name: script.script_name,
        })
    }

    /// POST /api/execute
    pub async fn execute(&self, req: ExecuteRequest) -> Result<ExecuteResponse, ApiError> {
        let result = execute::execute(self.executor.as_ref(), req).await?;

        Ok(ExecuteResponse {
            success: true,
            output: result.stdout,
            error: Some(result.stderr).filter(|s| !s.trim().is_empty()),
            exit_code: result.exit_code,
            message: "Script executed successfully".to_string(),
        })
    }

    /// GET /api/route-tables
    pub async fn route_tables(
        &self,
        query: RouteTablesQuery,
    ) -> Result<RouteTablesResponse, ApiError> {
        let region = query
            .region
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| self.defaults.aws_region.clone());

        let found = route_tables::execute(
            self.aws_cli.as_ref(),
            &self.defaults.aws_profile,
            &query.vpc_id,
            &region,
        )
        .await
        .map_err(|e| match e {
            AppError::AwsCli(e) => {
                warn!(vpc_id = %query.vpc_id, error = %e, "Route table lookup failed");
                ApiError::bad_request(route_tables::explain_aws_failure(&e))
            }
            other => ApiError::from(other),
        })?;

        Ok(RouteTablesResponse {
            vpc_id: found.vpc_id,
            region: found.region,
            route_tables: found.route_table_ids,
        })
    }
}
