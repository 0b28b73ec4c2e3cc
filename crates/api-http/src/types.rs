//! HTTP Request/Response Types
//!
//! Request bodies reuse the core wire shapes (`EndpointRequest`,
//! `ConfigureRequest`, `ExecuteRequest`); this module holds the responses.

use axum::extract::FromRequest;
use axum::extract::FromRequestParts;
use serde::{Deserialize, Serialize};
use vpce_core::application::ConfigureOutcome;
use vpce_core::domain::ScriptDialect;

use crate::error::ApiError;

/// JSON body extractor whose rejections use the API error envelope
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Query string extractor whose rejections use the API error envelope
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// GET /
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootResponse {
    pub message: String,
    pub version: String,
}

/// GET /health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// GET /api/regions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionsResponse {
    pub regions: Vec<String>,
}

/// POST /api/validate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub success: bool,
    pub message: String,
}

/// POST /api/generate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub success: bool,
    /// Script body in any dialect (name kept for existing clients)
    pub ps1_content: String,
    pub file_path: Option<String>,
    pub command: String,
    pub shell: ScriptDialect,
    pub script_name: String,
}

/// POST /api/execute (exit code 0)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteResponse {
    pub success: bool,
    pub output: String,
    pub error: Option<String>,
    pub exit_code: i32,
    pub message: String,
}

/// POST /api/configure
#[derive(Debug, Clone, Serialize)]
pub struct ConfigureResponse {
    pub success: bool,
    pub message: String,
    pub details: ConfigureOutcome,
}

/// GET /api/route-tables query
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RouteTablesQuery {
    #[serde(default)]
    pub vpc_id: String,
    pub region: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteTablesResponse {
    pub vpc_id: String,
    pub region: String,
    pub route_tables: Vec<String>,
}
