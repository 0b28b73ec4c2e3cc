//! HTTP Error Mapping
//!
//! Maps application errors to status codes and `{"detail": ...}` bodies.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use std::any::Any;
use tracing::error;
use vpce_core::error::AppError;

pub const VALIDATION_FAILED: &str = "Request validation failed";
pub const SCRIPT_FAILED: &str = "Script execution failed";
pub const SCRIPT_UNEXPECTED: &str = "Script execution failed with an unexpected error";

/// Status code plus the value placed under `detail`
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: Value,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: Value) -> Self {
        Self { status, detail }
    }

    /// 422 with every collected message
    pub fn validation_failed(errors: Vec<String>) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({
                "validation_errors": errors,
                "message": VALIDATION_FAILED,
            }),
        )
    }

    /// 400 with a plain string detail
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, Value::String(detail.into()))
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            Value::String(detail.into()),
        )
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Validation(errors) => ApiError::validation_failed(errors),
            AppError::Domain(e) => ApiError::validation_failed(vec![e.to_string()]),
            AppError::ScriptFailed {
                exit_code,
                stdout,
                stderr,
            } => ApiError::new(
                StatusCode::BAD_REQUEST,
                json!({
                    "success": false,
                    "exit_code": exit_code,
                    "error": non_empty_or(stderr, SCRIPT_FAILED),
                    "output": non_empty_or(stdout, "No output"),
                    "message": SCRIPT_FAILED,
                }),
            ),
            AppError::Execution(e) => ApiError::new(
                StatusCode::BAD_REQUEST,
                json!({
                    "success": false,
                    "error": e.to_string(),
                    "message": SCRIPT_UNEXPECTED,
                }),
            ),
            AppError::AwsCli(e) => ApiError::bad_request(e.to_string()),
        }
    }
}

/// 500 for a handler that panicked; the panic message stays in the log
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(panic = %message, "Handler panicked while serving request");
    ApiError::internal("Internal server error").into_response()
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation_failed(vec![rejection.body_text()])
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::validation_failed(vec![rejection.body_text()])
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

fn non_empty_or(s: String, fallback: &str) -> String {
    if s.trim().is_empty() {
        fallback.to_string()
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vpce_core::port::ExecutionError;

    async fn body(err: ApiError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_validation_maps_to_422() {
        let err = AppError::Validation(vec!["region is required".to_string()]);
        let (status, body) = body(err.into()).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            body,
            json!({"detail": {
                "validation_errors": ["region is required"],
                "message": "Request validation failed"
            }})
        );
    }

    #[tokio::test]
    async fn test_script_failed_maps_to_400_with_fallbacks() {
        let err = AppError::ScriptFailed {
            exit_code: 1,
            stdout: String::new(),
            stderr: " \n".to_string(),
        };
        let (status, body) = body(err.into()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"]["exit_code"], 1);
        assert_eq!(body["detail"]["success"], false);
        assert_eq!(body["detail"]["error"], "Script execution failed");
        assert_eq!(body["detail"]["output"], "No output");
    }

    #[tokio::test]
    async fn test_timeout_maps_to_unexpected_failure() {
        let err = AppError::Execution(ExecutionError::Timeout(60_000));
        let (status, body) = body(err.into()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["detail"]["error"],
            "Script execution timed out after 60000ms"
        );
        assert_eq!(body["detail"]["message"], SCRIPT_UNEXPECTED);
        assert!(body["detail"].get("exit_code").is_none());
    }

    #[tokio::test]
    async fn test_panic_maps_to_500() {
        let response = panic_response(Box::new("handler bug"));
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"detail": "Internal server error"}));
    }
}
