//! HTTP Server
//!
//! Binds the router to a TCP listener and runs it until asked to stop.

use crate::error::{panic_response, ApiError};
use crate::handler::{ApiHandler, ServiceDefaults};
use crate::types::{
    ApiJson, ApiQuery, ConfigureResponse, ExecuteResponse, GenerateResponse, HealthResponse,
    RegionsResponse, RootResponse, RouteTablesQuery, RouteTablesResponse, ValidateResponse,
};
use axum::extract::State;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use vpce_core::application::{ConfigureRequest, EndpointRequest, ExecuteRequest};
use vpce_core::port::{AwsCli, ScriptExecutor};

const DEFAULT_HTTP_HOST: &str = "127.0.0.1";
const DEFAULT_HTTP_PORT: u16 = 8000;

/// Origins of the bundled web UI dev servers
pub const DEFAULT_CORS_ORIGINS: &[&str] = &[
    "http://localhost:5173",
    "http://localhost:3000",
    "http://127.0.0.1:5173",
];

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to bind HTTP server on {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    #[error("Invalid CORS origin: {0}")]
    InvalidOrigin(String),
}

/// HTTP Server Configuration
#[derive(Debug, Clone)]
pub struct HttpServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HTTP_HOST.to_string(),
            port: DEFAULT_HTTP_PORT,
            cors_origins: DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect(),
        }
    }
}

/// Running server; dropping it does not stop the server
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    join: JoinHandle<std::io::Result<()>>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Ask the server to finish in-flight requests and exit
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }

    /// Wait until the server task exits
    pub async fn stopped(self) {
        match self.join.await {
            Ok(Ok(())) => info!("HTTP server stopped"),
            Ok(Err(e)) => warn!(error = %e, "HTTP server exited with error"),
            Err(e) => warn!(error = %e, "HTTP server task failed"),
        }
    }
}

/// HTTP Server
pub struct HttpServer {
    config: HttpServerConfig,
    handler: Arc<ApiHandler>,
}

impl HttpServer {
    pub fn new(
        config: HttpServerConfig,
        aws_cli: Arc<dyn AwsCli>,
        executor: Arc<dyn ScriptExecutor>,
        defaults: ServiceDefaults,
    ) -> Self {
        Self {
            config,
            handler: Arc::new(ApiHandler::new(aws_cli, executor, defaults)),
        }
    }

    /// Routes, panic catching, CORS and request tracing
    pub fn router(&self) -> Result<Router, ServerError> {
        let origins = self
            .config
            .cors_origins
            .iter()
            .map(|o| {
                HeaderValue::from_str(o).map_err(|_| ServerError::InvalidOrigin(o.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        // Credentials are allowed, so methods and headers must be listed explicitly
        let cors = CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_credentials(true)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION]);

        Ok(Router::new()
            .route("/", get(root))
            .route("/health", get(health))
            .route("/api/regions", get(regions))
            .route("/api/configure", post(configure))
            .route("/api/validate", post(validate))
            .route("/api/generate", post(generate))
            .route("/api/execute", post(execute))
            .route("/api/route-tables", get(route_tables))
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .with_state(self.handler.clone()))
    }

    /// Bind and serve in a background task
    pub async fn start(self) -> Result<ServerHandle, ServerError> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let router = self.router()?;

        let listener = TcpListener::bind(&addr).await.map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;
        let local_addr = listener.local_addr().map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;

        info!(
            addr = %local_addr,
            cors_origins = ?self.config.cors_origins,
            "HTTP server listening"
        );

        let (tx, rx) = oneshot::channel::<()>();
        let join = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = rx.await;
                })
                .await
        });

        Ok(ServerHandle {
            local_addr,
            shutdown: Some(tx),
            join,
        })
    }
}

type Handler = State<Arc<ApiHandler>>;

async fn root(State(h): Handler) -> Json<RootResponse> {
    Json(h.root())
}

async fn health(State(h): Handler) -> Json<HealthResponse> {
    Json(h.health())
}

async fn regions(State(h): Handler) -> Json<RegionsResponse> {
    Json(h.regions())
}

async fn configure(
    State(h): Handler,
    ApiJson(req): ApiJson<ConfigureRequest>,
) -> Result<Json<ConfigureResponse>, ApiError> {
    h.configure(req).await.map(Json)
}

async fn validate(
    State(h): Handler,
    ApiJson(req): ApiJson<EndpointRequest>,
) -> Result<Json<ValidateResponse>, ApiError> {
    h.validate(req).map(Json)
}

async fn generate(
    State(h): Handler,
    ApiJson(req): ApiJson<EndpointRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    h.generate(req).map(Json)
}

async fn execute(
    State(h): Handler,
    ApiJson(req): ApiJson<ExecuteRequest>,
) -> Result<Json<ExecuteResponse>, ApiError> {
    h.execute(req).await.map(Json)
}

async fn route_tables(
    State(h): Handler,
    ApiQuery(query): ApiQuery<RouteTablesQuery>,
) -> Result<Json<RouteTablesResponse>, ApiError> {
    h.route_tables(query).await.map(Json)
}
