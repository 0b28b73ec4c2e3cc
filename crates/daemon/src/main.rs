//! VPC Endpoint Generator - HTTP server entry point

mod settings;

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use settings::{LogFormat, Settings};
use vpce_api_http::{HttpServer, HttpServerConfig, ServiceDefaults};
use vpce_core::domain::ScriptDialect;
use vpce_core::port::id_provider::UuidProvider;
use vpce_core::port::time_provider::SystemTimeProvider;
use vpce_infra_system::{AwsCliAdapter, SubprocessExecutor};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const DEFAULT_LOG_FILTER: &str = "vpce=info,tower_http=info";
const LOG_FILE_PREFIX: &str = "vpce-server.log";

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load configuration (before logging so a bad file fails loudly)
    let settings = Settings::load()?;

    // 2. Initialize logging
    let _log_guard = init_logging(&settings)?;

    info!("VPC Endpoint Generator v{} starting...", VERSION);

    // 3. Setup dependencies (DI wiring)
    let time_provider = Arc::new(SystemTimeProvider);
    let id_provider = Arc::new(UuidProvider);

    let aws_cli =
        Arc::new(AwsCliAdapter::new(&settings.aws_cli_path).with_timeout(settings.aws_cli_timeout()));

    let scratch_dir = settings.scratch_dir();
    let executor = Arc::new(
        SubprocessExecutor::new(time_provider, id_provider, settings.env_allowlist.clone())
            .with_scratch_dir(&scratch_dir)
            .with_interpreters(settings.interpreters())
            .with_timeout(settings.script_timeout()),
    );

    info!(
        scratch_dir = %scratch_dir.display(),
        aws_profile = %settings.aws_profile,
        aws_region = %settings.aws_region,
        script_timeout_secs = settings.script_timeout_secs,
        "Script execution configured"
    );

    // 4. Start HTTP server
    let http_config = HttpServerConfig {
        host: settings.host.clone(),
        port: settings.port,
        cors_origins: settings.cors_origins.clone(),
    };
    let defaults = ServiceDefaults {
        aws_profile: settings.aws_profile.clone(),
        aws_region: settings.aws_region.clone(),
        dialect: ScriptDialect::default(),
    };
    let mut handle = HttpServer::new(http_config, aws_cli, executor, defaults)
        .start()
        .await
        .context("HTTP server start failed")?;

    info!(addr = %handle.local_addr(), "System ready. Press Ctrl+C to shutdown");

    // 5. Wait for shutdown signal
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    info!("Shutdown signal received. Exiting gracefully...");

    // 6. Graceful shutdown (in-flight requests finish)
    handle.stop();
    handle.stopped().await;

    info!("Shutdown complete.");

    Ok(())
}

/// Console logging in the configured format, plus a daily file when `log_dir` is set
fn init_logging(settings: &Settings) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_FILTER))
        .context("Failed to create env filter")?;

    let (file_layer, guard) = match settings.log_dir() {
        Some(dir) => {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(&dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().json().with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    let registry = tracing_subscriber::registry().with(env_filter).with(file_layer);

    match settings.log_format {
        LogFormat::Json => {
            // Production: JSON structured logging
            registry.with(fmt::layer().json()).init();
        }
        LogFormat::Pretty => {
            // Development: Pretty formatting with colors
            registry.with(fmt::layer().pretty()).init();
        }
    }

    Ok(guard)
}
