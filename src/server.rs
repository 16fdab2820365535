//! Gateway startup for logcast.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::{response::Json, routing::get, Router};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use logcast_config::{Config, ConfigValidator};
use logcast_gateway::{
    GatewayConfig, HttpHost, LogGateway, MemoryFilterStore, RecordHub, SharedHttpServer,
    StaticCredentials,
};
use logcast_protocols::{Hub, LogLevel, Record};

/// Initialize tracing with console and file output.
///
/// Log files are written to `log_dir` with daily rotation. `RUST_LOG`
/// takes precedence over `level`.
pub(crate) fn init_tracing(log_dir: &Path, level: &str) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("logcast")
        .filename_suffix("log")
        .max_log_files(14)
        .build(log_dir)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Keeps the file writer flushing for the life of the process.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_ansi(true))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

/// Run the gateway in foreground until Ctrl-C.
pub(crate) async fn run_gateway(
    config: Config,
    read_stdin: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting logcast v{}", env!("CARGO_PKG_VERSION"));

    let report = ConfigValidator::validate(&config);
    for warning in report.warnings() {
        warn!("Config {}: {}", warning.field, warning.message);
    }
    if let Some(error) = report.errors().next() {
        return Err(format!("invalid config {}: {}", error.field, error.message).into());
    }

    let hub = Arc::new(RecordHub::new(config.hub.backlog));
    let filters = Arc::new(MemoryFilterStore::new(config.logging.server_filter.clone()));

    let mut gateway_config = GatewayConfig::from_settings(&config.gateway)?;
    if config.auth.enabled {
        let credentials = StaticCredentials::new(config.auth.users.clone());
        info!("Viewer login required ({} users)", credentials.len());
        gateway_config = gateway_config.with_authenticator(Arc::new(credentials));
    }

    let app = match config.gateway.app_port {
        Some(port) => {
            let addr = SocketAddr::new(gateway_config.bind, port);
            let app = SharedHttpServer::bind(addr, app_router()).await?;
            gateway_config = gateway_config.with_http_host(app.clone());
            Some(app)
        }
        None => None,
    };

    let gateway = Arc::new(LogGateway::new(gateway_config, hub.clone(), filters));
    gateway.init().await;
    let forwarder = gateway.attach_to_hub(&hub);
    let reader = read_stdin.then(|| spawn_stdin_reader(hub.clone()));

    info!("logcast ready:");
    if let Some(addr) = gateway.standalone_addr() {
        info!("  Viewers:       ws://{}/ws/logcast", addr);
        info!("  Health:        http://{}/health", addr);
    }
    if let Some(app) = &app {
        if let Some(addr) = app.local_addr() {
            info!("  Host app:      http://{}/ (viewers at /ws/logcast)", addr);
        }
    }

    tokio::signal::ctrl_c().await?;
    info!("Shutting down...");

    if let Some(reader) = reader {
        reader.abort();
    }
    forwarder.abort();
    gateway.tear_down();
    if let Some(app) = app {
        app.shutdown();
    }
    Ok(())
}

/// The host application the gateway attaches to with `--app-port`.
fn app_router() -> Router {
    Router::new()
        .route("/", get(|| async { "logcast host application" }))
        .route(
            "/health",
            get(|| async { Json(serde_json::json!({ "status": "ok" })) }),
        )
}

fn spawn_stdin_reader(hub: Arc<RecordHub>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => hub.emit(Record::log("stdin", LogLevel::Info, line)),
                Ok(None) => break,
                Err(e) => {
                    warn!("Failed to read stdin: {}", e);
                    break;
                }
            }
        }
        info!("stdin closed");
    })
}
