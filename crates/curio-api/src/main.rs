//! curio-api - HTTP API server for curio

use std::net::SocketAddr;
use std::path::Path;

use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use curio_api::{build_router, AppState, ServerConfig};
use curio_db::Database;

const DEFAULT_LOG_FILTER: &str = "curio_api=debug,curio_db=info,tower_http=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let _log_guard = init_tracing();

    let config = ServerConfig::from_env()?;
    info!(
        host = %config.host,
        port = config.port,
        trust_actor_headers = config.trust_actor_headers,
        allowed_origins = config.allowed_origins.len(),
        "Configuration loaded"
    );

    // Connect to database
    info!("Connecting to database...");
    let db = Database::connect_with_config(&config.database_url, config.pool.clone()).await?;
    info!("Database connected");

    // Run pending database migrations on startup
    info!("Running database migrations...");
    db.migrate().await?;
    info!("Database migrations complete");

    let app = build_router(AppState::new(db), &config);

    // Start server
    let addr: SocketAddr = config.bind_addr().parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, starting shutdown");
        }
    }
}

/// Install the global subscriber.
///
/// `LOG_FORMAT` selects `json` or `text`, `LOG_FILE` adds a daily-rotated
/// file sink in place of stdout, `LOG_ANSI` forces colors on or off and
/// `RUST_LOG` overrides [`DEFAULT_LOG_FILTER`]. The returned guard flushes
/// the file writer and must outlive the server.
fn init_tracing() -> Option<WorkerGuard> {
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let ansi = std::env::var("LOG_ANSI").ok().map(|v| v == "true" || v == "1");
    let log_file = std::env::var("LOG_FILE").ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);

    let guard = match log_file.as_deref().map(Path::new) {
        Some(path) => {
            let dir = path.parent().unwrap_or(Path::new("."));
            let name = path
                .file_name()
                .and_then(|f| f.to_str())
                .unwrap_or("curio-api.log");
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, name));
            if json {
                registry.with(fmt::layer().json().with_writer(writer)).init();
            } else {
                registry
                    .with(fmt::layer().with_writer(writer).with_ansi(ansi.unwrap_or(false)))
                    .init();
            }
            Some(guard)
        }
        None => {
            if json {
                registry.with(fmt::layer().json()).init();
            } else {
                let mut layer = fmt::layer();
                if let Some(ansi) = ansi {
                    layer = layer.with_ansi(ansi);
                }
                registry.with(layer).init();
            }
            None
        }
    };

    info!(
        format = if json { "json" } else { "text" },
        sink = log_file.as_deref().unwrap_or("stdout"),
        "Logging initialized"
    );
    guard
}
