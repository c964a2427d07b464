//! Atelier - HTTP API for the portfolio site.
//!
//! Serves project listings and details from the headless CMS with retry,
//! timeout and caching, plus rate limited IndexNow and contact form endpoints.

mod handlers;
mod middleware;
mod routes;
mod state;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use atelier_core::cms::queries;
use atelier_core::{Config, QueryParams};
use tokio::net::TcpListener;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use state::AppState;

/// Log file name prefix inside the configured log directory
const LOG_FILE_PREFIX: &str = "atelier.log";

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr, and additionally to a daily rolling file when
/// `log_dir` is set. The returned guard flushes the file writer on drop.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

/// Path given with `--config <path>`, if any
fn config_path_arg(args: &[String]) -> Result<Option<PathBuf>> {
    match args.iter().position(|a| a == "--config") {
        Some(i) => {
            let path = args
                .get(i + 1)
                .ok_or_else(|| anyhow::anyhow!("--config requires a path"))?;
            Ok(Some(PathBuf::from(path)))
        }
        None => Ok(None),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().collect();
    let config = match config_path_arg(&args)? {
        Some(path) => Config::load_from(&path)?,
        None => Config::load()?,
    };

    let _log_guard = init_tracing(config.log_dir.as_deref());
    info!(version = env!("CARGO_PKG_VERSION"), "Atelier server starting");

    let state = Arc::new(AppState::from_config(&config)?);
    let sweeper = state.rate_limiter.spawn_sweeper();

    // Warm the home gallery before the first visitor arrives
    state.fetcher.preload(
        queries::DESIGNS_FOR_HOME,
        QueryParams::new(),
        handlers::projects::projects_options(),
    );

    let app = routes::create_router(state);
    let listener = TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;
    info!(addr = %config.server.bind, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    sweeper.abort();
    info!("Atelier server shutting down");
    Ok(())
}
