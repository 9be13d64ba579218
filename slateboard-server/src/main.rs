/*
    main.rs - Slateboard server binary

    Serves the document store API (/api/get, /api/set) together with
    the edge routing surface (board redirect, SPA rewrite, static
    passthrough) on a single listener.
*/

use clap::Parser;
use slateboard_core::logging::{init_logging_with_config, LogConfig, LogLevel};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

mod api;
mod edge;
mod handlers;
mod state;
mod store;

use state::AppState;

#[derive(Parser, Debug)]
#[command(name = "slateboard-server")]
#[command(about = "Collaborative whiteboard store and edge server", long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8080")]
    bind: String,

    /// Directory holding the single-page app assets
    #[arg(long, default_value = "web")]
    static_root: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = LogLevel::from_str(&args.log_level)
        .ok_or_else(|| anyhow::anyhow!("invalid log level: {}", args.log_level))?;
    init_logging_with_config(LogConfig::new(level).json_format(args.json_logs))?;

    let app_state = Arc::new(AppState::new());
    let router = api::build_router(app_state).merge(edge::build_router(args.static_root.clone()));

    let listener = tokio::net::TcpListener::bind(&args.bind).await?;
    info!(bind = %args.bind, static_root = %args.static_root.display(), "slateboard server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "failed to install shutdown signal handler");
    }
}
