//! workshop-api: item-management demo service.
//!
//! This is the application entry point. It initializes tracing, loads
//! configuration from the environment, opens the item store, builds the Axum
//! router and serves it until a termination signal arrives.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use workshop_api::config::{AppConfig, LogFormat, DEFAULT_LOG_FILTER};
use workshop_api::http::start_server;
use workshop_api::lifecycle::{Lifecycle, ProcessExit};
use workshop_api::routes::create_router;
use workshop_api::state::AppState;
use workshop_api::store::ItemStore;

/// workshop-api: item service for orchestration demos
#[derive(Parser, Debug)]
#[command(name = "workshop-api", version, about)]
struct Args {
    /// Log level filter (e.g., "workshop_api=debug,tower_http=info")
    #[arg(short, long)]
    log_level: Option<String>,
}

// One runtime thread: requests are processed one at a time, which is what
// makes the blocking work endpoint starve everything else.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = AppConfig::load()?;

    // Initialize tracing with priority: CLI > env > default
    let log_filter = args
        .log_level
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

    let registry =
        tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::new(&log_filter));
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    tracing::info!(
        version = %config.version(),
        work_mode = ?config.work_mode,
        cors_origin = %config.cors_origin,
        "Loaded configuration"
    );

    // Storage failures are fatal at startup
    let store = ItemStore::open(&config.data_dir, &config.db_file)?;
    tracing::info!(path = %config.database_file().display(), "Initialized item store");

    let addr = config.listen_addr()?;
    let lifecycle = Lifecycle::new(config.version());
    let state = AppState::new(config, store, lifecycle, Arc::new(ProcessExit));

    let app = create_router(state);
    start_server(app, addr).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
