//! ChemEquip Service - HTTP API for equipment dataset uploads.
//!
//! Run with: `cargo run -p chemeq-service`

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use chemeq_service::{AppState, Config};
use chemeq_store::Store;

/// ChemEquip Service - HTTP REST API for equipment datasets.
#[derive(Parser, Debug)]
#[command(name = "chemeq-service")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address (overrides config).
    #[arg(short, long)]
    bind: Option<String>,

    /// Database path (overrides config).
    #[arg(short, long, env = "CHEMEQ_DB")]
    database: Option<PathBuf>,

    /// Number of uploads to keep (overrides config).
    #[arg(long)]
    retention: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("chemeq_service=info".parse()?)
                .add_directive("chemeq_core=info".parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .init();

    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };

    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(db_path) = args.database {
        config.storage.path = db_path;
    }
    if let Some(retention) = args.retention {
        config.storage.retention = retention;
    }
    config.validate()?;

    info!("Opening database at {:?}", config.storage.path);
    let store = Store::open(&config.storage.path)
        .and_then(|store| store.with_retention(config.storage.retention))
        .with_context(|| format!("Failed to open database {:?}", config.storage.path))?;

    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("Invalid bind address '{}'", config.server.bind))?;

    if config.security.api_key_enabled {
        info!("API key authentication enabled");
    }
    let state = AppState::new(store, config);
    let app = chemeq_service::app(state);

    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
