//! Query server for record lookups.
//!
//! Provides an HTTP API for id, name, address and radius lookups. Results
//! come back as a map view (markers, popups, search polygon) or as CSV.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use clap::Parser;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use geodude::cache::{CachedStore, QueryCache};
use geodude::config::Config;
use geodude::store::{Backend, SqliteStore};

mod handlers;
use handlers::{
    address_handler, health_handler, id_handler, person_handler, radius_handler,
};

#[derive(Parser, Debug)]
#[command(name = "query")]
#[command(about = "Voter record lookup server")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address (overrides config)
    #[arg(short, long)]
    listen: Option<String>,

    /// SQLite database URL (overrides config)
    #[arg(long)]
    database: Option<String>,

    /// Disable the in-process query cache
    #[arg(long)]
    no_cache: bool,
}

/// Application state shared across handlers
pub struct AppState {
    pub store: CachedStore<Backend>,
    pub config: Config,
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/v1/lookup/id", get(id_handler))
        .route("/v1/lookup/person", get(person_handler))
        .route("/v1/lookup/address", get(address_handler))
        .route("/v1/lookup/radius", get(radius_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };
    if let Some(listen) = args.listen {
        config.server.listen = listen;
    }
    if let Some(database) = args.database {
        config.store.database_url = database;
    }
    if args.no_cache {
        config.store.cache = false;
    }

    info!("GeoDude Query Server");

    let sqlite = SqliteStore::connect(
        &config.store.database_url,
        true,
        config.store.max_connections,
    )
    .await
    .context("Failed to open record store")?;

    let backend = Backend::load(sqlite, config.store.backend)
        .await
        .context("Failed to load record store")?;
    let record_count = backend.count().await.context("Failed to read elector table")?;
    info!(
        "Record store ({:?}) holds {} records",
        config.store.backend, record_count
    );

    let cache = config
        .store
        .cache
        .then(|| Arc::new(QueryCache::with_capacity(config.store.cache_capacity)));
    match &cache {
        Some(cache) => info!("Query cache enabled ({} entries max)", cache.capacity()),
        None => info!("Query cache disabled"),
    }

    let listen = config.server.listen.clone();
    let state = Arc::new(AppState {
        store: CachedStore::new(backend, cache),
        config,
    });

    info!("Starting server on {}", listen);

    let listener = tokio::net::TcpListener::bind(&listen).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}
