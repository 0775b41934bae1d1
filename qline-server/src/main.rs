//! QLine Server
//!
//! A headless walk-in queue management server: kiosks issue sequential
//! tickets, service points pull the next eligible ticket, operators record
//! outcomes.

mod api;
mod config;
mod server;
mod shutdown;
mod state;

use clap::Parser;
use config::{ConfigLoader, StorageBackend, get_database_url};
use qline_core::config::DirectoryStore;
use qline_core::events::{board_update_channel, ticket_event_channel};
use qline_core::processors::CallAnnouncer;
use qline_core::sequence::{MemorySequenceAllocator, SequenceAllocator};
use qline_core::store::{MemoryTicketStore, PgSequenceAllocator, PgTicketStore, TicketStore};
use qline_core::{AssignmentCoordinator, LifecycleController, PerformanceAggregator};
use server::{build_router, run_server};
use shutdown::spawn_directory_reload_handler;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// QLine - headless walk-in queue management server
#[derive(Parser, Debug)]
#[command(name = "qline-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./qline.toml")]
    config: PathBuf,

    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Run database migrations on startup (postgres backend only)
    #[arg(long, default_value = "false")]
    migrate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    init_tracing();

    // Parse command line arguments
    let args = Args::parse();

    tracing::info!("Starting qline-server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_loader = Arc::new(ConfigLoader::new(&args.config, args.listen));
    let loaded = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;

    let listen_addr = loaded.listen;
    tracing::info!("Configuration loaded from {:?}", args.config);

    // The service directory is shared and hot-swapped on SIGHUP.
    let directory = DirectoryStore::new(loaded.directory);

    // Pick the storage backend.
    let mut pg_pool: Option<PgPool> = None;
    let (store, sequences): (Arc<dyn TicketStore>, Arc<dyn SequenceAllocator>) =
        match loaded.storage.backend {
            StorageBackend::Memory => {
                tracing::info!("Using in-memory ticket store");
                (
                    Arc::new(MemoryTicketStore::new()),
                    Arc::new(MemorySequenceAllocator::new()),
                )
            }
            StorageBackend::Postgres => {
                let database_url = get_database_url().map_err(|e| {
                    tracing::error!("DATABASE_URL environment variable not set");
                    e
                })?;

                tracing::info!("Connecting to database...");
                let pool = PgPoolOptions::new()
                    .max_connections(10)
                    .connect(&database_url)
                    .await
                    .map_err(|e| {
                        tracing::error!("Failed to connect to database: {}", e);
                        e
                    })?;
                tracing::info!("Database connection established");

                if args.migrate {
                    tracing::info!("Running database migrations...");
                    sqlx::migrate!("../migrations").run(&pool).await.map_err(|e| {
                        tracing::error!("Failed to run migrations: {}", e);
                        e
                    })?;
                    tracing::info!("Migrations completed successfully");
                }

                pg_pool = Some(pool.clone());
                (
                    Arc::new(PgTicketStore::new(pool.clone())),
                    Arc::new(PgSequenceAllocator::new(pool)),
                )
            }
        };

    // Event plumbing: engine -> announcer -> board subscribers.
    let (event_tx, event_rx) = ticket_event_channel();
    let (board_tx, _) = board_update_channel();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let announcer = CallAnnouncer::new(
        directory.clone(),
        event_rx,
        board_tx.clone(),
        shutdown_rx,
    );
    let announcer_handle = tokio::spawn(announcer.run());

    // Assemble the engine.
    let coordinator = Arc::new(AssignmentCoordinator::new(
        store.clone(),
        sequences,
        directory.clone(),
        event_tx.clone(),
    ));
    let lifecycle = Arc::new(LifecycleController::new(store.clone(), event_tx));
    let reports = Arc::new(PerformanceAggregator::new(store.clone(), directory.clone()));

    let state = AppState {
        coordinator,
        lifecycle,
        store,
        reports,
        directory: directory.clone(),
        board_tx,
    };

    // Spawn directory reload handler (listens for SIGHUP)
    let reload_notify = spawn_directory_reload_handler(directory, config_loader);

    // Build the router
    let router = build_router(state);

    // Run the server
    tracing::info!("Starting HTTP server on {}", listen_addr);
    let result = run_server(router, listen_addr).await;

    // Stop the reload handler and the announcer
    reload_notify.notify_one();
    let _ = shutdown_tx.send(true);
    let _ = announcer_handle.await;

    // Close database connections gracefully
    if let Some(pool) = pg_pool {
        tracing::info!("Closing database connections...");
        pool.close().await;
    }
    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
