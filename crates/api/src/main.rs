mod config;
mod error;
mod middleware;
mod routes;
mod state;

use std::sync::Arc;

use blog_sync_core::document::CategoryTable;
use blog_sync_core::events::bus::EventBus;
use blog_sync_core::mapping::PostMapper;
use blog_sync_core::mirror::{MirrorStore, MongoMirrorStore};
use blog_sync_core::notify::PublishNotifier;
use blog_sync_core::sync::{worker, SyncService};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience)
    let _ = dotenvy::dotenv();

    // Load configuration
    let config = config::AppConfig::from_env()
        .map_err(|e| anyhow::anyhow!("Failed to load config: {e}"))?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .json()
        .init();

    tracing::info!("Starting blog sync service");

    // The mirror store connects on first use; an unreachable MongoDB only
    // fails the events that need it.
    let store: Arc<dyn MirrorStore> = Arc::new(MongoMirrorStore::new(config.mongo_settings()));

    let notifier = PublishNotifier::new(config.webhook_url.as_deref(), config.site());
    if notifier.is_enabled() {
        tracing::info!(endpoint = ?notifier.endpoint(), "publish webhook enabled");
    } else {
        tracing::info!("N8N_WEBHOOK_URL not set; publish webhook disabled");
    }

    let service = Arc::new(SyncService::new(
        store.clone(),
        PostMapper::new(config.site(), CategoryTable::default()),
        notifier,
    ));

    // Create event bus and start the sync worker before accepting hooks
    let event_bus = EventBus::new(config.event_bus_capacity);
    let sync_worker = worker::spawn(&event_bus, service);

    // Build application state
    let state = state::AppState::new(store, config.clone(), event_bus);

    // Build router with middleware
    let app = routes::build_router(state).layer(middleware::request_tracing::trace_layer());

    // Start server
    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router held the last bus handle; the worker drains queued events and exits.
    if let Err(e) = sync_worker.await {
        tracing::error!("Sync worker ended abnormally: {e}");
    }

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
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
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => { tracing::info!("Received Ctrl+C, shutting down..."); }
        _ = terminate => { tracing::info!("Received SIGTERM, shutting down..."); }
    }
}
