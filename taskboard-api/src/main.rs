//! # Taskboard API Server
//!
//! Serves the task board over HTTP, backed by PostgreSQL for records and a
//! media directory for attachment payloads.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://... JWT_SECRET=... cargo run -p taskboard-api
//! ```

use std::sync::Arc;
use std::time::Duration;
use taskboard_api::{
    app::{build_router, AppState},
    config::Config,
};
use taskboard_shared::blob::FsBlobStore;
use taskboard_shared::db::{
    migrations::run_migrations,
    pool::{close_pool, create_pool, DatabaseConfig},
};
use taskboard_shared::store::{postgres::PgStore, SharedStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How often expired blacklist entries are removed
const TOKEN_PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskboard_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Taskboard API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let pool = create_pool(
        DatabaseConfig::new(config.database.url.clone())
            .with_max_connections(config.database.max_connections),
    )
    .await?;
    run_migrations(&pool).await?;

    tokio::fs::create_dir_all(&config.media.root).await?;
    tracing::info!(root = %config.media.root.display(), "Media directory ready");

    let store: SharedStore = Arc::new(PgStore::new(pool.clone()));
    let blobs = Arc::new(FsBlobStore::new(config.media.root.clone()));

    let purge_store = store.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(TOKEN_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            match purge_store.purge_expired_tokens().await {
                Ok(0) => {}
                Ok(removed) => tracing::debug!(removed, "Purged expired blacklisted tokens"),
                Err(e) => tracing::warn!(error = %e, "Failed to purge blacklisted tokens"),
            }
        }
    });

    let address = config.bind_address();
    let state = AppState::new(config, store, blobs).with_database(pool.clone());
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!("Server listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    close_pool(pool).await;
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
