//! Request history service.
//!
//! Serves request CRUD and version history over REST with SQLite persistence.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use request_history::codec::ZstdCodec;
use request_history::config::Config;
use request_history::db::{self, SqliteRequestStore, SqliteVersionRepository};
use request_history::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting request history service");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);
    tracing::info!("Snapshot compression level: {}", config.compression_level);

    if config.api_psk.is_none() {
        tracing::warn!(
            "No API PSK configured (REQUEST_HISTORY_API_PSK). Authentication is disabled!"
        );
    }

    let pool = db::init_database(&config.db_path).await?;
    let state = AppState::new(
        Arc::new(SqliteRequestStore::new(pool.clone())),
        Arc::new(SqliteVersionRepository::new(pool)),
        Arc::new(ZstdCodec::new(config.compression_level)),
        config.clone(),
    );

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
