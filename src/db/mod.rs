//! Database module: storage collaborators for requests and their versions.
//!
//! SQLite is the source of truth for the service; the in-memory stores
//! satisfy the same traits for embedding and tests.

mod memory;
mod repository;
mod requests;

pub use memory::*;
pub use repository::*;
pub use requests::*;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// Initialize the database connection pool and run migrations.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

/// Run database migrations.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS requests (
            id TEXT PRIMARY KEY,
            type TEXT NOT NULL,
            parent_id TEXT,
            created INTEGER NOT NULL,
            modified INTEGER NOT NULL,
            meta_sort_key REAL NOT NULL,
            name TEXT NOT NULL,
            description TEXT NOT NULL,
            url TEXT NOT NULL,
            method TEXT NOT NULL,
            body TEXT NOT NULL,
            parameters TEXT NOT NULL,
            headers TEXT NOT NULL,
            authentication TEXT NOT NULL,
            is_private INTEGER NOT NULL DEFAULT 0,
            setting_store_cookies INTEGER NOT NULL DEFAULT 1,
            setting_send_cookies INTEGER NOT NULL DEFAULT 1,
            setting_disable_render_request_body INTEGER NOT NULL DEFAULT 0,
            setting_encode_url INTEGER NOT NULL DEFAULT 1,
            setting_rebuild_path INTEGER NOT NULL DEFAULT 1,
            setting_follow_redirects TEXT NOT NULL DEFAULT 'global',
            version INTEGER NOT NULL DEFAULT 1
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS request_versions (
            id TEXT PRIMARY KEY,
            type TEXT NOT NULL,
            parent_id TEXT NOT NULL,
            created INTEGER NOT NULL,
            modified INTEGER NOT NULL,
            compressed_request TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_request_versions_parent ON request_versions(parent_id, modified);
        CREATE INDEX IF NOT EXISTS idx_requests_parent ON requests(parent_id);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
