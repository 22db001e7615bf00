//! Version repository: persistence for request versions.
//!
//! Versions are insert-only. Lookups are by id, by most recent per parent,
//! or a full enumeration.

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{
    generate_id, now_millis, NewRequestVersion, RequestVersion, REQUEST_VERSION_ID_PREFIX,
    REQUEST_VERSION_TYPE,
};

/// Storage for [`RequestVersion`] records.
#[async_trait]
pub trait VersionRepository: Send + Sync {
    /// Fetch a version by id.
    async fn get(&self, id: &str) -> Result<Option<RequestVersion>, AppError>;

    /// The most recently modified version of `parent_id`, if any.
    ///
    /// Ties on `modified` resolve to the last inserted record.
    async fn most_recent_by_parent(
        &self,
        parent_id: &str,
    ) -> Result<Option<RequestVersion>, AppError>;

    /// Every stored version, in no particular order.
    async fn all(&self) -> Result<Vec<RequestVersion>, AppError>;

    /// Persist a new version, assigning its id and timestamps.
    async fn insert(&self, new: NewRequestVersion) -> Result<RequestVersion, AppError>;
}

/// Build the full record for an insert.
pub(crate) fn new_record(new: NewRequestVersion) -> RequestVersion {
    let now = now_millis();
    RequestVersion {
        id: generate_id(REQUEST_VERSION_ID_PREFIX),
        kind: REQUEST_VERSION_TYPE.to_string(),
        parent_id: new.parent_id,
        created: now,
        modified: now,
        compressed_request: new.compressed_request,
    }
}

/// SQLite-backed version repository.
#[derive(Clone)]
pub struct SqliteVersionRepository {
    pool: SqlitePool,
}

impl SqliteVersionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VersionRepository for SqliteVersionRepository {
    async fn get(&self, id: &str) -> Result<Option<RequestVersion>, AppError> {
        let row = sqlx::query(
            "SELECT id, type, parent_id, created, modified, compressed_request FROM request_versions WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(version_from_row))
    }

    async fn most_recent_by_parent(
        &self,
        parent_id: &str,
    ) -> Result<Option<RequestVersion>, AppError> {
        let row = sqlx::query(
            "SELECT id, type, parent_id, created, modified, compressed_request FROM request_versions WHERE parent_id = ? ORDER BY modified DESC, rowid DESC LIMIT 1",
        )
        .bind(parent_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(version_from_row))
    }

    async fn all(&self) -> Result<Vec<RequestVersion>, AppError> {
        let rows = sqlx::query(
            "SELECT id, type, parent_id, created, modified, compressed_request FROM request_versions",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(version_from_row).collect())
    }

    async fn insert(&self, new: NewRequestVersion) -> Result<RequestVersion, AppError> {
        let record = new_record(new);

        sqlx::query(
            "INSERT INTO request_versions (id, type, parent_id, created, modified, compressed_request) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.id)
        .bind(&record.kind)
        .bind(&record.parent_id)
        .bind(record.created)
        .bind(record.modified)
        .bind(&record.compressed_request)
        .execute(&self.pool)
        .await?;

        Ok(record)
    }
}

fn version_from_row(row: &sqlx::sqlite::SqliteRow) -> RequestVersion {
    RequestVersion {
        id: row.get("id"),
        kind: row.get("type"),
        parent_id: row.get("parent_id"),
        created: row.get("created"),
        modified: row.get("modified"),
        compressed_request: row.get("compressed_request"),
    }
}
