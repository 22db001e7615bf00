//! Request store: the live request entities that versions are taken from
//! and restored onto.

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{FollowRedirects, NewRequest, Request, RequestPatch};

/// Storage for [`Request`] entities.
#[async_trait]
pub trait RequestStore: Send + Sync {
    async fn get_by_id(&self, id: &str) -> Result<Option<Request>, AppError>;

    /// All requests, ordered by sort key.
    async fn list(&self) -> Result<Vec<Request>, AppError>;

    /// Create a request, assigning its id and timestamps.
    async fn insert(&self, new: NewRequest) -> Result<Request, AppError>;

    /// Merge `patch` onto `existing` and persist the result.
    ///
    /// Fails with [`AppError::Conflict`] if the stored request was written
    /// after `existing` was read, and with [`AppError::NotFound`] if it is gone.
    async fn update(&self, existing: &Request, patch: RequestPatch) -> Result<Request, AppError>;

    async fn delete(&self, id: &str) -> Result<(), AppError>;
}

/// Merge a patch, check that identity is untouched and bump the version.
pub(crate) fn merge(existing: &Request, patch: &RequestPatch) -> Result<Request, AppError> {
    let mut updated = patch.apply_to(existing)?;
    if updated.id != existing.id {
        return Err(AppError::InvalidArgument(format!(
            "Cannot change id of request {}",
            existing.id
        )));
    }
    updated.version = existing.version + 1;
    Ok(updated)
}

/// SQLite-backed request store.
#[derive(Clone)]
pub struct SqliteRequestStore {
    pool: SqlitePool,
}

const REQUEST_COLUMNS: &str = "id, type, parent_id, created, modified, meta_sort_key, name, description, url, method, body, parameters, headers, authentication, is_private, setting_store_cookies, setting_send_cookies, setting_disable_render_request_body, setting_encode_url, setting_rebuild_path, setting_follow_redirects, version";

impl SqliteRequestStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a fully formed request, keeping its id and timestamps.
    pub async fn put(&self, request: &Request) -> Result<(), AppError> {
        let columns = RequestColumns::encode(request)?;

        sqlx::query(&format!(
            "INSERT INTO requests ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            REQUEST_COLUMNS
        ))
        .bind(&request.id)
        .bind(&request.kind)
        .bind(&request.parent_id)
        .bind(request.created)
        .bind(request.modified)
        .bind(request.meta_sort_key)
        .bind(&request.name)
        .bind(&request.description)
        .bind(&request.url)
        .bind(&request.method)
        .bind(&columns.body)
        .bind(&columns.parameters)
        .bind(&columns.headers)
        .bind(&columns.authentication)
        .bind(request.is_private as i32)
        .bind(request.setting_store_cookies as i32)
        .bind(request.setting_send_cookies as i32)
        .bind(request.setting_disable_render_request_body as i32)
        .bind(request.setting_encode_url as i32)
        .bind(request.setting_rebuild_path as i32)
        .bind(follow_redirects_str(request.setting_follow_redirects))
        .bind(request.version)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl RequestStore for SqliteRequestStore {
    async fn get_by_id(&self, id: &str) -> Result<Option<Request>, AppError> {
        let row = sqlx::query(&format!("SELECT {} FROM requests WHERE id = ?", REQUEST_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(request_from_row).transpose()
    }

    async fn list(&self) -> Result<Vec<Request>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM requests ORDER BY meta_sort_key, created",
            REQUEST_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(request_from_row).collect()
    }

    async fn insert(&self, new: NewRequest) -> Result<Request, AppError> {
        let request = Request::from_new(new);
        self.put(&request).await?;
        Ok(request)
    }

    async fn update(&self, existing: &Request, patch: RequestPatch) -> Result<Request, AppError> {
        let updated = merge(existing, &patch)?;
        let columns = RequestColumns::encode(&updated)?;

        // Optimistic lock: only write if nobody bumped the version since the read
        let result = sqlx::query(
            r#"UPDATE requests SET
                type = ?, parent_id = ?, created = ?, modified = ?, meta_sort_key = ?,
                name = ?, description = ?, url = ?, method = ?, body = ?, parameters = ?,
                headers = ?, authentication = ?, is_private = ?, setting_store_cookies = ?,
                setting_send_cookies = ?, setting_disable_render_request_body = ?,
                setting_encode_url = ?, setting_rebuild_path = ?, setting_follow_redirects = ?,
                version = ?
            WHERE id = ? AND version = ?"#,
        )
        .bind(&updated.kind)
        .bind(&updated.parent_id)
        .bind(updated.created)
        .bind(updated.modified)
        .bind(updated.meta_sort_key)
        .bind(&updated.name)
        .bind(&updated.description)
        .bind(&updated.url)
        .bind(&updated.method)
        .bind(&columns.body)
        .bind(&columns.parameters)
        .bind(&columns.headers)
        .bind(&columns.authentication)
        .bind(updated.is_private as i32)
        .bind(updated.setting_store_cookies as i32)
        .bind(updated.setting_send_cookies as i32)
        .bind(updated.setting_disable_render_request_body as i32)
        .bind(updated.setting_encode_url as i32)
        .bind(updated.setting_rebuild_path as i32)
        .bind(follow_redirects_str(updated.setting_follow_redirects))
        .bind(updated.version)
        .bind(&existing.id)
        .bind(existing.version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return match self.get_by_id(&existing.id).await? {
                Some(_) => Err(AppError::Conflict(format!(
                    "Concurrent modification detected for request {}",
                    existing.id
                ))),
                None => Err(AppError::NotFound(format!(
                    "Request {} not found",
                    existing.id
                ))),
            };
        }

        Ok(updated)
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM requests WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Request {} not found", id)));
        }
        Ok(())
    }
}

/// JSON-encoded columns of a request row.
struct RequestColumns {
    body: String,
    parameters: String,
    headers: String,
    authentication: String,
}

impl RequestColumns {
    fn encode(request: &Request) -> Result<Self, AppError> {
        Ok(Self {
            body: serde_json::to_string(&request.body)?,
            parameters: serde_json::to_string(&request.parameters)?,
            headers: serde_json::to_string(&request.headers)?,
            authentication: serde_json::to_string(&request.authentication)?,
        })
    }
}

fn follow_redirects_str(value: FollowRedirects) -> &'static str {
    match value {
        FollowRedirects::Global => "global",
        FollowRedirects::On => "on",
        FollowRedirects::Off => "off",
    }
}

fn parse_follow_redirects(s: &str) -> FollowRedirects {
    match s {
        "on" => FollowRedirects::On,
        "off" => FollowRedirects::Off,
        _ => FollowRedirects::Global,
    }
}

fn request_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Request, AppError> {
    let body: String = row.get("body");
    let parameters: String = row.get("parameters");
    let headers: String = row.get("headers");
    let authentication: String = row.get("authentication");
    let is_private: i32 = row.get("is_private");
    let store_cookies: i32 = row.get("setting_store_cookies");
    let send_cookies: i32 = row.get("setting_send_cookies");
    let disable_render: i32 = row.get("setting_disable_render_request_body");
    let encode_url: i32 = row.get("setting_encode_url");
    let rebuild_path: i32 = row.get("setting_rebuild_path");
    let follow_redirects: String = row.get("setting_follow_redirects");

    Ok(Request {
        id: row.get("id"),
        kind: row.get("type"),
        parent_id: row.get("parent_id"),
        created: row.get("created"),
        modified: row.get("modified"),
        meta_sort_key: row.get("meta_sort_key"),
        name: row.get("name"),
        description: row.get("description"),
        url: row.get("url"),
        method: row.get("method"),
        body: serde_json::from_str(&body)?,
        parameters: serde_json::from_str(&parameters)?,
        headers: serde_json::from_str(&headers)?,
        authentication: serde_json::from_str(&authentication)?,
        is_private: is_private != 0,
        setting_store_cookies: store_cookies != 0,
        setting_send_cookies: send_cookies != 0,
        setting_disable_render_request_body: disable_render != 0,
        setting_encode_url: encode_url != 0,
        setting_rebuild_path: rebuild_path != 0,
        setting_follow_redirects: parse_follow_redirects(&follow_redirects),
        version: row.get("version"),
    })
}
