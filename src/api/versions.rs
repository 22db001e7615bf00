//! Request version API endpoints.

use axum::extract::{Path, State};

use super::{found, record_version, success, ApiResult};
use crate::models::{Request, RequestVersion, Snapshot};
use crate::AppState;

/// GET /api/versions - List all versions.
pub async fn list_versions(State(state): State<AppState>) -> ApiResult<Vec<RequestVersion>> {
    success(state.versions.all().await?)
}

/// GET /api/versions/{id} - Get a single version.
pub async fn get_version(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<RequestVersion> {
    let version = found(state.versions.get_by_id(&id).await?, "Request version", &id)?;
    success(version)
}

/// GET /api/versions/{id}/snapshot - The request fields stored in a version.
pub async fn get_version_snapshot(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Snapshot> {
    let version = found(state.versions.get_by_id(&id).await?, "Request version", &id)?;
    success(state.versions.snapshot(&version)?)
}

/// POST /api/versions/{id}/restore - Roll the owning request back to a version.
///
/// The restored state is recorded as the request's newest version.
pub async fn restore_version(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Request> {
    let restored = found(
        state.restorer.restore(&id).await?,
        "Restorable request version",
        &id,
    )?;
    record_version(&state, &restored).await;
    success(restored)
}

/// GET /api/requests/{id}/versions/latest - Latest version of a request.
pub async fn get_latest_version(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<RequestVersion> {
    let version = found(
        state.versions.get_latest_by_parent_id(&id).await?,
        "Version of request",
        &id,
    )?;
    success(version)
}

/// POST /api/requests/{id}/versions - Record the current state of a request.
pub async fn create_version(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<RequestVersion> {
    let request = found(state.requests.get_by_id(&id).await?, "Request", &id)?;
    success(state.versions.create(&request).await?)
}
