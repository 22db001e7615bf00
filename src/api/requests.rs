//! Request API endpoints.
//!
//! Every successful create or update also records a version of the saved
//! request.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{found, record_version, success, ApiResult};
use crate::models::{now_millis, ExcludedField, NewRequest, Request, RequestPatch};
use crate::AppState;

/// Fields a client may not set through an update.
const IMMUTABLE_FIELDS: [ExcludedField; 4] = [
    ExcludedField::Id,
    ExcludedField::Type,
    ExcludedField::Created,
    ExcludedField::Modified,
];

/// GET /api/requests - List all requests.
pub async fn list_requests(State(state): State<AppState>) -> ApiResult<Vec<Request>> {
    success(state.requests.list().await?)
}

/// GET /api/requests/{id} - Get a single request.
pub async fn get_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Request> {
    let request = found(state.requests.get_by_id(&id).await?, "Request", &id)?;
    success(request)
}

/// POST /api/requests - Create a new request.
pub async fn create_request(
    State(state): State<AppState>,
    Json(new): Json<NewRequest>,
) -> ApiResult<Request> {
    let request = state.requests.insert(new).await?;
    record_version(&state, &request).await;
    success(request)
}

/// PUT /api/requests/{id} - Update a request.
pub async fn update_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<RequestPatch>,
) -> ApiResult<Request> {
    let existing = found(state.requests.get_by_id(&id).await?, "Request", &id)?;

    let mut patch = patch.without(&IMMUTABLE_FIELDS);
    patch.insert("modified", now_millis().max(existing.modified + 1));

    let request = state.requests.update(&existing, patch).await?;
    record_version(&state, &request).await;
    success(request)
}

/// DELETE /api/requests/{id} - Delete a request. Its versions are kept.
pub async fn delete_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    state.requests.delete(&id).await?;
    success(())
}
