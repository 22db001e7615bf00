//! REST API module.
//!
//! Request CRUD plus the version history endpoints.

mod requests;
mod versions;

pub use requests::*;
pub use versions::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::errors::AppError;
use crate::models::Request;
use crate::AppState;

/// Success response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, AppError>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(ApiResponse::new(data))
}

/// Turn an expected absence into a 404.
pub(crate) fn found<T>(value: Option<T>, what: &str, id: &str) -> Result<T, AppError> {
    value.ok_or_else(|| AppError::NotFound(format!("{} {} not found", what, id)))
}

/// Record a version of a just-saved request. The save already succeeded, so
/// a failure here is logged rather than returned.
pub(crate) async fn record_version(state: &AppState, request: &Request) {
    if let Err(e) = state.versions.create(request).await {
        tracing::warn!("Failed to record version of request {}: {}", request.id, e);
    }
}
