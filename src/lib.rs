//! Request history.
//!
//! Records deduplicated, compressed versions of HTTP request definitions
//! each time they are saved, and restores a request to any recorded
//! version while keeping its identity and display metadata.

pub mod api;
pub mod auth;
pub mod codec;
pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod versions;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use codec::Codec;
use config::Config;
use db::{RequestStore, VersionRepository};
use versions::{Restorer, VersionStore};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub requests: Arc<dyn RequestStore>,
    pub versions: VersionStore,
    pub restorer: Restorer,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire the versioning core onto the given collaborators.
    pub fn new(
        requests: Arc<dyn RequestStore>,
        repository: Arc<dyn VersionRepository>,
        codec: Arc<dyn Codec>,
        config: Config,
    ) -> Self {
        let versions = VersionStore::new(repository, codec);
        let restorer = Restorer::new(versions.clone(), Arc::clone(&requests));
        Self {
            requests,
            versions,
            restorer,
            config: Arc::new(config),
        }
    }
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Requests
        .route(
            "/requests",
            get(api::list_requests).post(api::create_request),
        )
        .route(
            "/requests/{id}",
            get(api::get_request)
                .put(api::update_request)
                .delete(api::delete_request),
        )
        .route("/requests/{id}/versions", post(api::create_version))
        .route("/requests/{id}/versions/latest", get(api::get_latest_version))
        // Versions
        .route("/versions", get(api::list_versions))
        .route("/versions/{id}", get(api::get_version))
        .route("/versions/{id}/snapshot", get(api::get_version_snapshot))
        .route("/versions/{id}/restore", post(api::restore_version))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_key,
        ));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
