//! Route configuration.

use crate::handlers;
use crate::state::AppState;
use axum::Router;
use axum::routing::{get, patch};
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check (unauthenticated for load balancers/k8s probes)
        .route("/health", get(handlers::health_check))
        // File control plane
        .route(
            "/files",
            get(handlers::list_files).post(handlers::register_file),
        )
        .route(
            "/files/{file_id}",
            patch(handlers::rename_file).delete(handlers::delete_file),
        )
        // Data plane
        .route("/files/upload/{file_id}", patch(handlers::upload_file))
        .route("/files/download/{file_id}", get(handlers::download_file))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
