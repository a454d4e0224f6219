use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::cors::cors_layer;
use super::handlers;
use crate::AppState;

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn create_router(state: Arc<AppState>) -> Router {
    let upload_limit =
        (state.config.max_upload_size as usize).saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        // Files
        .route("/files", get(handlers::list_files))
        .route(
            "/files",
            post(handlers::create_file).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/files/:id", delete(handlers::delete_file))
        .route("/files/:id", get(handlers::get_file))
        .route("/files/:id/download", get(handlers::download_file))
        // Stored bytes (the `file` URL of a record)
        .route("/uploads/*key", get(handlers::serve_upload))
        // Internal
        .route("/_internal/health", get(handlers::health))
        .layer(cors_layer(&state.config.server.cors_allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
