use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{handlers, normalize, tickets};
use crate::state::AppState;

/// Uploads up to this size are accepted.
const MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Job submission
        .route("/normalize", post(normalize::normalize))
        // Ticket polling and result fetch
        .route("/status/{ticket}", get(tickets::status))
        .route("/resource/{ticket}", get(tickets::resource))
        // Operations
        .route("/_health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::metrics))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
