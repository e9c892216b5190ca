use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;
use scrub_core::Config;

use crate::metrics;
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl HealthResponse {
    fn ok() -> Self {
        Self {
            status: "OK".to_string(),
            reason: None,
            detail: None,
        }
    }

    fn failed(reason: &str, detail: String) -> Self {
        Self {
            status: "FAILED".to_string(),
            reason: Some(reason.to_string()),
            detail: Some(detail),
        }
    }
}

/// Basic health checks: scratch directory writable, ticket store
/// reachable. The probe itself always answers 200; failures are
/// reported in the body.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    if let Err(e) = state.scratch().check_writable() {
        return Json(HealthResponse::failed(
            "temp directory not writable",
            e.to_string(),
        ));
    }

    if let Err(e) = state.ticket_store().ping() {
        return Json(HealthResponse::failed(
            "cannot reach ticket store",
            e.to_string(),
        ));
    }

    Json(HealthResponse::ok())
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<Config> {
    Json(state.config().clone())
}

pub async fn metrics() -> String {
    metrics::render()
}
