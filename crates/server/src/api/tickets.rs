//! Ticket polling and result fetch.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use super::normalize::{file_response, internal_error, ApiError};
use crate::state::AppState;

/// Status of one ticket, in the shape polling clients expect.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub completed: bool,
    pub success: Option<bool>,
    pub comment: Option<String>,
    pub requested: String,
    #[serde(rename = "executionTime")]
    pub execution_time: Option<f64>,
}

fn not_found(ticket: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ApiError {
            error: format!("Ticket not found: {ticket}"),
        }),
    )
        .into_response()
}

/// Polls a ticket. Idempotent: a completed ticket answers the same way
/// forever.
pub async fn status(
    State(state): State<Arc<AppState>>,
    Path(ticket): Path<String>,
) -> Response {
    match state.ticket_store().get(&ticket) {
        Ok(Some(record)) => Json(StatusResponse {
            completed: record.is_completed(),
            success: record.success,
            comment: record.comment,
            requested: record.requested_time.to_rfc3339(),
            execution_time: record.execution_time,
        })
        .into_response(),
        Ok(None) => not_found(&ticket),
        Err(e) => internal_error(e.to_string()),
    }
}

/// Fetches the stored output of a completed job.
///
/// Unknown tickets and tickets without a stored result are 404; a
/// recorded result whose file has since vanished is the distinct
/// "resource gone" condition, 410.
pub async fn resource(
    State(state): State<Arc<AppState>>,
    Path(ticket): Path<String>,
) -> Response {
    let record = match state.ticket_store().get(&ticket) {
        Ok(Some(record)) => record,
        Ok(None) => return not_found(&ticket),
        Err(e) => return internal_error(e.to_string()),
    };

    let locator = match record.result {
        Some(locator) => locator,
        None => return not_found(&ticket),
    };

    let path = state.output_store().resolve(&locator);
    if !path.is_file() {
        return (
            StatusCode::GONE,
            Json(ApiError {
                error: "Resource does not exist".to_string(),
            }),
        )
            .into_response();
    }

    file_response(&path).await
}
