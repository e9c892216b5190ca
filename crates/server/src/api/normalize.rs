//! Job submission endpoint.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use scrub_core::pipeline::{NormalizeOptions, ResourceKind, ResponseMode};
use scrub_core::scheduler::{NormalizeJob, ProcessError, SchedulerError};

use crate::state::AppState;

/// Error response body
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}

/// Response for accepted deferred jobs
#[derive(Debug, Serialize)]
pub struct DeferredResponse {
    pub ticket: String,
    pub endpoint: String,
    pub status: String,
}

pub(super) fn bad_request(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiError {
            error: message.into(),
        }),
    )
        .into_response()
}

pub(super) fn internal_error(message: impl Into<String>) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiError {
            error: message.into(),
        }),
    )
        .into_response()
}

/// One parsed multipart submission: the uploaded file plus every other
/// field, with repeated names collected in order.
struct SubmittedForm {
    file_name: String,
    payload: Vec<u8>,
    fields: HashMap<String, Vec<String>>,
}

/// Normalize endpoint: accepts a file and the normalization options,
/// answers with the transformed file (prompt) or an acceptance ticket
/// (deferred). Invalid options are rejected before any ticket or file
/// side effect happens.
pub async fn normalize(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Response {
    let form = match read_form(multipart).await {
        Ok(form) => form,
        Err(response) => return response,
    };

    let options = match build_options(&form.fields) {
        Ok(options) => options,
        Err(message) => return bad_request(message),
    };

    let upload_id = uuid::Uuid::new_v4().to_string();
    let upload_dir = match state.scratch().upload_dir(&upload_id) {
        Ok(dir) => dir,
        Err(e) => return internal_error(format!("failed to stage upload: {e}")),
    };
    let src_file = upload_dir.join(sanitize_filename(&form.file_name));
    if let Err(e) = tokio::fs::write(&src_file, &form.payload).await {
        return internal_error(format!("failed to stage upload: {e}"));
    }

    let job = NormalizeJob {
        src_file,
        filesize: form.payload.len() as u64,
        options: options.clone(),
    };

    match options.response_mode {
        ResponseMode::Prompt => match state.scheduler().run_prompt(job).await {
            Ok(outcome) => file_response(&outcome.artifact).await,
            Err(SchedulerError::Process(ProcessError::Dataset(e))) => {
                bad_request(format!("Error while reading the file: {e}"))
            }
            Err(e) => {
                error!(error = %e, "prompt job failed");
                internal_error(e.to_string())
            }
        },
        ResponseMode::Deferred => match state.scheduler().submit(job) {
            Ok(ticket) => (
                StatusCode::ACCEPTED,
                Json(DeferredResponse {
                    endpoint: format!("/resource/{}", ticket.ticket),
                    status: format!("/status/{}", ticket.ticket),
                    ticket: ticket.ticket,
                }),
            )
                .into_response(),
            Err(e) => {
                error!(error = %e, "failed to submit job");
                internal_error(e.to_string())
            }
        },
    }
}

async fn read_form(mut multipart: Multipart) -> Result<SubmittedForm, Response> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut fields: HashMap<String, Vec<String>> = HashMap::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(bad_request(format!("malformed multipart body: {e}"))),
        };

        let name = strip_index_suffix(field.name().unwrap_or_default()).to_string();
        if name.is_empty() {
            continue;
        }

        if name == "resource" {
            let file_name = field
                .file_name()
                .unwrap_or("upload.dat")
                .to_string();
            let payload = field
                .bytes()
                .await
                .map_err(|e| bad_request(format!("failed to read upload: {e}")))?;
            file = Some((file_name, payload.to_vec()));
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| bad_request(format!("failed to read field {name}: {e}")))?;
            fields.entry(name).or_default().push(value);
        }
    }

    let (file_name, payload) = file.ok_or_else(|| bad_request("resource file is required"))?;
    if payload.is_empty() {
        return Err(bad_request("resource file is empty"));
    }

    Ok(SubmittedForm {
        file_name,
        payload,
        fields,
    })
}

/// Accepts both `transliteration` and indexed `transliteration-0`
/// spellings for repeated fields.
fn strip_index_suffix(name: &str) -> &str {
    match name.rsplit_once('-') {
        Some((base, suffix))
            if !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()) =>
        {
            base
        }
        _ => name,
    }
}

fn build_options(fields: &HashMap<String, Vec<String>>) -> Result<NormalizeOptions, String> {
    let single = |name: &str| -> Option<String> {
        fields
            .get(name)
            .and_then(|values| values.first())
            .filter(|value| !value.is_empty())
            .cloned()
    };
    // Column selections are ordered sets: first occurrence wins.
    let list = |name: &str| -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for value in fields.get(name).map(Vec::as_slice).unwrap_or_default() {
            if !value.is_empty() && !out.contains(value) {
                out.push(value.clone());
            }
        }
        out
    };

    let resource_type = single("resource_type").ok_or("resource_type is required")?;
    let resource_kind = ResourceKind::parse(&resource_type).map_err(|e| e.to_string())?;

    let mut options = NormalizeOptions::new(resource_kind);
    if let Some(response) = single("response") {
        options.response_mode = ResponseMode::parse(&response).map_err(|e| e.to_string())?;
    }

    options.date_normalization = list("date_normalization");
    options.date_target_format = single("date_target_format");
    options.phone_normalization = list("phone_normalization");
    options.phone_exit_code = single("phone_exit_code");
    options.special_character_normalization = list("special_character_normalization");
    options.alphabetical_normalization = list("alphabetical_normalization");
    options.case_normalization = list("case_normalization");
    options.transliteration = list("transliteration");
    options.transliteration_langs = list("transliteration_langs");
    options.transliteration_lang = single("transliteration_lang");
    options.value_cleaning = list("value_cleaning");
    options.wkt_normalization = list("wkt_normalization");
    options.column_name_normalization = !list("column_name_normalization").is_empty();
    if let Some(version) = single("column_policy_version") {
        options.column_policy_version = version
            .parse()
            .map_err(|_| format!("invalid column_policy_version: {version}"))?;
    }
    options.csv_delimiter = single("csv_delimiter").and_then(|value| value.chars().next());
    options.crs = single("crs");

    options.validate().map_err(|e| e.to_string())?;
    Ok(options)
}

fn sanitize_filename(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let clean: String = base
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();
    if clean.is_empty() || clean.starts_with('.') {
        format!("upload{clean}")
    } else {
        clean
    }
}

/// Streams a stored artifact back with attachment disposition.
pub(super) async fn file_response(path: &Path) -> Response {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) => return internal_error(format!("failed to read output: {e}")),
    };

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());

    let content_type = match path.extension().and_then(|ext| ext.to_str()) {
        Some("csv") => "text/csv",
        Some("zip") => "application/zip",
        _ => "application/octet-stream",
    };

    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{name}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}
