//! API route handlers: health, relay, fallback.

use std::sync::Arc;

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use nerlens_core::{RelayError, UploadedFile};
use tracing::{debug, info};

use super::state::AppState;
use super::{json_error, relay_error_response};

/// Fallback handler for unmatched routes.
pub(crate) async fn handle_not_found() -> impl IntoResponse {
    json_error(StatusCode::NOT_FOUND, "not found")
}

/// GET /health
pub(crate) async fn handle_health() -> impl IntoResponse {
    let response = serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    });
    (StatusCode::OK, Json(response))
}

/// Fields read from an upload form.
#[derive(Default)]
pub(crate) struct UploadForm {
    /// The first non-empty `file` part.
    pub(crate) file: Option<UploadedFile>,
    /// The page's hidden `previous` field (current result as JSON).
    pub(crate) previous: Option<String>,
}

/// Read the whole form into memory.
pub(crate) async fn read_upload_form(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<UploadForm, RelayError> {
    let mut form = UploadForm::default();
    fill_upload_form(multipart, &mut form).await?;
    Ok(form)
}

/// Read fields into `form` until the body ends or a part fails. Fields
/// read before a failure stay in `form`. Unknown fields are skipped; an
/// empty file slot (no filename, no bytes) counts as no file.
pub(crate) async fn fill_upload_form(
    multipart: Result<Multipart, MultipartRejection>,
    form: &mut UploadForm,
) -> Result<(), RelayError> {
    let mut multipart = multipart.map_err(|e| {
        debug!(error = %e, "request is not a multipart form");
        RelayError::NoFileProvided
    })?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| RelayError::MalformedUpload(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" if form.file.is_none() => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| RelayError::MalformedUpload(e.to_string()))?;
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }
                form.file = Some(UploadedFile::new(
                    file_name,
                    content_type.as_deref(),
                    bytes.to_vec(),
                ));
            }
            "previous" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| RelayError::MalformedUpload(e.to_string()))?;
                form.previous = Some(text);
            }
            _ => {}
        }
    }
    Ok(())
}

/// POST /api/analyze
///
/// Relays the `file` field to the backend. Success bodies are returned
/// unmodified; failures become `{"error": ...}` with the taxonomy's status.
pub(crate) async fn handle_analyze(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let outcome = async {
        let form = read_upload_form(multipart).await?;
        let file = form.file.ok_or(RelayError::NoFileProvided)?;
        info!(filename = %file.name, bytes = file.len(), "relay request");
        state.relay(&file).await
    }
    .await;

    match outcome {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(err) => {
            info!(status = err.status_code(), error = %err, "relay request failed");
            relay_error_response(&err)
        }
    }
}
