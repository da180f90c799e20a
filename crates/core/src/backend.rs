//! Relay client for the external NLP backend.
//!
//! Uses `ureq` (sync) wrapped in `tokio::task::spawn_blocking` so the
//! async runtime never blocks. One attempt per call: no retry, no timeout
//! override, no streaming.

use tracing::{debug, info, warn};

use crate::error::RelayError;
use crate::model::UploadedFile;
use crate::multipart::MultipartForm;

/// Backend base URL used when `BACKEND_URL` is not set.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// Path of the backend's analysis route, appended to the base URL.
pub const ANALYZE_PATH: &str = "/analyze/";

/// Environment variable overriding [`DEFAULT_BACKEND_URL`].
pub const BACKEND_URL_ENV: &str = "BACKEND_URL";

/// Forwards one upload to `{base_url}/analyze/` and hands back its JSON.
#[derive(Clone)]
pub struct BackendClient {
    base_url: String,
    agent: ureq::Agent,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        // Non-2xx answers are data for the caller, not transport errors.
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .into();
        BackendClient {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            agent,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn analyze_url(&self) -> String {
        format!("{}{}", self.base_url, ANALYZE_PATH)
    }

    /// Send `file` as the multipart field `file` and return the backend's
    /// JSON body unmodified.
    ///
    /// - 2xx with a JSON body → `Ok(body)`
    /// - non-2xx → [`RelayError::BackendRejected`] with the raw body text
    /// - unreachable backend or non-JSON success body →
    ///   [`RelayError::TransportFailure`]
    pub async fn analyze(&self, file: &UploadedFile) -> Result<serde_json::Value, RelayError> {
        let url = self.analyze_url();
        let (content_type, body) = MultipartForm::new().file("file", file).finish();
        info!(
            url = %url,
            filename = %file.name,
            content_type = %file.content_type,
            bytes = file.len(),
            "forwarding upload to backend"
        );

        let agent = self.agent.clone();
        let (status, text) = tokio::task::spawn_blocking(move || {
            let response = agent
                .post(&url)
                .header("Content-Type", &content_type)
                .send(&body)
                .map_err(|e| RelayError::TransportFailure(e.to_string()))?;

            let status = response.status().as_u16();
            let text = response
                .into_body()
                .read_to_string()
                .map_err(|e| RelayError::TransportFailure(e.to_string()))?;
            Ok::<_, RelayError>((status, text))
        })
        .await
        .map_err(|e| RelayError::TransportFailure(format!("task join error: {}", e)))?
        .inspect_err(|e| warn!(error = %e, "backend unreachable"))?;

        info!(status, "backend responded");
        debug!(body = %text, "backend response body");

        if !(200..300).contains(&status) {
            warn!(status, body = %text, "backend rejected upload");
            return Err(RelayError::BackendRejected { status, body: text });
        }

        serde_json::from_str(&text).map_err(|e| {
            warn!(error = %e, "backend success body is not JSON");
            RelayError::TransportFailure(format!("invalid JSON from backend: {}", e))
        })
    }
}

impl std::fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
