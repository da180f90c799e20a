//! HTTP client for a running relay's `/api/analyze` endpoint.
//!
//! Uses `ureq` (sync) wrapped in `tokio::task::spawn_blocking`, the same
//! way the relay talks to its backend.

use async_trait::async_trait;
use nerlens_core::multipart::MultipartForm;
use nerlens_core::{AnalysisResult, AnalyzeClient, ClientRequestFailure, UploadedFile};
use tracing::debug;

/// Relay path, appended to the relay base URL.
pub(crate) const RELAY_ANALYZE_PATH: &str = "/api/analyze";

pub(crate) struct RelayHttpClient {
    url: String,
    agent: ureq::Agent,
}

impl RelayHttpClient {
    pub(crate) fn new(relay_url: &str) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .into();
        RelayHttpClient {
            url: format!("{}{}", relay_url.trim_end_matches('/'), RELAY_ANALYZE_PATH),
            agent,
        }
    }

    pub(crate) fn url(&self) -> &str {
        &self.url
    }
}

/// Pull the message out of a `{"error": "..."}` body, or use the raw text.
fn error_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

#[async_trait]
impl AnalyzeClient for RelayHttpClient {
    async fn analyze(&self, file: &UploadedFile) -> Result<AnalysisResult, ClientRequestFailure> {
        let (content_type, body) = MultipartForm::new().file("file", file).finish();
        let agent = self.agent.clone();
        let url = self.url.clone();
        debug!(url = %url, filename = %file.name, "sending file to relay");

        let (status, text) = tokio::task::spawn_blocking(move || {
            let response = agent
                .post(&url)
                .header("Content-Type", &content_type)
                .send(&body)
                .map_err(ClientRequestFailure::transport)?;
            let status = response.status().as_u16();
            let text = response
                .into_body()
                .read_to_string()
                .map_err(ClientRequestFailure::transport)?;
            Ok::<_, ClientRequestFailure>((status, text))
        })
        .await
        .map_err(|e| ClientRequestFailure::transport(format!("task join error: {}", e)))??;

        debug!(status, "relay responded");
        if !(200..300).contains(&status) {
            return Err(ClientRequestFailure::rejected(status, &error_detail(&text)));
        }

        serde_json::from_str(&text)
            .map_err(|e| ClientRequestFailure::transport(format!("invalid response: {}", e)))
    }
}
