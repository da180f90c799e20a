//! Application state shared across request handlers.

use nerlens_core::{BackendClient, RelayError, Theme, UploadedFile};
use tracing::warn;

/// Immutable per-process configuration. Requests never share payloads.
pub(crate) struct AppState {
    pub(crate) backend: BackendClient,
    pub(crate) theme: Theme,
    /// Replace backend error bodies before they reach the caller.
    pub(crate) redact_backend_errors: bool,
}

impl AppState {
    /// Forward one upload to the backend, applying the redaction policy.
    pub(crate) async fn relay(&self, file: &UploadedFile) -> Result<serde_json::Value, RelayError> {
        match self.backend.analyze(file).await {
            Err(err @ RelayError::BackendRejected { .. }) if self.redact_backend_errors => {
                warn!("redacting backend error body");
                Err(err.redacted())
            }
            other => other,
        }
    }
}
