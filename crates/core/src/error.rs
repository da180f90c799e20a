/// Message returned when a relay request carries no `file` field.
pub const NO_FILE_MESSAGE: &str = "No file uploaded";

/// Everything the relay endpoint can fail with.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelayError {
    /// The multipart body had no usable `file` field.
    #[error("{}", NO_FILE_MESSAGE)]
    NoFileProvided,

    /// The request body could not be read as a multipart form.
    #[error("invalid multipart body: {0}")]
    MalformedUpload(String),

    /// The backend answered with a non-2xx status. `body` is the raw
    /// response text, untouched.
    #[error("{body}")]
    BackendRejected { status: u16, body: String },

    /// The backend could not be reached, or its success body was not JSON.
    #[error("Failed to communicate with backend: {0}")]
    TransportFailure(String),
}

impl RelayError {
    /// HTTP status the relay answers with. Backend statuses pass through
    /// verbatim.
    pub fn status_code(&self) -> u16 {
        match self {
            RelayError::NoFileProvided | RelayError::MalformedUpload(_) => 400,
            RelayError::BackendRejected { status, .. } => *status,
            RelayError::TransportFailure(_) => 500,
        }
    }

    /// The `{"error": ...}` body sent to the caller.
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({ "error": self.to_string() })
    }

    /// Replace a backend-supplied body with a generic message. Other
    /// variants are returned unchanged.
    pub fn redacted(self) -> Self {
        match self {
            RelayError::BackendRejected { status, .. } => RelayError::BackendRejected {
                status,
                body: format!("backend returned status {}", status),
            },
            other => other,
        }
    }
}

/// Why a submit was refused before any request went out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SubmitRejected {
    #[error("no file selected")]
    NoFileSelected,
    #[error("an analysis is already in progress")]
    AlreadyAnalyzing,
}

/// The view's call to the relay failed or came back non-2xx.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ClientRequestFailure {
    /// Relay status, when a response was received at all.
    pub status: Option<u16>,
    pub message: String,
}

impl ClientRequestFailure {
    /// A non-2xx answer from the relay.
    pub fn rejected(status: u16, detail: &str) -> Self {
        ClientRequestFailure {
            status: Some(status),
            message: format!("Failed to analyze text: {} {}", status, detail),
        }
    }

    /// No usable answer: connection error or an unparseable body.
    pub fn transport(detail: impl std::fmt::Display) -> Self {
        ClientRequestFailure {
            status: None,
            message: format!("Failed to analyze text: {}", detail),
        }
    }
}

impl From<RelayError> for ClientRequestFailure {
    fn from(err: RelayError) -> Self {
        ClientRequestFailure::rejected(err.status_code(), &err.to_string())
    }
}

/// Problems loading a theme override file.
#[derive(Debug, thiserror::Error)]
pub enum ThemeError {
    #[error("theme overrides must be a JSON object")]
    NotAnObject,
    #[error("theme palette '{mode}' must be a JSON object")]
    PaletteNotAnObject { mode: String },
    #[error("theme color '{mode}.{key}' must be a string")]
    NonStringColor { mode: String, key: String },
    #[error("invalid theme JSON: {0}")]
    Json(#[from] serde_json::Error),
}
