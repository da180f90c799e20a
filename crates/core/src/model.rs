//! Data carried through the pipeline.

use serde::{Deserialize, Serialize};

/// MIME type assumed when an upload does not declare one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// One named-entity extraction result, exactly as the backend produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub entity: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl Entity {
    pub fn new(entity: impl Into<String>, kind: impl Into<String>) -> Self {
        Entity {
            entity: entity.into(),
            kind: kind.into(),
        }
    }
}

/// The full response payload for one analysis request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub openai_results: Vec<Entity>,
    pub huggingface_results: Vec<Entity>,
}

/// A single uploaded blob held in memory for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    /// Build an upload. A missing or blank content type falls back to
    /// [`DEFAULT_CONTENT_TYPE`].
    pub fn new(name: impl Into<String>, content_type: Option<&str>, bytes: Vec<u8>) -> Self {
        let content_type = content_type
            .map(str::trim)
            .filter(|ct| !ct.is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();
        UploadedFile {
            name: name.into(),
            content_type,
            bytes,
        }
    }

    /// Lowercased extension of the file name, without the dot.
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }

    /// MIME type without parameters (`text/plain; charset=utf-8` → `text/plain`).
    pub fn mime_essence(&self) -> String {
        self.content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
