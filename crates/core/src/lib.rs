//! nerlens-core: upload → relay → display pipeline for named-entity results.
//!
//! The crate holds everything the front ends share:
//!
//! - [`model`] -- [`Entity`], [`AnalysisResult`], [`UploadedFile`]
//! - [`backend`] -- [`BackendClient`], the single-shot relay to the NLP backend
//! - [`upload`] -- [`UploadWidget`], the one-file plain-text picker
//! - [`view`] -- [`ResultsView`], the Idle/Ready/Analyzing state machine
//! - [`render`] -- entity tables (HTML and plain text) and the full page
//! - [`notify`] -- toast notifications, delivered through an injected [`Notifier`]
//! - [`theme`] -- light/dark palettes emitted as CSS custom properties
//!
//! Entity extraction itself is owned by the external backend.

pub mod backend;
pub mod error;
pub mod model;
pub mod multipart;
pub mod notify;
pub mod render;
pub mod theme;
pub mod upload;
pub mod view;

// ── Convenience re-exports ──────────────────────────────────────────

pub use backend::{BackendClient, ANALYZE_PATH, DEFAULT_BACKEND_URL};
pub use error::{ClientRequestFailure, RelayError, SubmitRejected, ThemeError};
pub use model::{AnalysisResult, Entity, UploadedFile};
pub use notify::{Notifier, Toast, ToastQueue, ToastVariant};
pub use render::{RenderContext, ResultsTable};
pub use theme::{Palette, Theme};
pub use upload::{AcceptFilter, UploadWidget};
pub use view::{AnalyzeClient, ResultsView, ViewState};
