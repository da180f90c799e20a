//! Page routes. The browser posts its form back to `/`; the handler runs
//! the results view against the in-process relay and renders the page.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::response::Html;
use nerlens_core::render::{render_page, RenderContext};
use nerlens_core::{
    AnalysisResult, AnalyzeClient, ClientRequestFailure, Notifier, ResultsView, Toast, ToastQueue,
    UploadWidget, UploadedFile,
};
use tracing::debug;

use super::handlers::{fill_upload_form, UploadForm};
use super::state::AppState;

pub(crate) const PAGE_TITLE: &str = "NER Lens";

/// Calls the relay directly instead of looping back over HTTP.
struct LocalRelay<'a> {
    state: &'a AppState,
}

#[async_trait]
impl AnalyzeClient for LocalRelay<'_> {
    async fn analyze(&self, file: &UploadedFile) -> Result<AnalysisResult, ClientRequestFailure> {
        let body = self.state.relay(file).await?;
        serde_json::from_value(body)
            .map_err(|e| ClientRequestFailure::transport(format!("unexpected response shape: {}", e)))
    }
}

fn render(state: &AppState, widget: &UploadWidget, view: &ResultsView, toasts: &[Toast]) -> Html<String> {
    let ctx = RenderContext {
        title: PAGE_TITLE,
        theme: &state.theme,
        toasts,
    };
    Html(render_page(&ctx, widget, view))
}

/// GET /
pub(crate) async fn handle_index(State(state): State<Arc<AppState>>) -> Html<String> {
    render(&state, &UploadWidget::new(), &ResultsView::new(), &[])
}

/// POST /
///
/// Rebuilds the view from the hidden `previous` field, offers the upload
/// to the widget, and submits once. A failed or skipped analysis renders
/// the previous tables unchanged.
pub(crate) async fn handle_page_submit(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Html<String> {
    let mut toasts = ToastQueue::new();

    // A broken form is not analyzed, but the result it carried is kept.
    let mut form = UploadForm::default();
    if let Err(e) = fill_upload_form(multipart, &mut form).await {
        toasts.notify(Toast::error(e.to_string()));
        form.file = None;
    }

    let previous = form.previous.as_deref().and_then(|json| {
        serde_json::from_str::<AnalysisResult>(json)
            .map_err(|e| debug!(error = %e, "ignoring unreadable previous result"))
            .ok()
    });

    let mut view = ResultsView::with_result(previous);
    let mut widget = UploadWidget::new();

    if let Some(file) = form.file {
        let name = file.name.clone();
        if !widget.on_drop(vec![file], |f| view.select_file(f)) {
            toasts.notify(Toast::error(format!(
                "'{}' is not a plain-text (.txt) file",
                name
            )));
        }
    }

    let client = LocalRelay { state: &state };
    if let Err(rejected) = view.submit(&client, &mut toasts).await {
        debug!(reason = %rejected, "page submit skipped");
    }

    render(&state, &widget, &view, toasts.toasts())
}
