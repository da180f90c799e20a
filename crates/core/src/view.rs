//! Results view orchestration.
//!
//! ```text
//!  Idle ──select──▶ Ready ──submit──▶ Analyzing
//!                    ▲  ▲                 │
//!                    │  └──── success ────┤  (result replaced, success toast)
//!                    └─────── failure ────┘  (result kept, error toast)
//! ```
//!
//! Submission is split into [`ResultsView::begin_submit`] and
//! [`ResultsView::complete`] so a front end can hold the view across the
//! network await; [`ResultsView::submit`] drives both around an
//! [`AnalyzeClient`].

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::{ClientRequestFailure, SubmitRejected};
use crate::model::{AnalysisResult, UploadedFile};
use crate::notify::{Notifier, Toast};

pub const SUCCESS_TITLE: &str = "Analysis Complete";
pub const SUCCESS_DESCRIPTION: &str = "The text has been successfully analyzed.";

/// Issues one analysis request to the relay.
#[async_trait]
pub trait AnalyzeClient: Send + Sync {
    async fn analyze(&self, file: &UploadedFile) -> Result<AnalysisResult, ClientRequestFailure>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    Idle,
    Ready,
    Analyzing,
}

/// In-memory view state: at most one file and one result.
#[derive(Debug, Clone, Default)]
pub struct ResultsView {
    file: Option<UploadedFile>,
    result: Option<AnalysisResult>,
    analyzing: bool,
}

impl ResultsView {
    pub fn new() -> Self {
        Self::default()
    }

    /// A view already showing `result`, e.g. restored from the page.
    pub fn with_result(result: Option<AnalysisResult>) -> Self {
        ResultsView {
            result,
            ..Self::default()
        }
    }

    pub fn state(&self) -> ViewState {
        if self.analyzing {
            ViewState::Analyzing
        } else if self.file.is_some() {
            ViewState::Ready
        } else {
            ViewState::Idle
        }
    }

    pub fn file(&self) -> Option<&UploadedFile> {
        self.file.as_ref()
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    /// Replace the selected file. A request already in flight keeps the
    /// file it was started with.
    pub fn select_file(&mut self, file: UploadedFile) {
        debug!(filename = %file.name, bytes = file.len(), "file selected");
        self.file = Some(file);
    }

    pub fn can_submit(&self) -> bool {
        self.state() == ViewState::Ready
    }

    /// Enter `Analyzing` and return the file to send.
    pub fn begin_submit(&mut self) -> Result<UploadedFile, SubmitRejected> {
        if self.analyzing {
            return Err(SubmitRejected::AlreadyAnalyzing);
        }
        let file = self.file.clone().ok_or(SubmitRejected::NoFileSelected)?;
        self.analyzing = true;
        Ok(file)
    }

    /// Apply the outcome of the in-flight request and leave `Analyzing`.
    /// A failure never touches the stored result.
    pub fn complete<N>(
        &mut self,
        outcome: Result<AnalysisResult, ClientRequestFailure>,
        notifier: &mut N,
    ) where
        N: Notifier + ?Sized,
    {
        self.analyzing = false;
        match outcome {
            Ok(result) => {
                info!(
                    openai = result.openai_results.len(),
                    huggingface = result.huggingface_results.len(),
                    "analysis complete"
                );
                self.result = Some(result);
                notifier.notify(Toast::success(SUCCESS_TITLE, SUCCESS_DESCRIPTION));
            }
            Err(failure) => {
                warn!(error = %failure, "analysis failed");
                notifier.notify(Toast::error(failure.message));
            }
        }
    }

    /// Run one full submission. Rejected submits issue no request and
    /// raise no notification.
    pub async fn submit<C, N>(&mut self, client: &C, notifier: &mut N) -> Result<(), SubmitRejected>
    where
        C: AnalyzeClient + ?Sized,
        N: Notifier + Send + ?Sized,
    {
        let file = self.begin_submit()?;
        let outcome = client.analyze(&file).await;
        self.complete(outcome, notifier);
        Ok(())
    }
}
