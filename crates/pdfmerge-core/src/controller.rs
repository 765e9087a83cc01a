//! Top-level controller
//!
//! Owns the [`AppState`], runs the select → merge → download/share flow and
//! sends every failure through the same [`ErrorReporter`].

use crate::error::{ErrorReport, ErrorReporter, PdfMergeError};
use crate::file::{FileId, NewFile};
use crate::merge::merge_files_with_progress;
use crate::options::MergeOptions;
use crate::output::{package, MergeResult, SharePayload};
use crate::state::{Action, AppState};
use tracing::{error, info, warn};

pub struct MergeController<R: ErrorReporter = ()> {
    state: AppState,
    options: MergeOptions,
    reporter: R,
}

impl MergeController<()> {
    pub fn new(options: MergeOptions) -> Self {
        Self::with_reporter(options, ())
    }
}

impl<R: ErrorReporter> MergeController<R> {
    pub fn with_reporter(options: MergeOptions, reporter: R) -> Self {
        Self {
            state: AppState::new(),
            options,
            reporter,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn options(&self) -> &MergeOptions {
        &self.options
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub fn reporter_mut(&mut self) -> &mut R {
        &mut self.reporter
    }

    fn dispatch(&mut self, action: Action) {
        let state = std::mem::take(&mut self.state);
        self.state = state.apply(action);
    }

    /// Add picked files; types the accept filter rejects are skipped.
    ///
    /// Returns the ids given to the accepted files, in order.
    pub fn select(&mut self, files: Vec<NewFile>) -> Vec<FileId> {
        let accept = self.options.accept;
        let (accepted, rejected): (Vec<NewFile>, Vec<NewFile>) = files
            .into_iter()
            .partition(|f| accept.accepts(&f.media_type));

        for file in &rejected {
            warn!(
                name = %file.name,
                media_type = %file.media_type,
                "skipping file not allowed by accept filter"
            );
        }

        let ids = self.state.upcoming_ids(accepted.len());
        self.dispatch(Action::AddFiles(accepted));
        ids
    }

    pub fn remove(&mut self, id: FileId) {
        self.dispatch(Action::RemoveFile(id));
    }

    pub fn clear_error(&mut self) {
        self.dispatch(Action::ClearError);
    }

    pub fn reset(&mut self) {
        self.dispatch(Action::Reset);
    }

    /// Merge the current selection and store the packaged result.
    pub fn merge(&mut self) -> Result<&MergeResult, PdfMergeError> {
        self.merge_with_progress(|_, _, _| {})
    }

    pub fn merge_with_progress<F>(&mut self, on_progress: F) -> Result<&MergeResult, PdfMergeError>
    where
        F: FnMut(usize, usize, &str),
    {
        if self.state.files().is_empty() {
            return Err(self.fail(PdfMergeError::EmptySelection));
        }

        let merged =
            match merge_files_with_progress(self.state.files(), self.options.normalize, on_progress)
            {
                Ok(merged) => merged,
                Err(err) => {
                    error!(error = %err, "merge failed");
                    return Err(self.fail(err));
                }
            };

        let result = package(merged, self.options.naming);
        info!(file_name = result.file_name(), "merge result ready");
        self.dispatch(Action::MergeSucceeded {
            result,
            clear_files: self.options.clear_after_merge,
        });
        self.state.result().ok_or(PdfMergeError::NoResult)
    }

    /// The result to download, or `NoResult` before any successful merge.
    pub fn download(&mut self) -> Result<&MergeResult, PdfMergeError> {
        if self.state.result().is_none() {
            return Err(self.fail(PdfMergeError::NoResult));
        }
        self.state.result().ok_or(PdfMergeError::NoResult)
    }

    /// Build the share payload if `can_share` says the platform accepts it.
    pub fn share<F>(&mut self, can_share: F) -> Result<SharePayload<'_>, PdfMergeError>
    where
        F: FnOnce(&SharePayload<'_>) -> bool,
    {
        if self.state.result().is_none() {
            return Err(self.fail(PdfMergeError::NoResult));
        }
        let supported = self
            .state
            .result()
            .is_some_and(|result| can_share(&SharePayload::for_result(result)));
        if !supported {
            return Err(self.fail(PdfMergeError::ShareUnsupported));
        }
        self.state
            .result()
            .map(SharePayload::for_result)
            .ok_or(PdfMergeError::NoResult)
    }

    /// Report `err` to the user and hand it back to the caller.
    pub fn fail(&mut self, err: PdfMergeError) -> PdfMergeError {
        let report = ErrorReport::from(&err);
        self.reporter.report(&report);
        self.dispatch(Action::Failed(report.message));
        err
    }
}
