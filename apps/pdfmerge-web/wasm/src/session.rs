//! Stateful merge session
//!
//! Wraps a [`MergeController`] so the whole select → merge → download/share
//! flow lives in Rust. JavaScript forwards DOM events and renders what the
//! getters return.

use crate::browser::{self, ObjectUrl};
use crate::validation::{inspect_pdf, PdfInfo};
use pdfmerge_core::{
    ErrorReport, ErrorReporter, FileEntry, FileId, MediaKind, MergeController, MergeOptions,
    NewFile, PdfMergeError, ResultSummary,
};
use serde::Serialize;
use std::collections::HashMap;
use wasm_bindgen::prelude::*;

/// Forwards error reports to an optional JS callback and the console.
///
/// The console line carries the underlying cause; the callback gets
/// `{ kind, message, detail }`.
#[derive(Default)]
pub struct JsErrorReporter {
    callback: Option<js_sys::Function>,
}

impl ErrorReporter for JsErrorReporter {
    fn report(&mut self, report: &ErrorReport) {
        #[cfg(target_arch = "wasm32")]
        web_sys::console::error_2(
            &JsValue::from_str(&report.message),
            &JsValue::from_str(&report.detail),
        );

        if let Some(ref callback) = self.callback {
            if let Ok(value) = serde_wasm_bindgen::to_value(report) {
                let _ = callback.call1(&JsValue::null(), &value);
            }
        }
    }
}

/// One row of the file list
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
struct FileRow {
    id: u32,
    name: String,
    media_type: String,
    size_bytes: usize,
    /// Known for parseable PDFs; images always contribute one page
    page_count: Option<u32>,
}

#[wasm_bindgen]
pub struct MergeSession {
    controller: MergeController<JsErrorReporter>,
    pdf_infos: HashMap<FileId, PdfInfo>,
    progress_callback: Option<js_sys::Function>,
    /// URL of the current result; replaced or revoked with it
    object_url: Option<ObjectUrl>,
}

#[wasm_bindgen]
impl MergeSession {
    /// `options` is a plain object with `normalize`, `naming`, `accept`
    /// and `clearAfterMerge`, all optional.
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue) -> Result<MergeSession, JsValue> {
        let options = if options.is_undefined() || options.is_null() {
            MergeOptions::default()
        } else {
            serde_wasm_bindgen::from_value(options)
                .map_err(|e| JsValue::from_str(&format!("Invalid options: {}", e)))?
        };
        Ok(Self::with_options(options))
    }

    /// Value for the file input's `accept` attribute
    #[wasm_bindgen(getter, js_name = acceptAttribute)]
    pub fn accept_attribute(&self) -> String {
        self.controller.options().accept.accept_attribute().to_string()
    }

    /// Callback signature: (current: number, total: number, name: string) => void
    #[wasm_bindgen(js_name = setProgressCallback)]
    pub fn set_progress_callback(&mut self, callback: js_sys::Function) {
        self.progress_callback = Some(callback);
    }

    /// Callback signature: ({ kind: string, message: string, detail: string }) => void
    #[wasm_bindgen(js_name = setErrorCallback)]
    pub fn set_error_callback(&mut self, callback: js_sys::Function) {
        self.controller.reporter_mut().callback = Some(callback);
    }

    /// Add a file from raw bytes. Returns its id, or nothing when the
    /// accept filter skipped it.
    #[wasm_bindgen(js_name = addFile)]
    pub fn add_file(&mut self, name: &str, media_type: &str, bytes: &[u8]) -> Option<u32> {
        self.add_file_internal(name, media_type, bytes.to_vec())
    }

    /// Read a picked `File` and add it.
    #[wasm_bindgen(js_name = addBrowserFile)]
    pub async fn add_browser_file(&mut self, file: web_sys::File) -> Result<Option<u32>, JsValue> {
        let bytes = browser::read_file_bytes(&file).await?;
        Ok(self.add_file_internal(&file.name(), &file.type_(), bytes))
    }

    #[wasm_bindgen(js_name = removeFile)]
    pub fn remove_file(&mut self, id: u32) {
        let id = FileId(id);
        self.controller.remove(id);
        self.pdf_infos.remove(&id);
    }

    /// Current list as `[{ id, name, mediaType, sizeBytes, pageCount }]`
    #[wasm_bindgen(js_name = getFiles)]
    pub fn get_files(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.rows())
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    #[wasm_bindgen(js_name = getFileCount)]
    pub fn get_file_count(&self) -> usize {
        self.controller.state().files().len()
    }

    /// Merge the list. Returns `{ fileName, mediaType, pageCount, sizeBytes }`.
    pub fn merge(&mut self) -> Result<JsValue, JsValue> {
        let summary = self.merge_internal().map_err(to_js)?;
        serde_wasm_bindgen::to_value(&SummaryJs::from(summary))
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    #[wasm_bindgen(js_name = hasResult)]
    pub fn has_result(&self) -> bool {
        self.controller.state().result().is_some()
    }

    /// Merged PDF bytes, for callers that handle the download themselves
    #[wasm_bindgen(js_name = getResultBytes)]
    pub fn get_result_bytes(&mut self) -> Result<js_sys::Uint8Array, JsValue> {
        let result = self.controller.download().map_err(to_js)?;
        Ok(js_sys::Uint8Array::from(result.bytes()))
    }

    /// Save the merged PDF through a temporary download link.
    pub fn download(&mut self) -> Result<(), JsValue> {
        let result = self.controller.download().map_err(to_js)?;
        let file_name = result.file_name().to_string();

        if self.object_url.is_none() {
            self.object_url = Some(ObjectUrl::from_bytes(result.bytes(), result.media_type())?);
        }
        match self.object_url.as_ref() {
            Some(url) => browser::trigger_download(url.as_str(), &file_name),
            None => Err(JsValue::from_str("No object URL")),
        }
    }

    /// Open the native share sheet with the merged PDF.
    ///
    /// Dismissing the sheet is not an error. Any other rejection goes to
    /// the error channel.
    pub async fn share(&mut self) -> Result<(), JsValue> {
        let mut share_data: Option<JsValue> = None;
        let outcome = self
            .controller
            .share(|payload| match browser::share_data(payload) {
                Ok(data) => {
                    let data = JsValue::from(data);
                    let supported = browser::can_share(&data);
                    share_data = supported.then_some(data);
                    supported
                }
                Err(_) => false,
            })
            .map(|_| ());
        outcome.map_err(to_js)?;

        let Some(data) = share_data else {
            return Err(to_js(
                self.controller.fail(PdfMergeError::ShareUnsupported),
            ));
        };
        match browser::share(&data).await {
            Ok(()) => Ok(()),
            Err(err) if browser::is_abort(&err) => {
                tracing::debug!("share sheet dismissed");
                Ok(())
            }
            Err(err) => {
                let cause = browser::describe_js_error(&err);
                Err(to_js(self.share_failed(cause)))
            }
        }
    }

    /// Message currently shown in the error channel
    #[wasm_bindgen(getter)]
    pub fn error(&self) -> Option<String> {
        self.controller.state().error().map(str::to_string)
    }

    #[wasm_bindgen(js_name = clearError)]
    pub fn clear_error(&mut self) {
        self.controller.clear_error();
    }

    /// Drop files, result and error; revokes the result URL.
    pub fn reset(&mut self) {
        self.controller.reset();
        self.pdf_infos.clear();
        self.object_url = None;
    }
}

impl MergeSession {
    pub fn with_options(options: MergeOptions) -> Self {
        Self {
            controller: MergeController::with_reporter(options, JsErrorReporter::default()),
            pdf_infos: HashMap::new(),
            progress_callback: None,
            object_url: None,
        }
    }

    fn add_file_internal(&mut self, name: &str, media_type: &str, bytes: Vec<u8>) -> Option<u32> {
        // Inspect before the bytes move into the state
        let info = match MediaKind::classify(media_type) {
            MediaKind::Pdf => inspect_pdf(&bytes).ok(),
            _ => None,
        };

        let id = self
            .controller
            .select(vec![NewFile::new(name, media_type, bytes)])
            .into_iter()
            .next()?;

        if let Some(info) = info {
            self.pdf_infos.insert(id, info);
        }
        tracing::debug!(id = id.0, name, "file added");
        Some(id.0)
    }

    fn share_failed(&mut self, cause: String) -> PdfMergeError {
        self.controller.fail(PdfMergeError::ShareFailed(cause))
    }

    fn rows(&self) -> Vec<FileRow> {
        self.controller
            .state()
            .entries()
            .into_iter()
            .map(|entry: FileEntry| {
                let page_count = match MediaKind::classify(&entry.media_type) {
                    MediaKind::Pdf => self.pdf_infos.get(&FileId(entry.id)).map(|i| i.page_count),
                    MediaKind::Image(_) => Some(1),
                    MediaKind::Unsupported => None,
                };
                FileRow {
                    id: entry.id,
                    name: entry.name,
                    media_type: entry.media_type,
                    size_bytes: entry.size_bytes,
                    page_count,
                }
            })
            .collect()
    }

    fn merge_internal(&mut self) -> Result<ResultSummary, PdfMergeError> {
        let callback = self.progress_callback.as_ref();
        let summary = self
            .controller
            .merge_with_progress(|current, total, name| {
                if let Some(callback) = callback {
                    let _ = callback.call3(
                        &JsValue::null(),
                        &JsValue::from(current as u32),
                        &JsValue::from(total as u32),
                        &JsValue::from_str(name),
                    );
                }
            })?
            .summary();

        // New result, new URL
        self.object_url = None;
        Ok(summary)
    }
}

/// camelCase view of [`ResultSummary`]
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SummaryJs {
    file_name: String,
    media_type: String,
    page_count: u32,
    size_bytes: usize,
}

impl From<ResultSummary> for SummaryJs {
    fn from(summary: ResultSummary) -> Self {
        Self {
            file_name: summary.file_name,
            media_type: summary.media_type,
            page_count: summary.page_count,
            size_bytes: summary.size_bytes,
        }
    }
}

fn to_js(err: PdfMergeError) -> JsValue {
    JsValue::from_str(&err.user_message())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{create_test_pdf, png_bytes};
    use lopdf::Document;
    use pdfmerge_core::error::SHARE_FAILED_MESSAGE;
    use pdfmerge_core::{AcceptFilter, OutputNaming};

    fn session() -> MergeSession {
        MergeSession::with_options(MergeOptions {
            naming: OutputNaming::Fixed,
            ..MergeOptions::default()
        })
    }

    #[test]
    fn test_new_session_is_empty() {
        let session = session();
        assert_eq!(session.get_file_count(), 0);
        assert!(!session.has_result());
        assert!(session.error().is_none());
        assert_eq!(session.accept_attribute(), "application/pdf,image/*");
    }

    #[test]
    fn test_add_file_assigns_sequential_ids() {
        let mut session = session();
        let a = session.add_file_internal("a.pdf", "application/pdf", create_test_pdf(2));
        let b = session.add_file_internal("b.pdf", "application/pdf", create_test_pdf(3));
        assert_eq!(a, Some(0));
        assert_eq!(b, Some(1));
        assert_eq!(session.get_file_count(), 2);
    }

    #[test]
    fn test_rows_carry_page_counts() {
        let mut session = session();
        session.add_file_internal("a.pdf", "application/pdf", create_test_pdf(4));
        session.add_file_internal("p.png", "image/png", png_bytes(3, 2));
        session.add_file_internal("broken.pdf", "application/pdf", b"%PDF-1.4".to_vec());

        let counts: Vec<Option<u32>> = session.rows().iter().map(|r| r.page_count).collect();
        assert_eq!(counts, vec![Some(4), Some(1), None]);
    }

    #[test]
    fn test_pdf_only_session_skips_images() {
        let mut session = MergeSession::with_options(MergeOptions {
            accept: AcceptFilter::PdfOnly,
            ..MergeOptions::default()
        });
        assert_eq!(session.accept_attribute(), "application/pdf");
        assert_eq!(
            session.add_file_internal("p.png", "image/png", png_bytes(1, 1)),
            None
        );
        assert_eq!(session.get_file_count(), 0);
    }

    #[test]
    fn test_remove_file_forgets_info() {
        let mut session = session();
        let id = session
            .add_file_internal("a.pdf", "application/pdf", create_test_pdf(1))
            .unwrap();
        session.remove_file(id);
        assert_eq!(session.get_file_count(), 0);
        assert!(session.pdf_infos.is_empty());
    }

    #[test]
    fn test_merge_mixed_inputs() {
        let mut session = session();
        session.add_file_internal("a.pdf", "application/pdf", create_test_pdf(2));
        session.add_file_internal("p.png", "image/png", png_bytes(40, 30));

        let summary = session.merge_internal().unwrap();
        assert_eq!(summary.file_name, "merged.pdf");
        assert_eq!(summary.page_count, 3);
        assert!(session.has_result());

        let result = session.controller.state().result().unwrap();
        let doc = Document::load_mem(result.bytes()).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
    }

    #[test]
    fn test_merge_empty_sets_error() {
        let mut session = session();
        let err = session.merge_internal().unwrap_err();
        assert!(matches!(err, PdfMergeError::EmptySelection));
        assert_eq!(session.error().as_deref(), Some("Select at least 1 file"));

        session.clear_error();
        assert!(session.error().is_none());
    }

    #[test]
    fn test_share_rejection_goes_to_error_channel() {
        let mut session = session();
        session.add_file_internal("a.pdf", "application/pdf", create_test_pdf(1));
        session.merge_internal().unwrap();

        let err = session.share_failed("NotAllowedError: Permission denied".into());
        assert!(matches!(err, PdfMergeError::ShareFailed(_)));
        assert_eq!(session.error().as_deref(), Some(SHARE_FAILED_MESSAGE));
        // The result stays available for download
        assert!(session.has_result());
    }

    #[test]
    fn test_ids_match_file_rows() {
        let mut session = session();
        let ids: Vec<u32> = (0..3)
            .filter_map(|i| {
                session.add_file_internal(&format!("{}.pdf", i), "application/pdf", create_test_pdf(1))
            })
            .collect();
        let rows: Vec<u32> = session.rows().iter().map(|r| r.id).collect();
        assert_eq!(rows, ids);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut session = session();
        session.add_file_internal("a.pdf", "application/pdf", create_test_pdf(1));
        session.merge_internal().unwrap();

        session.reset();
        assert_eq!(session.get_file_count(), 0);
        assert!(!session.has_result());
        assert!(session.pdf_infos.is_empty());
    }
}
