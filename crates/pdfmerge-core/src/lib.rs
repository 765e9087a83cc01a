//! Client-side PDF and image merging
//!
//! Concatenates PDFs and images, in selection order, into a single PDF
//! using lopdf. Images can be tone-adjusted before they are embedded.
//!
//! - [`merge::merge_files`]: the stateless pipeline
//! - [`controller::MergeController`]: selection, merge, download and share
//!   on top of the reducer in [`state`]
//! - [`command::process_command`]: one-shot JSON entry point

pub mod command;
pub mod controller;
pub mod error;
pub mod file;
pub mod merge;
pub mod normalize;
pub mod options;
pub mod output;
pub mod page_source;
pub mod state;

#[cfg(test)]
mod testing;

pub use command::{process_command, PdfCommand, ProcessMetrics, ProcessResult};
pub use controller::MergeController;
pub use error::{ErrorKind, ErrorReport, ErrorReporter, PdfMergeError};
pub use file::{FileId, ImageKind, MediaKind, NewFile, SelectedFile};
pub use merge::{merge_files, merge_files_with_progress, MergedBytes, MergedDocument};
pub use options::{AcceptFilter, MergeOptions, NormalizeMode, OutputNaming};
pub use output::{generate_file_name, MergeResult, ResultSummary, SharePayload};
pub use state::{Action, AppState, FileEntry};

/// Parse PDF bytes and return page count
pub fn get_page_count(bytes: &[u8]) -> Result<u32, PdfMergeError> {
    let doc =
        lopdf::Document::load_mem(bytes).map_err(|e| PdfMergeError::ParseError(e.to_string()))?;
    Ok(doc.get_pages().len() as u32)
}
