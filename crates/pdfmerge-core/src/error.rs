use serde::Serialize;
use thiserror::Error;

/// Message shown for any failure inside the merge pipeline.
pub const MERGE_FAILED_MESSAGE: &str = "An error occurred while merging the files";

/// Message shown when the platform share sheet fails for a reason other
/// than the user dismissing it.
pub const SHARE_FAILED_MESSAGE: &str = "The PDF could not be shared";

#[derive(Error, Debug)]
pub enum PdfMergeError {
    #[error("Select at least 1 file")]
    EmptySelection,

    #[error("No PDF was generated for download")]
    NoResult,

    #[error("Failed to parse PDF: {0}")]
    ParseError(String),

    #[error("Failed to decode image: {0}")]
    DecodeError(String),

    #[error("Failed to embed image: {0}")]
    EmbedError(String),

    #[error("Failed to encode image: {0}")]
    EncodeError(String),

    #[error("Failed to save merged PDF: {0}")]
    SaveError(String),

    #[error("Sharing is not supported on this device")]
    ShareUnsupported,

    #[error("Share failed: {0}")]
    ShareFailed(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Coarse classification used by the error channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Validation,
    Decode,
    Encode,
    Capability,
}

impl PdfMergeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PdfMergeError::EmptySelection | PdfMergeError::NoResult => ErrorKind::Validation,
            PdfMergeError::ParseError(_)
            | PdfMergeError::DecodeError(_)
            | PdfMergeError::EmbedError(_)
            | PdfMergeError::SerializationError(_) => ErrorKind::Decode,
            PdfMergeError::EncodeError(_) | PdfMergeError::SaveError(_) => ErrorKind::Encode,
            PdfMergeError::ShareUnsupported | PdfMergeError::ShareFailed(_) => {
                ErrorKind::Capability
            }
        }
    }

    /// The string a user sees for this error.
    ///
    /// Validation and capability errors are shown as-is; anything raised by
    /// the pipeline collapses into one generic message.
    pub fn user_message(&self) -> String {
        if let PdfMergeError::ShareFailed(_) = self {
            return SHARE_FAILED_MESSAGE.to_string();
        }
        match self.kind() {
            ErrorKind::Validation | ErrorKind::Capability => self.to_string(),
            ErrorKind::Decode | ErrorKind::Encode => MERGE_FAILED_MESSAGE.to_string(),
        }
    }
}

/// What the error channel receives: a kind, the user-facing text and the
/// underlying cause for logs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
    pub detail: String,
}

impl From<&PdfMergeError> for ErrorReport {
    fn from(err: &PdfMergeError) -> Self {
        Self {
            kind: err.kind(),
            message: err.user_message(),
            detail: err.to_string(),
        }
    }
}

/// Single sink for every user-visible error.
///
/// The controller calls this uniformly; rendering (inline banner, alert)
/// is left to the implementor.
pub trait ErrorReporter {
    fn report(&mut self, report: &ErrorReport);
}

impl ErrorReporter for () {
    fn report(&mut self, _report: &ErrorReport) {}
}

impl ErrorReporter for Vec<ErrorReport> {
    fn report(&mut self, report: &ErrorReport) {
        self.push(report.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages_are_shown_verbatim() {
        assert_eq!(
            PdfMergeError::EmptySelection.user_message(),
            "Select at least 1 file"
        );
        assert_eq!(
            PdfMergeError::NoResult.user_message(),
            "No PDF was generated for download"
        );
    }

    #[test]
    fn test_pipeline_errors_collapse_to_generic_message() {
        let err = PdfMergeError::ParseError("xref table missing".into());
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert_eq!(err.user_message(), MERGE_FAILED_MESSAGE);

        let err = PdfMergeError::EncodeError("empty output".into());
        assert_eq!(err.kind(), ErrorKind::Encode);
        assert_eq!(err.user_message(), MERGE_FAILED_MESSAGE);
    }

    #[test]
    fn test_share_unsupported_is_capability() {
        let report = ErrorReport::from(&PdfMergeError::ShareUnsupported);
        assert_eq!(report.kind, ErrorKind::Capability);
        assert_eq!(report.message, "Sharing is not supported on this device");
    }

    #[test]
    fn test_report_keeps_underlying_cause() {
        let report = ErrorReport::from(&PdfMergeError::ParseError("Invalid file header".into()));
        assert_eq!(report.message, MERGE_FAILED_MESSAGE);
        assert_eq!(report.detail, "Failed to parse PDF: Invalid file header");
    }

    #[test]
    fn test_share_failure_hides_platform_error() {
        let err = PdfMergeError::ShareFailed("NotAllowedError: permission denied".into());
        let report = ErrorReport::from(&err);
        assert_eq!(report.kind, ErrorKind::Capability);
        assert_eq!(report.message, SHARE_FAILED_MESSAGE);
        assert!(report.detail.contains("NotAllowedError"));
    }
}
