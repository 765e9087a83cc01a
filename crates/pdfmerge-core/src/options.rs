//! Merge configuration
//!
//! Every field has a default so a partial JSON object (or `{}`) is valid.

use crate::error::PdfMergeError;
use crate::file::{MediaKind, PDF_MEDIA_TYPE};
use serde::{Deserialize, Serialize};

/// Tone adjustment applied to image inputs before embedding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizeMode {
    /// Embed images exactly as selected
    None,
    /// Grayscale "scanned" look with a light contrast stretch
    #[default]
    Contrast,
    /// Channel-wise brightness boost, always re-encoded as JPEG
    Brightness,
}

/// How the output file is named
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputNaming {
    /// Always `merged.pdf`
    Fixed,
    /// Timestamp plus random suffix
    #[default]
    Generated,
}

/// Which media types the file picker offers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AcceptFilter {
    PdfOnly,
    #[default]
    PdfAndImages,
}

impl AcceptFilter {
    /// Value for an `<input type="file" accept=...>` attribute
    pub fn accept_attribute(self) -> &'static str {
        match self {
            AcceptFilter::PdfOnly => PDF_MEDIA_TYPE,
            AcceptFilter::PdfAndImages => "application/pdf,image/*",
        }
    }

    pub fn accepts(self, media_type: &str) -> bool {
        match (self, MediaKind::classify(media_type)) {
            (_, MediaKind::Pdf) => true,
            (AcceptFilter::PdfAndImages, MediaKind::Image(_)) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MergeOptions {
    pub normalize: NormalizeMode,
    pub naming: OutputNaming,
    pub accept: AcceptFilter,
    /// Drop the selection once a merge succeeds
    pub clear_after_merge: bool,
}

impl MergeOptions {
    pub fn from_json(json: &str) -> Result<Self, PdfMergeError> {
        serde_json::from_str(json).map_err(|e| PdfMergeError::SerializationError(e.to_string()))
    }
}
