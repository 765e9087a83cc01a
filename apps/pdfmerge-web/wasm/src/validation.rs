//! PDF inspection for the file list
//!
//! Gives the UI a page count and a few header facts for a picked PDF.
//! Nothing here decides whether a file may be merged; that is left to the
//! pipeline, which reports failures through the session's error channel.

use lopdf::{Dictionary, Document};
use pdfmerge_core::PdfMergeError;
use serde::Serialize;

/// Facts shown next to a PDF entry
#[derive(Debug, Clone, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PdfInfo {
    pub page_count: u32,
    /// Header version, e.g. "1.7"
    pub version: String,
    pub encrypted: bool,
    pub size_bytes: usize,
    pub title: Option<String>,
    pub author: Option<String>,
}

/// Parse `bytes` and collect [`PdfInfo`].
pub fn inspect_pdf(bytes: &[u8]) -> Result<PdfInfo, PdfMergeError> {
    check_header(bytes)?;

    let document =
        Document::load_mem(bytes).map_err(|e| PdfMergeError::ParseError(e.to_string()))?;
    let info = info_dictionary(&document);

    Ok(PdfInfo {
        page_count: document.get_pages().len() as u32,
        version: header_version(bytes),
        encrypted: document.is_encrypted(),
        size_bytes: bytes.len(),
        title: info.and_then(|dict| text_entry(dict, b"Title")),
        author: info.and_then(|dict| text_entry(dict, b"Author")),
    })
}

/// Header and `%%EOF` check without parsing the object graph
pub fn quick_validate(bytes: &[u8]) -> Result<(), PdfMergeError> {
    check_header(bytes)?;

    let tail = &bytes[bytes.len().saturating_sub(1024)..];
    if !tail.windows(5).any(|w| w == b"%%EOF") {
        return Err(PdfMergeError::ParseError(
            "PDF appears truncated (missing %%EOF marker)".into(),
        ));
    }
    Ok(())
}

fn check_header(bytes: &[u8]) -> Result<(), PdfMergeError> {
    if bytes.len() < 8 {
        return Err(PdfMergeError::ParseError(
            "File too small to be a valid PDF".into(),
        ));
    }
    if !bytes.starts_with(b"%PDF-") {
        return Err(PdfMergeError::ParseError(
            "Not a valid PDF file (missing %PDF- header)".into(),
        ));
    }
    Ok(())
}

/// `%PDF-1.7` → `"1.7"`
fn header_version(bytes: &[u8]) -> String {
    bytes
        .get(5..8)
        .and_then(|v| std::str::from_utf8(v).ok())
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| "1.4".to_string())
}

fn info_dictionary(document: &Document) -> Option<&Dictionary> {
    let id = document.trailer.get(b"Info").ok()?.as_reference().ok()?;
    document.get_dictionary(id).ok()
}

fn text_entry(dict: &Dictionary, key: &[u8]) -> Option<String> {
    let raw = dict.get(key).ok()?.as_str().ok()?;
    let text = String::from_utf8_lossy(raw).into_owned();
    (!text.is_empty()).then_some(text)
}
