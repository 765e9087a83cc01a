//! Output packaging
//!
//! Names the merged bytes and describes them for download or sharing.

use crate::file::PDF_MEDIA_TYPE;
use crate::merge::MergedBytes;
use crate::options::OutputNaming;
use chrono::{DateTime, Local, TimeZone};
use rand_core::{OsRng, RngCore};
use serde::Serialize;

pub const FIXED_FILE_NAME: &str = "merged.pdf";

pub const SHARE_TITLE: &str = "Shared PDF";
pub const SHARE_TEXT: &str = "Merged PDF document";

const SUFFIX_MIN: u32 = 100_000;
const SUFFIX_SPAN: u32 = 900_000;

/// A finished merge, ready to hand to the user
#[derive(Debug, Clone)]
pub struct MergeResult {
    file_name: String,
    bytes: Vec<u8>,
    page_count: u32,
}

impl MergeResult {
    pub fn new(file_name: String, merged: MergedBytes) -> Self {
        Self {
            file_name,
            bytes: merged.bytes,
            page_count: merged.page_count,
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    pub fn media_type(&self) -> &'static str {
        PDF_MEDIA_TYPE
    }

    pub fn summary(&self) -> ResultSummary {
        ResultSummary {
            file_name: self.file_name.clone(),
            media_type: PDF_MEDIA_TYPE.to_string(),
            page_count: self.page_count,
            size_bytes: self.bytes.len(),
        }
    }
}

/// Serializable view of a [`MergeResult`] without the bytes
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ResultSummary {
    pub file_name: String,
    pub media_type: String,
    pub page_count: u32,
    pub size_bytes: usize,
}

/// What the platform share sheet receives
#[derive(Debug, Clone, Copy)]
pub struct SharePayload<'a> {
    pub title: &'static str,
    pub text: &'static str,
    pub file_name: &'a str,
    pub media_type: &'static str,
    pub bytes: &'a [u8],
}

impl<'a> SharePayload<'a> {
    pub fn for_result(result: &'a MergeResult) -> Self {
        Self {
            title: SHARE_TITLE,
            text: SHARE_TEXT,
            file_name: result.file_name(),
            media_type: result.media_type(),
            bytes: result.bytes(),
        }
    }
}

/// Wrap merged bytes under the configured name.
pub fn package(merged: MergedBytes, naming: OutputNaming) -> MergeResult {
    let file_name = match naming {
        OutputNaming::Fixed => FIXED_FILE_NAME.to_string(),
        OutputNaming::Generated => generate_file_name(&Local::now(), &mut OsRng),
    };
    MergeResult::new(file_name, merged)
}

/// `merged_<YYYYMMDD>_<hhmmss><mmm>_<rrrrrr>.pdf` from local time and a
/// random suffix in `[100000, 999999]`.
pub fn generate_file_name<Tz, R>(now: &DateTime<Tz>, rng: &mut R) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
    R: RngCore + ?Sized,
{
    let suffix = SUFFIX_MIN + rng.next_u32() % SUFFIX_SPAN;
    format!("merged_{}_{}.pdf", now.format("%Y%m%d_%H%M%S%3f"), suffix)
}
