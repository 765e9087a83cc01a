use crate::controller::MergeController;
use crate::error::PdfMergeError;
use crate::file::NewFile;
use crate::options::MergeOptions;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum PdfCommand {
    Merge {
        files: Vec<CommandFile>,
        #[serde(default)]
        options: MergeOptions,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommandFile {
    pub name: String,
    pub media_type: String,
    /// Base64-encoded file contents
    pub data: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessResult {
    pub success: bool,
    /// Base64-encoded PDF data
    pub data: Option<String>,
    pub file_name: Option<String>,
    /// User-facing message
    pub error: Option<String>,
    /// Underlying cause, for logs
    pub detail: Option<String>,
    pub metrics: Option<ProcessMetrics>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessMetrics {
    pub input_size_bytes: usize,
    pub output_size_bytes: usize,
    pub page_count: u32,
    pub processing_time_ms: u64,
}

impl ProcessResult {
    fn failure(err: &PdfMergeError) -> Self {
        Self {
            success: false,
            data: None,
            file_name: None,
            error: Some(err.user_message()),
            detail: Some(err.to_string()),
            metrics: None,
        }
    }
}

/// Run a JSON command end to end without keeping any session state.
pub fn process_command(json: &str) -> ProcessResult {
    match run(json) {
        Ok(result) => result,
        Err(err) => {
            tracing::error!(error = %err, "command failed");
            ProcessResult::failure(&err)
        }
    }
}

fn run(json: &str) -> Result<ProcessResult, PdfMergeError> {
    let command: PdfCommand =
        serde_json::from_str(json).map_err(|e| PdfMergeError::SerializationError(e.to_string()))?;

    match command {
        PdfCommand::Merge { files, options } => {
            let started = chrono::Utc::now();

            let files = files
                .into_iter()
                .map(|f| {
                    let bytes = STANDARD.decode(f.data.as_bytes()).map_err(|e| {
                        PdfMergeError::SerializationError(format!("{}: {}", f.name, e))
                    })?;
                    Ok(NewFile::new(f.name, f.media_type, bytes))
                })
                .collect::<Result<Vec<_>, PdfMergeError>>()?;
            let input_size_bytes = files.iter().map(|f| f.bytes.len()).sum();

            let mut controller = MergeController::new(options);
            controller.select(files);
            let result = controller.merge()?;

            let elapsed = chrono::Utc::now() - started;
            Ok(ProcessResult {
                success: true,
                data: Some(STANDARD.encode(result.bytes())),
                file_name: Some(result.file_name().to_string()),
                error: None,
                detail: None,
                metrics: Some(ProcessMetrics {
                    input_size_bytes,
                    output_size_bytes: result.bytes().len(),
                    page_count: result.page_count(),
                    processing_time_ms: elapsed.num_milliseconds().max(0) as u64,
                }),
            })
        }
    }
}
