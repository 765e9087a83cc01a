//! WASM bindings for merging PDFs and images in the browser
//!
//! All session state lives in Rust; JavaScript handles DOM events and
//! renders what the session returns.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { MergeSession } from './pkg/pdfmerge_wasm.js';
//!
//! await init();
//!
//! const session = new MergeSession({ normalize: "contrast", naming: "generated" });
//! input.accept = session.acceptAttribute;
//! session.setErrorCallback(({ kind, message }) => showError(message));
//! for (const file of input.files) await session.addBrowserFile(file);
//!
//! const summary = session.merge();   // { fileName, pageCount, ... }
//! session.download();
//! await session.share();
//! ```

pub mod browser;
pub mod session;
pub mod validation;

#[cfg(test)]
mod test_support;

use wasm_bindgen::prelude::*;

pub use session::{JsErrorReporter, MergeSession};
pub use validation::PdfInfo;

/// Called automatically by wasm-bindgen
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Header and trailer check without a full parse
#[wasm_bindgen]
pub fn quick_validate(bytes: &[u8]) -> Result<(), JsValue> {
    validation::quick_validate(bytes).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Page count, version and metadata for one PDF
#[wasm_bindgen]
pub fn get_pdf_info(bytes: &[u8]) -> Result<JsValue, JsValue> {
    let info = validation::inspect_pdf(bytes).map_err(|e| JsValue::from_str(&e.to_string()))?;

    serde_wasm_bindgen::to_value(&info)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

#[wasm_bindgen]
pub fn get_page_count(bytes: &[u8]) -> Result<u32, JsValue> {
    pdfmerge_core::get_page_count(bytes).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// One-shot merge from a JSON command; returns the JSON result
#[wasm_bindgen]
pub fn process_command(json: &str) -> Result<String, JsValue> {
    let result = pdfmerge_core::process_command(json);
    serde_json::to_string(&result)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// Format bytes as human-readable string
#[wasm_bindgen]
pub fn format_bytes(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    if bytes < KB {
        format!("{} B", bytes)
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    }
}
