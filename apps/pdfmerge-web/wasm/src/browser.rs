//! Browser glue: object URLs, download links, file reads and the share sheet
//!
//! Every function here calls into the DOM and only works in a browser.

use js_sys::{Array, Function, Object, Promise, Reflect, Uint8Array};
use pdfmerge_core::SharePayload;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Blob, BlobPropertyBag, File, FilePropertyBag, HtmlAnchorElement, Url};

/// An object URL that is revoked when dropped
pub struct ObjectUrl {
    url: String,
}

impl ObjectUrl {
    pub fn from_bytes(bytes: &[u8], media_type: &str) -> Result<Self, JsValue> {
        let options = BlobPropertyBag::new();
        options.set_type(media_type);
        let blob = Blob::new_with_u8_array_sequence_and_options(&byte_parts(bytes), &options)?;
        let url = Url::create_object_url_with_blob(&blob)?;
        Ok(Self { url })
    }

    pub fn as_str(&self) -> &str {
        &self.url
    }
}

impl Drop for ObjectUrl {
    fn drop(&mut self) {
        let _ = Url::revoke_object_url(&self.url);
    }
}

fn byte_parts(bytes: &[u8]) -> Array {
    Array::of1(&Uint8Array::from(bytes))
}

/// Click a temporary `<a download>` pointing at `url`.
pub fn trigger_download(url: &str, file_name: &str) -> Result<(), JsValue> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("No document available"))?;

    let anchor: HtmlAnchorElement = document.create_element("a")?.dyn_into()?;
    anchor.set_href(url);
    anchor.set_download(file_name);
    anchor.click();
    Ok(())
}

/// Read a picked `File` into memory.
pub async fn read_file_bytes(file: &File) -> Result<Vec<u8>, JsValue> {
    let buffer = JsFuture::from(file.array_buffer()).await?;
    Ok(Uint8Array::new(&buffer).to_vec())
}

/// Build the `ShareData` object: title, text and the PDF as a `File`.
pub fn share_data(payload: &SharePayload<'_>) -> Result<Object, JsValue> {
    let options = FilePropertyBag::new();
    options.set_type(payload.media_type);
    let file = File::new_with_u8_array_sequence_and_options(
        &byte_parts(payload.bytes),
        payload.file_name,
        &options,
    )?;

    let data = Object::new();
    Reflect::set(&data, &"title".into(), &payload.title.into())?;
    Reflect::set(&data, &"text".into(), &payload.text.into())?;
    Reflect::set(&data, &"files".into(), &Array::of1(&file))?;
    Ok(data)
}

/// `navigator.canShare(data)`, false when the method is missing
pub fn can_share(data: &JsValue) -> bool {
    match web_sys::window() {
        Some(window) => ask_can_share(&window.navigator(), data),
        None => false,
    }
}

fn ask_can_share(navigator: &JsValue, data: &JsValue) -> bool {
    Reflect::get(navigator, &"canShare".into())
        .ok()
        .and_then(|f| f.dyn_into::<Function>().ok())
        .and_then(|f| f.call1(navigator, data).ok())
        .is_some_and(|answer| answer.is_truthy())
}

/// `await navigator.share(data)`
pub async fn share(data: &JsValue) -> Result<(), JsValue> {
    let navigator = web_sys::window()
        .ok_or_else(|| JsValue::from_str("No window available"))?
        .navigator();

    let share: Function = Reflect::get(&navigator, &"share".into())?.dyn_into()?;
    let promise: Promise = share.call1(&navigator, data)?.dyn_into()?;
    JsFuture::from(promise).await?;
    Ok(())
}

/// The user closed the share sheet
pub fn is_abort(err: &JsValue) -> bool {
    Reflect::get(err, &"name".into())
        .ok()
        .and_then(|name| name.as_string())
        .is_some_and(|name| name == "AbortError")
}

/// `Name: message` for JS errors and DOMExceptions, the raw value otherwise
pub fn describe_js_error(err: &JsValue) -> String {
    let field = |key: &str| {
        Reflect::get(err, &key.into())
            .ok()
            .and_then(|v| v.as_string())
    };
    match (field("name"), field("message")) {
        (Some(name), Some(message)) => format!("{}: {}", name, message),
        _ => err.as_string().unwrap_or_else(|| format!("{:?}", err)),
    }
}
