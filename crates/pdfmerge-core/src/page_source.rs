//! Page source adapter
//!
//! Turns one selected file into the pages it contributes to the merged
//! document:
//! - `application/pdf`: every page of the document, in order
//! - `image/*`: a single page exactly the size of the image
//! - anything else: nothing

use crate::error::PdfMergeError;
use crate::file::{ImageKind, MediaKind, SelectedFile};
use crate::normalize::{normalize_image, NormalizedImage};
use crate::options::NormalizeMode;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::codecs::jpeg::JpegDecoder;
use image::{ImageDecoder, ImageFormat};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::io::{Cursor, Write};
use tracing::debug;

/// Page attributes a page may inherit from its ancestors in the page tree
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guards against cyclic `Parent` chains in malformed files
const MAX_TREE_DEPTH: usize = 64;

/// Pages produced for one input file
#[derive(Debug)]
pub enum SourcePages {
    Document(ImportedDocument),
    Image(EmbeddedImage),
    Empty,
}

impl SourcePages {
    pub fn page_count(&self) -> usize {
        match self {
            SourcePages::Document(doc) => doc.pages.len(),
            SourcePages::Image(_) => 1,
            SourcePages::Empty => 0,
        }
    }
}

/// A parsed source PDF and its page ids in document order
#[derive(Debug)]
pub struct ImportedDocument {
    pub(crate) document: Document,
    pub(crate) pages: Vec<ObjectId>,
}

impl ImportedDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// An image XObject ready to be placed on a page of its own size
#[derive(Debug)]
pub struct EmbeddedImage {
    pub width: u32,
    pub height: u32,
    pub(crate) image: Stream,
    pub(crate) soft_mask: Option<Stream>,
}

/// Produce the pages `file` contributes, normalizing images with `mode`.
pub fn load_pages(file: &SelectedFile, mode: NormalizeMode) -> Result<SourcePages, PdfMergeError> {
    match file.kind() {
        MediaKind::Pdf => Ok(SourcePages::Document(import_pdf(file.bytes())?)),
        MediaKind::Image(declared) => {
            let NormalizedImage { bytes, kind } = normalize_image(file.bytes(), declared, mode)?;
            Ok(SourcePages::Image(embed_image(&bytes, kind)?))
        }
        MediaKind::Unsupported => {
            debug!(
                name = file.name(),
                media_type = file.media_type(),
                "no pages for media type"
            );
            Ok(SourcePages::Empty)
        }
    }
}

/// Parse a PDF and collect its pages.
///
/// Inherited attributes are copied down onto each page so a page renders
/// the same once it hangs off a different page tree.
pub fn import_pdf(bytes: &[u8]) -> Result<ImportedDocument, PdfMergeError> {
    let mut document =
        Document::load_mem(bytes).map_err(|e| PdfMergeError::ParseError(e.to_string()))?;

    if document.is_encrypted() {
        return Err(PdfMergeError::ParseError(
            "encrypted PDFs are not supported".into(),
        ));
    }

    let pages: Vec<ObjectId> = document.get_pages().into_values().collect();
    for &page_id in &pages {
        materialize_inherited(&mut document, page_id)?;
    }

    Ok(ImportedDocument { document, pages })
}

fn materialize_inherited(doc: &mut Document, page_id: ObjectId) -> Result<(), PdfMergeError> {
    let page = doc
        .get_dictionary(page_id)
        .map_err(|e| PdfMergeError::ParseError(format!("page {:?}: {}", page_id, e)))?;

    let missing: Vec<(&[u8], Object)> = INHERITABLE_KEYS
        .iter()
        .filter(|key| !page.has(key))
        .filter_map(|&key| find_inherited(doc, page, key).map(|value| (key, value.clone())))
        .collect();

    if missing.is_empty() {
        return Ok(());
    }

    let page = doc
        .get_dictionary_mut(page_id)
        .map_err(|e| PdfMergeError::ParseError(format!("page {:?}: {}", page_id, e)))?;
    for (key, value) in missing {
        page.set(key.to_vec(), value);
    }
    Ok(())
}

fn find_inherited<'a>(doc: &'a Document, page: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();

    for _ in 0..MAX_TREE_DEPTH {
        let node = doc.get_dictionary(parent?).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value);
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }
    None
}

/// Wrap encoded image bytes as a PDF image XObject.
pub fn embed_image(bytes: &[u8], kind: ImageKind) -> Result<EmbeddedImage, PdfMergeError> {
    match kind {
        ImageKind::Jpeg => embed_jpeg(bytes),
        ImageKind::Png => embed_png(bytes),
    }
}

/// JPEG data goes into the PDF untouched as a DCTDecode stream
fn embed_jpeg(bytes: &[u8]) -> Result<EmbeddedImage, PdfMergeError> {
    let decoder = JpegDecoder::new(Cursor::new(bytes))
        .map_err(|e| PdfMergeError::EmbedError(format!("invalid JPEG: {}", e)))?;
    let (width, height) = decoder.dimensions();

    let components = jpeg_components(bytes)
        .ok_or_else(|| PdfMergeError::EmbedError("JPEG has no frame header".into()))?;

    let (color_space, decode): (&[u8], Option<Vec<Object>>) = match components {
        1 => (b"DeviceGray", None),
        3 => (b"DeviceRGB", None),
        // Adobe CMYK JPEGs store inverted values
        4 => (
            b"DeviceCMYK",
            Some([1, 0, 1, 0, 1, 0, 1, 0].map(Object::Integer).to_vec()),
        ),
        n => {
            return Err(PdfMergeError::EmbedError(format!(
                "unsupported JPEG component count: {}",
                n
            )))
        }
    };

    let mut dict = image_dictionary(width, height, color_space);
    dict.set("Filter", Object::Name(b"DCTDecode".to_vec()));
    if let Some(decode) = decode {
        dict.set("Decode", Object::Array(decode));
    }

    Ok(EmbeddedImage {
        width,
        height,
        image: Stream::new(dict, bytes.to_vec()).with_compression(false),
        soft_mask: None,
    })
}

/// Read the component count from the first SOF marker.
fn jpeg_components(bytes: &[u8]) -> Option<u8> {
    if !bytes.starts_with(&[0xFF, 0xD8]) {
        return None;
    }

    let mut pos = 2;
    while pos + 4 <= bytes.len() {
        if bytes[pos] != 0xFF {
            return None;
        }
        let marker = bytes[pos + 1];
        if marker == 0xFF {
            // fill byte
            pos += 1;
            continue;
        }
        let length = u16::from_be_bytes([bytes[pos + 2], bytes[pos + 3]]) as usize;

        let is_sof = matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_sof {
            // FF Cx len(2) precision(1) height(2) width(2) components(1)
            return bytes.get(pos + 9).copied();
        }
        pos += 2 + length;
    }
    None
}

/// PNG pixels are stored Flate-compressed; alpha becomes a soft mask
fn embed_png(bytes: &[u8]) -> Result<EmbeddedImage, PdfMergeError> {
    let decoded = image::load_from_memory_with_format(bytes, ImageFormat::Png)
        .map_err(|e| PdfMergeError::EmbedError(format!("invalid PNG: {}", e)))?;
    let (width, height) = (decoded.width(), decoded.height());
    let has_color = decoded.color().has_color();

    let rgba = decoded.into_rgba8();
    let pixel_count = (width as usize) * (height as usize);
    let mut color = Vec::with_capacity(pixel_count * if has_color { 3 } else { 1 });
    let mut alpha = Vec::with_capacity(pixel_count);
    for pixel in rgba.pixels() {
        let [r, g, b, a] = pixel.0;
        if has_color {
            color.extend_from_slice(&[r, g, b]);
        } else {
            color.push(r);
        }
        alpha.push(a);
    }

    let color_space: &[u8] = if has_color { b"DeviceRGB" } else { b"DeviceGray" };
    let mut dict = image_dictionary(width, height, color_space);
    dict.set("Filter", Object::Name(b"FlateDecode".to_vec()));

    let soft_mask = if alpha.iter().any(|&a| a != u8::MAX) {
        let mut mask = image_dictionary(width, height, b"DeviceGray");
        mask.set("Filter", Object::Name(b"FlateDecode".to_vec()));
        Some(Stream::new(mask, deflate(&alpha)?).with_compression(false))
    } else {
        None
    };

    Ok(EmbeddedImage {
        width,
        height,
        image: Stream::new(dict, deflate(&color)?).with_compression(false),
        soft_mask,
    })
}

fn image_dictionary(width: u32, height: u32, color_space: &[u8]) -> Dictionary {
    let mut dict = Dictionary::new();
    dict.set("Type", Object::Name(b"XObject".to_vec()));
    dict.set("Subtype", Object::Name(b"Image".to_vec()));
    dict.set("Width", Object::Integer(width as i64));
    dict.set("Height", Object::Integer(height as i64));
    dict.set("ColorSpace", Object::Name(color_space.to_vec()));
    dict.set("BitsPerComponent", Object::Integer(8));
    dict
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, PdfMergeError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| PdfMergeError::EmbedError(format!("compression failed: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| PdfMergeError::EmbedError(format!("compression failed: {}", e)))
}
