//! Image normalization
//!
//! Decodes a raster image, applies a per-pixel tone adjustment and
//! re-encodes it. Two adjustments exist:
//! - contrast: averages RGB into a single value, stretches it slightly
//!   around mid-gray and writes it back to all three channels
//! - brightness: scales each RGB channel by 1.1 and always emits JPEG
//!
//! Alpha is never modified.

use crate::error::PdfMergeError;
use crate::file::ImageKind;
use crate::options::NormalizeMode;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, RgbaImage};
use tracing::{debug, instrument};

/// Contrast amount used by [`NormalizeMode::Contrast`]
pub const CONTRAST: f64 = 1.1;

/// Channel multiplier used by [`NormalizeMode::Brightness`]
pub const BRIGHTNESS: f64 = 1.1;

/// Encoder quality for JPEG output (the canvas default of 0.92)
pub const JPEG_QUALITY: u8 = 92;

/// Re-encoded image bytes and the format they are in
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    pub bytes: Vec<u8>,
    pub kind: ImageKind,
}

/// Normalize one image according to `mode`.
///
/// `declared` is the format taken from the file's media type. It picks the
/// output format in contrast mode and is passed through untouched when no
/// normalization is requested.
#[instrument(skip(bytes), fields(len = bytes.len()))]
pub fn normalize_image(
    bytes: &[u8],
    declared: ImageKind,
    mode: NormalizeMode,
) -> Result<NormalizedImage, PdfMergeError> {
    let target = match mode {
        NormalizeMode::None => {
            return Ok(NormalizedImage {
                bytes: bytes.to_vec(),
                kind: declared,
            })
        }
        NormalizeMode::Contrast => declared,
        NormalizeMode::Brightness => ImageKind::Jpeg,
    };

    let mut pixels = decode_rgba(bytes)?;
    match mode {
        NormalizeMode::Contrast => apply_contrast(&mut pixels, CONTRAST),
        NormalizeMode::Brightness => apply_brightness(&mut pixels, BRIGHTNESS),
        NormalizeMode::None => {}
    }

    let encoded = encode(pixels, target)?;
    debug!(?mode, ?target, out_len = encoded.len(), "image normalized");

    Ok(NormalizedImage {
        bytes: encoded,
        kind: target,
    })
}

/// `259 * (c + 255) / (255 * (259 - c))`
pub fn contrast_factor(contrast: f64) -> f64 {
    (259.0 * (contrast + 255.0)) / (255.0 * (259.0 - contrast))
}

/// Grayscale contrast stretch; alpha untouched
pub fn apply_contrast(pixels: &mut RgbaImage, contrast: f64) {
    let factor = contrast_factor(contrast);
    for pixel in pixels.pixels_mut() {
        let [r, g, b, _] = pixel.0;
        let avg = (r as f64 + g as f64 + b as f64) / 3.0;
        let value = clamp_channel(factor * (avg - 128.0) + 128.0);
        pixel.0[0] = value;
        pixel.0[1] = value;
        pixel.0[2] = value;
    }
}

/// Per-channel multiply; alpha untouched
pub fn apply_brightness(pixels: &mut RgbaImage, multiplier: f64) {
    for pixel in pixels.pixels_mut() {
        for channel in &mut pixel.0[..3] {
            *channel = clamp_channel(*channel as f64 * multiplier);
        }
    }
}

/// Store a float the way a clamped byte array does: clamp, then round half to even.
fn clamp_channel(value: f64) -> u8 {
    value.clamp(0.0, 255.0).round_ties_even() as u8
}

fn decode_rgba(bytes: &[u8]) -> Result<RgbaImage, PdfMergeError> {
    let decoded =
        image::load_from_memory(bytes).map_err(|e| PdfMergeError::DecodeError(e.to_string()))?;

    if decoded.width() == 0 || decoded.height() == 0 {
        return Err(PdfMergeError::DecodeError("image has no pixels".into()));
    }

    Ok(decoded.into_rgba8())
}

fn encode(pixels: RgbaImage, kind: ImageKind) -> Result<Vec<u8>, PdfMergeError> {
    let mut buffer = Vec::new();

    let result = match kind {
        ImageKind::Png => pixels.write_with_encoder(PngEncoder::new(&mut buffer)),
        ImageKind::Jpeg => {
            // JPEG has no alpha channel
            let rgb = DynamicImage::ImageRgba8(pixels).into_rgb8();
            rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY))
        }
    };
    result.map_err(|e| PdfMergeError::EncodeError(e.to_string()))?;

    if buffer.is_empty() {
        return Err(PdfMergeError::EncodeError("encoder produced no output".into()));
    }

    Ok(buffer)
}
