//! # Photo Decoding
//!
//! Catalog photos travel as text: `data:image/...;base64,...` URIs (what a
//! browser canvas produces) or bare base64. This module turns that text into
//! a [`Photo`] the PDF surface can embed.
//!
//! JPEG bytes are kept as they are, since PDF can embed them with DCTDecode;
//! only the header is read for the size and channel count. PNG and WebP are
//! decoded to RGB with the alpha channel split off for an SMask.
//!
//! Decoding is exposed to the renderer as an async operation: one future per
//! photo, awaited before that photo is drawn.

use std::io::Cursor;

use base64::Engine;
use image::ImageFormat;

use crate::error::{CatalogError, Result};

/// A decoded photo, ready to embed.
#[derive(Debug, Clone)]
pub struct Photo {
    pub pixels: PhotoPixels,
    pub width_px: u32,
    pub height_px: u32,
}

#[derive(Debug, Clone)]
pub enum PhotoPixels {
    /// The original JPEG file.
    Jpeg { bytes: Vec<u8>, grayscale: bool },
    /// 8-bit RGB, row-major. `alpha` is present only when some pixel is not
    /// fully opaque.
    Raw { rgb: Vec<u8>, alpha: Option<Vec<u8>> },
}

/// Source of decoded photos for the renderer.
///
/// Each call is a one-shot decode: the returned future resolves once, when
/// the pixels are available.
#[allow(async_fn_in_trait)]
pub trait ImageDecoder {
    async fn decode(&self, src: &str) -> Result<Photo>;
}

/// Decodes data URIs and bare base64 on tokio's blocking pool.
///
/// Outside a tokio runtime there is no blocking pool, and the photo is
/// decoded inline on the polling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataUriDecoder;

impl ImageDecoder for DataUriDecoder {
    async fn decode(&self, src: &str) -> Result<Photo> {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return load_image(src);
        };
        let src = src.to_string();
        handle
            .spawn_blocking(move || load_image(&src))
            .await
            .map_err(|e| CatalogError::Image(format!("decode task failed: {}", e)))?
    }
}

/// Decode a photo from a data URI or bare base64, synchronously.
pub fn load_image(src: &str) -> Result<Photo> {
    let bytes = payload_bytes(src)?;
    match sniff_format(&bytes) {
        Some(ImageFormat::Jpeg) => read_jpeg(bytes),
        Some(format) => decode_raw(&bytes, format),
        None => Err(unsupported()),
    }
}

/// Wrap raw image file bytes in the data URI form catalog entries store.
pub fn encode_data_uri(bytes: &[u8]) -> Result<String> {
    let mime = sniff_format(bytes).ok_or_else(unsupported)?.to_mime_type();
    let payload = base64::engine::general_purpose::STANDARD.encode(bytes);
    Ok(format!("data:{};base64,{}", mime, payload))
}

fn unsupported() -> CatalogError {
    CatalogError::Image("unsupported image format (expected JPEG, PNG or WebP)".to_string())
}

/// The base64 payload of `src`, decoded. Anything before the first comma of
/// a data URI is the media type and is ignored.
fn payload_bytes(src: &str) -> Result<Vec<u8>> {
    let src = src.trim();
    let payload = match src.strip_prefix("data:") {
        Some(rest) => match rest.split_once(',') {
            Some((_, payload)) => payload,
            None => return Err(CatalogError::Image("data URI has no payload".to_string())),
        },
        None => src,
    };
    base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| CatalogError::Image(format!("invalid base64 payload: {}", e)))
}

/// Only the formats a phone camera or canvas export produces.
fn sniff_format(bytes: &[u8]) -> Option<ImageFormat> {
    match image::guess_format(bytes).ok()? {
        f @ (ImageFormat::Jpeg | ImageFormat::Png | ImageFormat::WebP) => Some(f),
        _ => None,
    }
}

/// Read the JPEG header only; the file itself is embedded unchanged.
fn read_jpeg(bytes: Vec<u8>) -> Result<Photo> {
    use image::ImageDecoder as _;

    let ((width_px, height_px), grayscale) = {
        let decoder = image::codecs::jpeg::JpegDecoder::new(Cursor::new(bytes.as_slice()))
            .map_err(|e| CatalogError::Image(format!("unreadable JPEG header: {}", e)))?;
        let gray = matches!(decoder.color_type(), image::ColorType::L8 | image::ColorType::L16);
        (decoder.dimensions(), gray)
    };

    Ok(Photo {
        pixels: PhotoPixels::Jpeg { bytes, grayscale },
        width_px,
        height_px,
    })
}

fn decode_raw(bytes: &[u8], format: ImageFormat) -> Result<Photo> {
    let rgba = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| CatalogError::Image(format!("cannot decode {:?} image: {}", format, e)))?
        .into_rgba8();

    let rgb: Vec<u8> = rgba.pixels().flat_map(|p| [p[0], p[1], p[2]]).collect();
    let alpha = if rgba.pixels().any(|p| p[3] < u8::MAX) {
        Some(rgba.pixels().map(|p| p[3]).collect())
    } else {
        None
    };

    Ok(Photo {
        pixels: PhotoPixels::Raw { rgb, alpha },
        width_px: rgba.width(),
        height_px: rgba.height(),
    })
}
