//! Image encoding: `DynamicImage` → base64 PNG [`PageImage`].
//!
//! PNG is lossless; JPEG artefacts around small digits in price columns
//! confuse vision models. The alpha channel is dropped first since pdfium
//! renders an opaque white page anyway.

use crate::error::PoExtractError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Media type attached to every image block.
pub const PNG_MEDIA_TYPE: &str = "image/png";

/// One rendered page, PNG-encoded and base64-wrapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageImage {
    /// 1-indexed page number.
    pub page_num: usize,
    /// Base64 PNG payload (no data-URI prefix).
    pub data: String,
}

/// Encode a rasterised page (0-indexed `idx`) as a base64 PNG.
pub fn encode_page(idx: usize, img: &DynamicImage) -> Result<PageImage, PoExtractError> {
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());

    let mut buf = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| PoExtractError::EncodingFailed {
            page: idx + 1,
            detail: e.to_string(),
        })?;

    let data = STANDARD.encode(&buf);
    debug!("Encoded page {} → {} bytes base64", idx + 1, data.len());

    Ok(PageImage {
        page_num: idx + 1,
        data,
    })
}
