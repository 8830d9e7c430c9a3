//! PDF rasterisation: render the leading pages of a PDF via pdfium.
//!
//! pdfium is CPU bound and not async-aware, so rendering runs inside
//! `tokio::task::spawn_blocking`. The document and every bitmap are dropped
//! on that thread before the images are handed back.
//!
//! Pages are scaled by a fixed linear zoom (2× by default) rather than a
//! target pixel size: purchase orders are almost always A4 or Letter, and 2×
//! keeps small print in line-item tables legible.

use crate::config::ExtractionConfig;
use crate::error::PoExtractError;
use crate::pipeline::{encode, input, pdfium};
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::sync::Arc;
use tracing::{debug, info};

/// Rasterise up to `config.max_pages` pages of a PDF held in memory.
///
/// # Returns
/// A vector of `(page_index_0based, DynamicImage)` tuples in page order.
///
/// # Errors
/// Not a PDF, unparsable, zero pages, or a page that fails to render.
pub async fn render_pages(
    pdf: Arc<[u8]>,
    config: &ExtractionConfig,
) -> Result<Vec<(usize, DynamicImage)>, PoExtractError> {
    let max_pages = config.max_pages;
    let zoom = config.zoom;

    tokio::task::spawn_blocking(move || render_pages_blocking(&pdf, max_pages, zoom))
        .await
        .map_err(|e| PoExtractError::Internal(format!("Render task panicked: {}", e)))?
}

/// Blocking implementation of page rendering.
pub fn render_pages_blocking(
    pdf: &[u8],
    max_pages: usize,
    zoom: f32,
) -> Result<Vec<(usize, DynamicImage)>, PoExtractError> {
    input::check_pdf_magic(pdf)?;
    let pdfium = pdfium::bind()?;

    let document = pdfium
        .load_pdf_from_byte_slice(pdf, None)
        .map_err(|e| PoExtractError::CorruptPdf {
            detail: format!("{:?}", e),
        })?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded: {} pages", total_pages);

    if total_pages == 0 {
        return Err(PoExtractError::EmptyDocument);
    }
    if total_pages > max_pages {
        debug!(
            "Dropping pages {}..={} (max_pages={})",
            max_pages + 1,
            total_pages,
            max_pages
        );
    }

    let render_config = PdfRenderConfig::new().scale_page_by_factor(zoom);
    let mut results = Vec::with_capacity(total_pages.min(max_pages));

    for (idx, page) in pages.iter().take(max_pages).enumerate() {
        let bitmap = page.render_with_config(&render_config).map_err(|e| {
            PoExtractError::RasterisationFailed {
                page: idx + 1,
                detail: format!("{:?}", e),
            }
        })?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            idx + 1,
            image.width(),
            image.height()
        );

        results.push((idx, image));
    }

    Ok(results)
}

/// Convert a base64-encoded PDF into base64-encoded PNG page images.
///
/// Renders at most `max_pages` pages at the default 2× zoom and returns the
/// images in page order.
pub async fn pdf_to_images(
    pdf_base64: &str,
    max_pages: usize,
) -> Result<Vec<String>, PoExtractError> {
    let bytes = input::decode_base64_pdf(pdf_base64)?;
    let config = ExtractionConfig::builder().max_pages(max_pages).build()?;

    let rendered = render_pages(bytes.into(), &config).await?;
    rendered
        .iter()
        .map(|(idx, img)| encode::encode_page(*idx, img).map(|p| p.data))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_bytes_fail_before_pdfium() {
        let err = render_pages_blocking(b"hello world", 10, 2.0).unwrap_err();
        assert!(matches!(err, PoExtractError::NotAPdf { .. }));
    }

    #[tokio::test]
    async fn pdf_to_images_rejects_bad_base64() {
        let err = pdf_to_images("%%%", 10).await.unwrap_err();
        assert!(matches!(err, PoExtractError::InvalidBase64 { .. }));
    }

    #[tokio::test]
    async fn pdf_to_images_rejects_zero_max_pages() {
        let err = pdf_to_images("JVBERi0xLjQ=", 0).await.unwrap_err();
        assert!(matches!(err, PoExtractError::InvalidConfig(_)));
    }
}
