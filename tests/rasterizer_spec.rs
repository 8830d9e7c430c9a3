//! Rasteriser tests against generated PDFs.
//!
//! These need a pdfium library. When none can be bound (see
//! `PDFIUM_LIB_PATH`) each test prints SKIP and returns.
//!
//! Run with:
//!   PDFIUM_LIB_PATH=/path/to/libpdfium.so cargo test --test rasterizer_spec -- --nocapture

use base64::{engine::general_purpose::STANDARD, Engine as _};
use po_extract::pipeline::{pdfium, render};
use po_extract::{pdf_to_images, PoExtractError};

// ── Test helpers ─────────────────────────────────────────────────────────────

macro_rules! skip_unless_pdfium {
    () => {{
        if !pdfium::is_available() {
            println!("SKIP: no pdfium library (set PDFIUM_LIB_PATH to run rasteriser tests)");
            return;
        }
    }};
}

/// Build a valid PDF with `pages` blank pages whose widths are 200, 210, 220…
/// points, so page order can be read back from the rendered image width.
fn blank_pdf(pages: usize) -> Vec<u8> {
    let mut objects: Vec<String> = Vec::new();
    let kids: Vec<String> = (0..pages).map(|i| format!("{} 0 R", i + 3)).collect();

    objects.push("<< /Type /Catalog /Pages 2 0 R >>".to_string());
    objects.push(format!(
        "<< /Type /Pages /Kids [{}] /Count {} >>",
        kids.join(" "),
        pages
    ));
    for i in 0..pages {
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} 300] >>",
            200 + 10 * i
        ));
    }

    let mut pdf = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
    }

    let xref_at = pdf.len();
    pdf.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    pdf.extend_from_slice(b"0000000000 65535 f \n");
    for off in offsets {
        pdf.extend_from_slice(format!("{off:010} 00000 n \n").as_bytes());
    }
    pdf.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_at
        )
        .as_bytes(),
    );
    pdf
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn renders_at_most_max_pages_in_order() {
    skip_unless_pdfium!();

    let pdf = blank_pdf(12);
    let pages = render::render_pages_blocking(&pdf, 10, 2.0).unwrap();
    assert_eq!(pages.len(), 10);

    for (expected, (idx, img)) in pages.iter().enumerate() {
        assert_eq!(*idx, expected);
        // 2× zoom of a (200 + 10·i)-point-wide page.
        let want = 2 * (200 + 10 * expected as u32);
        assert!(
            img.width().abs_diff(want) <= 1,
            "page {expected}: width {} != {want}",
            img.width()
        );
    }
}

#[test]
fn short_document_renders_every_page() {
    skip_unless_pdfium!();

    let pages = render::render_pages_blocking(&blank_pdf(3), 10, 1.0).unwrap();
    assert_eq!(pages.len(), 3);
}

#[test]
fn zero_page_document_is_an_error() {
    skip_unless_pdfium!();

    let err = render::render_pages_blocking(&blank_pdf(0), 10, 2.0).unwrap_err();
    assert!(
        matches!(err, PoExtractError::EmptyDocument | PoExtractError::CorruptPdf { .. }),
        "got: {err:?}"
    );
    assert!(err.to_string().starts_with("Error converting PDF to images"));
}

#[test]
fn corrupt_document_is_an_error() {
    skip_unless_pdfium!();

    let mut pdf = b"%PDF-1.4\n".to_vec();
    pdf.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef].repeat(64));
    let err = render::render_pages_blocking(&pdf, 10, 2.0).unwrap_err();
    assert!(err.to_string().starts_with("Error converting PDF to images"));
}

#[tokio::test]
async fn base64_entry_point_returns_png_strings() {
    skip_unless_pdfium!();

    let pdf_base64 = STANDARD.encode(blank_pdf(2));
    let images = pdf_to_images(&pdf_base64, 10).await.unwrap();
    assert_eq!(images.len(), 2);

    for image in images {
        let png = STANDARD.decode(image).unwrap();
        assert!(png.starts_with(b"\x89PNG\r\n\x1a\n"));
    }
}
