//! Error types for the po-extract library.
//!
//! Every failure mode of an extraction is one variant of [`PoExtractError`].
//! The variants are grouped the way the pipeline runs: input validation,
//! rasterisation, the remote call, and the reply parsing. The extraction
//! boundary ([`crate::extract::extract_po_data`]) turns any of them into a
//! single human-readable string, so the Display messages are written for the
//! person looking at the web form, not for a log file.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the po-extract library.
#[derive(Debug, Error)]
pub enum PoExtractError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The extraction was triggered without an API key.
    #[error("Please enter your Anthropic API key to proceed.")]
    MissingCredential,

    /// The extraction was triggered before a document was uploaded.
    #[error("Upload a purchase order PDF before extracting.")]
    NoDocument,

    /// A second extraction was triggered while one is still running.
    #[error("An extraction is already running for this document.")]
    ExtractionInProgress,

    /// The uploaded bytes do not start with the `%PDF` header.
    #[error("Error converting PDF to images: file is not a valid PDF (first bytes: {magic:?})")]
    NotAPdf { magic: Vec<u8> },

    /// The upload is larger than the configured cap.
    #[error("Uploaded file is {size} bytes; the limit is {limit} bytes")]
    UploadTooLarge { size: usize, limit: usize },

    /// The base64 payload handed to the rasteriser could not be decoded.
    #[error("Error converting PDF to images: invalid base64 input: {detail}")]
    InvalidBase64 { detail: String },

    /// A local input file could not be read.
    #[error("Cannot read '{}': {source}", path.display())]
    InputReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Mode string other than `basic` / `advanced`.
    #[error("Unknown extraction mode '{0}' (expected 'basic' or 'advanced')")]
    InvalidMode(String),

    // ── PDF errors ────────────────────────────────────────────────────────
    /// pdfium could not parse the document.
    #[error("Error converting PDF to images: {detail}")]
    CorruptPdf { detail: String },

    /// The document parsed but has no pages to render.
    #[error("Error converting PDF to images: the document has no pages")]
    EmptyDocument,

    /// pdfium failed on a specific page.
    #[error("Error converting PDF to images: page {page} failed to render: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// A rendered page could not be PNG-encoded.
    #[error("Error converting PDF to images: page {page} failed to encode: {detail}")]
    EncodingFailed { page: usize, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Install a pdfium build (https://github.com/bblanchon/pdfium-binaries) and either\n\
  • set PDFIUM_LIB_PATH=/path/to/libpdfium, or\n\
  • place the library next to the po-extract executable.\n"
    )]
    PdfiumBindingFailed(String),

    // ── API errors ────────────────────────────────────────────────────────
    /// The HTTP request never produced a response (DNS, TLS, connection reset).
    #[error("Error with direct Anthropic API call: {0}")]
    Transport(String),

    /// The API call did not complete within the configured timeout.
    #[error("Error with direct Anthropic API call: request timed out after {secs}s")]
    ApiTimeout { secs: u64 },

    /// The API answered with a non-success status. The body is kept verbatim.
    #[error("Error with direct Anthropic API call: API request failed with status {status}: {body}")]
    ApiStatus { status: u16, body: String },

    // ── Response errors ───────────────────────────────────────────────────
    /// The reply carried no content elements.
    #[error("No content in response")]
    NoContent,

    /// The first content element has no `text` field.
    #[error("Error with direct Anthropic API call: first content element has no text")]
    MissingText,

    /// The extracted text is not valid JSON.
    #[error("Error with direct Anthropic API call: {detail}")]
    InvalidJson { detail: String },

    /// The extracted JSON parsed but is not an object.
    #[error("Error with direct Anthropic API call: expected a JSON object, got {kind}")]
    NotAnObject { kind: &'static str },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not write the output JSON file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PoExtractError {
    /// Whether the error was caused by what the user supplied rather than by
    /// the document, the remote service or the host.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            PoExtractError::MissingCredential
                | PoExtractError::NoDocument
                | PoExtractError::ExtractionInProgress
                | PoExtractError::NotAPdf { .. }
                | PoExtractError::UploadTooLarge { .. }
                | PoExtractError::InputReadFailed { .. }
                | PoExtractError::InvalidMode(_)
        )
    }
}
