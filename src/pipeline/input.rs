//! Input validation: turn uploaded bytes into a [`Document`].
//!
//! The web form and the CLI both hand over raw bytes. We check the `%PDF`
//! magic and the size cap before anything reaches pdfium so a wrong file
//! type produces a clear message instead of a pdfium parse failure.

use crate::error::PoExtractError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// An uploaded purchase-order PDF. Immutable once constructed.
#[derive(Clone)]
pub struct Document {
    file_name: String,
    bytes: Arc<[u8]>,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("file_name", &self.file_name)
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .finish()
    }
}

impl Document {
    /// Validate and wrap uploaded bytes.
    ///
    /// Fails when the upload exceeds `limit` bytes or does not look like a PDF.
    pub fn from_upload(
        file_name: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
        limit: usize,
    ) -> Result<Self, PoExtractError> {
        let bytes = bytes.into();
        if bytes.len() > limit {
            return Err(PoExtractError::UploadTooLarge {
                size: bytes.len(),
                limit,
            });
        }
        check_pdf_magic(&bytes)?;

        let file_name = file_name.into();
        debug!("Accepted upload '{}' ({} bytes)", file_name, bytes.len());
        Ok(Self {
            file_name,
            bytes: bytes.into(),
        })
    }

    /// Read a local file into a document (CLI path).
    pub fn from_path(path: &Path, limit: usize) -> Result<Self, PoExtractError> {
        let bytes = std::fs::read(path).map_err(|source| PoExtractError::InputReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string());
        Self::from_upload(name, bytes, limit)
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Shared handle to the bytes, cheap to move onto a blocking thread.
    pub fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Base64 form of the document, used for the in-page PDF preview.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }
}

/// Verify the `%PDF` header.
pub fn check_pdf_magic(bytes: &[u8]) -> Result<(), PoExtractError> {
    if bytes.len() < PDF_MAGIC.len() || &bytes[..PDF_MAGIC.len()] != PDF_MAGIC {
        return Err(PoExtractError::NotAPdf {
            magic: bytes.iter().take(4).copied().collect(),
        });
    }
    Ok(())
}

/// Decode a base64-encoded PDF.
pub fn decode_base64_pdf(pdf_base64: &str) -> Result<Vec<u8>, PoExtractError> {
    STANDARD
        .decode(pdf_base64.trim())
        .map_err(|e| PoExtractError::InvalidBase64 {
            detail: e.to_string(),
        })
}
