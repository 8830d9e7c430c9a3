//! Extraction entry points.
//!
//! [`extract_document`] runs the whole pipeline and returns a typed error.
//! [`extract_po_data`] is the boundary used by the web form: it never fails,
//! it returns an [`ExtractionOutcome`] carrying either the data or a single
//! error string.

use crate::config::{ExtractionConfig, ExtractionMode};
use crate::error::PoExtractError;
use crate::pipeline::client::MessagesClient;
use crate::pipeline::input::Document;
use crate::pipeline::response::{self, ExtractionResult};
use crate::pipeline::{encode, render, request};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

/// Name of the downloadable JSON file.
pub const DOWNLOAD_FILE_NAME: &str = "purchase_order_data.json";

/// Result of one extraction as seen by the UI: exactly one field is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionOutcome {
    pub data: Option<ExtractionResult>,
    pub error: Option<String>,
}

impl ExtractionOutcome {
    pub fn is_success(&self) -> bool {
        self.data.is_some()
    }

    pub fn into_result(self) -> Result<ExtractionResult, String> {
        match (self.data, self.error) {
            (Some(data), _) => Ok(data),
            (None, Some(error)) => Err(error),
            (None, None) => Err("Extraction produced no result".to_string()),
        }
    }
}

impl From<Result<ExtractionResult, PoExtractError>> for ExtractionOutcome {
    fn from(result: Result<ExtractionResult, PoExtractError>) -> Self {
        match result {
            Ok(data) => Self {
                data: Some(data),
                error: None,
            },
            Err(e) => Self {
                data: None,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Extract purchase-order data from a document.
///
/// # Errors
/// Missing credential, PDF/rasterisation failures, transport or HTTP status
/// failures, and reply-parsing failures. Never returns partial data.
pub async fn extract_document(
    document: &Document,
    api_key: &str,
    mode: ExtractionMode,
    config: &ExtractionConfig,
) -> Result<ExtractionResult, PoExtractError> {
    let total_start = Instant::now();
    info!(
        "Starting extraction: {} ({} bytes, mode={})",
        document.file_name(),
        document.len(),
        mode
    );

    // ── Step 1: Build the client (fails fast on a blank key) ─────────────
    let client = MessagesClient::new(api_key, config)?;

    // ── Step 2: Rasterise pages ──────────────────────────────────────────
    let render_start = Instant::now();
    let rendered = render::render_pages(document.shared_bytes(), config).await?;
    info!(
        "Rendered {} pages in {}ms",
        rendered.len(),
        render_start.elapsed().as_millis()
    );

    // ── Step 3: Encode images to base64 ──────────────────────────────────
    let images = rendered
        .iter()
        .map(|(idx, img)| encode::encode_page(*idx, img))
        .collect::<Result<Vec<_>, _>>()?;
    drop(rendered);

    // ── Step 4: Build the request ────────────────────────────────────────
    let system = request::resolve_system_prompt(mode, config);
    let req = request::build_request(system, &images);

    // ── Step 5: Call the model ───────────────────────────────────────────
    let llm_start = Instant::now();
    let body = client.create_message(&req).await?;
    info!("Model answered in {}ms", llm_start.elapsed().as_millis());

    // ── Step 6: Parse the reply ──────────────────────────────────────────
    let data = response::parse_response(&body)?;
    info!(
        "Extraction complete: {} top-level fields, {}ms total",
        data.len(),
        total_start.elapsed().as_millis()
    );
    Ok(data)
}

/// Extraction boundary: run [`extract_document`] and fold any error into
/// the outcome's `error` string.
pub async fn extract_po_data(
    document: &Document,
    api_key: &str,
    mode: ExtractionMode,
    config: &ExtractionConfig,
) -> ExtractionOutcome {
    let result = extract_document(document, api_key, mode, config).await;
    if let Err(ref e) = result {
        warn!("Extraction failed: {}", e);
    }
    result.into()
}

/// Synchronous wrapper around [`extract_document`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_sync(
    document: &Document,
    api_key: &str,
    mode: ExtractionMode,
    config: &ExtractionConfig,
) -> Result<ExtractionResult, PoExtractError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| PoExtractError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(extract_document(document, api_key, mode, config))
}

/// Serialise a result the way the download button does: UTF-8 JSON with
/// two-space indentation.
pub fn to_pretty_json(data: &ExtractionResult) -> Result<String, PoExtractError> {
    serde_json::to_string_pretty(data)
        .map_err(|e| PoExtractError::Internal(format!("serialise result: {e}")))
}

/// Write a result to `path` atomically (temp file + rename).
pub async fn write_json_file(
    data: &ExtractionResult,
    path: impl AsRef<Path>,
) -> Result<(), PoExtractError> {
    let path = path.as_ref();
    let json = to_pretty_json(data)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| PoExtractError::OutputWriteFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
    }

    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, json.as_bytes())
        .await
        .map_err(|e| PoExtractError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| PoExtractError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    Ok(())
}
