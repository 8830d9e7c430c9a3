//! # po-extract
//!
//! Extract structured data from purchase-order PDFs with a vision language
//! model.
//!
//! ## Why images?
//!
//! Purchase orders come out of every ERP and word processor ever written, and
//! plenty of them are scans. Text extraction loses the table layout that tells
//! a unit price from a line total. Instead each page is rasterised to a PNG
//! and the model reads the page as a clerk would, answering with one JSON
//! object.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF bytes
//!  │
//!  ├─ 1. Input    %PDF magic + size cap
//!  ├─ 2. Render   first N pages via pdfium at 2× zoom (spawn_blocking)
//!  ├─ 3. Encode   RGB PNG → base64
//!  ├─ 4. Request  system prompt (basic | advanced) + images + directive
//!  ├─ 5. Call     one POST to the Messages API, no retry
//!  └─ 6. Parse    first text block → fenced JSON → object
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use po_extract::{extract_document, Document, ExtractionConfig, ExtractionMode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExtractionConfig::default();
//!     let doc = Document::from_path("po.pdf".as_ref(), 20 * 1024 * 1024)?;
//!     let key = std::env::var("ANTHROPIC_API_KEY")?;
//!     let data = extract_document(&doc, &key, ExtractionMode::Basic, &config).await?;
//!     println!("{}", serde_json::to_string_pretty(&data)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `po-extract` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! The web form ([`ui`]) is part of the library so it can be embedded in
//! another axum application or tested in-process.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod preview;
pub mod prompts;
pub mod session;
pub mod ui;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder, ExtractionMode, ServerConfig};
pub use error::PoExtractError;
pub use extract::{
    extract_document, extract_po_data, extract_sync, to_pretty_json, write_json_file,
    ExtractionOutcome, DOWNLOAD_FILE_NAME,
};
pub use pipeline::input::Document;
pub use pipeline::render::pdf_to_images;
pub use pipeline::response::ExtractionResult;
pub use preview::{table_previews, NamedPreview, TablePreview};
pub use session::{Session, SessionState, SessionStore};
pub use ui::{build_router, serve, AppState};
