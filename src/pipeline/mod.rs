//! Pipeline stages for purchase-order extraction.
//!
//! Each submodule implements exactly one transformation step, so every stage
//! can be tested without the others (and without a live model).
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ encode ──▶ request ──▶ client ──▶ response
//! (bytes)   (pdfium)   (base64)   (payload)   (HTTP)     (JSON)
//! ```
//!
//! 1. [`input`]   : validate the upload (`%PDF` magic, size cap)
//! 2. [`render`]  : rasterise the leading pages at 2× zoom; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 3. [`encode`]  : PNG-encode and base64-wrap each page
//! 4. [`request`] : system prompt + image blocks + trailing directive
//! 5. [`client`]  : the single Messages API call; the only stage with
//!    network I/O
//! 6. [`response`]: scrape the JSON object out of the model's text
//!
//! [`pdfium`] binds the native library used by `render`.

pub mod client;
pub mod encode;
pub mod input;
pub mod pdfium;
pub mod render;
pub mod request;
pub mod response;
