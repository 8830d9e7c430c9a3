//! Locate and bind the pdfium shared library.
//!
//! The library is bound once per process and shared; pdfium-render's
//! `thread_safe` feature serialises access to it.
//!
//! Resolution order:
//!
//! 1. `PDFIUM_LIB_PATH`: explicit path to the library file.
//! 2. The platform library name next to the running executable.
//! 3. The platform library name in the current working directory.
//! 4. Whatever the system loader finds.
//!
//! A failed binding is remembered too; restart the process after installing
//! the library.

use crate::error::PoExtractError;
use pdfium_render::prelude::*;
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Environment variable pointing at an existing pdfium library.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

static PDFIUM: OnceLock<Result<Pdfium, String>> = OnceLock::new();

/// The process-wide pdfium instance.
pub fn bind() -> Result<&'static Pdfium, PoExtractError> {
    PDFIUM
        .get_or_init(bind_uncached)
        .as_ref()
        .map_err(|detail| PoExtractError::PdfiumBindingFailed(detail.clone()))
}

/// Whether a pdfium library can be bound in this process.
pub fn is_available() -> bool {
    bind().is_ok()
}

fn bind_uncached() -> Result<Pdfium, String> {
    let mut attempts: Vec<String> = Vec::new();

    for candidate in candidate_paths() {
        match Pdfium::bind_to_library(&candidate) {
            Ok(bindings) => {
                debug!("Bound pdfium from {}", candidate.display());
                return Ok(Pdfium::new(bindings));
            }
            Err(e) => attempts.push(format!("{}: {e:?}", candidate.display())),
        }
    }

    match Pdfium::bind_to_system_library() {
        Ok(bindings) => {
            debug!("Bound system pdfium library");
            Ok(Pdfium::new(bindings))
        }
        Err(e) => {
            attempts.push(format!("system library: {e:?}"));
            let detail = attempts.join("; ");
            warn!("pdfium unavailable: {}", detail);
            Err(detail)
        }
    }
}

fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(p) = std::env::var(PDFIUM_LIB_PATH_ENV) {
        if !p.is_empty() {
            paths.push(PathBuf::from(p));
        }
    }

    if let Some(dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|d| d.to_path_buf()))
    {
        paths.push(Pdfium::pdfium_platform_library_name_at_path(&dir));
    }

    paths.push(Pdfium::pdfium_platform_library_name_at_path("./"));

    paths.retain(|p| p.exists());
    paths.dedup();
    paths
}
