//! PDF text extraction via pdfium.
//!
//! ## Why a temp file?
//!
//! Uploads arrive as bytes, but pdfium is opened on a file-system path here
//! so that large documents are read lazily rather than pinned in a second
//! in-memory copy. The bytes are written to a scoped `NamedTempFile` that is
//! removed as soon as extraction returns, whether it succeeded or not. A
//! failure to remove it is logged and otherwise ignored.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which is synchronous and
//! CPU-bound. `tokio::task::spawn_blocking` keeps it off the async workers.

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::request::PdfUpload;
use pdfium_render::prelude::*;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable pointing at a pdfium shared library (file or directory).
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Extract the text of every page of an uploaded PDF.
///
/// Pages are concatenated in order, each followed by `\n`. A page whose text
/// cannot be read contributes an empty segment; it does not fail the
/// extraction.
pub async fn extract_text(
    upload: &PdfUpload,
    config: &AnalysisConfig,
) -> Result<String, AnalysisError> {
    let bytes = upload.bytes.clone();
    let name = upload.name.clone();
    let password = config.password.clone();
    let library = config.pdfium_library_path.clone();

    tokio::task::spawn_blocking(move || {
        extract_text_blocking(&bytes, &name, password.as_deref(), library.as_deref())
    })
    .await
    .map_err(|e| AnalysisError::Internal(format!("Extraction task panicked: {}", e)))?
}

/// Blocking implementation of text extraction.
fn extract_text_blocking(
    bytes: &[u8],
    name: &str,
    password: Option<&str>,
    library: Option<&Path>,
) -> Result<String, AnalysisError> {
    let mut tmp = tempfile::Builder::new()
        .prefix("investguard-")
        .suffix(".pdf")
        .tempfile()
        .map_err(|e| AnalysisError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .and_then(|_| tmp.flush())
        .map_err(|e| AnalysisError::Internal(format!("tempfile write: {e}")))?;
    debug!("Wrote {} bytes to {}", bytes.len(), tmp.path().display());

    let result = read_pages(tmp.path(), name, password, library);

    if let Err(e) = tmp.close() {
        debug!("Ignoring temp file cleanup failure: {}", e);
    }

    result
}

fn read_pages(
    path: &Path,
    name: &str,
    password: Option<&str>,
    library: Option<&Path>,
) -> Result<String, AnalysisError> {
    let pdfium = bind_pdfium(library)?;

    let document = pdfium.load_pdf_from_file(path, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                AnalysisError::WrongPassword {
                    name: name.to_string(),
                }
            } else {
                AnalysisError::PasswordRequired {
                    name: name.to_string(),
                }
            }
        } else {
            AnalysisError::CorruptPdf {
                name: name.to_string(),
                detail: err_str,
            }
        }
    })?;

    let pages = document.pages();
    info!("PDF '{}' loaded: {} pages", name, pages.len());

    let segments = pages.iter().enumerate().map(|(idx, page)| match page.text() {
        Ok(text) => Some(text.all()),
        Err(e) => {
            warn!("Page {}: no extractable text ({:?})", idx + 1, e);
            None
        }
    });

    let text = join_pages(segments);
    if text.trim().is_empty() {
        warn!("PDF '{}' has no extractable text (scanned document?)", name);
    }
    Ok(text)
}

/// Concatenate page texts, each followed by a newline; missing pages are empty.
pub fn join_pages(segments: impl IntoIterator<Item = Option<String>>) -> String {
    let mut text = String::new();
    for segment in segments {
        if let Some(s) = segment {
            text.push_str(&s);
        }
        text.push('\n');
    }
    text
}

/// Bind to a pdfium library.
///
/// Lookup order: the configured path, `PDFIUM_LIB_PATH`, the working
/// directory, then the system library search path. A directory is resolved
/// to the platform library name inside it.
fn bind_pdfium(library: Option<&Path>) -> Result<Pdfium, AnalysisError> {
    let explicit = library
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(PDFIUM_LIB_PATH_ENV).map(PathBuf::from));

    let bindings = match explicit {
        Some(path) => {
            let path = if path.is_dir() {
                Pdfium::pdfium_platform_library_name_at_path(&path)
            } else {
                path
            };
            debug!("Binding pdfium from {}", path.display());
            Pdfium::bind_to_library(&path)
        }
        None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| AnalysisError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}
