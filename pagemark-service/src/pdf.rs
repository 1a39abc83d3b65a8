//! PDF access.
//!
//! This module handles the three PDF concerns of the service:
//! - Per-page plain text extraction
//! - Word tokens with bounding rectangles for keyword matching
//! - Highlight annotation insertion into a copy of the document

pub mod annotate;
pub mod text;
pub mod words;

use pdfium_render::prelude::*;

use crate::error::ProcessingError;

/// Create a new Pdfium instance (dynamically linked).
///
/// Searches for libpdfium in:
/// 1. Current directory (./libpdfium.so)
/// 2. System library paths
pub(crate) fn create_pdfium() -> Result<Pdfium, ProcessingError> {
    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|e| ProcessingError::PdfOpen {
            message: format!("failed to load the PDFium library: {:?}", e),
        })?;

    Ok(Pdfium::new(bindings))
}
