//! Per-page plain text extraction.

use std::path::Path;

use pdfium_render::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{ProcessingError, ServiceResult};

/// Extracted text for a single page
#[derive(Debug, Clone, Serialize)]
pub struct PageText {
    /// 1-based page number
    pub page: i32,
    pub text: String,
}

/// Extract plain text from every page of a PDF.
///
/// Pages with no extractable text (image-only scans, blank pages) are
/// omitted, so the result can be shorter than the document or empty.
/// Page numbers are 1-based and strictly increasing.
pub fn extract_page_texts(path: &Path) -> ServiceResult<Vec<PageText>> {
    let pdfium = super::create_pdfium()?;

    let document =
        pdfium
            .load_pdf_from_file(path, None)
            .map_err(|e| ProcessingError::PdfOpen {
                message: format!("{:?}", e),
            })?;

    let mut raw_pages = Vec::new();
    for (page_index, page) in document.pages().iter().enumerate() {
        let text = page.text().map_err(|e| {
            warn!(page = page_index + 1, error = ?e, "Failed to get text object for page");
            ProcessingError::TextExtraction {
                page: page_index as u32 + 1,
                message: format!("{:?}", e),
            }
        })?;
        raw_pages.push(text.all());
    }

    let page_count = raw_pages.len();
    let pages = number_non_empty_pages(raw_pages);

    debug!(
        pages = page_count,
        with_text = pages.len(),
        "PDF text extracted"
    );

    Ok(pages)
}

/// Number raw page texts 1-based in document order, dropping pages that
/// are empty after trimming
fn number_non_empty_pages(raw_pages: impl IntoIterator<Item = String>) -> Vec<PageText> {
    raw_pages
        .into_iter()
        .enumerate()
        .filter_map(|(page_index, raw)| {
            let text = raw.trim().to_string();
            if text.is_empty() {
                None
            } else {
                Some(PageText {
                    page: page_index as i32 + 1,
                    text,
                })
            }
        })
        .collect()
}
