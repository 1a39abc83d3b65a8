//! Keyword highlighting.
//!
//! Scans every page's word tokens for case-insensitive substring matches,
//! writes a highlight annotation over each matching word in a copy of the
//! document, and builds an HTML summary of the matching lines per page.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use regex::{Regex, RegexBuilder};
use tempfile::TempDir;
use tracing::{debug, info};

use crate::error::{ProcessingError, ServiceError, ServiceResult};
use crate::pdf::annotate::{HighlightRect, write_highlights};
use crate::pdf::words::page_words;

/// Returned as the summary when no word matched anywhere in the document
pub const NO_MATCH_MESSAGE: &str = "No occurrences of the keyword found.";

const SUMMARY_HEADER: &str = "Keywords found in:<br>";

/// Result of a highlight run.
///
/// The temp dir owns the output file and must stay alive for as long as
/// the file is served.
#[derive(Debug)]
pub struct HighlightOutcome {
    pub summary: String,
    pub matches: usize,
    pub output_path: PathBuf,
    pub output_dir: TempDir,
}

/// Matching lines found on a single page
#[derive(Debug)]
struct PageMatches {
    page: i32,
    /// HTML-escaped lines with `<mark>` around each keyword occurrence
    lines: Vec<String>,
}

/// Highlight every word containing `keyword` in a copy of the PDF at
/// `input`, written as `highlighted.pdf` in a fresh temp dir.
///
/// An empty or whitespace-only keyword is rejected: substring containment
/// with the empty string holds for every word, which would silently
/// highlight the entire document.
pub fn highlight_keyword(input: &Path, keyword: &str) -> ServiceResult<HighlightOutcome> {
    let keyword = keyword.trim();
    if keyword.is_empty() {
        return Err(ServiceError::InvalidRequest {
            message: "Keyword must not be empty".to_string(),
        });
    }

    let pattern = keyword_pattern(keyword)?;
    let (rects, page_matches, match_count) = scan_document(input, keyword, &pattern)?;

    let output_dir = tempfile::tempdir().map_err(ProcessingError::Io)?;
    let output_path = output_dir.path().join("highlighted.pdf");
    write_highlights(input, &output_path, &rects)?;

    let summary = if match_count == 0 {
        NO_MATCH_MESSAGE.to_string()
    } else {
        summary_html(&page_matches)
    };

    info!(matches = match_count, "Keyword highlighting finished");

    Ok(HighlightOutcome {
        summary,
        matches: match_count,
        output_path,
        output_dir,
    })
}

/// Case-insensitive pattern matching the keyword literally
fn keyword_pattern(keyword: &str) -> ServiceResult<Regex> {
    RegexBuilder::new(&regex::escape(keyword))
        .case_insensitive(true)
        .build()
        .map_err(|e| ServiceError::Internal {
            message: format!("keyword pattern: {}", e),
        })
}

/// Scan every page for matching words and matching lines
fn scan_document(
    input: &Path,
    keyword: &str,
    pattern: &Regex,
) -> ServiceResult<(BTreeMap<i32, Vec<HighlightRect>>, Vec<PageMatches>, usize)> {
    let pdfium = crate::pdf::create_pdfium()?;

    let document =
        pdfium
            .load_pdf_from_file(input, None)
            .map_err(|e| ProcessingError::PdfOpen {
                message: format!("{:?}", e),
            })?;

    let needle = keyword.to_lowercase();
    let mut rects: BTreeMap<i32, Vec<HighlightRect>> = BTreeMap::new();
    let mut page_matches = Vec::new();
    let mut match_count = 0usize;

    for (page_index, page) in document.pages().iter().enumerate() {
        let page_num = page_index as i32 + 1;

        let text = page
            .text()
            .map_err(|e| ProcessingError::TextExtraction {
                page: page_num as u32,
                message: format!("{:?}", e),
            })?;

        let mut word_rects = Vec::new();
        for word in page_words(&text) {
            if word.text.to_lowercase().contains(&needle) {
                word_rects.push(HighlightRect {
                    left: word.bounds.left.value,
                    bottom: word.bounds.bottom.value,
                    right: word.bounds.right.value,
                    top: word.bounds.top.value,
                });
            }
        }

        if word_rects.is_empty() {
            continue;
        }

        debug!(
            page = page_num,
            words = word_rects.len(),
            "Matched words on page"
        );

        match_count += word_rects.len();
        page_matches.push(PageMatches {
            page: page_num,
            lines: matching_lines(&text.all(), pattern),
        });
        rects.insert(page_num, word_rects);
    }

    Ok((rects, page_matches, match_count))
}

/// Lines of `page_text` containing the keyword, HTML-escaped with every
/// occurrence wrapped in `<mark>`
fn matching_lines(page_text: &str, pattern: &Regex) -> Vec<String> {
    page_text
        .lines()
        .filter(|line| pattern.is_match(line))
        .map(|line| mark_line(line, pattern))
        .collect()
}

/// Escape a line for HTML display and wrap each keyword occurrence in
/// `<mark>`
fn mark_line(line: &str, pattern: &Regex) -> String {
    let mut out = String::with_capacity(line.len() + 16);
    let mut last = 0;

    for m in pattern.find_iter(line) {
        out.push_str(&html_escape::encode_text(&line[last..m.start()]));
        out.push_str("<mark>");
        out.push_str(&html_escape::encode_text(m.as_str()));
        out.push_str("</mark>");
        last = m.end();
    }
    out.push_str(&html_escape::encode_text(&line[last..]));

    out
}

/// Build the per-page HTML summary
fn summary_html(pages: &[PageMatches]) -> String {
    let mut summary = String::from(SUMMARY_HEADER);

    for page in pages {
        summary.push_str(&format!("<br><b>Page {}:</b><br>", page.page));
        for line in &page.lines {
            summary.push_str(line);
            summary.push_str("<br>");
        }
    }

    summary
}
