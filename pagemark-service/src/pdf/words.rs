//! Word tokens with bounding rectangles, grouped from character geometry.

use pdfium_render::prelude::*;

/// A contiguous run of non-whitespace characters and its bounding box
#[derive(Debug, Clone)]
pub struct WordBox {
    pub text: String,
    /// Bounding rectangle in page space (points, bottom-left origin)
    pub bounds: PdfRect,
}

/// Group a page's characters into word tokens on whitespace boundaries.
///
/// Each word's bounding box is the union of the loose bounds of its
/// characters. Characters PDFium reports without geometry end the current
/// word so boxes only ever cover measured characters.
pub fn page_words(text: &PdfPageText) -> Vec<WordBox> {
    let mut words = Vec::new();
    let mut current = String::new();
    // (left, bottom, right, top)
    let mut bounds: Option<(f32, f32, f32, f32)> = None;

    for ch in text.chars().iter() {
        let Some(c) = ch.unicode_char() else {
            continue;
        };

        if c.is_whitespace() {
            flush_word(&mut words, &mut current, &mut bounds);
            continue;
        }

        let Ok(rect) = ch.loose_bounds() else {
            flush_word(&mut words, &mut current, &mut bounds);
            continue;
        };

        current.push(c);
        bounds = Some(match bounds {
            None => (
                rect.left.value,
                rect.bottom.value,
                rect.right.value,
                rect.top.value,
            ),
            Some((l, b, r, t)) => (
                l.min(rect.left.value),
                b.min(rect.bottom.value),
                r.max(rect.right.value),
                t.max(rect.top.value),
            ),
        });
    }

    flush_word(&mut words, &mut current, &mut bounds);
    words
}

fn flush_word(
    words: &mut Vec<WordBox>,
    current: &mut String,
    bounds: &mut Option<(f32, f32, f32, f32)>,
) {
    if !current.is_empty() {
        if let Some((l, b, r, t)) = *bounds {
            words.push(WordBox {
                text: std::mem::take(current),
                bounds: PdfRect::new_from_values(b, l, t, r),
            });
        } else {
            current.clear();
        }
    }
    *bounds = None;
}
