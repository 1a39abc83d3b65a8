//! Highlight annotation insertion via direct PDF object editing.
//!
//! Annotations are written into a copy of the document so the uploaded
//! file is never modified. Quad points cover each word's bounding
//! rectangle and render as the standard yellow marker.

use std::collections::BTreeMap;
use std::path::Path;

use lopdf::{Document, Object, ObjectId, dictionary};
use tracing::debug;

use crate::error::{ProcessingError, ServiceResult};

/// A rectangle to highlight, in PDF page space (points, bottom-left origin)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HighlightRect {
    pub left: f32,
    pub bottom: f32,
    pub right: f32,
    pub top: f32,
}

/// Write highlight annotations into a copy of `input` saved at `output`.
///
/// `rects` maps 1-based page numbers to the rectangles to mark on that
/// page. Pages absent from the map are copied unchanged; an empty map
/// produces an annotation-free copy.
pub fn write_highlights(
    input: &Path,
    output: &Path,
    rects: &BTreeMap<i32, Vec<HighlightRect>>,
) -> ServiceResult<()> {
    let mut doc = Document::load(input).map_err(|e| ProcessingError::PdfOpen {
        message: e.to_string(),
    })?;

    add_highlights(&mut doc, rects)?;

    doc.save(output)
        .map_err(|e| ProcessingError::Annotation(e.into()))?;
    Ok(())
}

/// Insert highlight annotation objects for every rectangle
pub fn add_highlights(
    doc: &mut Document,
    rects: &BTreeMap<i32, Vec<HighlightRect>>,
) -> ServiceResult<()> {
    let pages = doc.get_pages();

    for (page_num, page_rects) in rects {
        let Some(&page_id) = pages.get(&(*page_num as u32)) else {
            debug!(page = page_num, "No such page for highlight rects");
            continue;
        };

        for rect in page_rects {
            let annot_id = doc.add_object(highlight_dict(rect));
            attach_annotation(doc, page_id, annot_id)?;
        }
    }

    Ok(())
}

fn highlight_dict(rect: &HighlightRect) -> lopdf::Dictionary {
    dictionary! {
        "Type" => "Annot",
        "Subtype" => "Highlight",
        "Rect" => vec![
            Object::Real(rect.left),
            Object::Real(rect.bottom),
            Object::Real(rect.right),
            Object::Real(rect.top),
        ],
        // Quad order: upper-left, upper-right, lower-left, lower-right.
        "QuadPoints" => vec![
            Object::Real(rect.left),
            Object::Real(rect.top),
            Object::Real(rect.right),
            Object::Real(rect.top),
            Object::Real(rect.left),
            Object::Real(rect.bottom),
            Object::Real(rect.right),
            Object::Real(rect.bottom),
        ],
        // Yellow marker at partial opacity
        "C" => vec![Object::Real(1.0), Object::Real(1.0), Object::Real(0.0)],
        "CA" => Object::Real(0.4),
        "F" => Object::Integer(4),
    }
}

/// Append the annotation reference to the page's /Annots array.
///
/// /Annots may be missing, an inline array, or an indirect reference to
/// an array; all three forms occur in the wild.
fn attach_annotation(
    doc: &mut Document,
    page_id: ObjectId,
    annot_id: ObjectId,
) -> ServiceResult<()> {
    let existing = doc
        .get_dictionary(page_id)
        .ok()
        .and_then(|d| d.get(b"Annots").ok().cloned());

    match existing {
        Some(Object::Reference(array_id)) => {
            let array = doc
                .get_object_mut(array_id)
                .map_err(ProcessingError::Annotation)?
                .as_array_mut()
                .map_err(ProcessingError::Annotation)?;
            array.push(Object::Reference(annot_id));
        }
        Some(Object::Array(mut array)) => {
            array.push(Object::Reference(annot_id));
            let page = doc
                .get_object_mut(page_id)
                .map_err(ProcessingError::Annotation)?
                .as_dict_mut()
                .map_err(ProcessingError::Annotation)?;
            page.set("Annots", Object::Array(array));
        }
        _ => {
            let page = doc
                .get_object_mut(page_id)
                .map_err(ProcessingError::Annotation)?
                .as_dict_mut()
                .map_err(ProcessingError::Annotation)?;
            page.set("Annots", Object::Array(vec![Object::Reference(annot_id)]));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{Stream, dictionary};

    /// Build a minimal PDF with one text line per page
    fn fixture_pdf(page_texts: &[&str]) -> Document {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in page_texts {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![100.into(), 600.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(
                dictionary! {},
                content.encode().expect("encode content stream"),
            ));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            });
            kids.push(page_id.into());
        }

        let page_count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => page_count,
                "Resources" => resources_id,
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        doc
    }

    fn count_highlights(doc: &Document) -> usize {
        doc.objects
            .values()
            .filter(|obj| match obj {
                Object::Dictionary(dict) => dict
                    .get(b"Subtype")
                    .and_then(|o| o.as_name())
                    .map(|name| name == b"Highlight")
                    .unwrap_or(false),
                _ => false,
            })
            .count()
    }

    fn rect(left: f32, bottom: f32, right: f32, top: f32) -> HighlightRect {
        HighlightRect {
            left,
            bottom,
            right,
            top,
        }
    }

    #[test]
    fn inserts_one_annotation_per_rect() {
        let mut doc = fixture_pdf(&["Invoice Total: 500", "nothing relevant"]);

        let mut rects = BTreeMap::new();
        rects.insert(1, vec![rect(100.0, 595.0, 180.0, 620.0)]);

        add_highlights(&mut doc, &rects).expect("add highlights");

        assert_eq!(count_highlights(&doc), 1);

        // The annotation hangs off page 1's /Annots array
        let pages = doc.get_pages();
        let page_id = pages[&1];
        let page = doc.get_dictionary(page_id).expect("page dict");
        let annots = page
            .get(b"Annots")
            .and_then(|o| o.as_array())
            .expect("annots array");
        assert_eq!(annots.len(), 1);
    }

    #[test]
    fn empty_rect_map_leaves_document_unchanged() {
        let mut doc = fixture_pdf(&["some text"]);

        add_highlights(&mut doc, &BTreeMap::new()).expect("add highlights");

        assert_eq!(count_highlights(&doc), 0);
        let pages = doc.get_pages();
        let page = doc.get_dictionary(pages[&1]).expect("page dict");
        assert!(page.get(b"Annots").is_err());
    }

    #[test]
    fn appends_to_existing_annots_array() {
        let mut doc = fixture_pdf(&["line one"]);

        // Give the page a pre-existing (empty) annotation array
        let pages = doc.get_pages();
        let page_id = pages[&1];
        doc.get_object_mut(page_id)
            .expect("page object")
            .as_dict_mut()
            .expect("page dict")
            .set("Annots", Object::Array(vec![]));

        let mut rects = BTreeMap::new();
        rects.insert(1, vec![rect(0.0, 0.0, 10.0, 10.0), rect(20.0, 0.0, 30.0, 10.0)]);
        add_highlights(&mut doc, &rects).expect("add highlights");

        assert_eq!(count_highlights(&doc), 2);
        let page = doc.get_dictionary(page_id).expect("page dict");
        let annots = page
            .get(b"Annots")
            .and_then(|o| o.as_array())
            .expect("annots array");
        assert_eq!(annots.len(), 2);
    }

    #[test]
    fn rects_for_missing_pages_are_skipped() {
        let mut doc = fixture_pdf(&["only page"]);

        let mut rects = BTreeMap::new();
        rects.insert(7, vec![rect(0.0, 0.0, 10.0, 10.0)]);
        add_highlights(&mut doc, &rects).expect("add highlights");

        assert_eq!(count_highlights(&doc), 0);
    }

    #[test]
    fn write_highlights_round_trips_through_a_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("input.pdf");
        let output = dir.path().join("highlighted.pdf");

        let mut doc = fixture_pdf(&["Invoice Total: 500"]);
        doc.save(&input).expect("save fixture");

        let mut rects = BTreeMap::new();
        rects.insert(1, vec![rect(100.0, 595.0, 180.0, 620.0)]);
        write_highlights(&input, &output, &rects).expect("write highlights");

        let saved = Document::load(&output).expect("load output");
        assert_eq!(count_highlights(&saved), 1);

        // Input file is untouched
        let original = Document::load(&input).expect("load input");
        assert_eq!(count_highlights(&original), 0);
    }
}
