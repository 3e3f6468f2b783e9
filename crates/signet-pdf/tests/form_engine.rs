// crates/signet-pdf/tests/form_engine.rs
// ============================================================================
// Module: PDF Form Engine Tests
// Description: Tests for widget synthesis, value fill, and flattening.
// Purpose: Validate the form engine over programmatically built documents.
// Dependencies: signet-pdf, signet-core, lopdf
// ============================================================================

//! ## Overview
//! Builds small PDF documents in memory and drives the form engine end to
//! end: page-count validation, widget synthesis with coordinate mapping,
//! per-field skip behavior, flattening to static content, and flatten
//! idempotence.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use lopdf::Document;
use lopdf::Object;
use lopdf::Stream;
use lopdf::dictionary;
use signet_core::FieldDef;
use signet_core::FieldId;
use signet_core::FieldKind;
use signet_core::FilledValue;
use signet_core::FormEngine;
use signet_core::FormEngineError;
use signet_pdf::MAX_PAGE_COUNT;
use signet_pdf::PdfFormEngine;

/// Builds a minimal document with the given page count and an inherited
/// US-letter MediaBox on the page-tree root.
fn minimal_pdf(page_count: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids: Vec<Object> = Vec::new();
    for _ in 0 .. page_count {
        let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count as i64,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

fn field(id: &str, page: u32, x: f64, y: f64, width: f64, height: f64) -> FieldDef {
    FieldDef {
        id: FieldId::new(id),
        kind: FieldKind::Text,
        x,
        y,
        width,
        height,
        page,
        required: true,
        placeholder: None,
        label: None,
    }
}

fn filled(id: &str, kind: FieldKind, value: &str) -> FilledValue {
    FilledValue {
        field_id: FieldId::new(id),
        value: value.to_string(),
        kind,
    }
}

/// Resolves the AcroForm field array length of a document, if present.
fn acroform_field_count(doc: &Document) -> Option<usize> {
    let root_id = doc.trailer.get(b"Root").and_then(Object::as_reference).ok()?;
    let catalog = doc.get_object(root_id).and_then(Object::as_dict).ok()?;
    let acroform_id = catalog.get(b"AcroForm").and_then(Object::as_reference).ok()?;
    let acroform = doc.get_object(acroform_id).and_then(Object::as_dict).ok()?;
    let fields = acroform.get(b"Fields").and_then(Object::as_array).ok()?;
    Some(fields.len())
}

/// Collects a page's annotation dictionaries.
fn page_annotations(doc: &Document, page_number: u32) -> Vec<lopdf::Dictionary> {
    let pages = doc.get_pages();
    let Some(page_id) = pages.get(&page_number) else {
        return Vec::new();
    };
    let Ok(page_dict) = doc.get_object(*page_id).and_then(Object::as_dict) else {
        return Vec::new();
    };
    let Ok(annots) = page_dict.get(b"Annots").and_then(Object::as_array) else {
        return Vec::new();
    };
    annots
        .iter()
        .filter_map(|entry| match entry {
            Object::Reference(id) => {
                doc.get_object(*id).and_then(Object::as_dict).ok().cloned()
            }
            Object::Dictionary(dict) => Some(dict.clone()),
            _ => None,
        })
        .collect()
}

/// Verifies inspection returns the document's page count.
#[test]
fn inspect_returns_page_count() {
    let engine = PdfFormEngine::new();
    assert_eq!(engine.inspect(&minimal_pdf(3)).unwrap(), 3);
}

/// Verifies inspection rejects non-PDF bytes.
#[test]
fn inspect_rejects_garbage() {
    let engine = PdfFormEngine::new();
    let result = engine.inspect(b"not a pdf at all");
    assert!(matches!(result, Err(FormEngineError::InvalidDocument(_))));
}

/// Verifies inspection rejects documents over the page limit.
#[test]
fn inspect_rejects_over_limit() {
    let engine = PdfFormEngine::new();
    let oversized = minimal_pdf(MAX_PAGE_COUNT as usize + 1);
    let result = engine.inspect(&oversized);
    let Err(FormEngineError::PageLimitExceeded {
        pages,
        max,
    }) = result
    else {
        panic!("expected page limit error");
    };
    assert_eq!(pages, MAX_PAGE_COUNT + 1);
    assert_eq!(max, MAX_PAGE_COUNT);
}

/// Verifies synthesis creates one text widget per field with mapped
/// coordinates.
#[test]
fn synthesize_creates_mapped_widgets() {
    let engine = PdfFormEngine::new();
    let output = engine
        .synthesize_fields(
            &minimal_pdf(1),
            &[
                field("sig1", 0, 10.0, 20.0, 100.0, 30.0),
                field("date1", 0, 10.0, 60.0, 80.0, 20.0),
            ],
        )
        .unwrap();

    let doc = Document::load_mem(&output).unwrap();
    assert_eq!(acroform_field_count(&doc), Some(2));

    let annotations = page_annotations(&doc, 1);
    assert_eq!(annotations.len(), 2);
    let sig = annotations
        .iter()
        .find(|dict| {
            matches!(dict.get(b"T"), Ok(Object::String(bytes, _)) if bytes == b"sig1")
        })
        .unwrap();
    let rect = sig.get(b"Rect").and_then(Object::as_array).unwrap();
    let values: Vec<f64> = rect
        .iter()
        .map(|obj| match obj {
            Object::Real(v) => f64::from(*v),
            Object::Integer(v) => *v as f64,
            _ => panic!("unexpected rect component"),
        })
        .collect();
    // Authored at top-left (10, 20), 100x30, on a 792-high page.
    assert!((values[0] - 10.0).abs() < 0.01);
    assert!((values[1] - 742.0).abs() < 0.01);
    assert!((values[2] - 110.0).abs() < 0.01);
    assert!((values[3] - 772.0).abs() < 0.01);
}

/// Verifies a field on a missing page is skipped without failing the rest.
#[test]
fn synthesize_skips_out_of_range_page() {
    let engine = PdfFormEngine::new();
    let output = engine
        .synthesize_fields(
            &minimal_pdf(1),
            &[
                field("sig1", 0, 10.0, 20.0, 100.0, 30.0),
                field("ghost", 5, 10.0, 20.0, 100.0, 30.0),
            ],
        )
        .unwrap();

    let doc = Document::load_mem(&output).unwrap();
    assert_eq!(acroform_field_count(&doc), Some(1));
    assert_eq!(page_annotations(&doc, 1).len(), 1);
}

/// Verifies flattening paints submitted values and strips all interactive
/// structure.
#[test]
fn fill_and_flatten_paints_and_strips() {
    let engine = PdfFormEngine::new();
    let form = engine
        .synthesize_fields(&minimal_pdf(1), &[field("sig1", 0, 10.0, 20.0, 100.0, 30.0)])
        .unwrap();
    let output = engine
        .fill_and_flatten(&form, &[filled("sig1", FieldKind::Signature, "Jane Doe")])
        .unwrap();
    assert_eq!(output.page_count, 1);

    let doc = Document::load_mem(&output.bytes).unwrap();
    assert_eq!(acroform_field_count(&doc), None);
    assert!(page_annotations(&doc, 1).is_empty());

    let pages = doc.get_pages();
    let content = doc.get_page_content(pages[&1]).unwrap();
    let text = String::from_utf8_lossy(&content);
    assert!(text.contains("(Jane Doe) Tj"), "content missing painted text: {text}");
}

/// Verifies date values are normalized at fill time.
#[test]
fn fill_normalizes_date_values() {
    let engine = PdfFormEngine::new();
    let form = engine
        .synthesize_fields(&minimal_pdf(1), &[field("date1", 0, 10.0, 20.0, 80.0, 20.0)])
        .unwrap();
    let output = engine
        .fill_and_flatten(&form, &[filled("date1", FieldKind::Date, "2026-08-30")])
        .unwrap();

    let doc = Document::load_mem(&output.bytes).unwrap();
    let pages = doc.get_pages();
    let content = doc.get_page_content(pages[&1]).unwrap();
    let text = String::from_utf8_lossy(&content);
    assert!(text.contains("(8/30/2026) Tj"), "content missing date text: {text}");
}

/// Verifies parenthesized text is escaped into the content stream.
#[test]
fn fill_escapes_literal_text() {
    let engine = PdfFormEngine::new();
    let form = engine
        .synthesize_fields(&minimal_pdf(1), &[field("note", 0, 10.0, 20.0, 200.0, 20.0)])
        .unwrap();
    let output = engine
        .fill_and_flatten(&form, &[filled("note", FieldKind::Text, "a (quoted) value")])
        .unwrap();

    let doc = Document::load_mem(&output.bytes).unwrap();
    let pages = doc.get_pages();
    let content = doc.get_page_content(pages[&1]).unwrap();
    let text = String::from_utf8_lossy(&content);
    assert!(text.contains("(a \\(quoted\\) value) Tj"), "content not escaped: {text}");
}

/// Verifies flattening a flattened document again is a no-op on structure.
#[test]
fn flatten_is_idempotent() {
    let engine = PdfFormEngine::new();
    let form = engine
        .synthesize_fields(&minimal_pdf(2), &[field("sig1", 1, 10.0, 20.0, 100.0, 30.0)])
        .unwrap();
    let first = engine
        .fill_and_flatten(&form, &[filled("sig1", FieldKind::Signature, "Jane Doe")])
        .unwrap();
    let second = engine.fill_and_flatten(&first.bytes, &[]).unwrap();
    assert_eq!(second.page_count, first.page_count);

    let doc = Document::load_mem(&second.bytes).unwrap();
    assert_eq!(acroform_field_count(&doc), None);
    assert!(page_annotations(&doc, 2).is_empty());
    let pages = doc.get_pages();
    let content = doc.get_page_content(pages[&2]).unwrap();
    assert!(String::from_utf8_lossy(&content).contains("(Jane Doe) Tj"));
}

/// Verifies a widget with stored text and no submitted value keeps its
/// text through flattening.
#[test]
fn flatten_preserves_prefilled_widget_text() {
    let engine = PdfFormEngine::new();
    let form = engine
        .synthesize_fields(&minimal_pdf(1), &[field("note", 0, 10.0, 20.0, 200.0, 20.0)])
        .unwrap();

    // Store default text on the widget, as an externally authored form would.
    let mut doc = Document::load_mem(&form).unwrap();
    let pages = doc.get_pages();
    let annots = {
        let page_dict = doc.get_object(pages[&1]).and_then(Object::as_dict).unwrap();
        page_dict.get(b"Annots").and_then(Object::as_array).unwrap().clone()
    };
    let Object::Reference(widget_id) = annots[0] else {
        panic!("expected widget reference");
    };
    let widget = doc.get_object_mut(widget_id).and_then(Object::as_dict_mut).unwrap();
    widget.set("V", Object::String(b"KEEP ME".to_vec(), lopdf::StringFormat::Literal));
    let mut prefilled = Vec::new();
    doc.save_to(&mut prefilled).unwrap();

    let output = engine.fill_and_flatten(&prefilled, &[]).unwrap();
    let flattened = Document::load_mem(&output.bytes).unwrap();
    assert!(page_annotations(&flattened, 1).is_empty());
    let flattened_pages = flattened.get_pages();
    let content = flattened.get_page_content(flattened_pages[&1]).unwrap();
    let text = String::from_utf8_lossy(&content);
    assert!(text.contains("(KEEP ME) Tj"), "stored text lost in flatten: {text}");
}

/// Verifies a submitted value wins over a widget's stored text.
#[test]
fn fill_overrides_prefilled_widget_text() {
    let engine = PdfFormEngine::new();
    let form = engine
        .synthesize_fields(&minimal_pdf(1), &[field("note", 0, 10.0, 20.0, 200.0, 20.0)])
        .unwrap();

    let mut doc = Document::load_mem(&form).unwrap();
    let pages = doc.get_pages();
    let annots = {
        let page_dict = doc.get_object(pages[&1]).and_then(Object::as_dict).unwrap();
        page_dict.get(b"Annots").and_then(Object::as_array).unwrap().clone()
    };
    let Object::Reference(widget_id) = annots[0] else {
        panic!("expected widget reference");
    };
    let widget = doc.get_object_mut(widget_id).and_then(Object::as_dict_mut).unwrap();
    widget.set("V", Object::String(b"stale".to_vec(), lopdf::StringFormat::Literal));
    let mut prefilled = Vec::new();
    doc.save_to(&mut prefilled).unwrap();

    let output = engine
        .fill_and_flatten(&prefilled, &[filled("note", FieldKind::Text, "fresh")])
        .unwrap();
    let flattened = Document::load_mem(&output.bytes).unwrap();
    let flattened_pages = flattened.get_pages();
    let content = flattened.get_page_content(flattened_pages[&1]).unwrap();
    let text = String::from_utf8_lossy(&content);
    assert!(text.contains("(fresh) Tj"), "submitted value not painted: {text}");
    assert!(!text.contains("(stale) Tj"), "stored text should be replaced: {text}");
}

/// Verifies synthesis terminates on a document whose page tree forms a
/// parent cycle, falling back to the default page height.
#[test]
fn synthesize_survives_circular_page_tree() {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    // No MediaBox anywhere, and the page-tree root claims itself as parent.
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
            "Parent" => pages_id,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();

    let engine = PdfFormEngine::new();
    let output = engine
        .synthesize_fields(&bytes, &[field("sig1", 0, 10.0, 20.0, 100.0, 30.0)])
        .unwrap();
    let synthesized = Document::load_mem(&output).unwrap();
    assert_eq!(acroform_field_count(&synthesized), Some(1));
    assert_eq!(page_annotations(&synthesized, 1).len(), 1);
}

/// Verifies non-widget annotations survive flattening.
#[test]
fn flatten_retains_non_widget_annotations() {
    let engine = PdfFormEngine::new();
    let form = engine
        .synthesize_fields(&minimal_pdf(1), &[field("sig1", 0, 10.0, 20.0, 100.0, 30.0)])
        .unwrap();

    // Add a link annotation alongside the synthesized widget.
    let mut doc = Document::load_mem(&form).unwrap();
    let pages = doc.get_pages();
    let page_id = pages[&1];
    let link_id = doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Link",
        "Rect" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(50),
            Object::Integer(50),
        ],
    });
    let page_dict = doc.get_object_mut(page_id).and_then(Object::as_dict_mut).unwrap();
    let annots = page_dict.get_mut(b"Annots").and_then(Object::as_array_mut).unwrap();
    annots.push(Object::Reference(link_id));
    let mut with_link = Vec::new();
    doc.save_to(&mut with_link).unwrap();

    let output = engine
        .fill_and_flatten(&with_link, &[filled("sig1", FieldKind::Signature, "Jane Doe")])
        .unwrap();
    let flattened = Document::load_mem(&output.bytes).unwrap();
    let remaining = page_annotations(&flattened, 1);
    assert_eq!(remaining.len(), 1);
    assert!(matches!(
        remaining[0].get(b"Subtype"),
        Ok(Object::Name(name)) if name == b"Link"
    ));
}
