// crates/signet-pdf/src/engine.rs
// ============================================================================
// Module: Signet PDF Form Engine
// Description: AcroForm synthesis, value fill, and flattening over lopdf.
// Purpose: Implement the document form engine for PDF documents.
// Dependencies: signet-core, lopdf, tracing
// ============================================================================

//! ## Overview
//! The PDF form engine works directly on the document object graph. Field
//! synthesis creates one text widget annotation per field definition, wired
//! into a document-level AcroForm dictionary. Fill-and-flatten paints the
//! submitted values into the page content streams, then strips the widget
//! annotations and the AcroForm so the output carries zero interactive
//! fields. Per-field failures are logged and skipped; only an unloadable or
//! over-limit document aborts an operation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use lopdf::Dictionary;
use lopdf::Document;
use lopdf::Object;
use lopdf::ObjectId;
use lopdf::StringFormat;
use lopdf::dictionary;
use signet_core::FieldDef;
use signet_core::FieldKind;
use signet_core::FilledValue;
use signet_core::FlattenOutput;
use signet_core::FormEngine;
use signet_core::FormEngineError;
use signet_core::PixelRect;
use signet_core::to_document_space;

use crate::dates::normalize_date;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum accepted page count for any document.
pub const MAX_PAGE_COUNT: u32 = 50;

/// Font size used for widget appearance and flattened text.
const FONT_SIZE: f64 = 12.0;

/// Resource name of the shared Helvetica font.
const FONT_RESOURCE: &str = "Helv";

/// Default appearance string applied to synthesized widgets.
const DEFAULT_APPEARANCE: &[u8] = b"/Helv 12 Tf 0 g";

/// Fallback page height (US letter) when no MediaBox is resolvable.
const FALLBACK_PAGE_HEIGHT: f64 = 792.0;

/// Horizontal text inset from the field's left edge, in document units.
const TEXT_INSET_X: f64 = 2.0;

/// Baseline lift from the field's bottom edge, in document units.
const TEXT_INSET_Y: f64 = 3.0;

/// Maximum page-tree ancestors visited when resolving an inherited MediaBox.
const PARENT_WALK_LIMIT: usize = 64;

// ============================================================================
// SECTION: Engine
// ============================================================================

/// Document form engine for PDF documents.
///
/// # Invariants
/// - Stateless; every operation parses its input bytes from scratch and
///   writes a new byte vector, never mutating input in place.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfFormEngine;

impl PdfFormEngine {
    /// Creates a new engine.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl FormEngine for PdfFormEngine {
    fn inspect(&self, document: &[u8]) -> Result<u32, FormEngineError> {
        let (_, page_count) = load_document(document)?;
        Ok(page_count)
    }

    fn synthesize_fields(
        &self,
        document: &[u8],
        fields: &[FieldDef],
    ) -> Result<Vec<u8>, FormEngineError> {
        let (mut doc, _) = load_document(document)?;
        let pages = doc.get_pages();
        let font_id = doc.add_object(helvetica_font());

        let mut field_refs: Vec<Object> = Vec::with_capacity(fields.len());
        for field in fields {
            match synthesize_widget(&mut doc, &pages, field) {
                Ok(annotation_id) => field_refs.push(Object::Reference(annotation_id)),
                Err(reason) => {
                    tracing::warn!(field = %field.id, page = field.page, reason, "skipping field synthesis");
                }
            }
        }

        let acroform_id = doc.add_object(dictionary! {
            "Fields" => field_refs,
            "NeedAppearances" => true,
            "DA" => Object::String(DEFAULT_APPEARANCE.to_vec(), StringFormat::Literal),
            "DR" => dictionary! {
                "Font" => dictionary! { FONT_RESOURCE => font_id },
            },
        });
        set_catalog_acroform(&mut doc, acroform_id).map_err(FormEngineError::Engine)?;
        save_bytes(&mut doc)
    }

    fn fill_and_flatten(
        &self,
        document: &[u8],
        values: &[FilledValue],
    ) -> Result<FlattenOutput, FormEngineError> {
        let (mut doc, page_count) = load_document(document)?;
        let pages = doc.get_pages();

        let mut fill: BTreeMap<String, String> = BTreeMap::new();
        for value in values {
            fill.insert(value.field_id.to_string(), display_value(value));
        }

        let font_id = doc.add_object(helvetica_font());
        for page_id in pages.values() {
            if let Err(reason) = flatten_page(&mut doc, *page_id, &fill, font_id) {
                return Err(FormEngineError::Engine(reason));
            }
        }
        remove_catalog_acroform(&mut doc);

        let bytes = save_bytes(&mut doc)?;
        Ok(FlattenOutput {
            bytes,
            page_count,
        })
    }
}

// ============================================================================
// SECTION: Document Loading
// ============================================================================

/// Parses document bytes and enforces the page-count bounds.
fn load_document(document: &[u8]) -> Result<(Document, u32), FormEngineError> {
    let doc = Document::load_mem(document)
        .map_err(|error| FormEngineError::InvalidDocument(error.to_string()))?;
    let pages = doc.get_pages();
    if pages.is_empty() {
        return Err(FormEngineError::InvalidDocument("document has no pages".to_string()));
    }
    let page_count = u32::try_from(pages.len()).unwrap_or(u32::MAX);
    if page_count > MAX_PAGE_COUNT {
        return Err(FormEngineError::PageLimitExceeded {
            pages: page_count,
            max: MAX_PAGE_COUNT,
        });
    }
    Ok((doc, page_count))
}

/// Serializes the document into a fresh byte vector.
fn save_bytes(doc: &mut Document) -> Result<Vec<u8>, FormEngineError> {
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).map_err(|error| FormEngineError::Engine(error.to_string()))?;
    Ok(bytes)
}

// ============================================================================
// SECTION: Field Synthesis
// ============================================================================

/// Shared Helvetica font dictionary for widget appearance and flattening.
fn helvetica_font() -> Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    }
}

/// Creates one text widget annotation for a field and attaches it to its
/// page.
fn synthesize_widget(
    doc: &mut Document,
    pages: &BTreeMap<u32, ObjectId>,
    field: &FieldDef,
) -> Result<ObjectId, String> {
    let page_number = field.page.checked_add(1).ok_or_else(|| "page out of range".to_string())?;
    let page_id = *pages
        .get(&page_number)
        .ok_or_else(|| format!("page {} out of range", field.page))?;
    let page_height = page_height(doc, page_id);

    // Field placements are authored against a full-scale render of the page.
    let rect = to_document_space(
        PixelRect {
            x: field.x,
            y: field.y,
            width: field.width,
            height: field.height,
        },
        page_height,
        1.0,
    );

    let mut widget = dictionary! {
        "Type" => "Annot",
        "Subtype" => "Widget",
        "FT" => "Tx",
        "T" => Object::String(field.id.to_string().into_bytes(), StringFormat::Literal),
        "Rect" => vec![
            real(rect.x),
            real(rect.y),
            real(rect.x + rect.width),
            real(rect.y + rect.height),
        ],
        "F" => 4,
        "DA" => Object::String(DEFAULT_APPEARANCE.to_vec(), StringFormat::Literal),
        "MK" => dictionary! {
            "BC" => gray_components(0.5),
            "BG" => gray_components(0.95),
        },
    };
    if let Some(label) = &field.label {
        widget.set("TU", Object::String(label.clone().into_bytes(), StringFormat::Literal));
    }

    let annotation_id = doc.add_object(widget);
    append_annotation(doc, page_id, annotation_id)?;
    Ok(annotation_id)
}

/// Appends an annotation reference to a page's annotation array.
fn append_annotation(
    doc: &mut Document,
    page_id: ObjectId,
    annotation_id: ObjectId,
) -> Result<(), String> {
    let mut annotations = take_annotations(doc, page_id)?;
    annotations.push(Object::Reference(annotation_id));
    let page_dict = doc
        .get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(|_| "page dictionary missing".to_string())?;
    page_dict.set("Annots", annotations);
    Ok(())
}

// ============================================================================
// SECTION: Fill and Flatten
// ============================================================================

/// Renders a submitted value for display, normalizing date fields.
fn display_value(value: &FilledValue) -> String {
    match value.kind {
        FieldKind::Date => normalize_date(&value.value),
        FieldKind::Signature | FieldKind::Text => value.value.clone(),
    }
}

/// Paints submitted values over a page's text widgets and strips the
/// widgets, leaving other annotations in place.
fn flatten_page(
    doc: &mut Document,
    page_id: ObjectId,
    fill: &BTreeMap<String, String>,
    font_id: ObjectId,
) -> Result<(), String> {
    let annotations = take_annotations(doc, page_id)?;
    if annotations.is_empty() {
        return Ok(());
    }

    let mut retained: Vec<Object> = Vec::new();
    let mut paints: Vec<(String, [f64; 4])> = Vec::new();
    for entry in &annotations {
        match text_widget(doc, entry) {
            Some((name, rect, default_text)) => {
                // Unfilled fields keep the text already stored on the widget.
                let text = fill.get(&name).cloned().or(default_text);
                if let Some(text) = text {
                    paints.push((text, rect));
                }
            }
            None => retained.push(entry.clone()),
        }
    }

    if !paints.is_empty() {
        ensure_page_font(doc, page_id, font_id)?;
    }
    for (text, rect) in paints {
        let x = rect[0] + TEXT_INSET_X;
        let y = rect[1] + TEXT_INSET_Y;
        let content = format!(
            "q BT /{FONT_RESOURCE} {FONT_SIZE} Tf 0 g {x:.2} {y:.2} Td ({}) Tj ET Q",
            escape_text(&text)
        );
        if let Err(error) = doc.add_page_contents(page_id, content.into_bytes()) {
            tracing::warn!(%error, "skipping field paint");
        }
    }

    if !retained.is_empty() {
        let page_dict = doc
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(|_| "page dictionary missing".to_string())?;
        page_dict.set("Annots", retained);
    }
    Ok(())
}

/// Resolves an annotation entry into a text widget's name, rectangle, and
/// stored default text.
///
/// Returns `None` for annotations that are not text widgets or that cannot
/// be resolved; those are retained untouched.
fn text_widget(doc: &Document, entry: &Object) -> Option<(String, [f64; 4], Option<String>)> {
    let dict = match entry {
        Object::Reference(id) => doc.get_object(*id).ok()?.as_dict().ok()?,
        Object::Dictionary(dict) => dict,
        _ => return None,
    };
    let subtype = dict.get(b"Subtype").ok()?;
    if !matches!(subtype, Object::Name(name) if name == b"Widget") {
        return None;
    }
    let field_type = dict.get(b"FT").ok()?;
    if !matches!(field_type, Object::Name(name) if name == b"Tx") {
        return None;
    }
    let name = match dict.get(b"T").ok()? {
        Object::String(bytes, _) => String::from_utf8_lossy(bytes).into_owned(),
        _ => return None,
    };
    let rect = dict.get(b"Rect").ok()?.as_array().ok()?;
    if rect.len() != 4 {
        return None;
    }
    let llx = numeric(&rect[0])?;
    let lly = numeric(&rect[1])?;
    let urx = numeric(&rect[2])?;
    let ury = numeric(&rect[3])?;
    let default_text = match dict.get(b"V") {
        Ok(Object::String(bytes, _)) => Some(String::from_utf8_lossy(bytes).into_owned()),
        _ => None,
    };
    Some((name, [llx, lly, urx, ury], default_text))
}

/// Escapes text for a PDF literal string, collapsing line breaks.
fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '(' => escaped.push_str("\\("),
            ')' => escaped.push_str("\\)"),
            '\n' | '\r' => escaped.push(' '),
            other => escaped.push(other),
        }
    }
    escaped
}

// ============================================================================
// SECTION: Object Graph Helpers
// ============================================================================

/// Converts a document-space coordinate to a PDF numeric object.
#[expect(clippy::cast_possible_truncation, reason = "PDF real numbers are single precision")]
fn real(value: f64) -> Object {
    Object::Real(value as f32)
}

/// Builds a single-component gray color array.
fn gray_components(level: f32) -> Vec<Object> {
    vec![Object::Real(level), Object::Real(level), Object::Real(level)]
}

/// Reads a numeric object as `f64`.
fn numeric(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(value) => Some(f64::from(i32::try_from(*value).ok()?)),
        Object::Real(value) => Some(f64::from(*value)),
        _ => None,
    }
}

/// Removes and returns a page's annotation array, resolving an indirect
/// array reference to its contents.
fn take_annotations(doc: &mut Document, page_id: ObjectId) -> Result<Vec<Object>, String> {
    let removed = {
        let page_dict = doc
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(|_| "page dictionary missing".to_string())?;
        page_dict.remove(b"Annots")
    };
    match removed {
        None => Ok(Vec::new()),
        Some(Object::Array(items)) => Ok(items),
        Some(Object::Reference(id)) => doc
            .get_object(id)
            .and_then(Object::as_array)
            .map(Clone::clone)
            .map_err(|_| "annotation array unresolvable".to_string()),
        Some(_) => Err("annotation entry invalid".to_string()),
    }
}

/// Resolves a page's height by walking the page tree for a MediaBox.
///
/// The ancestor walk is bounded so a malformed document with a circular
/// parent chain cannot loop forever.
fn page_height(doc: &Document, page_id: ObjectId) -> f64 {
    let mut current = Some(page_id);
    for _ in 0 .. PARENT_WALK_LIMIT {
        let Some(id) = current else {
            break;
        };
        let Ok(dict) = doc.get_object(id).and_then(Object::as_dict) else {
            break;
        };
        if let Some(height) = media_box_height(doc, dict) {
            return height;
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok();
    }
    FALLBACK_PAGE_HEIGHT
}

/// Extracts the MediaBox height from a page-tree dictionary.
fn media_box_height(doc: &Document, dict: &Dictionary) -> Option<f64> {
    let raw = dict.get(b"MediaBox").ok()?;
    let resolved = match raw {
        Object::Reference(id) => doc.get_object(*id).ok()?,
        other => other,
    };
    let array = resolved.as_array().ok()?;
    if array.len() != 4 {
        return None;
    }
    let lower = numeric(&array[1])?;
    let upper = numeric(&array[3])?;
    Some(upper - lower)
}

/// Ensures the shared font is reachable from a page's resource dictionary.
fn ensure_page_font(
    doc: &mut Document,
    page_id: ObjectId,
    font_id: ObjectId,
) -> Result<(), String> {
    let mut resources = {
        let page_dict = doc
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(|_| "page dictionary missing".to_string())?;
        page_dict
            .remove(b"Resources")
            .unwrap_or_else(|| Object::Dictionary(dictionary! {}))
    };

    match &mut resources {
        Object::Reference(id) => {
            let shared = doc
                .get_object_mut(*id)
                .and_then(Object::as_dict_mut)
                .map_err(|_| "resource dictionary unresolvable".to_string())?;
            set_font_entry(shared, font_id)?;
        }
        Object::Dictionary(dict) => set_font_entry(dict, font_id)?,
        _ => return Err("resource entry invalid".to_string()),
    }

    let page_dict = doc
        .get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(|_| "page dictionary missing".to_string())?;
    page_dict.set("Resources", resources);
    Ok(())
}

/// Registers the shared font under the resource dictionary's font map.
fn set_font_entry(resources: &mut Dictionary, font_id: ObjectId) -> Result<(), String> {
    let owned = resources
        .remove(b"Font")
        .unwrap_or_else(|| Object::Dictionary(dictionary! {}));
    let sanitized = match owned {
        Object::Dictionary(dict) => Object::Dictionary(dict),
        Object::Reference(_) => Object::Dictionary(dictionary! {}),
        _ => return Err("font entry invalid".to_string()),
    };
    resources.set("Font", sanitized);
    match resources.get_mut(b"Font") {
        Ok(Object::Dictionary(dict)) => {
            dict.set(FONT_RESOURCE, font_id);
            Ok(())
        }
        _ => Err("font entry invalid".to_string()),
    }
}

/// Installs the AcroForm dictionary on the document catalog.
fn set_catalog_acroform(doc: &mut Document, acroform_id: ObjectId) -> Result<(), String> {
    let root_id = doc
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|_| "document catalog missing".to_string())?;
    let catalog = doc
        .get_object_mut(root_id)
        .and_then(Object::as_dict_mut)
        .map_err(|_| "document catalog missing".to_string())?;
    catalog.set("AcroForm", acroform_id);
    Ok(())
}

/// Strips the AcroForm dictionary from the document catalog, if present.
fn remove_catalog_acroform(doc: &mut Document) {
    let root_id = doc.trailer.get(b"Root").and_then(Object::as_reference).ok();
    if let Some(root_id) = root_id
        && let Ok(catalog) = doc.get_object_mut(root_id).and_then(Object::as_dict_mut)
    {
        catalog.remove(b"AcroForm");
    }
}
