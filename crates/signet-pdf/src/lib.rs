// crates/signet-pdf/src/lib.rs
// ============================================================================
// Module: Signet PDF Library
// Description: PDF implementation of the Signet document form engine.
// Purpose: Expose AcroForm synthesis and flattening for PDF documents.
// Dependencies: crate::{dates, engine}
// ============================================================================

//! ## Overview
//! Signet PDF implements the document form engine over the PDF object
//! graph: text widget synthesis at template authoring time and value fill
//! plus flattening at submission time. Documents are treated as immutable
//! inputs; every operation produces a fresh byte vector.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod dates;
pub mod engine;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use dates::normalize_date;
pub use engine::MAX_PAGE_COUNT;
pub use engine::PdfFormEngine;
