// crates/signet-core/src/core/mod.rs
// ============================================================================
// Module: Signet Core Model
// Description: Data model for templates, fields, links, and audits.
// Purpose: Group the canonical Signet types behind one module path.
// Dependencies: crate::core submodules
// ============================================================================

//! ## Overview
//! The core model is pure data plus pure functions: identifiers, timestamps,
//! field definitions, templates, sign links, audit records, the coordinate
//! mapper, and the field validator. Nothing here performs I/O.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod field;
pub mod geometry;
pub mod identifiers;
pub mod link;
pub mod template;
pub mod time;
pub mod validation;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AuditRecord;
pub use field::FieldDef;
pub use field::FieldGeometryError;
pub use field::FieldKind;
pub use field::FilledValue;
pub use geometry::DocumentRect;
pub use geometry::PixelRect;
pub use geometry::to_document_space;
pub use geometry::to_pixel_space;
pub use identifiers::AuditId;
pub use identifiers::DocumentKey;
pub use identifiers::FieldId;
pub use identifiers::SignToken;
pub use identifiers::TemplateId;
pub use link::SignLink;
pub use link::SignLinkStatus;
pub use template::DocumentRecord;
pub use template::Template;
pub use time::DAY_MILLIS;
pub use time::SECOND_MILLIS;
pub use time::Timestamp;
pub use validation::ValidationError;
pub use validation::validate_filled_values;
