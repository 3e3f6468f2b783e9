// crates/signet-core/src/core/template.rs
// ============================================================================
// Module: Signet Template Model
// Description: Document templates and their ordered field definitions.
// Purpose: Bind a source document to the fields a signer must fill.
// Dependencies: crate::core::{field, identifiers, time}, serde
// ============================================================================

//! ## Overview
//! A template is a named source document plus its ordered field definitions.
//! Templates are immutable once created; the surrounding system implements
//! updates as create-new.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::field::FieldDef;
use crate::core::identifiers::DocumentKey;
use crate::core::identifiers::TemplateId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Template
// ============================================================================

/// A named document template with its ordered field definitions.
///
/// # Invariants
/// - Immutable once created.
/// - `fields` preserves authoring order; field identifiers are unique within
///   the template.
/// - `source_document` addresses the original bytes, which are never mutated
///   in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    /// Template identifier.
    pub template_id: TemplateId,
    /// Human-readable template name.
    pub name: String,
    /// Key of the original source document.
    pub source_document: DocumentKey,
    /// Creation timestamp.
    pub created_at: Timestamp,
    /// Ordered field definitions.
    pub fields: Vec<FieldDef>,
}

/// Stored document metadata referencing object-store bytes.
///
/// # Invariants
/// - `key` is the object-store address of the bytes; the record never embeds
///   document content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Object-store key of the document bytes.
    pub key: DocumentKey,
    /// Original upload filename.
    pub filename: String,
    /// Content type of the stored bytes.
    pub content_type: String,
    /// Page count determined at upload validation.
    pub page_count: u32,
    /// Upload timestamp.
    pub uploaded_at: Timestamp,
}
