// crates/signet-core/src/core/field.rs
// ============================================================================
// Module: Signet Field Model
// Description: Field definitions, kinds, and signer-submitted values.
// Purpose: Describe fillable regions on template pages with stable wire forms.
// Dependencies: crate::core::identifiers, serde, thiserror
// ============================================================================

//! ## Overview
//! Field definitions describe one fillable region each: a placement in
//! raster-page pixel space, a kind, and requiredness. Filled values are the
//! ephemeral signer-submitted counterparts; they exist only for the duration
//! of a submission request and are never persisted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::identifiers::FieldId;

// ============================================================================
// SECTION: Field Kind
// ============================================================================

/// Kinds of fillable fields supported by Signet.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Freehand or typed signature region.
    Signature,
    /// Plain text region.
    Text,
    /// Date region; parseable values are reformatted at fill time.
    Date,
}

// ============================================================================
// SECTION: Field Definition
// ============================================================================

/// One fillable region on a template page, placed in raster pixel space.
///
/// # Invariants
/// - `x, y >= 0`; `width, height >= 1`; `page >= 0` (zero-based).
/// - `id` is unique within the owning template.
/// - Positions are interpreted against the rendering scale used at template
///   authoring time; callers must keep that basis consistent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field identifier, unique within the template.
    pub id: FieldId,
    /// Field kind.
    pub kind: FieldKind,
    /// Horizontal position in pixels from the page's left edge.
    pub x: f64,
    /// Vertical position in pixels from the page's top edge.
    pub y: f64,
    /// Region width in pixels.
    pub width: f64,
    /// Region height in pixels.
    pub height: f64,
    /// Zero-based page index.
    pub page: u32,
    /// Indicates whether a value must be submitted for this field.
    pub required: bool,
    /// Optional placeholder text shown before filling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// Optional human-readable label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl FieldDef {
    /// Validates the geometry invariants for this field definition.
    ///
    /// # Errors
    ///
    /// Returns [`FieldGeometryError`] when a coordinate is negative or a
    /// dimension is below one pixel.
    pub fn validate_geometry(&self) -> Result<(), FieldGeometryError> {
        if !(self.x >= 0.0 && self.y >= 0.0) {
            return Err(FieldGeometryError::NegativePosition {
                field_id: self.id.clone(),
                x: self.x,
                y: self.y,
            });
        }
        if !(self.width >= 1.0 && self.height >= 1.0) {
            return Err(FieldGeometryError::DegenerateSize {
                field_id: self.id.clone(),
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

/// Geometry validation errors for field definitions.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum FieldGeometryError {
    /// Position components must be non-negative.
    #[error("field {field_id} has negative position ({x}, {y})")]
    NegativePosition {
        /// Offending field identifier.
        field_id: FieldId,
        /// Horizontal position in pixels.
        x: f64,
        /// Vertical position in pixels.
        y: f64,
    },
    /// Dimensions must be at least one pixel.
    #[error("field {field_id} has degenerate size ({width} x {height})")]
    DegenerateSize {
        /// Offending field identifier.
        field_id: FieldId,
        /// Region width in pixels.
        width: f64,
        /// Region height in pixels.
        height: f64,
    },
}

// ============================================================================
// SECTION: Filled Value
// ============================================================================

/// Signer-submitted value for one field.
///
/// # Invariants
/// - Ephemeral; exists only for the duration of a submission request.
/// - `kind` must match the corresponding field definition's kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilledValue {
    /// Identifier of the field being filled.
    pub field_id: FieldId,
    /// Raw submitted value.
    pub value: String,
    /// Field kind asserted by the submitter.
    pub kind: FieldKind,
}
