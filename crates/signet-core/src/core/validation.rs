// crates/signet-core/src/core/validation.rs
// ============================================================================
// Module: Signet Field Validator
// Description: Completeness checking for signer-submitted field values.
// Purpose: Decide whether a submission satisfies a template's requirements.
// Dependencies: crate::core::{field, identifiers}, thiserror
// ============================================================================

//! ## Overview
//! Validation is a pure function of the template's field definitions and the
//! submitted values. It checks completeness only: every required field must
//! have a submitted value. Values referencing unknown field identifiers are
//! tolerated (stale client state) and simply ignored downstream. Date values
//! are not format-checked here; the form engine reformats parseable dates at
//! fill time and passes the rest through verbatim.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use thiserror::Error;

use crate::core::field::FieldDef;
use crate::core::field::FilledValue;
use crate::core::identifiers::FieldId;

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Validation errors for submitted field values.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - `missing` is sorted, so the result is independent of submission order.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// One or more required fields have no submitted value.
    #[error("missing required fields: {missing:?}")]
    MissingRequiredFields {
        /// Sorted identifiers of the required fields left unfilled.
        missing: Vec<FieldId>,
    },
}

/// Checks that every required field definition has a submitted value.
///
/// # Errors
///
/// Returns [`ValidationError::MissingRequiredFields`] listing the required
/// field identifiers absent from `filled`, in sorted order.
pub fn validate_filled_values(
    fields: &[FieldDef],
    filled: &[FilledValue],
) -> Result<(), ValidationError> {
    let submitted: BTreeSet<&FieldId> = filled.iter().map(|value| &value.field_id).collect();
    let missing: Vec<FieldId> = fields
        .iter()
        .filter(|field| field.required && !submitted.contains(&field.id))
        .map(|field| field.id.clone())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        // Field definitions arrive in authoring order; sort for a canonical
        // error shape.
        let mut missing = missing;
        missing.sort();
        Err(ValidationError::MissingRequiredFields {
            missing,
        })
    }
}
