// crates/signet-core/tests/validation.rs
// ============================================================================
// Module: Field Validator Tests
// Description: Tests for submission completeness validation.
// Purpose: Validate required-field enforcement and tolerant extras handling.
// Dependencies: signet-core
// ============================================================================

//! ## Overview
//! Ensures validation fails closed on missing required fields, reports every
//! missing identifier in a stable order, ignores optional fields and unknown
//! extras, and stays independent of submission order.

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

use signet_core::FieldDef;
use signet_core::FieldId;
use signet_core::FieldKind;
use signet_core::FilledValue;
use signet_core::ValidationError;
use signet_core::validate_filled_values;

fn field(id: &str, kind: FieldKind, required: bool) -> FieldDef {
    FieldDef {
        id: FieldId::new(id),
        kind,
        x: 10.0,
        y: 10.0,
        width: 120.0,
        height: 20.0,
        page: 0,
        required,
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

/// Verifies a complete submission passes.
#[test]
fn complete_submission_passes() {
    let fields = vec![
        field("sig1", FieldKind::Signature, true),
        field("date1", FieldKind::Date, true),
        field("note1", FieldKind::Text, false),
    ];
    let values = vec![
        filled("sig1", FieldKind::Signature, "Jane Doe"),
        filled("date1", FieldKind::Date, "2026-08-30"),
    ];
    assert!(validate_filled_values(&fields, &values).is_ok());
}

/// Verifies every missing required field is reported, sorted.
#[test]
fn missing_required_fields_are_reported_sorted() {
    let fields = vec![
        field("sig1", FieldKind::Signature, true),
        field("date1", FieldKind::Date, true),
        field("note1", FieldKind::Text, false),
    ];
    let values = vec![filled("note1", FieldKind::Text, "optional text")];
    let error = validate_filled_values(&fields, &values).unwrap_err();
    let ValidationError::MissingRequiredFields {
        missing,
    } = error;
    assert_eq!(missing, vec![FieldId::new("date1"), FieldId::new("sig1")]);
}

/// Verifies optional fields may be omitted.
#[test]
fn optional_fields_may_be_omitted() {
    let fields = vec![
        field("sig1", FieldKind::Signature, true),
        field("note1", FieldKind::Text, false),
    ];
    let values = vec![filled("sig1", FieldKind::Signature, "Jane Doe")];
    assert!(validate_filled_values(&fields, &values).is_ok());
}

/// Verifies values for unknown field identifiers are tolerated.
#[test]
fn unknown_field_values_are_tolerated() {
    let fields = vec![field("sig1", FieldKind::Signature, true)];
    let values = vec![
        filled("sig1", FieldKind::Signature, "Jane Doe"),
        filled("ghost", FieldKind::Text, "stale client state"),
    ];
    assert!(validate_filled_values(&fields, &values).is_ok());
}

/// Verifies the outcome is independent of submission order.
#[test]
fn validation_is_order_independent() {
    let fields = vec![
        field("a", FieldKind::Text, true),
        field("b", FieldKind::Text, true),
        field("c", FieldKind::Text, true),
    ];
    let forward = vec![
        filled("a", FieldKind::Text, "1"),
        filled("b", FieldKind::Text, "2"),
        filled("c", FieldKind::Text, "3"),
    ];
    let reversed: Vec<_> = forward.iter().rev().cloned().collect();
    assert_eq!(
        validate_filled_values(&fields, &forward).is_ok(),
        validate_filled_values(&fields, &reversed).is_ok()
    );

    let partial_forward = vec![filled("b", FieldKind::Text, "2")];
    let error_forward = validate_filled_values(&fields, &partial_forward).unwrap_err();
    let ValidationError::MissingRequiredFields {
        missing,
    } = error_forward;
    assert_eq!(missing, vec![FieldId::new("a"), FieldId::new("c")]);
}

/// Verifies an empty template accepts an empty submission.
#[test]
fn empty_template_accepts_empty_submission() {
    assert!(validate_filled_values(&[], &[]).is_ok());
}
