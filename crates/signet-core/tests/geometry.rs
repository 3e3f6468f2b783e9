// crates/signet-core/tests/geometry.rs
// ============================================================================
// Module: Coordinate Mapper Tests
// Description: Tests for pixel-to-document coordinate mapping.
// Purpose: Validate axis flipping, scaling, and round-trip stability.
// Dependencies: signet-core, proptest
// ============================================================================

//! ## Overview
//! Ensures the coordinate mapper flips the vertical axis correctly, applies
//! the scale factor uniformly, and that the two mapping directions are exact
//! inverses for any consistent page-height and scale basis.

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

use proptest::prelude::*;
use signet_core::DocumentRect;
use signet_core::PixelRect;
use signet_core::to_document_space;
use signet_core::to_pixel_space;

const EPSILON: f64 = 1e-9;

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < EPSILON,
        "expected {expected}, got {actual}"
    );
}

/// Verifies a rectangle at the page top maps to the top of document space.
#[test]
fn top_left_pixel_rect_maps_to_document_top() {
    let rect = PixelRect {
        x: 0.0,
        y: 0.0,
        width: 100.0,
        height: 20.0,
    };
    let mapped = to_document_space(rect, 792.0, 1.0);
    assert_close(mapped.x, 0.0);
    // Bottom edge of the field sits 20 units below the page top.
    assert_close(mapped.y, 772.0);
    assert_close(mapped.width, 100.0);
    assert_close(mapped.height, 20.0);
}

/// Verifies a rectangle at the page bottom maps to document y = 0.
#[test]
fn bottom_pixel_rect_maps_to_document_origin() {
    let rect = PixelRect {
        x: 50.0,
        y: 772.0,
        width: 100.0,
        height: 20.0,
    };
    let mapped = to_document_space(rect, 792.0, 1.0);
    assert_close(mapped.y, 0.0);
}

/// Verifies the scale factor applies to positions and sizes uniformly.
#[test]
fn scale_applies_to_all_components() {
    let rect = PixelRect {
        x: 100.0,
        y: 200.0,
        width: 300.0,
        height: 40.0,
    };
    let mapped = to_document_space(rect, 792.0, 0.5);
    assert_close(mapped.x, 50.0);
    assert_close(mapped.y, 792.0 - (200.0 + 40.0) * 0.5);
    assert_close(mapped.width, 150.0);
    assert_close(mapped.height, 20.0);
}

/// Verifies the documented inverse mapping for stored field positions.
#[test]
fn document_rect_maps_back_to_authored_pixels() {
    let stored = DocumentRect {
        x: 72.0,
        y: 700.0,
        width: 144.0,
        height: 18.0,
    };
    let pixels = to_pixel_space(stored, 792.0, 1.0);
    assert_close(pixels.x, 72.0);
    assert_close(pixels.y, 792.0 - 700.0 - 18.0);
    let back = to_document_space(pixels, 792.0, 1.0);
    assert_close(back.x, stored.x);
    assert_close(back.y, stored.y);
}

proptest! {
    /// Round-tripping any rectangle through document space and back recovers
    /// the original within floating-point tolerance.
    #[test]
    fn pixel_round_trip_is_identity(
        x in 0.0_f64 .. 2_000.0,
        y in 0.0_f64 .. 2_000.0,
        width in 0.1_f64 .. 1_000.0,
        height in 0.1_f64 .. 1_000.0,
        page_height in 100.0_f64 .. 5_000.0,
        scale in 0.05_f64 .. 4.0,
    ) {
        let rect = PixelRect { x, y, width, height };
        let mapped = to_document_space(rect, page_height, scale);
        let back = to_pixel_space(mapped, page_height, scale);
        prop_assert!((back.x - rect.x).abs() < 1e-6);
        prop_assert!((back.y - rect.y).abs() < 1e-6);
        prop_assert!((back.width - rect.width).abs() < 1e-6);
        prop_assert!((back.height - rect.height).abs() < 1e-6);
    }

    /// The mapped bottom edge plus the mapped height equals the distance from
    /// the page bottom to the authored top edge.
    #[test]
    fn vertical_flip_preserves_extent(
        y in 0.0_f64 .. 2_000.0,
        height in 0.1_f64 .. 1_000.0,
        page_height in 100.0_f64 .. 5_000.0,
        scale in 0.05_f64 .. 4.0,
    ) {
        let rect = PixelRect { x: 0.0, y, width: 1.0, height };
        let mapped = to_document_space(rect, page_height, scale);
        let top_from_bottom = page_height - y * scale;
        prop_assert!((mapped.y + mapped.height - top_from_bottom).abs() < 1e-6);
    }
}
