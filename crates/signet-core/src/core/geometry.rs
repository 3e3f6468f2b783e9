// crates/signet-core/src/core/geometry.rs
// ============================================================================
// Module: Signet Coordinate Mapper
// Description: Raster-to-document coordinate translation for field placement.
// Purpose: Convert between top-left pixel space and bottom-left document space.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Field placements are authored against a rendered page image whose origin
//! is the top-left corner, while documents use a bottom-left origin in
//! physical units. The mapper converts rectangles between the two spaces as
//! a pure function of page height and scale. A page-height or scale mismatch
//! between authoring and flattening is a caller error the mapper cannot
//! detect; callers must supply a consistent basis.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Rectangles
// ============================================================================

/// Rectangle in raster pixel space, origin at the page's top-left corner.
///
/// # Invariants
/// - `x, y` locate the rectangle's top-left corner; `y` grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelRect {
    /// Horizontal offset from the left edge, in pixels.
    pub x: f64,
    /// Vertical offset from the top edge, in pixels.
    pub y: f64,
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

/// Rectangle in document space, origin at the page's bottom-left corner.
///
/// # Invariants
/// - `x, y` locate the rectangle's bottom-left corner; `y` grows upward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DocumentRect {
    /// Horizontal offset from the left edge, in document units.
    pub x: f64,
    /// Vertical offset from the bottom edge, in document units.
    pub y: f64,
    /// Width in document units.
    pub width: f64,
    /// Height in document units.
    pub height: f64,
}

// ============================================================================
// SECTION: Mapping
// ============================================================================

/// Maps a pixel-space rectangle into document space.
///
/// `scale` is the number of document units per pixel; `page_height` is the
/// page height in document units. Because the vertical axes run in opposite
/// directions, the document-space `y` is measured from the page bottom to the
/// rectangle's bottom edge: `page_height - (y + height) * scale`.
#[must_use]
pub fn to_document_space(rect: PixelRect, page_height: f64, scale: f64) -> DocumentRect {
    DocumentRect {
        x: rect.x * scale,
        y: page_height - (rect.y + rect.height) * scale,
        width: rect.width * scale,
        height: rect.height * scale,
    }
}

/// Maps a document-space rectangle back into pixel space.
///
/// Exact inverse of [`to_document_space`] for the same `page_height` and
/// `scale` basis, used to present stored field positions on a rendered page.
#[must_use]
pub fn to_pixel_space(rect: DocumentRect, page_height: f64, scale: f64) -> PixelRect {
    PixelRect {
        x: rect.x / scale,
        y: (page_height - rect.y) / scale - rect.height / scale,
        width: rect.width / scale,
        height: rect.height / scale,
    }
}
