// crates/signet-pdf/src/dates.rs
// ============================================================================
// Module: Signet Date Display Formatting
// Description: Normalization of submitted date values for flattened output.
// Purpose: Render parseable dates as month/day/year display text.
// Dependencies: time
// ============================================================================

//! ## Overview
//! Date fields accept whatever the signer's client submitted. Values that
//! parse as an ISO calendar date or an RFC 3339 timestamp are rendered as
//! unpadded `month/day/year`; anything else passes through verbatim so an
//! unusual but intentional value is never destroyed at fill time.

// ============================================================================
// SECTION: Imports
// ============================================================================

use time::Date;
use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

// ============================================================================
// SECTION: Formats
// ============================================================================

/// ISO calendar date format (`YYYY-MM-DD`).
const ISO_DATE: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

// ============================================================================
// SECTION: Normalization
// ============================================================================

/// Normalizes a submitted date value for display.
///
/// Parseable ISO dates and RFC 3339 timestamps become unpadded
/// `month/day/year`; unparseable input is returned verbatim.
#[must_use]
pub fn normalize_date(raw: &str) -> String {
    if let Ok(date) = Date::parse(raw, ISO_DATE) {
        return display_date(date);
    }
    if let Ok(timestamp) = OffsetDateTime::parse(raw, &Rfc3339) {
        return display_date(timestamp.date());
    }
    raw.to_string()
}

/// Renders a calendar date as unpadded `month/day/year`.
fn display_date(date: Date) -> String {
    format!("{}/{}/{}", u8::from(date.month()), date.day(), date.year())
}
