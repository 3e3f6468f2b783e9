// crates/signet-core/src/core/time.rs
// ============================================================================
// Module: Signet Time Model
// Description: Canonical timestamp representation for link lifecycles and audits.
// Purpose: Provide explicit, host-supplied time values across Signet records.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Signet uses explicit time values passed into every lifecycle operation to
//! keep expiry decisions testable. The core engine never reads wall-clock
//! time directly; hosts must supply the current instant on each call.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Milliseconds in one second.
pub const SECOND_MILLIS: i64 = 1_000;
/// Milliseconds in one day.
pub const DAY_MILLIS: i64 = 24 * 60 * 60 * SECOND_MILLIS;

// ============================================================================
// SECTION: Timestamp
// ============================================================================

/// Canonical timestamp used in Signet records, as unix epoch milliseconds.
///
/// # Invariants
/// - Values are explicitly provided by callers; the core never reads
///   wall-clock time.
/// - Ordering is total; expiry is evaluated as a strict comparison against
///   the current instant supplied by the host.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from unix epoch milliseconds.
    #[must_use]
    pub const fn from_unix_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the timestamp as unix epoch milliseconds.
    #[must_use]
    pub const fn as_unix_millis(self) -> i64 {
        self.0
    }

    /// Returns the timestamp advanced by the given millisecond offset,
    /// saturating at the representation bounds.
    #[must_use]
    pub const fn saturating_add_millis(self, millis: i64) -> Self {
        Self(self.0.saturating_add(millis))
    }

    /// Returns true when this timestamp is strictly before `other`.
    #[must_use]
    pub const fn is_before(self, other: Self) -> bool {
        self.0 < other.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
