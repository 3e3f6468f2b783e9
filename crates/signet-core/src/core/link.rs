// crates/signet-core/src/core/link.rs
// ============================================================================
// Module: Signet Sign Link Model
// Description: Single-use, time-bounded signing capability records.
// Purpose: Capture the sign-link state machine with derived expiry.
// Dependencies: crate::core::{identifiers, time}, serde
// ============================================================================

//! ## Overview
//! A sign link grants one signer access to fill one template instance. The
//! status machine is monotonic: `active -> completed` or `active -> expired`,
//! and both destinations are terminal. Expiry is a derived, time-based
//! predicate evaluated on every read; a link past `expires_at` is treated as
//! expired regardless of its stored status.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::SignToken;
use crate::core::identifiers::TemplateId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Link Status
// ============================================================================

/// Sign-link lifecycle status.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
/// - `Completed` and `Expired` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignLinkStatus {
    /// Link is live and may be fetched or submitted.
    Active,
    /// Link has been consumed by a successful submission.
    Completed,
    /// Link lapsed without a submission.
    Expired,
}

impl SignLinkStatus {
    /// Returns true when the status admits no further transition.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Expired)
    }
}

// ============================================================================
// SECTION: Sign Link
// ============================================================================

/// A single-use signing capability bound to one template.
///
/// # Invariants
/// - Status transitions are monotonic; `Active -> Completed` happens at most
///   once, guarded by a conditional store write.
/// - `completed_at` is set if and only if `status == Completed`.
/// - The lifecycle engine is the sole writer of `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignLink {
    /// Signer-facing capability token.
    pub token: SignToken,
    /// Template this link signs.
    pub template_id: TemplateId,
    /// Optional signer email recorded at issuance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signer_email: Option<String>,
    /// Stored lifecycle status.
    pub status: SignLinkStatus,
    /// Issuance timestamp.
    pub created_at: Timestamp,
    /// Expiry instant; strictly after this the link is expired.
    pub expires_at: Timestamp,
    /// Completion timestamp, present only for completed links.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Timestamp>,
}

impl SignLink {
    /// Returns true when the link is past its expiry at the given instant.
    ///
    /// Expiry dominates stored status: callers must evaluate this predicate
    /// on every read rather than trusting `status` alone.
    #[must_use]
    pub const fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_at.is_before(now)
    }
}
