// crates/signet-core/src/core/audit.rs
// ============================================================================
// Module: Signet Audit Model
// Description: Immutable submission audit records.
// Purpose: Record who completed a signing, when, and which artifact resulted.
// Dependencies: crate::core::{identifiers, time}, serde
// ============================================================================

//! ## Overview
//! An audit record is created exactly once per successful submission, in the
//! same atomic transaction that completes the sign link, and is immutable
//! thereafter.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::AuditId;
use crate::core::identifiers::DocumentKey;
use crate::core::identifiers::SignToken;
use crate::core::identifiers::TemplateId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Audit Record
// ============================================================================

/// Immutable record of one completed signing submission.
///
/// # Invariants
/// - Written exactly once, atomically with the link completion.
/// - `artifact` references the flattened signed document, never the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Audit record identifier.
    pub audit_id: AuditId,
    /// Template that was signed.
    pub template_id: TemplateId,
    /// Sign token that was consumed.
    pub token: SignToken,
    /// Submitter network address as reported by the transport.
    pub submitter_address: String,
    /// Submitter user-agent string as reported by the transport.
    pub submitter_agent: String,
    /// Instant the submission handling started.
    pub started_at: Timestamp,
    /// Instant the submission completed.
    pub completed_at: Timestamp,
    /// Key of the signed artifact produced by the submission.
    pub artifact: DocumentKey,
}
