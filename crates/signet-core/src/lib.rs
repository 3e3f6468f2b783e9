// crates/signet-core/src/lib.rs
// ============================================================================
// Module: Signet Core Library
// Description: Public API surface for the Signet core.
// Purpose: Expose core types, interfaces, and runtime helpers.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Signet core implements the single-use sign-link lifecycle: template and
//! field modeling, link issuance and expiry, submission validation, and
//! exactly-once completion. It is backend-agnostic and integrates through
//! explicit interfaces rather than embedding storage or document tooling.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use self::core::*;

pub use interfaces::EntityKey;
pub use interfaces::FieldRecord;
pub use interfaces::FlattenOutput;
pub use interfaces::FormEngine;
pub use interfaces::FormEngineError;
pub use interfaces::MetadataRecord;
pub use interfaces::MetadataStore;
pub use interfaces::MetadataStoreError;
pub use interfaces::Mutation;
pub use interfaces::ObjectMetadata;
pub use interfaces::ObjectStore;
pub use interfaces::ObjectStoreError;
pub use interfaces::Precondition;
pub use interfaces::PresignedUrl;
pub use interfaces::SignLinkIndexRecord;
pub use interfaces::TemplateMeta;
pub use interfaces::TokenGenerator;
pub use interfaces::WriteOp;
pub use runtime::CreateTemplateRequest;
pub use runtime::InMemoryMetadataStore;
pub use runtime::InMemoryObjectStore;
pub use runtime::IssueRequest;
pub use runtime::LifecycleConfig;
pub use runtime::LifecycleError;
pub use runtime::SequentialTokenGenerator;
pub use runtime::SharedMetadataStore;
pub use runtime::SharedObjectStore;
pub use runtime::SignLinkLifecycle;
pub use runtime::SigningSession;
pub use runtime::SubmissionResult;
pub use runtime::SubmitterInfo;
