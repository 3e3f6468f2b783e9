// crates/signet-core/src/runtime/mod.rs
// ============================================================================
// Module: Signet Runtime
// Description: Lifecycle engine and in-memory backend implementations.
// Purpose: Group the executable parts of the core crate.
// Dependencies: crate::runtime submodules
// ============================================================================

//! ## Overview
//! The runtime layer executes the sign-link lifecycle over the abstract
//! interfaces and ships in-memory backends sufficient for tests and
//! single-process hosts. Production backends live in host crates.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod lifecycle;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use lifecycle::CreateTemplateRequest;
pub use lifecycle::IssueRequest;
pub use lifecycle::LifecycleConfig;
pub use lifecycle::LifecycleError;
pub use lifecycle::SignLinkLifecycle;
pub use lifecycle::SigningSession;
pub use lifecycle::SubmissionResult;
pub use lifecycle::SubmitterInfo;
pub use store::InMemoryMetadataStore;
pub use store::InMemoryObjectStore;
pub use store::SequentialTokenGenerator;
pub use store::SharedMetadataStore;
pub use store::SharedObjectStore;
