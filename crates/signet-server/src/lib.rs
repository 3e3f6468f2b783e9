// crates/signet-server/src/lib.rs
// ============================================================================
// Module: Signet Server
// Description: HTTP server, configuration, and storage backends for Signet.
// Purpose: Host the sign-link lifecycle behind an authenticated REST API.
// Dependencies: signet-core, signet-pdf, axum, aws-sdk-s3, tokio
// ============================================================================

//! ## Overview
//! Signet Server wires the sign-link lifecycle engine to an HTTP surface.
//! Administrative routes author documents, templates, and sign links; signer
//! routes open sessions and accept submissions with the sign token as the
//! only credential. Storage backends are configurable: in-memory for local
//! development, S3-compatible object storage for durable deployments.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod auth;
pub mod config;
pub mod s3_store;
pub mod server;
pub mod token;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use auth::AdminAuthz;
pub use auth::AuthContext;
pub use auth::AuthError;
pub use auth::RequestContext;
pub use config::ConfigError;
pub use config::ObjectStoreConfig;
pub use config::ServerAuthMode;
pub use config::SignetConfig;
pub use config::StorageConfig;
pub use s3_store::S3DocumentStore;
pub use server::ServerError;
pub use server::SignetServer;
pub use token::RandTokenGenerator;
