// crates/signet-server/src/auth.rs
// ============================================================================
// Module: Signet Admin Authentication
// Description: Request authentication for administrative endpoints.
// Purpose: Enforce loopback-only or bearer-token access, failing closed.
// Dependencies: sha2, signet-server config
// ============================================================================

//! ## Overview
//! Administrative endpoints (document registration, template authoring, link
//! issuance) are authenticated; signer endpoints are not, because possession
//! of the unguessable sign token is the capability. Local-only mode accepts
//! loopback peers; bearer mode requires a configured token. Failures are
//! always closed: missing or malformed credentials deny the request. Audit
//! events record a token fingerprint, never the token itself.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::net::SocketAddr;

use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

use crate::config::ServerAuthMode;
use crate::config::ServerConfig;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum accepted authorization header size in bytes.
const MAX_AUTH_HEADER_BYTES: usize = 4096;

// ============================================================================
// SECTION: Request Context
// ============================================================================

/// Transport-level request context for authentication decisions.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Peer socket address.
    pub peer: SocketAddr,
    /// Raw authorization header, when present.
    pub auth_header: Option<String>,
}

/// Authenticated administrative context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    /// SHA-256 fingerprint of the presented bearer token, when applicable.
    pub token_fingerprint: Option<String>,
}

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Credentials were missing or invalid.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),
}

// ============================================================================
// SECTION: Admin Authorizer
// ============================================================================

/// Authorizer for administrative endpoints.
#[derive(Debug, Clone)]
pub struct AdminAuthz {
    /// Configured authentication mode.
    mode: ServerAuthMode,
    /// Accepted bearer tokens in bearer mode.
    bearer_tokens: BTreeSet<String>,
}

impl AdminAuthz {
    /// Builds an authorizer from server configuration.
    #[must_use]
    pub fn from_config(config: &ServerConfig) -> Self {
        let bearer_tokens = config
            .auth
            .as_ref()
            .map(|auth| auth.bearer_tokens.iter().cloned().collect())
            .unwrap_or_default();
        Self {
            mode: config.auth_mode,
            bearer_tokens,
        }
    }

    /// Authorizes an administrative request.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Unauthenticated`] when the request carries no
    /// acceptable credentials for the configured mode.
    pub fn authorize(&self, ctx: &RequestContext) -> Result<AuthContext, AuthError> {
        match self.mode {
            ServerAuthMode::LocalOnly => {
                if ctx.peer.ip().is_loopback() {
                    Ok(AuthContext {
                        token_fingerprint: None,
                    })
                } else {
                    Err(AuthError::Unauthenticated(
                        "local-only mode requires loopback access".to_string(),
                    ))
                }
            }
            ServerAuthMode::BearerToken => {
                let token = parse_bearer_token(ctx.auth_header.as_deref())?;
                if !self.bearer_tokens.contains(&token) {
                    return Err(AuthError::Unauthenticated("invalid bearer token".to_string()));
                }
                Ok(AuthContext {
                    token_fingerprint: Some(fingerprint(token.as_bytes())),
                })
            }
        }
    }
}

/// Extracts the token from a `Bearer` authorization header.
fn parse_bearer_token(auth_header: Option<&str>) -> Result<String, AuthError> {
    let header = auth_header
        .ok_or_else(|| AuthError::Unauthenticated("missing authorization".to_string()))?;
    if header.len() > MAX_AUTH_HEADER_BYTES {
        return Err(AuthError::Unauthenticated("authorization header too large".to_string()));
    }
    let mut parts = header.trim().splitn(2, ' ');
    let scheme = parts.next().unwrap_or_default();
    let token = parts.next().unwrap_or_default().trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(AuthError::Unauthenticated("invalid authorization header".to_string()));
    }
    Ok(token.to_string())
}

/// Computes a lowercase hex SHA-256 fingerprint.
fn fingerprint(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
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

    use super::*;
    use crate::config::AuthConfig;

    fn bearer_config(tokens: &[&str]) -> ServerConfig {
        ServerConfig {
            auth_mode: ServerAuthMode::BearerToken,
            auth: Some(AuthConfig {
                bearer_tokens: tokens.iter().map(|t| (*t).to_string()).collect(),
            }),
            ..ServerConfig::default()
        }
    }

    fn ctx(peer: &str, header: Option<&str>) -> RequestContext {
        RequestContext {
            peer: peer.parse().unwrap(),
            auth_header: header.map(str::to_string),
        }
    }

    #[test]
    fn local_only_accepts_loopback() {
        let authz = AdminAuthz::from_config(&ServerConfig::default());
        assert!(authz.authorize(&ctx("127.0.0.1:5000", None)).is_ok());
    }

    #[test]
    fn local_only_rejects_remote_peer() {
        let authz = AdminAuthz::from_config(&ServerConfig::default());
        assert!(authz.authorize(&ctx("203.0.113.5:5000", None)).is_err());
    }

    #[test]
    fn bearer_accepts_configured_token() {
        let authz = AdminAuthz::from_config(&bearer_config(&["secret"]));
        let context = authz.authorize(&ctx("203.0.113.5:5000", Some("Bearer secret"))).unwrap();
        assert!(context.token_fingerprint.is_some());
    }

    #[test]
    fn bearer_rejects_unknown_token() {
        let authz = AdminAuthz::from_config(&bearer_config(&["secret"]));
        assert!(authz.authorize(&ctx("127.0.0.1:5000", Some("Bearer wrong"))).is_err());
    }

    #[test]
    fn bearer_rejects_missing_header() {
        let authz = AdminAuthz::from_config(&bearer_config(&["secret"]));
        assert!(authz.authorize(&ctx("127.0.0.1:5000", None)).is_err());
    }

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        let authz = AdminAuthz::from_config(&bearer_config(&["secret"]));
        assert!(authz.authorize(&ctx("127.0.0.1:5000", Some("bearer secret"))).is_ok());
    }

    #[test]
    fn fingerprint_is_stable_hex() {
        let one = fingerprint(b"secret");
        let two = fingerprint(b"secret");
        assert_eq!(one, two);
        assert_eq!(one.len(), 64);
        assert!(one.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
