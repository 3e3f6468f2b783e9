// crates/signet-server/src/token.rs
// ============================================================================
// Module: Signet Token Generation
// Description: Entropy-backed identifier generation for tokens and keys.
// Purpose: Produce unguessable URL-safe identifiers.
// Dependencies: signet-core, rand
// ============================================================================

//! ## Overview
//! Sign tokens are bearer capabilities: whoever holds one can open the
//! signing session. Tokens are drawn from a thread-local CSPRNG over a
//! URL-safe alphabet; at the default length of 21 characters the space is
//! roughly 62^21, far past brute-force reach for single-use links.

// ============================================================================
// SECTION: Imports
// ============================================================================

use rand::Rng;
use signet_core::TokenGenerator;

// ============================================================================
// SECTION: Generator
// ============================================================================

/// URL-safe token alphabet.
const TOKEN_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Entropy-backed token generator over a URL-safe alphabet.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandTokenGenerator;

impl RandTokenGenerator {
    /// Creates a new generator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl TokenGenerator for RandTokenGenerator {
    fn generate(&self, length: usize) -> String {
        let mut rng = rand::thread_rng();
        (0 .. length)
            .map(|_| {
                let index = rng.gen_range(0 .. TOKEN_ALPHABET.len());
                char::from(TOKEN_ALPHABET[index])
            })
            .collect()
    }
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

    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn generates_requested_length() {
        let generator = RandTokenGenerator::new();
        assert_eq!(generator.generate(21).len(), 21);
        assert_eq!(generator.generate(0).len(), 0);
    }

    #[test]
    fn output_is_url_safe() {
        let generator = RandTokenGenerator::new();
        let token = generator.generate(64);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn outputs_do_not_repeat() {
        let generator = RandTokenGenerator::new();
        let tokens: BTreeSet<String> = (0 .. 100).map(|_| generator.generate(21)).collect();
        assert_eq!(tokens.len(), 100);
    }
}
