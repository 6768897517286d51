//! Token generation and validation.
//!
//! # Why hash before comparing?
//!
//! A naive `provided == expected` stops at the first differing byte, so
//! the time it takes reveals how much of a guess was right. An attacker who
//! can measure that can recover the token one byte at a time.
//!
//! [`subtle::ConstantTimeEq`] fixes the per-byte part, but its slice impl
//! still returns early when the two lengths differ. Instead of exposing
//! that branch, both sides are run through SHA-256 first. The digests are
//! always 32 bytes, so every comparison does the same amount of work no
//! matter what the client sent: a wrong length, a wrong first byte, and a
//! wrong last byte all look alike from the outside.

use std::fmt;

use rand::Rng;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Number of random bytes in a token (256 bits of entropy).
pub const TOKEN_BYTES: usize = 32;

/// Length of an encoded token: two hex characters per byte.
pub const TOKEN_LEN: usize = TOKEN_BYTES * 2;

/// Generates a fresh CSRF token: 32 random bytes as 64 lowercase hex chars.
///
/// `rand::rng()` is a cryptographically secure generator seeded from the
/// operating system, so a token can't be predicted from the session id,
/// the time, or any earlier token.
pub fn generate_token() -> String {
    let bytes: [u8; TOKEN_BYTES] = rand::rng().random();
    hex::encode(bytes)
}

/// Checks a client-supplied token against the one the server issued.
///
/// Returns `false` when either side is empty. A missing token is a normal
/// rejection, not an error: the caller can't tell "no token" from "wrong
/// token" and doesn't need to.
///
/// For non-empty inputs the running time depends on neither the contents
/// nor the length of `provided` (see the module docs).
pub fn validate_token(provided: &str, expected: &str) -> bool {
    if provided.is_empty() || expected.is_empty() {
        tracing::trace!("csrf token missing");
        return false;
    }

    let provided = Sha256::digest(provided.as_bytes());
    let expected = Sha256::digest(expected.as_bytes());
    provided.as_slice().ct_eq(expected.as_slice()).into()
}

// ---------------------------------------------------------------------------
// CsrfToken
// ---------------------------------------------------------------------------

/// A CSRF token held by the server.
///
/// There is deliberately no `PartialEq`: the only way to compare a token is
/// [`CsrfToken::matches`], which goes through [`validate_token`]. `Debug`
/// is redacted so a session can be logged without leaking its token.
#[derive(Clone)]
pub struct CsrfToken(String);

impl CsrfToken {
    /// Issues a new random token.
    pub fn generate() -> Self {
        Self(generate_token())
    }

    /// Returns the token value, for handing it to the owning client.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns `true` if `provided` is this token. `None` never matches.
    pub fn matches(&self, provided: Option<&str>) -> bool {
        validate_token(provided.unwrap_or_default(), &self.0)
    }
}

impl fmt::Debug for CsrfToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CsrfToken(<redacted>)")
    }
}
