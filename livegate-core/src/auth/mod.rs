//! Authentication primitives for the control surface
//!
//! Two independent checks exist:
//! - a static shared secret compared verbatim against the `authorization` header
//! - an optional HMAC-signed bearer token ([`JwtVerifier`])

pub mod jwt;

pub use jwt::{JwtVerifier, TokenClaims};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Unauthorized")]
    InvalidApiKey,

    /// Bearer token rejected; the message is returned to the client as-is.
    #[error("{0}")]
    Token(String),

    #[error("Unsupported JWT signing algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

/// Compare the presented `authorization` header against the configured key.
///
/// A missing header is treated as the empty string, so an empty key admits
/// requests that carry no header at all.
#[must_use]
pub fn api_key_matches(expected: &str, presented: Option<&str>) -> bool {
    presented.unwrap_or_default() == expected
}

/// Same as [`api_key_matches`] but as a `Result` for `?` call sites.
pub fn check_api_key(expected: &str, presented: Option<&str>) -> Result<(), AuthError> {
    if api_key_matches(expected, presented) {
        Ok(())
    } else {
        Err(AuthError::InvalidApiKey)
    }
}
