//! Signing error types.

use thiserror::Error;

/// Result type for signing operations.
pub type AuthResult<T> = Result<T, AuthError>;

/// Errors raised while building or checking a signature.
///
/// None of these are transient: retrying the same input fails the same way.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid signing key: {0}")]
    InvalidKey(String),

    #[error("Failed to canonicalize signed content: {0}")]
    Encoding(String),

    #[error("Malformed signature: {0}")]
    MalformedSign(String),

    #[error("Signature expired at {0}")]
    Expired(i64),

    #[error("Signature mismatch")]
    Mismatch,
}

impl AuthError {
    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedSign(msg.into())
    }
}
