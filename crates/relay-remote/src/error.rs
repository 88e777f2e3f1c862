//! Remote handler error types.

use relay_auth::AuthError;
use relay_models::ModelError;
use thiserror::Error;

/// Result type for remote operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Errors returned by remote operations.
///
/// Nothing is retried or translated at this layer; each error reaches the
/// immediate caller as-is.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Remote node responded with HTTP {0}")]
    HttpStatus(u16),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unrecognized response format: {0}")]
    ResponseFormat(String),

    /// Business-level failure reported by the slave (`code != 0`).
    #[error("{message}")]
    Remote { code: i32, message: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl RemoteError {
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    pub fn response_format(msg: impl Into<String>) -> Self {
        Self::ResponseFormat(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// True for HTTP status and connection failures.
    pub fn is_transport(&self) -> bool {
        matches!(self, RemoteError::HttpStatus(_) | RemoteError::Network(_))
    }
}

impl From<AuthError> for RemoteError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Encoding(msg) => RemoteError::Encoding(msg),
            other => RemoteError::Signing(other.to_string()),
        }
    }
}

impl From<ModelError> for RemoteError {
    fn from(err: ModelError) -> Self {
        RemoteError::Encoding(err.to_string())
    }
}
