//! HMAC-SHA256 signing capability.
//!
//! A signature is `base64url(HMAC(secret, body + ":" + expires)) + ":" + expires`,
//! where `expires` is a unix timestamp or `0` for a signature that never
//! expires. The expiry travels inside the signature, so the frontend keeps no
//! state between issuing and the slave checking it.

use std::fmt;

use base64::{engine::general_purpose::URL_SAFE, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{AuthError, AuthResult};

type HmacSha256 = Hmac<Sha256>;

/// When a signature stops being valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// Signed, but valid forever. Encoded as timestamp `0`.
    Never,
    /// Unix timestamp (seconds) after which the signature is rejected.
    At(i64),
}

impl Expiry {
    /// Expiry `ttl` seconds from now; `ttl <= 0` never expires.
    pub fn from_ttl(ttl: i64) -> Self {
        if ttl > 0 {
            Expiry::At(chrono::Utc::now().timestamp() + ttl)
        } else {
            Expiry::Never
        }
    }

    /// Wire form of the expiry.
    pub fn timestamp(&self) -> i64 {
        match self {
            Expiry::Never => 0,
            Expiry::At(ts) => *ts,
        }
    }

    pub fn from_timestamp(ts: i64) -> Self {
        if ts == 0 {
            Expiry::Never
        } else {
            Expiry::At(ts)
        }
    }

    /// Check if the expiry has passed.
    pub fn is_expired(&self) -> bool {
        match self {
            Expiry::Never => false,
            Expiry::At(ts) => chrono::Utc::now().timestamp() > *ts,
        }
    }
}

/// A signing capability.
///
/// Implementations must be pure functions of their key and inputs so they can
/// be shared across concurrent callers without locking.
pub trait Auth: Send + Sync {
    /// Sign `body` so that it is valid until `expiry`.
    fn sign(&self, body: &str, expiry: Expiry) -> AuthResult<String>;

    /// Verify a signature produced by [`Auth::sign`] over the same `body`.
    fn check(&self, body: &str, sign: &str) -> AuthResult<()>;
}

/// HMAC-SHA256 signer keyed by the secret shared with the slave.
#[derive(Clone)]
pub struct HmacAuth {
    secret_key: Vec<u8>,
}

impl HmacAuth {
    /// Create a signer from the shared secret.
    pub fn new(secret_key: impl Into<Vec<u8>>) -> AuthResult<Self> {
        let secret_key = secret_key.into();
        if secret_key.is_empty() {
            return Err(AuthError::InvalidKey("secret key is empty".to_string()));
        }
        Ok(Self { secret_key })
    }

    /// Create from the `RELAY_SLAVE_SECRET` environment variable.
    pub fn from_env() -> AuthResult<Self> {
        let secret = std::env::var("RELAY_SLAVE_SECRET")
            .map_err(|_| AuthError::InvalidKey("RELAY_SLAVE_SECRET not set".to_string()))?;
        Self::new(secret)
    }

    fn mac(&self, body: &str, expires: i64) -> AuthResult<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.secret_key)
            .map_err(|e| AuthError::InvalidKey(e.to_string()))?;
        mac.update(body.as_bytes());
        mac.update(b":");
        mac.update(expires.to_string().as_bytes());
        Ok(mac)
    }
}

impl fmt::Debug for HmacAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HmacAuth")
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

impl Auth for HmacAuth {
    fn sign(&self, body: &str, expiry: Expiry) -> AuthResult<String> {
        let expires = expiry.timestamp();
        let signature = self.mac(body, expires)?.finalize().into_bytes();
        Ok(format!("{}:{}", URL_SAFE.encode(signature), expires))
    }

    fn check(&self, body: &str, sign: &str) -> AuthResult<()> {
        let (signature, expires) = sign
            .rsplit_once(':')
            .ok_or_else(|| AuthError::malformed("missing expiry"))?;
        let expires: i64 = expires
            .parse()
            .map_err(|_| AuthError::malformed(format!("invalid expiry '{}'", expires)))?;

        if Expiry::from_timestamp(expires).is_expired() {
            return Err(AuthError::Expired(expires));
        }

        let signature = URL_SAFE
            .decode(signature)
            .map_err(|e| AuthError::malformed(e.to_string()))?;

        self.mac(body, expires)?
            .verify_slice(&signature)
            .map_err(|_| AuthError::Mismatch)
    }
}
