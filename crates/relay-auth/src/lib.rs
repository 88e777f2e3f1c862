//! Time-bounded HMAC signatures for slave node requests.
//!
//! This crate provides:
//! - The `Auth` signing capability and its HMAC-SHA256 implementation
//! - Signed URIs (`?sign=` query parameter) for GET and redirect flows
//! - Signed requests (`Authorization: Bearer`) for POST flows
//! - Verification helpers for the receiving side

pub mod error;
pub mod hmac_auth;
pub mod sign;

pub use error::{AuthError, AuthResult};
pub use hmac_auth::{Auth, Expiry, HmacAuth};
pub use sign::{
    check_request, check_uri, request_sign_content, sign_request, sign_request_until, sign_uri,
    sign_uri_until, SIGN_QUERY_PARAM,
};
