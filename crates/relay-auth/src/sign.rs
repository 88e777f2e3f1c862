//! Signing of URIs and HTTP requests.
//!
//! GET and redirect flows carry the signature in the `sign` query parameter,
//! computed over the percent-decoded path. POST flows carry it in
//! `Authorization: Bearer <sign>`, computed over a canonical JSON rendering of
//! method, path, `X-` headers and body.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Request;
use serde::Serialize;
use url::Url;

use crate::error::{AuthError, AuthResult};
use crate::hmac_auth::{Auth, Expiry};

/// Query parameter carrying a URI signature.
pub const SIGN_QUERY_PARAM: &str = "sign";

/// Only headers with this prefix take part in request signatures.
const SIGNED_HEADER_PREFIX: &str = "X-";

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Serialize)]
struct RequestSignContent<'a> {
    method: &'a str,
    path: &'a str,
    header: String,
    body: &'a str,
}

/// Sign `url` so it is valid for `ttl` seconds (`ttl <= 0` never expires).
pub fn sign_uri(auth: &dyn Auth, url: Url, ttl: i64) -> AuthResult<Url> {
    sign_uri_until(auth, url, Expiry::from_ttl(ttl))
}

/// Sign `url` with an explicit expiry.
///
/// Any existing `sign` parameter is replaced; other query parameters are kept
/// in their original order.
pub fn sign_uri_until(auth: &dyn Auth, mut url: Url, expiry: Expiry) -> AuthResult<Url> {
    let path = decoded_path(&url)?;
    let sign = auth.sign(&path, expiry)?;

    let retained: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != SIGN_QUERY_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(retained)
        .append_pair(SIGN_QUERY_PARAM, &sign);

    Ok(url)
}

/// Verify a URI produced by [`sign_uri`].
pub fn check_uri(auth: &dyn Auth, url: &Url) -> AuthResult<()> {
    let sign = url
        .query_pairs()
        .find(|(key, _)| key == SIGN_QUERY_PARAM)
        .map(|(_, value)| value.into_owned())
        .ok_or_else(|| AuthError::malformed("missing sign parameter"))?;

    auth.check(&decoded_path(url)?, &sign)
}

/// Sign `request` in place, valid for `ttl` seconds.
pub fn sign_request(auth: &dyn Auth, request: &mut Request, ttl: i64) -> AuthResult<()> {
    sign_request_until(auth, request, Expiry::from_ttl(ttl))
}

/// Sign `request` in place with an explicit expiry.
pub fn sign_request_until(auth: &dyn Auth, request: &mut Request, expiry: Expiry) -> AuthResult<()> {
    let content = request_sign_content(request)?;
    let sign = auth.sign(&content, expiry)?;

    let value = HeaderValue::from_str(&format!("{}{}", BEARER_PREFIX, sign))
        .map_err(|e| AuthError::encoding(e.to_string()))?;
    request.headers_mut().insert(AUTHORIZATION, value);

    Ok(())
}

/// Verify the `Authorization` header of a request signed by [`sign_request`].
pub fn check_request(auth: &dyn Auth, request: &Request) -> AuthResult<()> {
    let sign = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix(BEARER_PREFIX))
        .ok_or_else(|| AuthError::malformed("missing bearer authorization"))?;

    auth.check(&request_sign_content(request)?, sign)
}

/// Canonical string a request signature is computed over.
pub fn request_sign_content(request: &Request) -> AuthResult<String> {
    let path = decoded_path(request.url())?;

    let body = match request.body() {
        None => "",
        Some(body) => {
            let bytes = body
                .as_bytes()
                .ok_or_else(|| AuthError::encoding("streaming bodies cannot be signed"))?;
            std::str::from_utf8(bytes).map_err(|e| AuthError::encoding(e.to_string()))?
        }
    };

    let content = RequestSignContent {
        method: request.method().as_str(),
        path: &path,
        header: signed_headers(request.headers())?,
        body,
    };

    serde_json::to_string(&content).map_err(|e| AuthError::encoding(e.to_string()))
}

fn decoded_path(url: &Url) -> AuthResult<String> {
    urlencoding::decode(url.path())
        .map(|path| path.into_owned())
        .map_err(|e| AuthError::encoding(format!("path is not valid UTF-8: {}", e)))
}

fn signed_headers(headers: &HeaderMap) -> AuthResult<String> {
    let mut signed = Vec::new();
    for name in headers.keys() {
        let canonical = canonical_header_name(name.as_str());
        if !canonical.starts_with(SIGNED_HEADER_PREFIX) {
            continue;
        }
        let value = headers
            .get(name)
            .map(|v| v.to_str())
            .transpose()
            .map_err(|e| AuthError::encoding(format!("header {}: {}", canonical, e)))?
            .unwrap_or_default();
        signed.push(format!("{}={}", canonical, value));
    }
    signed.sort();
    Ok(signed.join("&"))
}

/// `x-policy` -> `X-Policy`.
fn canonical_header_name(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => {
                    first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}
