//! Upload credential issuing.
//!
//! An untrusted client uploads straight to the slave. It never sees the
//! secret key: it receives the encoded upload policy and a signature over a
//! synthetic `POST /api/v3/slave/upload` carrying that policy in `X-Policy`.
//! The slave recomputes the signature from the request the client sends.

use relay_auth::{sign_request, Auth};
use relay_models::{Policy, UploadCredential, UploadPolicy};
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Method, Request};
use url::Url;

use crate::error::{RemoteError, RemoteResult};

/// Header carrying the encoded upload policy.
pub const POLICY_HEADER: &str = "x-policy";

/// Upload constraints for `policy`, reporting completion to `callback_url`.
pub fn upload_policy(policy: &Policy, callback_url: &Url) -> UploadPolicy {
    UploadPolicy {
        save_path: policy.dir_name_rule.clone(),
        file_name: policy.file_name_rule.clone(),
        auto_rename: policy.auto_rename,
        max_size: policy.max_size,
        allowed_extension: policy.allowed_extensions.clone(),
        callback_url: callback_url.to_string(),
    }
}

/// Sign `upload_policy` for an upload to `upload_url`, valid for `ttl` seconds.
pub fn issue(
    auth: &dyn Auth,
    upload_url: Url,
    upload_policy: &UploadPolicy,
    ttl: i64,
) -> RemoteResult<UploadCredential> {
    let encoded = upload_policy.encode()?;

    let mut request = Request::new(Method::POST, upload_url);
    let value = HeaderValue::from_str(&encoded).map_err(|e| RemoteError::encoding(e.to_string()))?;
    request.headers_mut().insert(POLICY_HEADER, value);

    sign_request(auth, &mut request, ttl)?;

    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| RemoteError::Signing("cannot sign upload policy".to_string()))?;

    Ok(UploadCredential {
        token: token.to_string(),
        policy: encoded,
    })
}
