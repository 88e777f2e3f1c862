//! Upload policies and the credentials issued to untrusted uploaders.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

use crate::error::ModelResult;

/// Constraints the slave enforces on a delegated upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadPolicy {
    pub save_path: String,
    pub file_name: String,
    pub auto_rename: bool,
    pub max_size: u64,
    pub allowed_extension: Vec<String>,
    /// Where the slave reports the finished upload.
    pub callback_url: String,
}

impl UploadPolicy {
    /// Encode to standard base64 JSON, the form carried in `X-Policy`.
    pub fn encode(&self) -> ModelResult<String> {
        let json = serde_json::to_vec(self)?;
        Ok(STANDARD.encode(json))
    }

    /// Decode from the `X-Policy` form.
    pub fn decode(encoded: &str) -> ModelResult<Self> {
        let bytes = STANDARD.decode(encoded)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Credential handed to a client so it can upload straight to the slave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadCredential {
    /// Value for the uploader's `Authorization` header.
    pub token: String,
    /// Encoded upload policy, sent back verbatim as `X-Policy`.
    pub policy: String,
}
