//! Slave API payloads.

use serde::{Deserialize, Serialize};
use url::Url;

/// Envelope returned by every slave endpoint. `code == 0` is success.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default)]
    pub msg: String,
    #[serde(default)]
    pub error: String,
}

impl Response {
    pub fn is_success(&self) -> bool {
        self.code == 0
    }
}

/// Batch delete body.
///
/// The same shape comes back JSON-encoded inside `Response::data` as the
/// list of files the slave could not delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteDeleteRequest {
    pub files: Vec<String>,
}

/// Content delivered by redirecting the client rather than proxying bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentResponse {
    pub redirect: bool,
    pub url: Url,
}
