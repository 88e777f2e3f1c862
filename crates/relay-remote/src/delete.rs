//! Batch delete outcome.
//!
//! A batch delete on the slave may be partially applied, so the outcome is
//! reported file by file instead of as a single success flag. On failure the
//! slave returns the files it could not delete as a `RemoteDeleteRequest`,
//! the same shape as the request body, JSON-encoded inside `data`.

use relay_models::{RemoteDeleteRequest, Response};
use serde_json::Value;

use crate::error::RemoteError;

/// Files that were requested but not deleted, and why.
#[derive(Debug, Default)]
pub struct DeleteReport {
    pub failed: Vec<String>,
    pub error: Option<RemoteError>,
}

impl DeleteReport {
    /// Every file was deleted.
    pub fn complete() -> Self {
        Self::default()
    }

    /// Nothing is known to be deleted.
    pub fn failed_all(files: &[String], error: RemoteError) -> Self {
        Self {
            failed: files.to_vec(),
            error: Some(error),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.error.is_none()
    }

    pub fn into_parts(self) -> (Vec<String>, Option<RemoteError>) {
        (self.failed, self.error)
    }

    /// Interpret the slave's raw reply to a delete of `files`.
    pub fn from_response_body(files: &[String], body: &str) -> Self {
        match serde_json::from_str::<Response>(body) {
            Ok(response) => Self::from_response(files, response),
            Err(e) => Self::failed_all(files, RemoteError::response_format(e.to_string())),
        }
    }

    /// Interpret a decoded envelope.
    pub fn from_response(files: &[String], response: Response) -> Self {
        if response.is_success() {
            return Self::complete();
        }

        match undeleted_files(&response.data) {
            Some(failed) => {
                let message = if response.error.is_empty() {
                    response.msg
                } else {
                    response.error
                };
                Self {
                    failed,
                    error: Some(RemoteError::Remote {
                        code: response.code,
                        message,
                    }),
                }
            }
            None => Self::failed_all(
                files,
                RemoteError::response_format("unrecognized response format"),
            ),
        }
    }
}

/// Decode the nested payload, JSON-encoded as a string or inline.
fn undeleted_files(data: &Value) -> Option<Vec<String>> {
    let payload: RemoteDeleteRequest = match data {
        Value::String(encoded) => serde_json::from_str(encoded).ok()?,
        Value::Object(_) => serde_json::from_value(data.clone()).ok()?,
        _ => return None,
    };
    Some(payload.files)
}
