//! Streaming response body handed back by `get`.

use bytes::Bytes;
use futures_util::{Stream, TryStreamExt};
use reqwest::StatusCode;

use crate::error::{RemoteError, RemoteResult};

/// Open response body from the slave.
///
/// The caller owns the underlying connection; dropping the handle on any
/// exit path releases it.
#[derive(Debug)]
pub struct RemoteBody {
    response: reqwest::Response,
}

impl RemoteBody {
    pub(crate) fn new(response: reqwest::Response) -> Self {
        Self { response }
    }

    pub fn status(&self) -> StatusCode {
        self.response.status()
    }

    /// Length announced by the slave, if any.
    pub fn content_length(&self) -> Option<u64> {
        self.response.content_length()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    /// Next chunk of the body, `None` once exhausted.
    pub async fn chunk(&mut self) -> RemoteResult<Option<Bytes>> {
        self.response.chunk().await.map_err(RemoteError::Network)
    }

    /// Read the remaining body into memory.
    pub async fn bytes(self) -> RemoteResult<Bytes> {
        self.response.bytes().await.map_err(RemoteError::Network)
    }

    /// Convert into a byte stream.
    pub fn into_stream(self) -> impl Stream<Item = RemoteResult<Bytes>> {
        self.response.bytes_stream().map_err(RemoteError::Network)
    }
}
