//! Remote storage policy handler.
//!
//! Each operation is one round trip: build the slave URL, sign it, send it,
//! interpret the reply. Nothing is retried here.

use std::sync::Arc;

use async_trait::async_trait;
use relay_auth::{sign_request, sign_uri, Auth};
use relay_models::{ContentResponse, Policy, RemoteDeleteRequest, UploadCredential};
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use tracing::{debug, info, warn};
use url::Url;

use crate::body::RemoteBody;
use crate::config::{SettingsProvider, DEFAULT_SLAVE_API_TIMEOUT, SLAVE_API_TIMEOUT};
use crate::credential;
use crate::delete::DeleteReport;
use crate::endpoint::{
    callback_url, encode_path, join, parse_server, source_path, thumb_path, SlaveEndpoint,
    DEFAULT_FILE_NAME,
};
use crate::error::{RemoteError, RemoteResult};

/// Per-request hints for source URLs.
#[derive(Debug, Clone, Default)]
pub struct SourceOptions {
    /// Download speed limit for the slave to apply, 0 for unlimited.
    pub speed_limit: u64,
    /// Display file name; `"file"` when unset.
    pub file_name: Option<String>,
}

impl SourceOptions {
    pub fn with_speed_limit(mut self, speed_limit: u64) -> Self {
        self.speed_limit = speed_limit;
        self
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn file_name(&self) -> &str {
        self.file_name.as_deref().unwrap_or(DEFAULT_FILE_NAME)
    }
}

/// File operations a storage policy adapter provides.
#[async_trait]
pub trait StorageHandler: Send + Sync {
    /// Open the content of `path` for reading.
    async fn get(&self, path: &str, options: &SourceOptions) -> RemoteResult<RemoteBody>;

    /// Store `body` at `dst`.
    async fn put(&self, body: reqwest::Body, dst: &str, size: u64) -> RemoteResult<()>;

    /// Delete `files`, reporting the ones left behind.
    async fn delete(&self, files: &[String]) -> DeleteReport;

    /// Thumbnail of `path`.
    async fn thumb(&self, path: &str) -> RemoteResult<ContentResponse>;

    /// Public URL for `path`, valid for `ttl` seconds (`ttl <= 0` never expires).
    async fn source(
        &self,
        path: &str,
        ttl: i64,
        is_download: bool,
        options: &SourceOptions,
    ) -> RemoteResult<Url>;

    /// Credential for a direct upload, keyed by the upload session `key`.
    async fn token(&self, ttl: i64, key: &str) -> RemoteResult<UploadCredential>;
}

/// Handler delegating to a remote slave node.
pub struct RemoteHandler<'a> {
    client: reqwest::Client,
    policy: &'a Policy,
    auth: Arc<dyn Auth>,
    settings: Arc<dyn SettingsProvider>,
}

impl<'a> RemoteHandler<'a> {
    pub fn new(
        client: reqwest::Client,
        policy: &'a Policy,
        auth: Arc<dyn Auth>,
        settings: Arc<dyn SettingsProvider>,
    ) -> Self {
        Self {
            client,
            policy,
            auth,
            settings,
        }
    }

    /// TTL for delete and thumbnail signatures.
    fn api_ttl(&self) -> i64 {
        self.settings
            .int_setting(SLAVE_API_TIMEOUT, DEFAULT_SLAVE_API_TIMEOUT)
    }

    /// Signed, absolute download or preview URL.
    pub fn source_url(
        &self,
        path: &str,
        ttl: i64,
        is_download: bool,
        options: &SourceOptions,
    ) -> RemoteResult<Url> {
        let server = parse_server(self.policy)?;
        let endpoint = SlaveEndpoint::for_source(is_download);
        let relative = source_path(
            endpoint,
            options.speed_limit,
            &encode_path(path),
            options.file_name(),
        );

        Ok(sign_uri(self.auth.as_ref(), join(&server, &relative)?, ttl)?)
    }

    /// Signed, absolute thumbnail URL.
    pub fn thumb_url(&self, path: &str) -> RemoteResult<Url> {
        let server = parse_server(self.policy)?;
        let url = join(&server, &thumb_path(&encode_path(path)))?;
        Ok(sign_uri(self.auth.as_ref(), url, self.api_ttl())?)
    }

    async fn send_delete(&self, files: &[String]) -> RemoteResult<String> {
        let server = parse_server(self.policy)?;
        let body = serde_json::to_string(&RemoteDeleteRequest {
            files: files.to_vec(),
        })
        .map_err(|e| RemoteError::encoding(e.to_string()))?;

        let mut request = self
            .client
            .post(SlaveEndpoint::Delete.resolve(&server)?)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .build()?;
        sign_request(self.auth.as_ref(), &mut request, self.api_ttl())?;

        let response = self.client.execute(request).await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(RemoteError::HttpStatus(status.as_u16()));
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl<'a> StorageHandler for RemoteHandler<'a> {
    async fn get(&self, path: &str, options: &SourceOptions) -> RemoteResult<RemoteBody> {
        let url = self.source_url(path, 0, true, options)?;
        let endpoint = SlaveEndpoint::Download.as_str();
        debug!(endpoint, path, "Fetching file from slave");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            warn!(endpoint, path, status = status.as_u16(), "Slave refused download");
            return Err(RemoteError::HttpStatus(status.as_u16()));
        }

        Ok(RemoteBody::new(response))
    }

    async fn put(&self, _body: reqwest::Body, dst: &str, _size: u64) -> RemoteResult<()> {
        debug!(dst, "Rejected direct upload to remote policy");
        Err(RemoteError::unsupported(
            "remote policy does not accept direct uploads, request an upload credential instead",
        ))
    }

    async fn delete(&self, files: &[String]) -> DeleteReport {
        if files.is_empty() {
            return DeleteReport::complete();
        }

        debug!(
            endpoint = SlaveEndpoint::Delete.as_str(),
            files = files.len(),
            "Deleting files on slave"
        );

        let report = match self.send_delete(files).await {
            Ok(body) => DeleteReport::from_response_body(files, &body),
            Err(e) => DeleteReport::failed_all(files, e),
        };

        match &report.error {
            None => info!(files = files.len(), "Deleted files on slave"),
            Some(e) => warn!(
                requested = files.len(),
                failed = report.failed.len(),
                error = %e,
                "Slave delete incomplete"
            ),
        }

        report
    }

    async fn thumb(&self, path: &str) -> RemoteResult<ContentResponse> {
        let url = self.thumb_url(path)?;
        debug!(endpoint = SlaveEndpoint::Thumb.as_str(), path, "Signed thumbnail redirect");
        Ok(ContentResponse {
            redirect: true,
            url,
        })
    }

    async fn source(
        &self,
        path: &str,
        ttl: i64,
        is_download: bool,
        options: &SourceOptions,
    ) -> RemoteResult<Url> {
        self.source_url(path, ttl, is_download, options)
    }

    async fn token(&self, ttl: i64, key: &str) -> RemoteResult<UploadCredential> {
        let server = parse_server(self.policy)?;
        let callback = callback_url(&self.settings.site_url(), key)?;
        let upload_policy = credential::upload_policy(self.policy, &callback);

        let credential = credential::issue(
            self.auth.as_ref(),
            SlaveEndpoint::Upload.resolve(&server)?,
            &upload_policy,
            ttl,
        )?;

        debug!(key, ttl, "Issued upload credential");
        Ok(credential)
    }
}
