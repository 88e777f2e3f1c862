//! Client configuration and the settings collaborator.

use std::collections::HashMap;
use std::time::Duration;

use url::Url;

use crate::error::{RemoteError, RemoteResult};

/// Setting holding the TTL (seconds) for slave API signatures.
pub const SLAVE_API_TIMEOUT: &str = "slave_api_timeout";

/// TTL used when `slave_api_timeout` is not configured.
pub const DEFAULT_SLAVE_API_TIMEOUT: i64 = 60;

/// Site settings the handler reads at call time.
pub trait SettingsProvider: Send + Sync {
    /// Integer setting `name`, or `default` when unset.
    fn int_setting(&self, name: &str, default: i64) -> i64;

    /// Public base URL of this site, used for upload callbacks.
    fn site_url(&self) -> Url;
}

/// In-memory site settings.
#[derive(Debug, Clone)]
pub struct SiteSettings {
    site_url: Url,
    ints: HashMap<String, i64>,
}

impl SiteSettings {
    pub fn new(site_url: Url) -> Self {
        Self {
            site_url,
            ints: HashMap::new(),
        }
    }

    /// Set an integer setting.
    pub fn with_int(mut self, name: impl Into<String>, value: i64) -> Self {
        self.ints.insert(name.into(), value);
        self
    }

    /// Create settings from environment variables.
    pub fn from_env() -> RemoteResult<Self> {
        let raw = std::env::var("RELAY_SITE_URL")
            .unwrap_or_else(|_| "http://localhost:5212/".to_string());
        let site_url = Url::parse(&raw)
            .map_err(|e| RemoteError::config(format!("invalid RELAY_SITE_URL '{}': {}", raw, e)))?;

        let mut settings = Self::new(site_url);
        if let Some(ttl) = std::env::var("RELAY_SLAVE_API_TIMEOUT")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            settings = settings.with_int(SLAVE_API_TIMEOUT, ttl);
        }

        Ok(settings)
    }
}

impl SettingsProvider for SiteSettings {
    fn int_setting(&self, name: &str, default: i64) -> i64 {
        self.ints.get(name).copied().unwrap_or(default)
    }

    fn site_url(&self) -> Url {
        self.site_url.clone()
    }
}

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct RemoteClientConfig {
    /// Whole-request timeout
    pub timeout: Duration,
    /// Connection establishment timeout
    pub connect_timeout: Duration,
}

impl Default for RemoteClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl RemoteClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            timeout: Duration::from_secs(
                std::env::var("RELAY_REQUEST_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            connect_timeout: Duration::from_secs(
                std::env::var("RELAY_CONNECT_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
        }
    }

    /// Build the HTTP client.
    pub fn build_client(&self) -> RemoteResult<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .build()
            .map_err(RemoteError::Network)
    }
}
