//! Storage policy backed by a remote slave node.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Configuration of a remote storage backend.
///
/// Owned by the caller and only borrowed by the dispatcher, so it stays
/// immutable for the lifetime of any single operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    /// Base address of the slave node (e.g. `https://slave.example.com/`).
    pub server: String,
    /// Directory naming rule, expanded by the slave on upload.
    #[serde(default)]
    pub dir_name_rule: String,
    /// File naming rule, expanded by the slave on upload.
    #[serde(default)]
    pub file_name_rule: String,
    /// Rename on conflict instead of failing.
    #[serde(default)]
    pub auto_rename: bool,
    /// Maximum upload size in bytes, 0 for unlimited.
    #[serde(default)]
    pub max_size: u64,
    /// Allowed file extensions, empty for any.
    #[serde(default)]
    pub allowed_extensions: Vec<String>,
}

impl Policy {
    /// Create a policy for `server` with default naming rules.
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            dir_name_rule: "uploads/{uid}/{path}".to_string(),
            file_name_rule: "{uid}_{randomkey8}_{originname}".to_string(),
            auto_rename: false,
            max_size: 0,
            allowed_extensions: Vec::new(),
        }
    }

    /// Create policy from environment variables.
    pub fn from_env() -> ModelResult<Self> {
        Self::from_env_with_server(None)
    }

    /// Like [`Policy::from_env`], with `server` taking precedence over
    /// `RELAY_SLAVE_SERVER`.
    pub fn from_env_with_server(server: Option<String>) -> ModelResult<Self> {
        let server = match server {
            Some(server) => server,
            None => std::env::var("RELAY_SLAVE_SERVER").map_err(|_| {
                ModelError::InvalidPolicy("RELAY_SLAVE_SERVER not set".to_string())
            })?,
        };

        let mut policy = Self::new(server);
        if let Ok(rule) = std::env::var("RELAY_DIR_NAME_RULE") {
            policy.dir_name_rule = rule;
        }
        if let Ok(rule) = std::env::var("RELAY_FILE_NAME_RULE") {
            policy.file_name_rule = rule;
        }
        policy.auto_rename = std::env::var("RELAY_AUTO_RENAME")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);
        policy.max_size = std::env::var("RELAY_MAX_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);
        policy.allowed_extensions = std::env::var("RELAY_ALLOWED_EXTENSIONS")
            .map(|s| {
                s.split(',')
                    .map(|ext| ext.trim().to_string())
                    .filter(|ext| !ext.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(policy)
    }
}
