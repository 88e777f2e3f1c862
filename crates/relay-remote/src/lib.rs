//! Remote storage policy adapter.
//!
//! Delegates file operations to a slave node over HTTP. Nothing here holds
//! file bytes or session state: every request is authenticated by a
//! time-bounded signature from [`relay_auth`].
//!
//! This crate provides:
//! - Slave endpoint resolution and path tokens (`endpoint`)
//! - Upload credential issuing (`credential`)
//! - The six delegated operations on [`RemoteHandler`] (`handler`)
//! - Batch delete outcome decoding (`delete`)

pub mod body;
pub mod config;
pub mod credential;
pub mod delete;
pub mod endpoint;
pub mod error;
pub mod handler;

pub use body::RemoteBody;
pub use config::{RemoteClientConfig, SettingsProvider, SiteSettings, DEFAULT_SLAVE_API_TIMEOUT};
pub use delete::DeleteReport;
pub use endpoint::{decode_path, encode_path, SlaveEndpoint};
pub use error::{RemoteError, RemoteResult};
pub use handler::{RemoteHandler, SourceOptions, StorageHandler};
