//! Shared data models for remote storage delegation.
//!
//! This crate provides Serde-serializable types for:
//! - Storage policies pointing at a remote slave node
//! - Upload policies and the credentials handed to uploaders
//! - The slave API response envelope and batch delete payloads

pub mod error;
pub mod policy;
pub mod response;
pub mod upload;

// Re-export common types
pub use error::{ModelError, ModelResult};
pub use policy::Policy;
pub use response::{ContentResponse, RemoteDeleteRequest, Response};
pub use upload::{UploadCredential, UploadPolicy};
