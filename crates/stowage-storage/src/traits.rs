//! Storage abstraction trait
//!
//! This module defines the `Storage` trait that all storage backends must
//! implement, plus the option and metadata records exchanged with the upload
//! middleware.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("upload failed: {0}")]
    UploadFailed(String),

    #[error("object not found: {0}")]
    NotFound(String),

    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    #[error("storage backend error: {0}")]
    BackendError(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Options for a single upload call.
#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    /// The name the file is stored under. Produced by the middleware's name
    /// generator, never by the client.
    pub file_name: String,

    /// Arbitrary key/value pairs forwarded to backends that support object
    /// metadata. Backends without such a notion ignore it.
    pub metadata: HashMap<String, String>,

    /// Target bucket or namespace. When absent, the backend's configured
    /// default is used.
    pub bucket: Option<String>,
}

impl UploadOptions {
    pub fn new(file_name: impl Into<String>) -> Self {
        UploadOptions {
            file_name: file_name.into(),
            ..Default::default()
        }
    }
}

/// What the backend reports after a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedMetadata {
    /// Folder, bucket or namespace holding the file.
    pub folder_destination: String,
    /// Retrieval key. May differ from the requested file name.
    pub key: String,
    /// Bytes written.
    pub size: i64,
}

/// Options for resolving a stored object to an addressable URL.
#[derive(Debug, Clone, Default)]
pub struct PathOptions {
    pub bucket: Option<String>,
    pub key: String,

    /// Request a time-limited signed URL instead of a public one.
    pub secure: bool,
    /// Signed-URL lifetime. Only takes effect when `secure` is set.
    pub expires_in: Option<Duration>,
}

/// Storage abstraction trait
///
/// All backends (local filesystem, S3, in-memory) implement this trait, which
/// lets the middleware work against any of them without coupling to
/// implementation details. Implementations must be `Send + Sync`; the
/// middleware calls `upload` concurrently from several units of the same
/// request and across requests.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Write `data` to the backend under the options' file name and report
    /// where it ended up.
    async fn upload(&self, opts: &UploadOptions, data: Bytes) -> StorageResult<UploadedMetadata>;

    /// Resolve a stored object to an addressable URL.
    async fn path(&self, opts: &PathOptions) -> StorageResult<String>;

    /// Release backend resources. Called at backend-lifecycle end, not per
    /// request. Most backends have nothing to do here.
    async fn close(&self) -> StorageResult<()> {
        Ok(())
    }
}
