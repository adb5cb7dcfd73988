//! Stowage Storage Library
//!
//! This crate defines the storage capability consumed by the upload
//! middleware and ships the backend adapters: local filesystem (feature
//! `storage-local`, default) and S3-compatible object stores (feature
//! `storage-s3`). An in-memory backend is always available and doubles as a
//! test stub.
//!
//! A backend accepts a byte payload plus upload options and reports where
//! the file ended up; it can also resolve a stored object to an addressable
//! URL. Backends must be safe for concurrent use: the middleware issues
//! uploads from several in-flight units without any locking of its own.

#[cfg(feature = "storage-local")]
pub mod local;
pub mod memory;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use memory::MemoryStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{PathOptions, Storage, StorageError, StorageResult, UploadOptions, UploadedMetadata};
