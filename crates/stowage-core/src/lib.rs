//! Stowage Core Library
//!
//! This crate provides the types shared by the stowage upload middleware:
//! the uploaded-file descriptor, validation and name-generation functions,
//! MIME sniffing, and the error enum. It has no HTTP or storage dependencies;
//! those live in `stowage-axum` and `stowage-storage`.

pub mod error;
pub mod file;
pub mod naming;
pub mod sniff;
pub mod validation;

// Re-export commonly used types
pub use error::UploadError;
pub use file::UploadedFile;
pub use naming::{timestamp_names, uuid_names, NameGeneratorFn};
pub use sniff::{detect_mime, strip_params};
pub use validation::{accept_all, chain, mime_types, ValidationError, ValidationFn};
