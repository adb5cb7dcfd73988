//! Axum middleware for declarative multipart file uploads.
//!
//! Given a list of expected form-field keys, the middleware parses the
//! request body as multipart form data, then concurrently sniffs, validates,
//! renames and uploads the file(s) under each key to a pluggable storage
//! backend. On success the results are attached to the request as an
//! [`UploadedFiles`] extension for downstream handlers; on the first failure
//! the configured error responder answers and the inner handler never runs.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use axum::{middleware::from_fn_with_state, routing::post, Json, Router};
//! use stowage_axum::{handle_upload, UploadedFiles, Uploader};
//! use stowage_core::validation;
//! use stowage_storage::LocalStorage;
//!
//! # async fn build() -> anyhow::Result<Router> {
//! let storage = Arc::new(LocalStorage::new("/tmp/uploads").await?);
//! let uploader = Uploader::builder(storage)
//!     .max_file_size(10 << 20)
//!     .validation(validation::mime_types(["image/jpeg", "image/png"]))
//!     .build();
//!
//! let app = Router::new()
//!     .route(
//!         "/",
//!         post(|files: UploadedFiles| async move { Json(files.all().clone()) }),
//!     )
//!     .route_layer(from_fn_with_state(uploader.on(["avatar"]), handle_upload));
//! # Ok(app)
//! # }
//! ```

pub mod context;
pub mod error;
pub mod middleware;
pub mod uploader;

// Re-export commonly used types
pub use context::UploadedFiles;
pub use error::ErrorResponse;
pub use middleware::handle_upload;
pub use stowage_core::{UploadError, UploadedFile};
pub use uploader::{ErrorResponder, UploadRoute, Uploader, UploaderBuilder, DEFAULT_MAX_FILE_SIZE};
