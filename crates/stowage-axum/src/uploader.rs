//! Middleware configuration
//!
//! An [`Uploader`] holds the fully resolved configuration for the upload
//! pipeline: storage backend, size limit, validation, naming, and the error
//! responder. It is built once, is immutable afterwards, and holds no
//! per-request state; cloning it is cheap.

use std::sync::Arc;

use axum::response::Response;
use stowage_core::{naming, validation, NameGeneratorFn, UploadError, ValidationFn};
use stowage_storage::Storage;

use crate::error::default_error_responder;

/// Default maximum request body size: 5 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;

/// Builds the HTTP error response for a failed upload pipeline.
pub type ErrorResponder = Arc<dyn Fn(&UploadError) -> Response + Send + Sync>;

pub(crate) struct UploaderInner {
    pub(crate) storage: Arc<dyn Storage>,
    pub(crate) bucket: Option<String>,
    pub(crate) max_file_size: u64,
    pub(crate) validation: ValidationFn,
    pub(crate) name_generator: NameGeneratorFn,
    pub(crate) ignore_missing_keys: bool,
    pub(crate) error_responder: ErrorResponder,
}

/// Immutable upload-middleware configuration. See [`UploaderBuilder`] for the
/// recognized options and their defaults.
///
/// Files already written to the backend when a sibling key later fails are
/// left in place; the pipeline does not attempt rollback.
#[derive(Clone)]
pub struct Uploader {
    inner: Arc<UploaderInner>,
}

impl Uploader {
    /// Start building an uploader around the given storage backend.
    pub fn builder(storage: Arc<dyn Storage>) -> UploaderBuilder {
        UploaderBuilder {
            storage,
            bucket: None,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            validation: validation::accept_all(),
            name_generator: naming::timestamp_names(),
            ignore_missing_keys: false,
            error_responder: default_error_responder(),
        }
    }

    /// Bind this uploader to a list of expected form-field keys, producing
    /// the state for [`crate::handle_upload`]:
    ///
    /// ```ignore
    /// router.route_layer(from_fn_with_state(uploader.on(["avatar"]), handle_upload))
    /// ```
    ///
    /// Repeated keys collapse to one; each key gets exactly one upload unit.
    pub fn on<I, S>(&self, keys: I) -> UploadRoute
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut keys_vec: Vec<String> = Vec::new();
        for key in keys {
            let key = key.into();
            if !keys_vec.contains(&key) {
                keys_vec.push(key);
            }
        }
        UploadRoute {
            uploader: Arc::clone(&self.inner),
            keys: keys_vec.into(),
        }
    }
}

/// Builder for [`Uploader`]. Defaults are applied up front, so a built
/// uploader is always fully resolved.
pub struct UploaderBuilder {
    storage: Arc<dyn Storage>,
    bucket: Option<String>,
    max_file_size: u64,
    validation: ValidationFn,
    name_generator: NameGeneratorFn,
    ignore_missing_keys: bool,
    error_responder: ErrorResponder,
}

impl UploaderBuilder {
    /// Bucket or namespace passed along with every upload. When unset, the
    /// backend's configured default is used.
    pub fn bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    /// Maximum request body size in bytes. Default: 5 MiB.
    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    /// Validation function run against each candidate file.
    /// Default: accept everything.
    pub fn validation(mut self, validation: ValidationFn) -> Self {
        self.validation = validation;
        self
    }

    /// Name generator applied to each original filename.
    /// Default: [`stowage_core::naming::timestamp_names`].
    pub fn name_generator(mut self, name_generator: NameGeneratorFn) -> Self {
        self.name_generator = name_generator;
        self
    }

    /// When set, an expected key with no submitted file is skipped instead of
    /// failing the request. Default: off.
    pub fn ignore_missing_keys(mut self, ignore: bool) -> Self {
        self.ignore_missing_keys = ignore;
        self
    }

    /// Responder invoked when the pipeline fails. Default: HTTP 500 with a
    /// JSON body, see [`crate::error::ErrorResponse`].
    pub fn error_responder(mut self, responder: ErrorResponder) -> Self {
        self.error_responder = responder;
        self
    }

    pub fn build(self) -> Uploader {
        Uploader {
            inner: Arc::new(UploaderInner {
                storage: self.storage,
                bucket: self.bucket,
                max_file_size: self.max_file_size,
                validation: self.validation,
                name_generator: self.name_generator,
                ignore_missing_keys: self.ignore_missing_keys,
                error_responder: self.error_responder,
            }),
        }
    }
}

/// State handed to [`crate::handle_upload`]: one uploader plus the expected
/// form-field keys for a route.
#[derive(Clone)]
pub struct UploadRoute {
    pub(crate) uploader: Arc<UploaderInner>,
    pub(crate) keys: Arc<[String]>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use stowage_storage::MemoryStorage;

    #[test]
    fn defaults_are_resolved_at_build_time() {
        let uploader = Uploader::builder(Arc::new(MemoryStorage::new())).build();
        assert_eq!(uploader.inner.max_file_size, DEFAULT_MAX_FILE_SIZE);
        assert!(!uploader.inner.ignore_missing_keys);
    }

    #[test]
    fn on_collects_the_expected_keys() {
        let uploader = Uploader::builder(Arc::new(MemoryStorage::new())).build();
        let route = uploader.on(["a", "b"]);
        assert_eq!(route.keys.as_ref(), ["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn on_collapses_repeated_keys() {
        let uploader = Uploader::builder(Arc::new(MemoryStorage::new())).build();
        let route = uploader.on(["file", "other", "file"]);
        assert_eq!(
            route.keys.as_ref(),
            ["file".to_string(), "other".to_string()]
        );
    }
}
