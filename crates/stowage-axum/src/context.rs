//! Request-scoped result context
//!
//! On the success path the middleware attaches an [`UploadedFiles`] value to
//! the request extensions. Downstream handlers read it either through the
//! axum extractor impl or explicitly via [`UploadedFiles::from_extensions`].

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{Extensions, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use stowage_core::{UploadError, UploadedFile};

use crate::error::ErrorResponse;

/// All files uploaded during a request, keyed by form field. A key maps to
/// more than one descriptor when the form submitted several files under it;
/// order is encounter order in the form.
///
/// Frozen once built; cloning shares the underlying map.
#[derive(Debug, Clone, Default)]
pub struct UploadedFiles {
    inner: Arc<HashMap<String, Vec<UploadedFile>>>,
}

impl UploadedFiles {
    pub(crate) fn new(files: HashMap<String, Vec<UploadedFile>>) -> Self {
        UploadedFiles {
            inner: Arc::new(files),
        }
    }

    /// All uploaded files, keyed by form field.
    pub fn all(&self) -> &HashMap<String, Vec<UploadedFile>> {
        &self.inner
    }

    /// The files uploaded under one specific form field.
    pub fn get(&self, key: &str) -> Result<&[UploadedFile], UploadError> {
        match self.inner.get(key) {
            Some(files) => Ok(files.as_slice()),
            None => Err(UploadError::NoFilesForKey {
                key: key.to_string(),
            }),
        }
    }

    /// Read the result context out of request extensions. Fails with
    /// [`UploadError::NoFilesUploaded`] when the upload middleware never
    /// reached its success path for this request.
    pub fn from_extensions(extensions: &Extensions) -> Result<&UploadedFiles, UploadError> {
        extensions
            .get::<UploadedFiles>()
            .ok_or(UploadError::NoFilesUploaded)
    }
}

/// Rejection for the [`UploadedFiles`] extractor: the upload middleware never
/// attached a result context to this request.
#[derive(Debug)]
pub struct NoFilesRejection;

impl IntoResponse for NoFilesRejection {
    fn into_response(self) -> axum::response::Response {
        let err = UploadError::NoFilesUploaded;
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                message: "could not upload file".to_string(),
                error: err.to_string(),
            }),
        )
            .into_response()
    }
}

impl<S> FromRequestParts<S> for UploadedFiles
where
    S: Send + Sync,
{
    type Rejection = NoFilesRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<UploadedFiles>()
            .cloned()
            .ok_or(NoFilesRejection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(key: &str) -> UploadedFile {
        UploadedFile {
            field_name: key.to_string(),
            original_name: "a.txt".to_string(),
            uploaded_file_name: "a.txt".to_string(),
            folder_destination: "memory".to_string(),
            storage_key: "a.txt".to_string(),
            mime_type: "text/plain".to_string(),
            size: 1,
        }
    }

    #[test]
    fn get_returns_files_in_order() {
        let mut map = HashMap::new();
        map.insert("docs".to_string(), vec![descriptor("docs"), descriptor("docs")]);
        let files = UploadedFiles::new(map);

        assert_eq!(files.get("docs").unwrap().len(), 2);
    }

    #[test]
    fn get_fails_for_unpopulated_keys() {
        let files = UploadedFiles::new(HashMap::new());
        let err = files.get("missing").unwrap_err();
        assert!(matches!(err, UploadError::NoFilesForKey { .. }));
        assert!(err.to_string().contains("(missing)"));
    }

    #[test]
    fn from_extensions_fails_when_never_attached() {
        let extensions = Extensions::new();
        let err = UploadedFiles::from_extensions(&extensions).unwrap_err();
        assert!(matches!(err, UploadError::NoFilesUploaded));
    }

    #[test]
    fn from_extensions_reads_the_attached_context() {
        let mut extensions = Extensions::new();
        let mut map = HashMap::new();
        map.insert("f".to_string(), vec![descriptor("f")]);
        extensions.insert(UploadedFiles::new(map));

        let files = UploadedFiles::from_extensions(&extensions).unwrap();
        assert_eq!(files.get("f").unwrap()[0].field_name, "f");
    }
}
