//! Error types for the upload pipeline.
//!
//! Every failure carries enough context (which key, which phase) to diagnose
//! without re-running the request. Backend errors are wrapped, never
//! discarded.

use crate::validation::ValidationError;

/// Boxed error used to carry a storage backend failure without coupling this
/// crate to a concrete backend error type.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// The request body exceeded the configured maximum. Detected while
    /// draining the multipart stream, before the body is fully buffered.
    #[error("request body exceeds the configured limit of {limit} bytes")]
    BodyTooLarge { limit: u64 },

    /// The body could not be parsed as multipart form data.
    #[error("could not parse multipart form: {message}")]
    MultipartParse { message: String },

    /// An expected form field carried no file and `ignore_missing_keys` is
    /// off.
    #[error("files could not be found in key ({key}) from http request")]
    MissingField { key: String },

    /// The content stream for a field became unreadable mid-extraction.
    #[error("could not read file contents for key ({key}): {message}")]
    StreamRead { key: String, message: String },

    /// The configured validation function rejected the file.
    #[error("validation failed for key ({key}): {source}")]
    Validation {
        key: String,
        #[source]
        source: ValidationError,
    },

    /// The storage backend refused or failed the upload.
    #[error("could not upload file to storage for key ({key}): {source}")]
    Storage {
        key: String,
        #[source]
        source: BoxError,
    },

    /// An upload unit stopped without producing a result (task panic or
    /// runtime shutdown).
    #[error("upload unit for key ({key}) did not complete: {message}")]
    UnitFailed { key: String, message: String },

    /// Read API was invoked but no result context was attached to the
    /// request.
    #[error("no uploadable files found in request")]
    NoFilesUploaded,

    /// Read API was invoked for a key that was never populated.
    #[error("no uploaded files found under key ({key})")]
    NoFilesForKey { key: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_key() {
        let err = UploadError::MissingField {
            key: "avatar".to_string(),
        };
        assert!(err.to_string().contains("(avatar)"));

        let err = UploadError::Validation {
            key: "resume".to_string(),
            source: ValidationError::UnsupportedMimeType {
                mime_type: "application/zip".to_string(),
            },
        };
        let message = err.to_string();
        assert!(message.contains("(resume)"));
        assert!(message.contains("application/zip"));
    }

    #[test]
    fn storage_error_preserves_the_source() {
        use std::error::Error;

        let backend = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let err = UploadError::Storage {
            key: "file".to_string(),
            source: Box::new(backend),
        };
        assert!(err.source().is_some());
        assert!(err.to_string().contains("disk full"));
    }
}
