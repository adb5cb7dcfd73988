//! File validation functions
//!
//! A validation function inspects a candidate [`UploadedFile`] before it is
//! handed to the storage backend and rejects it with a descriptive error when
//! the file is unacceptable. Validators compose with [`chain`].

use std::sync::Arc;

use crate::file::UploadedFile;

/// Why a file was rejected by a validation function.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("unsupported mime type uploaded ({mime_type})")]
    UnsupportedMimeType { mime_type: String },

    #[error("{0}")]
    Rejected(String),
}

impl ValidationError {
    /// Build a custom rejection with the given message.
    pub fn rejected(message: impl Into<String>) -> Self {
        ValidationError::Rejected(message.into())
    }
}

/// A validation function over a candidate uploaded file.
pub type ValidationFn = Arc<dyn Fn(&UploadedFile) -> Result<(), ValidationError> + Send + Sync>;

/// The default validation function. Lets every file pass through.
pub fn accept_all() -> ValidationFn {
    Arc::new(|_| Ok(()))
}

/// Accepts a file iff its sniffed MIME type case-insensitively matches one of
/// the allowed entries. The rejection message names the offending MIME type.
pub fn mime_types<I, S>(allowed: I) -> ValidationFn
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let allowed: Vec<String> = allowed.into_iter().map(Into::into).collect();
    Arc::new(move |file| {
        if allowed
            .iter()
            .any(|mime| mime.eq_ignore_ascii_case(&file.mime_type))
        {
            Ok(())
        } else {
            Err(ValidationError::UnsupportedMimeType {
                mime_type: file.mime_type.clone(),
            })
        }
    })
}

/// Composes validators left to right, short-circuiting on the first failure.
pub fn chain<I>(validators: I) -> ValidationFn
where
    I: IntoIterator<Item = ValidationFn>,
{
    let validators: Vec<ValidationFn> = validators.into_iter().collect();
    Arc::new(move |file| {
        for validator in &validators {
            validator(file)?;
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(mime_type: &str) -> UploadedFile {
        UploadedFile {
            field_name: "file".to_string(),
            original_name: "a.bin".to_string(),
            uploaded_file_name: "a.bin".to_string(),
            folder_destination: String::new(),
            storage_key: String::new(),
            mime_type: mime_type.to_string(),
            size: 0,
        }
    }

    #[test]
    fn accept_all_accepts_everything() {
        assert!(accept_all()(&descriptor("application/x-anything")).is_ok());
    }

    #[test]
    fn mime_types_matches_case_insensitively() {
        let validator = mime_types(["image/PNG", "text/plain"]);
        assert!(validator(&descriptor("image/png")).is_ok());
        assert!(validator(&descriptor("Text/Plain")).is_ok());
    }

    #[test]
    fn mime_types_rejection_names_the_offender() {
        let validator = mime_types(["image/png"]);
        let err = validator(&descriptor("application/pdf")).unwrap_err();
        assert!(err.to_string().contains("application/pdf"));
    }

    #[test]
    fn chain_surfaces_the_first_failure() {
        let first: ValidationFn = Arc::new(|_| Err(ValidationError::rejected("first")));
        let second: ValidationFn = Arc::new(|_| Err(ValidationError::rejected("second")));
        let chained = chain([accept_all(), first, second]);

        let err = chained(&descriptor("text/plain")).unwrap_err();
        assert_eq!(err.to_string(), "first");
    }

    #[test]
    fn chain_succeeds_when_every_validator_succeeds() {
        let chained = chain([accept_all(), mime_types(["text/plain"])]);
        assert!(chained(&descriptor("text/plain")).is_ok());
    }

    #[test]
    fn empty_chain_accepts() {
        let chained = chain(Vec::<ValidationFn>::new());
        assert!(chained(&descriptor("anything")).is_ok());
    }
}
