//! HTTP error response conversion
//!
//! The default error responder answers failed upload pipelines with
//! HTTP 500 and a small JSON body. Callers can swap in their own responder
//! via [`crate::UploaderBuilder::error_responder`].

use std::sync::Arc;

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use stowage_core::UploadError;

use crate::uploader::ErrorResponder;

/// Wire format of the default error responder.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
    pub error: String,
}

pub(crate) fn default_error_responder() -> ErrorResponder {
    Arc::new(|err: &UploadError| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                message: "could not upload file".to_string(),
                error: err.to_string(),
            }),
        )
            .into_response()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_responder_returns_500_json() {
        let responder = default_error_responder();
        let response = responder(&UploadError::NoFilesUploaded);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response
                .headers()
                .get(axum::http::header::CONTENT_TYPE)
                .unwrap(),
            "application/json"
        );
    }
}
