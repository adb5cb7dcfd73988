//! Uploaded-file descriptor

use serde::{Deserialize, Serialize};

/// Describes one file after it has been pulled out of a multipart form and
/// written to the storage backend.
///
/// A descriptor is only built after the file was successfully extracted from
/// the form, and it is fully populated (backend size, destination and key
/// merged in) before it becomes visible to downstream handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    /// The multipart form field this file arrived under.
    pub field_name: String,

    /// Client-supplied filename. Untrusted; may be empty or contain
    /// path-like sequences, so it is never used as a storage path directly.
    pub original_name: String,

    /// Name assigned by the configured name generator. This is what the file
    /// was ultimately stored under, which usually differs from
    /// `original_name`.
    pub uploaded_file_name: String,

    /// Backend-reported location holding the file (folder, bucket, ...).
    #[serde(default)]
    pub folder_destination: String,

    /// Backend-reported key used to retrieve the file. May differ from
    /// `uploaded_file_name`.
    #[serde(default)]
    pub storage_key: String,

    /// MIME type sniffed from the first 512 bytes of content, with any
    /// parameters stripped (`text/plain; charset=utf-8` -> `text/plain`).
    pub mime_type: String,

    /// Size in bytes written to the backend.
    #[serde(default)]
    pub size: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_snake_case_field_names() {
        let file = UploadedFile {
            field_name: "avatar".to_string(),
            original_name: "me.png".to_string(),
            uploaded_file_name: "stowage-1-me.png".to_string(),
            folder_destination: "uploads".to_string(),
            storage_key: "stowage-1-me.png".to_string(),
            mime_type: "image/png".to_string(),
            size: 42,
        };

        let value = serde_json::to_value(&file).unwrap();
        assert_eq!(value["field_name"], "avatar");
        assert_eq!(value["original_name"], "me.png");
        assert_eq!(value["uploaded_file_name"], "stowage-1-me.png");
        assert_eq!(value["folder_destination"], "uploads");
        assert_eq!(value["storage_key"], "stowage-1-me.png");
        assert_eq!(value["mime_type"], "image/png");
        assert_eq!(value["size"], 42);
    }

    #[test]
    fn deserializes_with_missing_backend_fields() {
        let file: UploadedFile = serde_json::from_str(
            r#"{"field_name":"f","original_name":"a.txt","uploaded_file_name":"b.txt","mime_type":"text/plain"}"#,
        )
        .unwrap();
        assert_eq!(file.size, 0);
        assert!(file.storage_key.is_empty());
        assert!(file.folder_destination.is_empty());
    }
}
