//! Content-based MIME detection
//!
//! The client-declared content type of a multipart part is untrusted, so the
//! MIME type recorded on a descriptor is inferred from the content itself:
//! magic-byte detection over the first 512 bytes, falling back to
//! `text/plain` for plausible text and `application/octet-stream` otherwise.

/// Number of leading bytes considered for detection.
pub const SNIFF_LENGTH: usize = 512;

/// Sniff a MIME type from the leading bytes of `data`.
///
/// Operates on an owned prefix, so the bytes handed to validation and upload
/// are never consumed. The returned type carries no parameters.
pub fn detect_mime(data: &[u8]) -> String {
    let truncated = data.len() > SNIFF_LENGTH;
    let prefix = &data[..data.len().min(SNIFF_LENGTH)];

    if let Some(kind) = infer::get(prefix) {
        return kind.mime_type().to_string();
    }

    // No magic bytes recognized. Valid UTF-8 without NUL bytes is treated as
    // plain text, anything else as an opaque byte stream. A truncated window
    // may cut a multi-byte character in half; an otherwise valid prefix that
    // ends in an incomplete sequence still counts as text.
    if !prefix.contains(&0) {
        match std::str::from_utf8(prefix) {
            Ok(_) => return "text/plain".to_string(),
            Err(err) if truncated && err.error_len().is_none() => {
                return "text/plain".to_string()
            }
            Err(_) => {}
        }
    }

    "application/octet-stream".to_string()
}

/// Normalize a MIME type by stripping parameters:
/// `text/plain; charset=utf-8` -> `text/plain`.
pub fn strip_params(mime: &str) -> &str {
    mime.split(';').next().unwrap_or(mime).trim()
}
