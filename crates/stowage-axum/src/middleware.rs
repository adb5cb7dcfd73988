//! Upload orchestration middleware
//!
//! The pipeline per request:
//!
//! 1. Drain the multipart body under the configured size cap, grouping file
//!    parts by form-field key. The shared body is fully consumed here, so the
//!    per-key units that follow operate on independent buffers.
//! 2. Spawn one unit per expected key. Units run concurrently with no
//!    ordering guarantee; within one key, files are handled sequentially in
//!    encounter order.
//! 3. Join all units. The first failure (in key order) wins and the request
//!    is answered by the error responder; in-flight sibling uploads run to
//!    completion but their results are discarded, and nothing is rolled back.
//! 4. On success, attach the merged [`UploadedFiles`] context to the request
//!    and hand it to the next handler with an emptied body.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use bytes::{Bytes, BytesMut};
use futures::future::join_all;
use stowage_core::{sniff, UploadError, UploadedFile};
use stowage_storage::UploadOptions;

use crate::context::UploadedFiles;
use crate::uploader::{UploadRoute, UploaderInner};

/// The middleware entry point, wired with [`crate::Uploader::on`]:
///
/// ```ignore
/// router.route_layer(from_fn_with_state(uploader.on(["avatar"]), handle_upload))
/// ```
pub async fn handle_upload(
    State(route): State<UploadRoute>,
    request: Request,
    next: Next,
) -> Response {
    match process(&route, request).await {
        Ok(request) => next.run(request).await,
        Err(err) => {
            tracing::warn!(error = %err, "upload pipeline failed");
            (route.uploader.error_responder)(&err)
        }
    }
}

/// One file as it came out of the form, before any processing.
struct RawPart {
    file_name: String,
    data: Bytes,
}

async fn process(route: &UploadRoute, request: Request) -> Result<Request, UploadError> {
    let uploader = &route.uploader;
    let (mut parts, body) = request.into_parts();

    // Fail fast on a declared length before reading anything.
    if let Some(length) = parts
        .headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
    {
        if length > uploader.max_file_size {
            return Err(UploadError::BodyTooLarge {
                limit: uploader.max_file_size,
            });
        }
    }

    let boundary = parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| multer::parse_boundary(ct).ok())
        .ok_or_else(|| UploadError::MultipartParse {
            message: "request is not multipart/form-data".to_string(),
        })?;

    let mut groups = drain_form(
        body,
        boundary,
        uploader.max_file_size,
        route.keys.as_ref(),
    )
    .await?;

    // One concurrent unit per expected key. Spawned tasks keep running even
    // after a sibling fails; the join below only suppresses their success.
    let mut handles = Vec::with_capacity(route.keys.len());
    for key in route.keys.iter() {
        let unit_parts = groups.remove(key);
        handles.push(tokio::spawn(process_key(
            Arc::clone(uploader),
            key.clone(),
            unit_parts,
        )));
    }

    let mut merged: HashMap<String, Vec<UploadedFile>> = HashMap::with_capacity(route.keys.len());
    let mut first_error: Option<UploadError> = None;

    // Join barrier: wait for every unit, keep the first error in key order.
    for (key, joined) in route.keys.iter().zip(join_all(handles).await) {
        match joined {
            Ok(Ok(Some((key, files)))) => {
                merged.insert(key, files);
            }
            Ok(Ok(None)) => {}
            Ok(Err(err)) => {
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
            Err(join_err) => {
                if first_error.is_none() {
                    first_error = Some(UploadError::UnitFailed {
                        key: key.clone(),
                        message: join_err.to_string(),
                    });
                }
            }
        }
    }

    if let Some(err) = first_error {
        return Err(err);
    }

    parts.extensions.insert(UploadedFiles::new(merged));

    // The multipart body has been consumed; downstream sees the upload
    // results through the extension, not the body.
    Ok(Request::from_parts(parts, Body::empty()))
}

/// Consume the multipart body, buffering the file parts submitted under the
/// expected keys. Text fields and unexpected keys are drained and dropped.
async fn drain_form(
    body: Body,
    boundary: String,
    max_file_size: u64,
    keys: &[String],
) -> Result<HashMap<String, Vec<RawPart>>, UploadError> {
    let constraints = multer::Constraints::new()
        .size_limit(multer::SizeLimit::new().whole_stream(max_file_size));
    let mut form =
        multer::Multipart::with_constraints(body.into_data_stream(), boundary, constraints);

    let mut groups: HashMap<String, Vec<RawPart>> = HashMap::with_capacity(keys.len());

    loop {
        let field = match form.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => return Err(map_multer_error(err, max_file_size, None)),
        };

        let Some(name) = field.name().map(str::to_owned) else {
            drain_field(field, max_file_size).await?;
            continue;
        };

        // Only parts carrying a filename are file uploads.
        let file_name = field.file_name().map(str::to_owned);
        if file_name.is_none() || !keys.contains(&name) {
            drain_field(field, max_file_size).await?;
            continue;
        }

        let data = read_field(field, max_file_size, &name).await?;
        groups.entry(name).or_default().push(RawPart {
            // file_name checked above
            file_name: file_name.unwrap_or_default(),
            data,
        });
    }

    Ok(groups)
}

async fn read_field(
    mut field: multer::Field<'_>,
    max_file_size: u64,
    key: &str,
) -> Result<Bytes, UploadError> {
    let mut buffer = BytesMut::new();
    loop {
        match field.chunk().await {
            Ok(Some(chunk)) => buffer.extend_from_slice(&chunk),
            Ok(None) => return Ok(buffer.freeze()),
            Err(err) => return Err(map_multer_error(err, max_file_size, Some(key))),
        }
    }
}

async fn drain_field(mut field: multer::Field<'_>, max_file_size: u64) -> Result<(), UploadError> {
    loop {
        match field.chunk().await {
            Ok(Some(_)) => {}
            Ok(None) => return Ok(()),
            Err(err) => return Err(map_multer_error(err, max_file_size, None)),
        }
    }
}

fn map_multer_error(err: multer::Error, limit: u64, key: Option<&str>) -> UploadError {
    match err {
        multer::Error::StreamSizeExceeded { .. } | multer::Error::FieldSizeExceeded { .. } => {
            UploadError::BodyTooLarge { limit }
        }
        err => match key {
            Some(key) => UploadError::StreamRead {
                key: key.to_string(),
                message: err.to_string(),
            },
            None => UploadError::MultipartParse {
                message: err.to_string(),
            },
        },
    }
}

/// One upload unit: extract -> sniff -> validate -> name -> upload for every
/// file submitted under `key`, sequentially in encounter order.
///
/// Returns `Ok(None)` when the key was absent and the uploader ignores
/// missing keys.
async fn process_key(
    uploader: Arc<UploaderInner>,
    key: String,
    parts: Option<Vec<RawPart>>,
) -> Result<Option<(String, Vec<UploadedFile>)>, UploadError> {
    let Some(parts) = parts else {
        if uploader.ignore_missing_keys {
            return Ok(None);
        }
        return Err(UploadError::MissingField { key });
    };

    let mut files = Vec::with_capacity(parts.len());

    for part in parts {
        let RawPart { file_name, data } = part;

        let mime_type = sniff::strip_params(&sniff::detect_mime(&data)).to_string();
        let uploaded_file_name = (uploader.name_generator)(&file_name);

        // Candidate descriptor: backend fields are merged in after upload.
        let mut file = UploadedFile {
            field_name: key.clone(),
            original_name: file_name,
            uploaded_file_name: uploaded_file_name.clone(),
            folder_destination: String::new(),
            storage_key: String::new(),
            mime_type,
            size: 0,
        };

        (uploader.validation)(&file).map_err(|source| UploadError::Validation {
            key: key.clone(),
            source,
        })?;

        let opts = UploadOptions {
            file_name: uploaded_file_name,
            bucket: uploader.bucket.clone(),
            ..Default::default()
        };

        let start = std::time::Instant::now();
        let metadata = uploader
            .storage
            .upload(&opts, data)
            .await
            .map_err(|err| UploadError::Storage {
                key: key.clone(),
                source: Box::new(err),
            })?;

        tracing::debug!(
            key = %key,
            uploaded_file_name = %file.uploaded_file_name,
            size_bytes = metadata.size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "upload unit stored file"
        );

        file.size = metadata.size;
        file.folder_destination = metadata.folder_destination;
        file.storage_key = metadata.key;
        files.push(file);
    }

    Ok(Some((key, files)))
}
