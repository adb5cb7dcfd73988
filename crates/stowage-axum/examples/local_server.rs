//! Minimal server storing uploads on the local filesystem.
//!
//! Run with `cargo run --example local_server`, then:
//!
//! ```sh
//! curl -F "avatar=@photo.png" -F "document=@notes.md" localhost:3300/
//! ```

use std::sync::Arc;

use axum::middleware::from_fn_with_state;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use stowage_axum::{handle_upload, UploadedFiles, Uploader};
use stowage_core::{naming, validation, UploadedFile, ValidationError, ValidationFn};
use stowage_storage::{LocalStorage, PathOptions, Storage};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let storage: Arc<dyn Storage> = Arc::new(LocalStorage::new("/tmp/stowage-uploads").await?);

    let named_files_only: ValidationFn = Arc::new(|file: &UploadedFile| {
        if file.original_name.is_empty() {
            return Err(ValidationError::rejected("a filename is required"));
        }
        Ok(())
    });

    let uploader = Uploader::builder(storage.clone())
        .max_file_size(10 << 20)
        .validation(validation::chain([
            validation::mime_types(["image/jpeg", "image/png", "text/plain"]),
            named_files_only,
        ]))
        .name_generator(naming::uuid_names())
        .build();

    let app = Router::new()
        .route(
            "/",
            post(move |files: UploadedFiles| uploaded(files, storage.clone())),
        )
        .route_layer(from_fn_with_state(
            uploader.on(["avatar", "document"]),
            handle_upload,
        ));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:3300").await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn uploaded(files: UploadedFiles, storage: Arc<dyn Storage>) -> impl IntoResponse {
    for (key, uploads) in files.all() {
        for file in uploads {
            let path = storage
                .path(&PathOptions {
                    key: file.storage_key.clone(),
                    ..Default::default()
                })
                .await;
            tracing::info!(key = %key, original = %file.original_name, ?path, "stored upload");
        }
    }
    Json(files.all().clone())
}
