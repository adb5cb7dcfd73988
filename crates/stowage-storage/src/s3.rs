use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::signer::Signer;
use object_store::{ObjectStoreExt, PutPayload, Result as ObjectResult};

use crate::traits::{
    PathOptions, Storage, StorageError, StorageResult, UploadOptions, UploadedMetadata,
};

/// Signed-URL lifetime used when the caller asks for a secure path without an
/// explicit expiry.
const DEFAULT_SIGNED_URL_EXPIRY: Duration = Duration::from_secs(15 * 60);

/// S3 storage implementation
///
/// One `S3Storage` is bound to a single bucket; upload options naming a
/// different bucket are rejected rather than silently redirected.
#[derive(Clone)]
pub struct S3Storage {
    store: AmazonS3,
    bucket: String,
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub async fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        // Build AmazonS3 object store from environment and explicit settings.
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region.clone())
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(S3Storage {
            store,
            bucket,
            region,
            endpoint_url,
        })
    }

    fn resolve_bucket<'a>(&'a self, requested: Option<&'a str>) -> StorageResult<&'a str> {
        match requested {
            None => Ok(&self.bucket),
            Some(bucket) if bucket == self.bucket => Ok(bucket),
            Some(other) => Err(StorageError::ConfigError(format!(
                "this store is configured for bucket {}, not {}",
                self.bucket, other
            ))),
        }
    }

    /// Generate public URL for S3 object
    ///
    /// For AWS S3, uses the standard format: https://{bucket}.s3.{region}.amazonaws.com/{key}
    /// For S3-compatible providers, uses the endpoint URL if provided
    fn generate_url(&self, key: &str) -> String {
        if let Some(ref endpoint) = self.endpoint_url {
            let base_url = endpoint.trim_end_matches('/');
            // Path-style for compatibility with MinIO and friends
            format!("{}/{}/{}", base_url, self.bucket, key)
        } else {
            format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket, self.region, key
            )
        }
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn upload(&self, opts: &UploadOptions, data: Bytes) -> StorageResult<UploadedMetadata> {
        let bucket = self.resolve_bucket(opts.bucket.as_deref())?.to_string();
        let size = data.len();
        let location = Path::from(opts.file_name.clone());

        let start = std::time::Instant::now();

        let result: ObjectResult<_> = self.store.put(&location, PutPayload::from(data)).await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %bucket,
                key = %opts.file_name,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 upload failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %bucket,
            key = %opts.file_name,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(UploadedMetadata {
            folder_destination: bucket,
            key: opts.file_name.clone(),
            size: size as i64,
        })
    }

    async fn path(&self, opts: &PathOptions) -> StorageResult<String> {
        self.resolve_bucket(opts.bucket.as_deref())?;

        if !opts.secure {
            return Ok(self.generate_url(&opts.key));
        }

        let location = Path::from(opts.key.clone());
        let expires_in = opts.expires_in.unwrap_or(DEFAULT_SIGNED_URL_EXPIRY);

        let url_result: ObjectResult<_> = self
            .store
            .signed_url(Method::GET, &location, expires_in)
            .await;

        let url = url_result
            .map_err(|e| StorageError::BackendError(e.to_string()))?
            .to_string();

        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> S3Storage {
        S3Storage::new(
            "uploads".to_string(),
            "us-east-1".to_string(),
            Some("http://localhost:9000".to_string()),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn foreign_bucket_is_rejected() {
        let storage = store().await;
        let err = storage.resolve_bucket(Some("other")).unwrap_err();
        assert!(matches!(err, StorageError::ConfigError(_)));
    }

    #[tokio::test]
    async fn public_url_uses_path_style_for_custom_endpoints() {
        let storage = store().await;
        assert_eq!(
            storage.generate_url("a.png"),
            "http://localhost:9000/uploads/a.png"
        );
    }

    #[tokio::test]
    async fn public_url_uses_virtual_hosted_style_for_aws() {
        let storage = S3Storage::new("uploads".to_string(), "eu-west-1".to_string(), None)
            .await
            .unwrap();
        assert_eq!(
            storage.generate_url("a.png"),
            "https://uploads.s3.eu-west-1.amazonaws.com/a.png"
        );
    }
}
