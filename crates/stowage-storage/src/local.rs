use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::traits::{
    PathOptions, Storage, StorageError, StorageResult, UploadOptions, UploadedMetadata,
};

/// Local filesystem storage implementation
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at `base_path`, creating the
    /// directory if it does not exist.
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage { base_path })
    }

    /// Convert a storage key to a filesystem path, rejecting keys that could
    /// escape the base directory.
    fn key_to_path(&self, key: &str) -> StorageResult<PathBuf> {
        if key.is_empty() || key.contains("..") || key.starts_with('/') {
            return Err(StorageError::InvalidKey(format!(
                "storage key contains invalid characters: {key}"
            )));
        }
        Ok(self.base_path.join(key))
    }

    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn upload(&self, opts: &UploadOptions, data: Bytes) -> StorageResult<UploadedMetadata> {
        let path = self.key_to_path(&opts.file_name)?;
        let size = data.len();

        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::UploadFailed(format!("failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %opts.file_name,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "local storage upload successful"
        );

        Ok(UploadedMetadata {
            folder_destination: self.base_path.display().to_string(),
            key: opts.file_name.clone(),
            size: size as i64,
        })
    }

    async fn path(&self, opts: &PathOptions) -> StorageResult<String> {
        // Signed URLs make no sense on a bare filesystem; hand back the
        // plain path either way.
        let path = self.key_to_path(&opts.key)?;
        Ok(path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn storage() -> (TempDir, LocalStorage) {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();
        (dir, storage)
    }

    #[tokio::test]
    async fn upload_writes_the_file_and_reports_metadata() {
        let (dir, storage) = storage().await;

        let meta = storage
            .upload(
                &UploadOptions::new("notes.txt"),
                Bytes::from_static(b"hello"),
            )
            .await
            .unwrap();

        assert_eq!(meta.key, "notes.txt");
        assert_eq!(meta.size, 5);
        assert_eq!(meta.folder_destination, dir.path().display().to_string());

        let written = std::fs::read(dir.path().join("notes.txt")).unwrap();
        assert_eq!(written, b"hello");
    }

    #[tokio::test]
    async fn zero_byte_uploads_are_valid() {
        let (dir, storage) = storage().await;

        let meta = storage
            .upload(&UploadOptions::new("empty.bin"), Bytes::new())
            .await
            .unwrap();

        assert_eq!(meta.size, 0);
        assert!(dir.path().join("empty.bin").exists());
    }

    #[tokio::test]
    async fn traversal_keys_are_rejected() {
        let (_dir, storage) = storage().await;

        let err = storage
            .upload(
                &UploadOptions::new("../escape.txt"),
                Bytes::from_static(b"x"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));

        let err = storage
            .upload(&UploadOptions::new("/abs.txt"), Bytes::from_static(b"x"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
    }

    #[tokio::test]
    async fn path_joins_base_and_key() {
        let (dir, storage) = storage().await;

        let url = storage
            .path(&PathOptions {
                key: "a/b.txt".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(url, dir.path().join("a/b.txt").display().to_string());
    }
}
