//! In-memory storage backend
//!
//! Keeps uploaded objects in a process-local map. Handy as a test double:
//! it records every object it receives and counts upload calls, so tests can
//! assert that the middleware did (or did not) reach the backend.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;

use crate::traits::{
    PathOptions, Storage, StorageError, StorageResult, UploadOptions, UploadedMetadata,
};

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    metadata: HashMap<String, String>,
}

/// In-memory storage implementation
#[derive(Debug, Default)]
pub struct MemoryStorage {
    objects: Mutex<HashMap<String, StoredObject>>,
    upload_calls: AtomicUsize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `upload` calls made against this store.
    pub fn upload_calls(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }

    /// Content stored under `key`, if any.
    pub fn object(&self, key: &str) -> Option<Bytes> {
        self.objects
            .lock()
            .expect("memory storage lock poisoned")
            .get(key)
            .map(|o| o.data.clone())
    }

    /// Metadata stored alongside `key`, if any.
    pub fn object_metadata(&self, key: &str) -> Option<HashMap<String, String>> {
        self.objects
            .lock()
            .expect("memory storage lock poisoned")
            .get(key)
            .map(|o| o.metadata.clone())
    }

    pub fn len(&self) -> usize {
        self.objects
            .lock()
            .expect("memory storage lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn upload(&self, opts: &UploadOptions, data: Bytes) -> StorageResult<UploadedMetadata> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);

        let size = data.len() as i64;
        self.objects
            .lock()
            .expect("memory storage lock poisoned")
            .insert(
                opts.file_name.clone(),
                StoredObject {
                    data,
                    metadata: opts.metadata.clone(),
                },
            );

        Ok(UploadedMetadata {
            folder_destination: opts.bucket.clone().unwrap_or_else(|| "memory".to_string()),
            key: opts.file_name.clone(),
            size,
        })
    }

    async fn path(&self, opts: &PathOptions) -> StorageResult<String> {
        let objects = self.objects.lock().expect("memory storage lock poisoned");
        if !objects.contains_key(&opts.key) {
            return Err(StorageError::NotFound(opts.key.clone()));
        }
        Ok(format!("memory://{}", opts.key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stores_objects_and_counts_calls() {
        let storage = MemoryStorage::new();

        let mut opts = UploadOptions::new("a.txt");
        opts.metadata.insert("owner".to_string(), "tests".to_string());

        let meta = storage
            .upload(&opts, Bytes::from_static(b"content"))
            .await
            .unwrap();

        assert_eq!(meta.size, 7);
        assert_eq!(meta.key, "a.txt");
        assert_eq!(storage.upload_calls(), 1);
        assert_eq!(storage.object("a.txt").unwrap(), Bytes::from_static(b"content"));
        assert_eq!(
            storage.object_metadata("a.txt").unwrap().get("owner"),
            Some(&"tests".to_string())
        );
    }

    #[tokio::test]
    async fn path_fails_for_unknown_keys() {
        let storage = MemoryStorage::new();
        let err = storage
            .path(&PathOptions {
                key: "missing".to_string(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn path_resolves_stored_keys() {
        let storage = MemoryStorage::new();
        storage
            .upload(&UploadOptions::new("k"), Bytes::from_static(b"x"))
            .await
            .unwrap();

        let url = storage
            .path(&PathOptions {
                key: "k".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(url, "memory://k");
    }
}
