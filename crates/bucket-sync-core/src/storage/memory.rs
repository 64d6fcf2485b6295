//! In-memory storage backend for testing.

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::{ObjectMeta, ObjectStore, PutPayload};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use super::{ObjectMetadata, StorageBackend};
use crate::error::StorageError;
use crate::{Error, Result};

/// In-memory storage backend using object_store
///
/// Each bucket is its own `InMemory` store. Nothing persists between runs.
/// Names registered with [`MemoryBackend::reserve_foreign_bucket`] behave like
/// buckets owned by another account: they are invisible to listing and
/// cannot be created.
#[derive(Default)]
pub struct MemoryBackend {
    buckets: RwLock<BTreeMap<String, Arc<InMemory>>>,
    foreign: RwLock<HashSet<String>>,
}

impl MemoryBackend {
    /// Create a new in-memory storage backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a bucket name as taken by another owner
    pub fn reserve_foreign_bucket(&self, bucket: &str) {
        self.foreign.write().insert(bucket.to_string());
    }

    fn bucket(&self, bucket: &str) -> Result<Arc<InMemory>> {
        self.buckets
            .read()
            .get(bucket)
            .cloned()
            .ok_or_else(|| Error::Storage(StorageError::NotFound(bucket.to_string())))
    }

    fn to_metadata(meta: ObjectMeta) -> ObjectMetadata {
        ObjectMetadata {
            key: meta.location.to_string(),
            size: meta.size as u64,
            last_modified: meta.last_modified,
        }
    }
}

fn backend_error(op: &str, e: object_store::Error) -> Error {
    Error::Storage(StorageError::Backend(format!("Memory {} failed: {}", op, e)))
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn list_buckets(&self) -> Result<Vec<String>> {
        Ok(self.buckets.read().keys().cloned().collect())
    }

    async fn create_bucket(&self, bucket: &str, _region: Option<&str>) -> Result<()> {
        if self.foreign.read().contains(bucket) {
            return Err(Error::Storage(StorageError::NameConflict(bucket.to_string())));
        }
        self.buckets
            .write()
            .entry(bucket.to_string())
            .or_insert_with(|| Arc::new(InMemory::new()));
        Ok(())
    }

    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectMetadata>> {
        let store = self.bucket(bucket)?;

        // object_store prefixes match whole path segments; S3 matches raw strings
        let mut objects = Vec::new();
        let mut stream = store.list(None);
        while let Some(result) = stream.next().await {
            let meta = result.map_err(|e| backend_error("LIST", e))?;
            if meta.location.as_ref().starts_with(prefix) {
                objects.push(Self::to_metadata(meta));
            }
        }

        objects.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(objects)
    }

    async fn head(&self, bucket: &str, key: &str) -> Result<ObjectMetadata> {
        let store = self.bucket(bucket)?;
        let meta = store.head(&Path::from(key)).await.map_err(|e| match e {
            object_store::Error::NotFound { .. } => {
                Error::Storage(StorageError::NotFound(key.to_string()))
            }
            _ => backend_error("HEAD", e),
        })?;

        Ok(Self::to_metadata(meta))
    }

    async fn put(&self, bucket: &str, key: &str, data: Bytes) -> Result<()> {
        let store = self.bucket(bucket)?;
        store
            .put(&Path::from(key), PutPayload::from_bytes(data))
            .await
            .map_err(|e| backend_error("PUT", e))?;
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes> {
        let store = self.bucket(bucket)?;
        let result = store.get(&Path::from(key)).await.map_err(|e| match e {
            object_store::Error::NotFound { .. } => {
                Error::Storage(StorageError::NotFound(key.to_string()))
            }
            _ => backend_error("GET", e),
        })?;

        result
            .bytes()
            .await
            .map_err(|e| Error::Storage(StorageError::Backend(format!("Failed to read bytes: {}", e))))
    }
}
