//! Storage backend trait definition.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::path::Path;

use crate::Result;

/// Metadata about a stored object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMetadata {
    /// Full object key within the bucket
    pub key: String,
    /// Size in bytes
    pub size: u64,
    /// Last modified timestamp as recorded by the store
    pub last_modified: DateTime<Utc>,
}

/// Trait for object storage backends.
///
/// Every call is a single attempt: implementations surface failures as errors
/// and never leave a partially written object behind.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Names of all buckets visible to the caller
    async fn list_buckets(&self) -> Result<Vec<String>>;

    /// Create a bucket, returning `StorageError::NameConflict` if the name is
    /// owned by someone else
    async fn create_bucket(&self, bucket: &str, region: Option<&str>) -> Result<()>;

    /// List objects whose key starts with `prefix`, sorted by key
    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectMetadata>>;

    /// Get object metadata
    async fn head(&self, bucket: &str, key: &str) -> Result<ObjectMetadata>;

    /// Write data to a key
    async fn put(&self, bucket: &str, key: &str, data: Bytes) -> Result<()>;

    /// Read data from a key
    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes>;

    /// Upload a local file, returning the number of bytes sent.
    ///
    /// The default reads the whole file and calls [`put`](Self::put);
    /// backends that can stream from disk override it.
    async fn put_file(&self, bucket: &str, key: &str, path: &Path) -> Result<u64> {
        let data = tokio::fs::read(path).await?;
        let size = data.len() as u64;
        self.put(bucket, key, Bytes::from(data)).await?;
        Ok(size)
    }

    /// Download an object into a local file, returning the number of bytes
    /// written. The parent directory must already exist.
    async fn get_to_file(&self, bucket: &str, key: &str, path: &Path) -> Result<u64> {
        let data = self.get(bucket, key).await?;
        tokio::fs::write(path, &data).await?;
        Ok(data.len() as u64)
    }

    /// Region new buckets land in when the caller does not name one
    fn region(&self) -> Option<String> {
        None
    }

    /// Check if a bucket exists
    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        Ok(self.list_buckets().await?.iter().any(|b| b == bucket))
    }
}
