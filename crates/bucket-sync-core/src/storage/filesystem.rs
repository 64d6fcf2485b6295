//! Filesystem storage backend implementation.
//!
//! Buckets are directories directly under the base path; object keys are
//! relative paths inside them.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::{ObjectMetadata, StorageBackend};
use crate::error::StorageError;
use crate::Result;

/// Filesystem-based storage backend
#[derive(Debug, Clone)]
pub struct FilesystemBackend {
    base_path: PathBuf,
}

impl FilesystemBackend {
    /// Create a new filesystem backend with the given base path
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn bucket_path(&self, bucket: &str) -> Result<PathBuf> {
        if bucket.is_empty() || bucket.contains(['/', '\\']) || bucket == "." || bucket == ".." {
            return Err(StorageError::InvalidPath(bucket.to_string()).into());
        }
        Ok(self.base_path.join(bucket))
    }

    /// Convert a storage key to a filesystem path, rejecting traversal
    fn key_to_path(&self, bucket: &str, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(StorageError::InvalidPath(key.to_string()).into());
        }
        Ok(self.bucket_path(bucket)?.join(relative))
    }

    async fn existing_bucket(&self, bucket: &str) -> Result<PathBuf> {
        let path = self.bucket_path(bucket)?;
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_dir() => Ok(path),
            _ => Err(StorageError::NotFound(bucket.to_string()).into()),
        }
    }

    async fn metadata_for(path: &Path, key: String) -> Result<ObjectMetadata> {
        let metadata = fs::metadata(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(key.clone())
            } else {
                StorageError::Backend(format!(
                    "Failed to get metadata for {}: {}",
                    path.display(),
                    e
                ))
            }
        })?;

        if !metadata.is_file() {
            return Err(StorageError::NotFound(key).into());
        }

        let last_modified = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .map_err(|e| StorageError::Backend(format!("No mtime for {}: {}", path.display(), e)))?;

        Ok(ObjectMetadata {
            key,
            size: metadata.len(),
            last_modified,
        })
    }
}

#[async_trait]
impl StorageBackend for FilesystemBackend {
    async fn list_buckets(&self) -> Result<Vec<String>> {
        let mut buckets = Vec::new();

        if !self.base_path.exists() {
            return Ok(buckets);
        }

        let mut entries = fs::read_dir(&self.base_path).await.map_err(|e| {
            StorageError::Backend(format!(
                "Failed to read directory {}: {}",
                self.base_path.display(),
                e
            ))
        })?;

        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            StorageError::Backend(format!("Failed to read directory entry: {}", e))
        })? {
            if entry.path().is_dir() {
                buckets.push(entry.file_name().to_string_lossy().to_string());
            }
        }

        buckets.sort();
        Ok(buckets)
    }

    async fn create_bucket(&self, bucket: &str, _region: Option<&str>) -> Result<()> {
        let path = self.bucket_path(bucket)?;
        debug!("FS MKBUCKET: {}", path.display());
        fs::create_dir_all(&path).await.map_err(|e| {
            StorageError::Backend(format!("Failed to create bucket {}: {}", path.display(), e))
        })?;
        Ok(())
    }

    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectMetadata>> {
        let root = self.existing_bucket(bucket).await?;
        let mut results = Vec::new();

        // Prefixes are plain strings, but every match lives under the
        // directory part of the prefix, so the walk can start there.
        let start = match prefix.rfind('/') {
            Some(idx) => match self.key_to_path(bucket, &prefix[..idx]) {
                Ok(dir) => dir,
                Err(_) => return Ok(results),
            },
            None => root.clone(),
        };
        if !fs::metadata(&start).await.is_ok_and(|m| m.is_dir()) {
            return Ok(results);
        }

        let mut stack = vec![start];
        while let Some(dir) = stack.pop() {
            let mut entries = fs::read_dir(&dir).await.map_err(|e| {
                StorageError::Backend(format!("Failed to read directory {}: {}", dir.display(), e))
            })?;

            while let Some(entry) = entries.next_entry().await.map_err(|e| {
                StorageError::Backend(format!("Failed to read directory entry: {}", e))
            })? {
                let path = entry.path();
                if path.is_dir() {
                    stack.push(path);
                    continue;
                }

                let Ok(relative) = path.strip_prefix(&root) else {
                    continue;
                };
                let key = relative.to_string_lossy().replace('\\', "/");
                if key.starts_with(prefix) {
                    results.push(Self::metadata_for(&path, key).await?);
                }
            }
        }

        results.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(results)
    }

    async fn head(&self, bucket: &str, key: &str) -> Result<ObjectMetadata> {
        self.existing_bucket(bucket).await?;
        let path = self.key_to_path(bucket, key)?;
        Self::metadata_for(&path, key.to_string()).await
    }

    async fn put(&self, bucket: &str, key: &str, data: Bytes) -> Result<()> {
        self.existing_bucket(bucket).await?;
        let path = self.key_to_path(bucket, key)?;
        debug!("FS PUT: {}", path.display());

        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::Backend(format!("Failed to create directories: {}", e))
            })?;
        }

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::Backend(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::Backend(format!("Failed to write to file {}: {}", path.display(), e))
        })?;

        file.flush().await.map_err(|e| {
            StorageError::Backend(format!("Failed to flush file {}: {}", path.display(), e))
        })?;

        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes> {
        self.existing_bucket(bucket).await?;
        let path = self.key_to_path(bucket, key)?;
        debug!("FS GET: {}", path.display());

        let data = fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(key.to_string())
            } else {
                StorageError::Backend(format!("Failed to read file {}: {}", path.display(), e))
            }
        })?;

        Ok(Bytes::from(data))
    }

    async fn put_file(&self, bucket: &str, key: &str, path: &Path) -> Result<u64> {
        self.existing_bucket(bucket).await?;
        let dest = self.key_to_path(bucket, key)?;
        debug!("FS COPY IN: {} -> {}", path.display(), dest.display());

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::Backend(format!("Failed to create directories: {}", e))
            })?;
        }

        let size = fs::copy(path, &dest).await.map_err(|e| {
            StorageError::Backend(format!(
                "Failed to copy {} to {}: {}",
                path.display(),
                dest.display(),
                e
            ))
        })?;
        Ok(size)
    }

    async fn get_to_file(&self, bucket: &str, key: &str, path: &Path) -> Result<u64> {
        self.existing_bucket(bucket).await?;
        let src = self.key_to_path(bucket, key)?;
        debug!("FS COPY OUT: {} -> {}", src.display(), path.display());

        let size = fs::copy(&src, path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound && !src.exists() {
                StorageError::NotFound(key.to_string())
            } else {
                StorageError::Backend(format!(
                    "Failed to copy {} to {}: {}",
                    src.display(),
                    path.display(),
                    e
                ))
            }
        })?;
        Ok(size)
    }
}
