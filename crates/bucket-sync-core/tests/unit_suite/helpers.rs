//! Test helper utilities.
//!
//! Provides scratch directory trees and a scriptable storage backend used
//! across the engine tests.

use async_trait::async_trait;
use bucket_sync_core::storage::{MemoryBackend, ObjectMetadata, StorageBackend};
use bucket_sync_core::{Error, Result, StorageError};
use bytes::Bytes;
use chrono::Utc;
use std::collections::HashSet;
use std::fs::File;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

/// Create `data/a.txt` and `data/sub/b.txt` inside a fresh temp dir.
///
/// Returns the temp dir guard; the tree lives under `<tmp>/data`.
pub fn sample_tree() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let data = temp_dir.path().join("data");
    std::fs::create_dir_all(data.join("sub")).unwrap();
    std::fs::write(data.join("a.txt"), b"alpha contents").unwrap();
    std::fs::write(data.join("sub/b.txt"), b"beta contents").unwrap();
    temp_dir
}

/// Push a file's modification time `secs` seconds into the future
pub fn touch_future(path: &Path, secs: u64) {
    let file = File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::now() + Duration::from_secs(secs))
        .unwrap();
}

/// Memory backend wrapper with injectable faults and a call counter.
#[derive(Default)]
pub struct FaultyBackend {
    pub inner: MemoryBackend,
    fail_put: HashSet<String>,
    fail_get: HashSet<String>,
    fail_head: HashSet<String>,
    fail_list: bool,
    markers: Vec<String>,
    calls: AtomicUsize,
}

impl FaultyBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `put` fail for `key`
    pub fn fail_put(mut self, key: &str) -> Self {
        self.fail_put.insert(key.to_string());
        self
    }

    /// Make `get` fail for `key`
    pub fn fail_get(mut self, key: &str) -> Self {
        self.fail_get.insert(key.to_string());
        self
    }

    /// Make `head` fail for `key`
    pub fn fail_head(mut self, key: &str) -> Self {
        self.fail_head.insert(key.to_string());
        self
    }

    /// Make every object listing fail
    pub fn fail_list(mut self) -> Self {
        self.fail_list = true;
        self
    }

    /// Report a zero-byte directory marker at `key` (must end in `/`)
    pub fn with_marker(mut self, key: &str) -> Self {
        self.markers.push(key.to_string());
        self
    }

    /// Number of storage calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

fn injected(op: &str, key: &str) -> Error {
    Error::Storage(StorageError::Backend(format!("injected {} fault for {}", op, key)))
}

#[async_trait]
impl StorageBackend for FaultyBackend {
    async fn list_buckets(&self) -> Result<Vec<String>> {
        self.record();
        self.inner.list_buckets().await
    }

    async fn create_bucket(&self, bucket: &str, region: Option<&str>) -> Result<()> {
        self.record();
        self.inner.create_bucket(bucket, region).await
    }

    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectMetadata>> {
        self.record();
        if self.fail_list {
            return Err(injected("LIST", prefix));
        }

        let mut objects = self.inner.list(bucket, prefix).await?;
        objects.extend(
            self.markers
                .iter()
                .filter(|m| m.starts_with(prefix))
                .map(|m| ObjectMetadata {
                    key: m.clone(),
                    size: 0,
                    last_modified: Utc::now(),
                }),
        );
        objects.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(objects)
    }

    async fn head(&self, bucket: &str, key: &str) -> Result<ObjectMetadata> {
        self.record();
        if self.fail_head.contains(key) {
            return Err(injected("HEAD", key));
        }
        self.inner.head(bucket, key).await
    }

    async fn put(&self, bucket: &str, key: &str, data: Bytes) -> Result<()> {
        self.record();
        if self.fail_put.contains(key) {
            return Err(injected("PUT", key));
        }
        self.inner.put(bucket, key, data).await
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes> {
        self.record();
        if self.fail_get.contains(key) {
            return Err(injected("GET", key));
        }
        self.inner.get(bucket, key).await
    }
}
