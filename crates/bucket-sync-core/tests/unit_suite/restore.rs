//! Restore engine unit tests.
//!
//! Tests for restore-related functionality including:
//! - Backup/restore round trips
//! - Key layouts
//! - Directory markers
//! - Abort-on-failure semantics

use std::sync::Arc;

use bucket_sync_core::storage::{FilesystemBackend, MemoryBackend, StorageBackend};
use bucket_sync_core::{
    BackupEngine, BackupOptions, Error, KeyLayout, RestoreEngine, RestoreOptions, SyncTarget,
};
use bytes::Bytes;
use tempfile::TempDir;

use super::helpers::{sample_tree, FaultyBackend};

#[tokio::test]
async fn test_backup_then_restore_round_trip() {
    let tree = sample_tree();
    let storage = Arc::new(MemoryBackend::new());
    let target = SyncTarget::parse("mybucket::archive").unwrap();

    BackupEngine::new(storage.clone(), BackupOptions::default())
        .run(tree.path().join("data"), &target)
        .await
        .unwrap();

    let restored = tree.path().join("restored");
    let report = RestoreEngine::new(storage, RestoreOptions::default())
        .run(&target, &restored)
        .await
        .unwrap();

    assert_eq!(report.files_restored(), 2);
    assert_eq!(
        std::fs::read(restored.join("a.txt")).unwrap(),
        std::fs::read(tree.path().join("data/a.txt")).unwrap()
    );
    assert_eq!(
        std::fs::read(restored.join("sub/b.txt")).unwrap(),
        std::fs::read(tree.path().join("data/sub/b.txt")).unwrap()
    );
}

#[tokio::test]
async fn test_round_trip_through_filesystem_store() {
    let tree = sample_tree();
    let store = TempDir::new().unwrap();
    let storage = Arc::new(FilesystemBackend::new(store.path().to_path_buf()));
    let target = SyncTarget::parse("mybucket::archive").unwrap();

    let backup = BackupEngine::new(storage.clone(), BackupOptions::default())
        .run(tree.path().join("data"), &target)
        .await
        .unwrap();
    assert_eq!(backup.uploaded(), 2);
    assert_eq!(
        std::fs::read(store.path().join("mybucket/archive/sub/b.txt")).unwrap(),
        b"beta contents"
    );

    let restored = tree.path().join("restored");
    let report = RestoreEngine::new(storage, RestoreOptions::default())
        .run(&target, &restored)
        .await
        .unwrap();

    let sizes: Vec<_> = report.objects.iter().map(|o| o.bytes).collect();
    assert_eq!(sizes, vec![14, 13]);
    assert_eq!(std::fs::read(restored.join("sub/b.txt")).unwrap(), b"beta contents");
}

#[tokio::test]
async fn test_restore_overwrites_existing_files() {
    let storage = Arc::new(MemoryBackend::new());
    storage.create_bucket("mybucket", None).await.unwrap();
    storage
        .put("mybucket", "archive/a.txt", Bytes::from("remote"))
        .await
        .unwrap();

    let out = TempDir::new().unwrap();
    std::fs::write(out.path().join("a.txt"), b"local and longer").unwrap();

    RestoreEngine::new(storage, RestoreOptions::default())
        .run(&SyncTarget::parse("mybucket::archive").unwrap(), out.path())
        .await
        .unwrap();

    assert_eq!(std::fs::read(out.path().join("a.txt")).unwrap(), b"remote");
}

#[tokio::test]
async fn test_multi_segment_prefix_keeps_tail_by_default() {
    let storage = Arc::new(MemoryBackend::new());
    storage.create_bucket("mybucket", None).await.unwrap();
    storage
        .put("mybucket", "photos/2024/a.jpg", Bytes::from("jpg"))
        .await
        .unwrap();
    let out = TempDir::new().unwrap();
    let target = SyncTarget::parse("mybucket::photos/2024").unwrap();

    RestoreEngine::new(storage.clone(), RestoreOptions::default())
        .run(&target, out.path())
        .await
        .unwrap();
    assert!(out.path().join("2024/a.jpg").is_file());

    let exact = TempDir::new().unwrap();
    RestoreEngine::new(
        storage,
        RestoreOptions {
            layout: KeyLayout::FullPrefix,
        },
    )
    .run(&target, exact.path())
    .await
    .unwrap();
    assert!(exact.path().join("a.jpg").is_file());
}

#[tokio::test]
async fn test_directory_marker_creates_directory_only() {
    let backend = FaultyBackend::new().with_marker("archive/empty/");
    backend.inner.create_bucket("mybucket", None).await.unwrap();
    backend
        .inner
        .put("mybucket", "archive/a.txt", Bytes::from("alpha"))
        .await
        .unwrap();
    let out = TempDir::new().unwrap();

    let report = RestoreEngine::new(Arc::new(backend), RestoreOptions::default())
        .run(&SyncTarget::parse("mybucket::archive").unwrap(), out.path())
        .await
        .unwrap();

    assert!(out.path().join("empty").is_dir());
    assert_eq!(report.files_restored(), 1);
    let marker = report.objects.iter().find(|o| o.directory).unwrap();
    assert_eq!(marker.key, "archive/empty/");
    assert_eq!(marker.bytes, 0);
}

#[tokio::test]
async fn test_failed_download_aborts_pass() {
    let backend = FaultyBackend::new().fail_get("archive/b.txt");
    backend.inner.create_bucket("mybucket", None).await.unwrap();
    for (key, body) in [
        ("archive/a.txt", "alpha"),
        ("archive/b.txt", "beta"),
        ("archive/c.txt", "gamma"),
    ] {
        backend
            .inner
            .put("mybucket", key, Bytes::from(body))
            .await
            .unwrap();
    }
    let out = TempDir::new().unwrap();

    let err = RestoreEngine::new(Arc::new(backend), RestoreOptions::default())
        .run(&SyncTarget::parse("mybucket::archive").unwrap(), out.path())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::TransferFailure { ref key, .. } if key == "archive/b.txt"));
    assert!(out.path().join("a.txt").is_file());
    assert!(!out.path().join("c.txt").exists());
}

#[tokio::test]
async fn test_unmappable_key_aborts_pass() {
    let storage = Arc::new(MemoryBackend::new());
    storage.create_bucket("mybucket", None).await.unwrap();
    storage
        .put("mybucket", "toplevel.txt", Bytes::from("x"))
        .await
        .unwrap();
    let out = TempDir::new().unwrap();

    let err = RestoreEngine::new(storage, RestoreOptions::default())
        .run(&SyncTarget::parse("mybucket::").unwrap(), out.path())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::StructuralMapping(_)));
}

#[tokio::test]
async fn test_missing_bucket_downloads_nothing() {
    let storage = Arc::new(FaultyBackend::new());
    let out = TempDir::new().unwrap();

    let err = RestoreEngine::new(storage.clone(), RestoreOptions::default())
        .run(&SyncTarget::parse("ghost::archive").unwrap(), out.path())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::BucketNotFound(_)));
    assert_eq!(err.to_string(), "Bucket ghost does not exist");
    assert_eq!(storage.calls(), 1);
}
