//! Path mapping and target parsing tests.

use bucket_sync_core::mapping::{from_key, to_key, KeyLayout};
use bucket_sync_core::{Error, LocalRoot, SyncTarget};
use std::path::PathBuf;

#[test]
fn test_round_trip_single_segment_prefix() {
    let root = LocalRoot::new("data");
    for file in ["data/a.txt", "data/sub/b.txt", "data/deep/er/c.bin"] {
        let key = to_key(&root, file, "archive/").unwrap();
        let back = from_key(&key, "archive/", "data", KeyLayout::FirstSegment).unwrap();
        assert_eq!(back, PathBuf::from(file));
    }
}

#[test]
fn test_round_trip_full_prefix_any_depth() {
    let root = LocalRoot::new("data");
    let key = to_key(&root, "data/sub/b.txt", "a/b/c/").unwrap();
    assert_eq!(key, "a/b/c/sub/b.txt");
    assert_eq!(
        from_key(&key, "a/b/c/", "data", KeyLayout::FullPrefix).unwrap(),
        PathBuf::from("data/sub/b.txt")
    );
}

#[test]
fn test_windows_separators_normalized() {
    let root = LocalRoot::new(r"data\");
    assert_eq!(
        to_key(&root, r"data\sub\b.txt", "archive/").unwrap(),
        "archive/sub/b.txt"
    );
}

#[test]
fn test_path_outside_root() {
    let root = LocalRoot::new("data");
    assert!(matches!(
        to_key(&root, "elsewhere/a.txt", "archive/"),
        Err(Error::StructuralMapping(_))
    ));
}

#[test]
fn test_descriptor_parsing() {
    let target = SyncTarget::parse("mybucket::archive").unwrap();
    assert_eq!(target.bucket(), "mybucket");
    assert_eq!(target.prefix(), "archive/");

    let nested = SyncTarget::parse("mybucket::/photos/2024/").unwrap();
    assert_eq!(nested.prefix(), "photos/2024/");

    let root = SyncTarget::parse("mybucket::").unwrap();
    assert_eq!(root.prefix(), "");
}

#[test]
fn test_malformed_descriptors() {
    for descriptor in ["::dir", "bucketonly", ""] {
        assert!(
            matches!(
                SyncTarget::parse(descriptor),
                Err(Error::InvalidTargetFormat(_))
            ),
            "{descriptor:?} should be rejected"
        );
    }
}
