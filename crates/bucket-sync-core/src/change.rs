//! Per-file change detection for backups.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::storage::StorageBackend;

/// What a backup should do with one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferDecision {
    /// Remote copy is at least as new as the local file
    Skip,
    /// Object is missing or stale
    Upload,
    /// The decision could not be made
    Error(String),
}

/// Check whether `key` exists by listing with the key as prefix and looking
/// for an exact match. Keys that merely start with `key` do not count.
///
/// Listing failures count as "missing" so the file gets re-uploaded.
pub async fn object_exists(storage: &dyn StorageBackend, bucket: &str, key: &str) -> bool {
    match storage.list(bucket, key).await {
        Ok(objects) => objects.iter().any(|o| o.key == key),
        Err(e) => {
            warn!(
                "Existence check for s3://{}/{} failed, treating as new: {}",
                bucket, key, e
            );
            false
        }
    }
}

/// Decide whether the local file behind `key` must be uploaded.
pub async fn decide(
    storage: &dyn StorageBackend,
    bucket: &str,
    key: &str,
    local_modified: DateTime<Utc>,
) -> TransferDecision {
    if !object_exists(storage, bucket, key).await {
        debug!("s3://{}/{} not found, uploading", bucket, key);
        return TransferDecision::Upload;
    }

    let remote = match storage.head(bucket, key).await {
        Ok(meta) => meta,
        Err(e) => return TransferDecision::Error(e.to_string()),
    };

    debug!(
        "s3://{}/{}: local {} remote {}",
        bucket, key, local_modified, remote.last_modified
    );

    if local_modified > remote.last_modified {
        TransferDecision::Upload
    } else {
        TransferDecision::Skip
    }
}
