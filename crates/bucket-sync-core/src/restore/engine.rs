//! Restore engine orchestration.

use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::RestoreOptions;
use crate::mapping::from_key;
use crate::metrics::TransferMetrics;
use crate::progress::{ProgressCallback, ProgressEvent};
use crate::report::{RestoreReport, RestoredObject};
use crate::storage::{ObjectMetadata, StorageBackend};
use crate::target::SyncTarget;
use crate::{Error, Result};

/// Restore engine for materializing a bucket prefix into a local directory
pub struct RestoreEngine {
    storage: Arc<dyn StorageBackend>,
    options: RestoreOptions,
    progress: Option<Arc<dyn ProgressCallback>>,
}

impl RestoreEngine {
    /// Create a new restore engine over an already constructed backend
    pub fn new(storage: Arc<dyn StorageBackend>, options: RestoreOptions) -> Self {
        Self {
            storage,
            options,
            progress: None,
        }
    }

    /// Report each download to `callback` before it starts
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Download every object under `target` into `local_dir`.
    ///
    /// Unlike backup, the first failed object aborts the pass. Files written
    /// before the failure are left in place.
    pub async fn run(&self, target: &SyncTarget, local_dir: impl AsRef<Path>) -> Result<RestoreReport> {
        let local_dir = local_dir.as_ref();
        let metrics = TransferMetrics::new();

        info!(
            "Restore starting: s3://{}/{} -> {}",
            target.bucket(),
            target.prefix(),
            local_dir.display()
        );

        if !self.storage.bucket_exists(target.bucket()).await? {
            return Err(Error::BucketNotFound(target.bucket().to_string()));
        }

        let objects = self.storage.list(target.bucket(), target.prefix()).await?;
        if objects.is_empty() {
            return Err(Error::PrefixNotFound {
                bucket: target.bucket().to_string(),
                prefix: target.prefix().to_string(),
            });
        }

        info!("Found {} objects to restore", objects.len());

        let mut restored = Vec::with_capacity(objects.len());
        for object in &objects {
            restored.push(self.restore_object(target, object, local_dir, &metrics).await?);
        }

        let report = RestoreReport {
            bucket: target.bucket().to_string(),
            prefix: target.prefix().to_string(),
            layout: self.options.layout,
            objects: restored,
            metrics: metrics.report(),
        };

        info!("Restore completed: {}", report.metrics);
        Ok(report)
    }

    async fn restore_object(
        &self,
        target: &SyncTarget,
        object: &ObjectMetadata,
        local_dir: &Path,
        metrics: &TransferMetrics,
    ) -> Result<RestoredObject> {
        let path = from_key(&object.key, target.prefix(), local_dir, self.options.layout)?;

        if object.key.ends_with('/') {
            debug!("Creating directory {} for marker {}", path.display(), object.key);
            tokio::fs::create_dir_all(&path).await?;
            return Ok(RestoredObject {
                key: object.key.clone(),
                path: path.display().to_string(),
                bytes: 0,
                directory: true,
            });
        }

        if let Some(progress) = &self.progress {
            progress.on_event(&ProgressEvent::Downloading {
                bucket: target.bucket(),
                key: &object.key,
                path: &path,
            });
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let bytes = self
            .storage
            .get_to_file(target.bucket(), &object.key, &path)
            .await
            .map_err(|e| Error::TransferFailure {
                key: object.key.clone(),
                message: format!("{}: {}", path.display(), e),
            })?;

        metrics.record_download(bytes);
        debug!("Downloaded {} bytes to {}", bytes, path.display());

        Ok(RestoredObject {
            key: object.key.clone(),
            path: path.display().to_string(),
            bytes,
            directory: false,
        })
    }
}
