//! Backup engine orchestration.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::change::{decide, TransferDecision};
use crate::config::BackupOptions;
use crate::error::StorageError;
use crate::mapping::to_key;
use crate::metrics::TransferMetrics;
use crate::progress::{ProgressCallback, ProgressEvent};
use crate::report::{BackupReport, FileOutcome, FileStatus, WalkIssue};
use crate::storage::StorageBackend;
use crate::target::{LocalRoot, SyncTarget};
use crate::{Error, Result};

/// A regular file found under the local root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCandidate {
    pub path: PathBuf,
    /// `None` when the filesystem would not report an mtime
    pub modified: Option<DateTime<Utc>>,
}

/// State of the target bucket once pre-flight is done
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BucketState {
    Existing,
    Created,
    /// Dry run against a bucket that does not exist yet
    Missing,
}

/// Backup engine for mirroring a local directory into a bucket
pub struct BackupEngine {
    storage: Arc<dyn StorageBackend>,
    options: BackupOptions,
    progress: Option<Arc<dyn ProgressCallback>>,
}

impl BackupEngine {
    /// Create a new backup engine over an already constructed backend
    pub fn new(storage: Arc<dyn StorageBackend>, options: BackupOptions) -> Self {
        Self {
            storage,
            options,
            progress: None,
        }
    }

    /// Report per-file progress to `callback`
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = Some(callback);
        self
    }

    fn emit(&self, event: ProgressEvent<'_>) {
        if let Some(progress) = &self.progress {
            progress.on_event(&event);
        }
    }

    /// Run one backup pass of `local_dir` into `target`.
    ///
    /// Fails only on pre-flight problems (missing directory, bucket that
    /// cannot be created). Individual file failures are recorded in the
    /// report and the pass carries on.
    pub async fn run(&self, local_dir: impl AsRef<Path>, target: &SyncTarget) -> Result<BackupReport> {
        let root = LocalRoot::existing(local_dir.as_ref())?;
        let metrics = TransferMetrics::new();

        info!(
            "Backup starting: {} -> s3://{}/{}",
            root.path().display(),
            target.bucket(),
            target.prefix()
        );

        let bucket_state = self.ensure_bucket(target.bucket()).await?;

        let (candidates, walk_issues) = collect_candidates(&root).await?;
        for issue in &walk_issues {
            warn!("Skipping {}: {}", issue.path, issue.reason);
            metrics.record_failure();
        }

        info!("Found {} files under {}", candidates.len(), root.path().display());

        let mut files = Vec::with_capacity(candidates.len());
        for candidate in &candidates {
            let outcome = self
                .backup_file(&root, target, candidate, bucket_state, &metrics)
                .await;
            self.emit(ProgressEvent::File {
                bucket: target.bucket(),
                outcome: &outcome,
            });
            files.push(outcome);
        }

        let report = BackupReport {
            bucket: target.bucket().to_string(),
            prefix: target.prefix().to_string(),
            bucket_created: bucket_state == BucketState::Created,
            dry_run: self.options.dry_run,
            files,
            walk_issues,
            metrics: metrics.report(),
        };

        if report.has_failures() {
            warn!(
                "Backup finished with {} failures: {}",
                report.failed(),
                report.metrics
            );
        } else {
            info!("Backup completed: {}", report.metrics);
        }

        Ok(report)
    }

    /// Check the bucket exists, creating it when it does not.
    async fn ensure_bucket(&self, bucket: &str) -> Result<BucketState> {
        if self.storage.bucket_exists(bucket).await? {
            debug!("Bucket {} exists", bucket);
            return Ok(BucketState::Existing);
        }

        if self.options.dry_run {
            info!("Bucket {} does not exist, dry run will not create it", bucket);
            return Ok(BucketState::Missing);
        }

        let region = self.options.region.clone().or_else(|| self.storage.region());
        info!("Creating bucket: {} with region: {:?}", bucket, region);

        match self.storage.create_bucket(bucket, region.as_deref()).await {
            Ok(()) => {
                self.emit(ProgressEvent::BucketCreated {
                    bucket,
                    region: region.as_deref(),
                });
                Ok(BucketState::Created)
            }
            Err(Error::Storage(StorageError::NameConflict(_))) => {
                error!("Bucket name {} is taken by another owner", bucket);
                Err(Error::BucketNameConflict(bucket.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    async fn backup_file(
        &self,
        root: &LocalRoot,
        target: &SyncTarget,
        candidate: &FileCandidate,
        bucket_state: BucketState,
        metrics: &TransferMetrics,
    ) -> FileOutcome {
        let path = candidate.path.to_string_lossy().replace('\\', "/");

        let key = match to_key(root, &candidate.path, target.prefix()) {
            Ok(key) => key,
            Err(e) => {
                metrics.record_failure();
                return FileOutcome {
                    key: String::new(),
                    path,
                    status: FileStatus::Failed {
                        reason: e.to_string(),
                    },
                };
            }
        };

        let decision = match (bucket_state, candidate.modified) {
            (BucketState::Missing, _) => TransferDecision::Upload,
            (_, None) => TransferDecision::Error(format!("cannot read modification time of {}", path)),
            (_, Some(modified)) => {
                decide(self.storage.as_ref(), target.bucket(), &key, modified).await
            }
        };

        let status = match decision {
            TransferDecision::Skip => {
                metrics.record_skip();
                FileStatus::Unchanged
            }
            TransferDecision::Upload if self.options.dry_run => FileStatus::WouldUpload,
            TransferDecision::Upload => match self.upload(&candidate.path, target.bucket(), &key).await {
                Ok(bytes) => {
                    metrics.record_upload(bytes);
                    FileStatus::Uploaded { bytes }
                }
                Err(e) => {
                    warn!("Back up of {} failed: {}", path, e);
                    metrics.record_failure();
                    FileStatus::Failed {
                        reason: e.to_string(),
                    }
                }
            },
            TransferDecision::Error(reason) => {
                warn!("Could not decide on {}: {}", path, reason);
                metrics.record_failure();
                FileStatus::Failed { reason }
            }
        };

        FileOutcome { path, key, status }
    }

    async fn upload(&self, path: &Path, bucket: &str, key: &str) -> Result<u64> {
        let size = self
            .storage
            .put_file(bucket, key, path)
            .await
            .map_err(|e| Error::TransferFailure {
                key: key.to_string(),
                message: format!("{}: {}", path.display(), e),
            })?;

        debug!("Uploaded {} bytes to s3://{}/{}", size, bucket, key);
        Ok(size)
    }
}

/// Walk the root and return every regular file, sorted by name within each
/// directory, plus the entries that could not be read.
pub async fn collect_candidates(root: &LocalRoot) -> Result<(Vec<FileCandidate>, Vec<WalkIssue>)> {
    let path = root.path().to_path_buf();
    tokio::task::spawn_blocking(move || walk(&path))
        .await
        .map_err(|e| Error::Io(std::io::Error::other(format!("walk task failed: {}", e))))
}

fn walk(root: &Path) -> (Vec<FileCandidate>, Vec<WalkIssue>) {
    let mut candidates = Vec::new();
    let mut issues = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                issues.push(WalkIssue {
                    path: e
                        .path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| root.display().to_string()),
                    reason: e.to_string(),
                });
                continue;
            }
        };

        // Symlinked files are backed up through the link; symlinked
        // directories are not descended into.
        if entry.path_is_symlink() {
            match std::fs::metadata(entry.path()) {
                Ok(target) if target.is_file() => {
                    candidates.push(FileCandidate {
                        path: entry.into_path(),
                        modified: target.modified().ok().map(DateTime::<Utc>::from),
                    });
                }
                Ok(_) => issues.push(WalkIssue {
                    path: entry.path().display().to_string(),
                    reason: "symlink to a directory, not followed".to_string(),
                }),
                Err(e) => issues.push(WalkIssue {
                    path: entry.path().display().to_string(),
                    reason: format!("broken symlink: {}", e),
                }),
            }
            continue;
        }

        if !entry.file_type().is_file() {
            continue;
        }

        let modified = entry
            .metadata()
            .ok()
            .and_then(|m| m.modified().ok())
            .map(DateTime::<Utc>::from);

        candidates.push(FileCandidate {
            path: entry.into_path(),
            modified,
        });
    }

    (candidates, issues)
}
