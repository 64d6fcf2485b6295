//! Per-pass reports returned by the backup and restore engines.

use serde::Serialize;

use crate::mapping::KeyLayout;
use crate::metrics::MetricsReport;

/// Outcome for one local file during a backup
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOutcome {
    /// Local path as walked
    pub path: String,
    /// Object key the file maps to
    pub key: String,
    #[serde(flatten)]
    pub status: FileStatus,
}

/// Backup status of a single file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    /// Sent to the store
    Uploaded { bytes: u64 },
    /// Remote copy already current
    Unchanged,
    /// Dry run: would have been sent
    WouldUpload,
    /// Transfer or decision failed; the pass moved on
    Failed { reason: String },
}

/// A directory entry the walk could not read
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalkIssue {
    pub path: String,
    pub reason: String,
}

/// Result of a backup pass
#[derive(Debug, Clone, Serialize)]
pub struct BackupReport {
    pub bucket: String,
    pub prefix: String,
    /// The bucket did not exist and this pass created it
    pub bucket_created: bool,
    pub dry_run: bool,
    pub files: Vec<FileOutcome>,
    pub walk_issues: Vec<WalkIssue>,
    pub metrics: MetricsReport,
}

impl BackupReport {
    fn count(&self, pred: impl Fn(&FileStatus) -> bool) -> usize {
        self.files.iter().filter(|f| pred(&f.status)).count()
    }

    pub fn uploaded(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Uploaded { .. }))
    }

    pub fn unchanged(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Unchanged))
    }

    pub fn would_upload(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::WouldUpload))
    }

    /// Failed files plus unreadable directory entries
    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Failed { .. })) + self.walk_issues.len()
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }
}

/// One object written (or directory created) by a restore
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestoredObject {
    pub key: String,
    pub path: String,
    pub bytes: u64,
    /// Key was a directory marker; only the directory was created
    pub directory: bool,
}

/// Result of a restore pass
#[derive(Debug, Clone, Serialize)]
pub struct RestoreReport {
    pub bucket: String,
    pub prefix: String,
    pub layout: KeyLayout,
    pub objects: Vec<RestoredObject>,
    pub metrics: MetricsReport,
}

impl RestoreReport {
    /// Number of files written
    pub fn files_restored(&self) -> usize {
        self.objects.iter().filter(|o| !o.directory).count()
    }
}
