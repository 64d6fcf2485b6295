//! Bucket Sync Core Library
//!
//! This crate mirrors a local directory tree into an object-storage bucket
//! under a key prefix, and restores a prefix back onto the local filesystem.
//! Backups are incremental: a file is uploaded only when no object exists at
//! its key or the local copy is newer than the stored one.

pub mod backup;
pub mod change;
pub mod config;
pub mod error;
pub mod mapping;
pub mod metrics;
pub mod progress;
pub mod report;
pub mod restore;
pub mod storage;
pub mod target;

pub use backup::BackupEngine;
pub use change::TransferDecision;
pub use config::{BackupOptions, Config, RestoreOptions};
pub use error::{Error, Result, StorageError};
pub use mapping::KeyLayout;
pub use metrics::{MetricsReport, TransferMetrics};
pub use progress::{ProgressCallback, ProgressEvent};
pub use report::{BackupReport, FileOutcome, FileStatus, RestoreReport, RestoredObject, WalkIssue};
pub use restore::RestoreEngine;
pub use target::{LocalRoot, SyncTarget};
