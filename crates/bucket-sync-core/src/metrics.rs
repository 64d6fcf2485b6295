//! Transfer counters for a single backup or restore pass.

use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Transfer metrics collector
pub struct TransferMetrics {
    /// Files uploaded
    pub uploaded: AtomicU64,
    /// Files left alone because the remote copy was current
    pub skipped: AtomicU64,
    /// Files that failed to upload or could not be checked
    pub failed: AtomicU64,
    /// Objects downloaded
    pub downloaded: AtomicU64,
    /// Bytes sent to the store
    pub bytes_uploaded: AtomicU64,
    /// Bytes fetched from the store
    pub bytes_downloaded: AtomicU64,
    start_time: Instant,
}

impl Default for TransferMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            uploaded: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            downloaded: AtomicU64::new(0),
            bytes_uploaded: AtomicU64::new(0),
            bytes_downloaded: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_upload(&self, bytes: u64) {
        self.uploaded.fetch_add(1, Ordering::Relaxed);
        self.bytes_uploaded.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn record_skip(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_download(&self, bytes: u64) {
        self.downloaded.fetch_add(1, Ordering::Relaxed);
        self.bytes_downloaded.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Get elapsed time since start
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Snapshot the counters
    pub fn report(&self) -> MetricsReport {
        MetricsReport {
            uploaded: self.uploaded.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            downloaded: self.downloaded.load(Ordering::Relaxed),
            bytes_uploaded: self.bytes_uploaded.load(Ordering::Relaxed),
            bytes_downloaded: self.bytes_downloaded.load(Ordering::Relaxed),
            elapsed_ms: self.elapsed().as_millis() as u64,
        }
    }
}

/// Point-in-time view of [`TransferMetrics`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsReport {
    pub uploaded: u64,
    pub skipped: u64,
    pub failed: u64,
    pub downloaded: u64,
    pub bytes_uploaded: u64,
    pub bytes_downloaded: u64,
    pub elapsed_ms: u64,
}

impl fmt::Display for MetricsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "uploaded={} ({}) skipped={} failed={} downloaded={} ({}) elapsed={}ms",
            self.uploaded,
            format_bytes(self.bytes_uploaded),
            self.skipped,
            self.failed,
            self.downloaded,
            format_bytes(self.bytes_downloaded),
            self.elapsed_ms
        )
    }
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
