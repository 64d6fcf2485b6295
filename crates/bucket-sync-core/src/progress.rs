//! Progress callbacks fired by the engines as a pass runs.

use std::path::Path;

use crate::report::FileOutcome;

/// Something that happened during a pass
#[derive(Debug)]
pub enum ProgressEvent<'a> {
    /// A missing bucket was created before the backup started
    BucketCreated {
        bucket: &'a str,
        region: Option<&'a str>,
    },
    /// A backup finished with one file
    File {
        bucket: &'a str,
        outcome: &'a FileOutcome,
    },
    /// A restore is about to fetch an object
    Downloading {
        bucket: &'a str,
        key: &'a str,
        path: &'a Path,
    },
}

/// Callback trait for progress reporting.
pub trait ProgressCallback: Send + Sync {
    fn on_event(&self, event: &ProgressEvent<'_>);
}

impl<F> ProgressCallback for F
where
    F: Fn(&ProgressEvent<'_>) + Send + Sync,
{
    fn on_event(&self, event: &ProgressEvent<'_>) {
        self(event)
    }
}
