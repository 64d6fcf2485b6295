//! Sync targets (`bucket::directory`) and local roots.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::mapping::normalize_separators;
use crate::{Error, Result};

/// Separator between bucket name and key prefix in a target descriptor.
pub const TARGET_SEPARATOR: &str = "::";

/// A bucket plus the key prefix objects are grouped under.
///
/// The prefix always uses forward slashes, never starts with `/` and ends with
/// exactly one `/`. A descriptor with an empty directory (`bucket::`) targets
/// the bucket root and carries an empty prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncTarget {
    bucket: String,
    prefix: String,
}

impl SyncTarget {
    /// Parse a `bucket::directory` descriptor.
    ///
    /// Backslashes are normalized before splitting. Anything after the first
    /// `::` belongs to the directory.
    pub fn parse(descriptor: &str) -> Result<Self> {
        let normalized = normalize_separators(descriptor);
        let (bucket, directory) = normalized
            .split_once(TARGET_SEPARATOR)
            .ok_or_else(|| Error::InvalidTargetFormat(descriptor.to_string()))?;

        if bucket.is_empty() {
            return Err(Error::InvalidTargetFormat(descriptor.to_string()));
        }

        Ok(Self {
            bucket: bucket.to_string(),
            prefix: normalize_prefix(directory),
        })
    }

    /// Bucket name
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Normalized key prefix (empty or ending with `/`)
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// `s3://bucket/key` form used in progress lines.
    pub fn uri_for(&self, key: &str) -> String {
        format!("s3://{}/{}", self.bucket, key)
    }
}

impl FromStr for SyncTarget {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for SyncTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.bucket,
            TARGET_SEPARATOR,
            self.prefix.trim_end_matches('/')
        )
    }
}

/// Normalize a key prefix: forward slashes, no leading `/`, one trailing `/`.
pub fn normalize_prefix(prefix: &str) -> String {
    let normalized = normalize_separators(prefix);
    let trimmed = normalized.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}/", trimmed)
    }
}

/// The local directory being mirrored.
///
/// Keeps the path used for filesystem I/O alongside the mapping form keys are
/// derived from: forward slashes, one trailing `/`, no leading `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalRoot {
    path: PathBuf,
    mapping: String,
}

impl LocalRoot {
    /// Build a root from a user-supplied directory.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let normalized = normalize_separators(&path.as_ref().to_string_lossy());
        let io_path = format!("{}/", normalized.trim_end_matches('/'));

        let mut mapping = normalized.trim_start_matches('/').trim_end_matches('/').to_string();
        if !mapping.is_empty() {
            mapping.push('/');
        }

        Self {
            path: PathBuf::from(io_path),
            mapping,
        }
    }

    /// Build a root and check it is an existing directory.
    pub fn existing(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_dir() {
            return Err(Error::InvalidLocalPath(path.display().to_string()));
        }
        Ok(Self::new(path))
    }

    /// Path used for filesystem I/O
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Mapping form of the root
    pub fn mapping(&self) -> &str {
        &self.mapping
    }
}
