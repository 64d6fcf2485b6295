//! Storage configuration types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Storage backend configuration using tagged enum for type-safe configuration.
///
/// Bucket names are not part of the backend configuration; they come from the
/// `bucket::directory` target of each run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "backend")]
pub enum StorageBackendConfig {
    /// AWS S3 or S3-compatible storage (MinIO, Ceph RGW, DigitalOcean Spaces, etc.)
    #[serde(rename = "s3")]
    S3 {
        /// AWS region (e.g., "us-east-1"), falls back to AWS_REGION / profile
        #[serde(default)]
        region: Option<String>,
        /// Custom endpoint URL (for S3-compatible services like MinIO)
        #[serde(default)]
        endpoint: Option<String>,
        /// Access key ID (falls back to the default credential chain)
        #[serde(default)]
        access_key: Option<String>,
        /// Secret access key (falls back to the default credential chain)
        #[serde(default)]
        secret_key: Option<String>,
        /// Use path-style requests (required for MinIO/Ceph RGW)
        #[serde(default)]
        path_style: bool,
    },

    /// Local filesystem storage, one directory per bucket
    #[serde(rename = "filesystem")]
    Filesystem {
        /// Base path holding the bucket directories
        path: PathBuf,
    },

    /// In-memory storage (for testing)
    #[serde(rename = "memory")]
    Memory,
}

impl Default for StorageBackendConfig {
    fn default() -> Self {
        Self::S3 {
            region: None,
            endpoint: None,
            access_key: None,
            secret_key: None,
            path_style: false,
        }
    }
}

impl StorageBackendConfig {
    /// Parse configuration from a URL string
    ///
    /// Supported URL formats:
    /// - `s3://` with optional `region`, `endpoint` and `path_style` query parameters
    /// - `file:///path/to/buckets`
    /// - `memory://`
    pub fn from_url(url: &str) -> crate::Result<Self> {
        let parsed = url::Url::parse(url)
            .map_err(|e| crate::Error::Config(format!("Invalid storage URL: {}", e)))?;

        let query = |name: &str| {
            parsed
                .query_pairs()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.to_string())
        };

        match parsed.scheme() {
            "s3" | "s3a" => Ok(Self::S3 {
                region: query("region"),
                endpoint: query("endpoint"),
                access_key: std::env::var("AWS_ACCESS_KEY_ID").ok(),
                secret_key: std::env::var("AWS_SECRET_ACCESS_KEY").ok(),
                path_style: query("path_style").is_some_and(|v| v == "true"),
            }),
            "file" => Ok(Self::Filesystem {
                path: PathBuf::from(parsed.path()),
            }),
            "memory" => Ok(Self::Memory),
            scheme => Err(crate::Error::Config(format!(
                "Unknown storage scheme: {}",
                scheme
            ))),
        }
    }

    /// Region configured for this backend, if any
    pub fn region(&self) -> Option<&str> {
        match self {
            Self::S3 { region, .. } => region.as_deref(),
            Self::Filesystem { .. } | Self::Memory => None,
        }
    }

    /// Short backend name for log lines
    pub fn name(&self) -> &'static str {
        match self {
            Self::S3 { .. } => "s3",
            Self::Filesystem { .. } => "filesystem",
            Self::Memory => "memory",
        }
    }
}
