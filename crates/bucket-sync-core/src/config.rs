//! Configuration structures for backup and restore operations.
//!
//! Everything here is optional; a run with no configuration file talks to S3
//! using the SDK's default region and credential chain.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::mapping::KeyLayout;
use crate::storage::StorageBackendConfig;
use crate::{Error, Result};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Storage configuration (S3, Filesystem, Memory)
    #[serde(default)]
    pub storage: StorageBackendConfig,

    /// Backup-specific options
    #[serde(default)]
    pub backup: BackupOptions,

    /// Restore-specific options
    #[serde(default)]
    pub restore: RestoreOptions,
}

/// Backup options
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackupOptions {
    /// Region to create a missing bucket in (defaults to the backend's region)
    #[serde(default)]
    pub region: Option<String>,

    /// Decide what would be uploaded without creating buckets or uploading
    #[serde(default)]
    pub dry_run: bool,
}

/// Restore options
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RestoreOptions {
    /// How object keys map back onto local paths
    #[serde(default)]
    pub layout: KeyLayout,
}

impl Config {
    /// Parse a YAML document
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML configuration file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if let StorageBackendConfig::S3 {
            access_key,
            secret_key,
            ..
        } = &self.storage
        {
            if access_key.is_some() != secret_key.is_some() {
                return Err(Error::Config(
                    "access_key and secret_key must be set together".to_string(),
                ));
            }
        }

        if let StorageBackendConfig::Filesystem { path } = &self.storage {
            if path.as_os_str().is_empty() {
                return Err(Error::Config("Filesystem path is required".to_string()));
            }
        }

        if let Some(region) = &self.backup.region {
            if region.trim().is_empty() {
                return Err(Error::Config("backup.region must not be empty".to_string()));
            }
        }

        Ok(())
    }
}
