pub mod backup;
pub mod restore;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use bucket_sync_core::storage::{create_backend, StorageBackend, StorageBackendConfig};
use bucket_sync_core::{Config, FileStatus, ProgressEvent};
use tracing::info;

use crate::OutputFormat;

/// Global options shared by every command
pub struct Settings {
    pub config: Option<PathBuf>,
    pub storage: Option<String>,
    pub region: Option<String>,
    pub format: OutputFormat,
}

impl Settings {
    /// Load the configuration file (if any) and apply command-line overrides.
    pub async fn resolve_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => {
                info!("Loading configuration from: {}", path.display());
                Config::load(path).await?
            }
            None => Config::default(),
        };

        if let Some(url) = &self.storage {
            config.storage = StorageBackendConfig::from_url(url)?;
        }

        if let Some(region) = &self.region {
            config.backup.region = Some(region.clone());
            if let StorageBackendConfig::S3 { region: s3_region, .. } = &mut config.storage {
                s3_region.get_or_insert_with(|| region.clone());
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Build the storage backend once for this process
    pub async fn backend(&self, config: &Config) -> Result<Arc<dyn StorageBackend>> {
        info!("Using {} storage backend", config.storage.name());
        Ok(create_backend(&config.storage).await?)
    }
}

/// Print one progress line per event to stdout
pub fn print_progress(event: &ProgressEvent<'_>) {
    match event {
        ProgressEvent::BucketCreated { bucket, region } => match region {
            Some(region) => println!("Created bucket {} in {}", bucket, region),
            None => println!("Created bucket {}", bucket),
        },
        ProgressEvent::File { bucket, outcome } => {
            let uri = format!("s3://{}/{}", bucket, outcome.key);
            match &outcome.status {
                FileStatus::Uploaded { .. } => {
                    println!("Backed up {} to {}", outcome.path, uri)
                }
                FileStatus::Unchanged => println!(
                    "File unchanged, did not need to back up {} to {}",
                    outcome.path, uri
                ),
                FileStatus::WouldUpload => println!("Would back up {} to {}", outcome.path, uri),
                FileStatus::Failed { reason } => {
                    println!("Back up failed for {} to {}: {}", outcome.path, uri, reason)
                }
            }
        }
        ProgressEvent::Downloading { bucket, key, path } => {
            println!("Downloading s3://{}/{} to {}", bucket, key, path.display())
        }
    }
}
