//! Storage backend abstraction and implementations.
//!
//! This module provides a unified, bucket-aware interface over:
//!
//! - **S3**: AWS S3 and S3-compatible services (MinIO, Ceph RGW, etc.)
//! - **Filesystem**: Local directories standing in for buckets
//! - **Memory**: In-memory storage (for testing)

mod backend;
mod config;
mod filesystem;
mod memory;
#[cfg(feature = "s3")]
mod s3;

pub use backend::{ObjectMetadata, StorageBackend};
pub use config::StorageBackendConfig;
pub use filesystem::FilesystemBackend;
pub use memory::MemoryBackend;
#[cfg(feature = "s3")]
pub use s3::{S3Backend, S3Config};

use crate::Result;
use std::sync::Arc;

/// Create a storage backend from configuration.
///
/// The returned handle is meant to be built once per process and passed to
/// both engines.
///
/// # Example
///
/// ```rust,ignore
/// use bucket_sync_core::storage::{create_backend, StorageBackendConfig};
///
/// let backend = create_backend(&StorageBackendConfig::Memory).await?;
/// ```
pub async fn create_backend(config: &StorageBackendConfig) -> Result<Arc<dyn StorageBackend>> {
    match config {
        #[cfg(feature = "s3")]
        StorageBackendConfig::S3 {
            region,
            endpoint,
            access_key,
            secret_key,
            path_style,
        } => {
            let s3_config = S3Config {
                region: region.clone(),
                endpoint: endpoint.clone(),
                access_key_id: access_key.clone(),
                secret_access_key: secret_key.clone(),
                path_style: *path_style,
            };
            Ok(Arc::new(S3Backend::new(s3_config).await?))
        }

        #[cfg(not(feature = "s3"))]
        StorageBackendConfig::S3 { .. } => Err(crate::Error::Config(
            "S3 support was not compiled in (enable the `s3` feature)".to_string(),
        )),

        StorageBackendConfig::Filesystem { path } => {
            Ok(Arc::new(FilesystemBackend::new(path.clone())))
        }

        StorageBackendConfig::Memory => Ok(Arc::new(MemoryBackend::new())),
    }
}
