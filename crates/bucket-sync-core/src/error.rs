//! Error types for the bucket-sync core library.

use thiserror::Error;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the bucket-sync library.
#[derive(Error, Debug)]
pub enum Error {
    /// Local directory is missing or not a directory
    #[error("{0} does not exist")]
    InvalidLocalPath(String),

    /// Target descriptor is not `bucket::directory`
    #[error("Invalid target '{0}', expected bucket::directory")]
    InvalidTargetFormat(String),

    /// Bucket name already taken by another owner
    #[error("The name for the bucket {0} already exists, please use a different name")]
    BucketNameConflict(String),

    /// Bucket missing at restore time
    #[error("Bucket {0} does not exist")]
    BucketNotFound(String),

    /// No objects under the requested prefix
    #[error("{prefix} does not exist in {bucket}")]
    PrefixNotFound { bucket: String, prefix: String },

    /// A single object failed to transfer
    #[error("Transfer of {key} failed: {message}")]
    TransferFailure { key: String, message: String },

    /// Key or path cannot be mapped onto the other side
    #[error("Cannot map {0}")]
    StructuralMapping(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage-specific errors
#[derive(Error, Debug)]
pub enum StorageError {
    /// Object or bucket not found
    #[error("Object not found: {0}")]
    NotFound(String),

    /// Bucket name owned by someone else
    #[error("Bucket name already taken: {0}")]
    NameConflict(String),

    /// Storage backend error
    #[error("Backend error: {0}")]
    Backend(String),

    /// Invalid path
    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
