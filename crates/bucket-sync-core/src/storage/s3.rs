//! S3-compatible storage backend using the AWS SDK.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketLocationConstraint, CompletedMultipartUpload, CompletedPart, CreateBucketConfiguration,
};
use aws_sdk_s3::Client;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::io::SeekFrom;
use std::path::Path;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::{debug, info, warn};

use super::{ObjectMetadata, StorageBackend};
use crate::error::StorageError;
use crate::{Error, Result};

/// Files at or above this size are sent as a multipart upload
pub const MULTIPART_THRESHOLD: u64 = 64 * 1024 * 1024;

/// Smallest part size used for multipart uploads
pub const MIN_PART_SIZE: u64 = 16 * 1024 * 1024;

/// S3 limit on the number of parts in one upload
pub const MAX_PARTS: u64 = 10_000;

/// Part size for a file of `len` bytes, or `None` when a single PUT suffices.
pub fn part_size_for(len: u64) -> Option<u64> {
    if len < MULTIPART_THRESHOLD {
        return None;
    }
    Some(MIN_PART_SIZE.max(len.div_ceil(MAX_PARTS)))
}

/// S3 storage backend configuration
#[derive(Debug, Clone, Default)]
pub struct S3Config {
    /// AWS region (falls back to the SDK's region provider chain)
    pub region: Option<String>,
    /// Custom endpoint (for S3-compatible services like MinIO)
    pub endpoint: Option<String>,
    /// Access key ID
    pub access_key_id: Option<String>,
    /// Secret access key
    pub secret_access_key: Option<String>,
    /// Use path-style requests
    pub path_style: bool,
}

/// S3 storage backend
pub struct S3Backend {
    client: Client,
    region: Option<String>,
}

impl S3Backend {
    /// Create a new S3 backend, resolving credentials and region from the
    /// environment where the config leaves them unset
    pub async fn new(config: S3Config) -> Result<Self> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }
        let sdk_config = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);

        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        if config.path_style {
            builder = builder.force_path_style(true);
        }

        if let (Some(access_key), Some(secret_key)) =
            (&config.access_key_id, &config.secret_access_key)
        {
            builder = builder.credentials_provider(Credentials::new(
                access_key.clone(),
                secret_key.clone(),
                None,
                None,
                "bucket-sync-static",
            ));
        }

        let region = sdk_config.region().map(|r| r.to_string());

        info!(
            "Created S3 backend, region: {:?}, endpoint: {:?}",
            region, config.endpoint
        );

        Ok(Self {
            client: Client::from_conf(builder.build()),
            region,
        })
    }
}

impl S3Backend {
    async fn upload_parts(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        path: &Path,
        len: u64,
        part_size: u64,
    ) -> Result<Vec<CompletedPart>> {
        let mut file = tokio::fs::File::open(path).await?;
        let mut parts = Vec::new();
        let mut offset = 0u64;
        let mut part_number = 1i32;

        while offset < len {
            let length = part_size.min(len - offset);
            file.seek(SeekFrom::Start(offset)).await?;
            let mut buffer = vec![0u8; length as usize];
            file.read_exact(&mut buffer).await?;

            debug!(
                "S3 UPLOAD PART {}: s3://{}/{} ({} bytes)",
                part_number, bucket, key, length
            );
            let output = self
                .client
                .upload_part()
                .bucket(bucket)
                .key(key)
                .upload_id(upload_id)
                .part_number(part_number)
                .body(ByteStream::from(buffer))
                .send()
                .await
                .map_err(|e| backend_error("UPLOAD PART", e))?;

            parts.push(
                CompletedPart::builder()
                    .set_e_tag(output.e_tag().map(String::from))
                    .part_number(part_number)
                    .build(),
            );
            offset += length;
            part_number += 1;
        }

        Ok(parts)
    }

    async fn put_multipart(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        len: u64,
        part_size: u64,
    ) -> Result<()> {
        let created = self
            .client
            .create_multipart_upload()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| backend_error("CREATE MULTIPART UPLOAD", e))?;
        let upload_id = created.upload_id().ok_or_else(|| {
            Error::Storage(StorageError::Backend(format!(
                "S3 returned no upload id for s3://{}/{}",
                bucket, key
            )))
        })?;

        let result = match self
            .upload_parts(bucket, key, upload_id, path, len, part_size)
            .await
        {
            Ok(parts) => self
                .client
                .complete_multipart_upload()
                .bucket(bucket)
                .key(key)
                .upload_id(upload_id)
                .multipart_upload(
                    CompletedMultipartUpload::builder()
                        .set_parts(Some(parts))
                        .build(),
                )
                .send()
                .await
                .map(|_| ())
                .map_err(|e| backend_error("COMPLETE MULTIPART UPLOAD", e)),
            Err(e) => Err(e),
        };

        if result.is_err() {
            if let Err(e) = self
                .client
                .abort_multipart_upload()
                .bucket(bucket)
                .key(key)
                .upload_id(upload_id)
                .send()
                .await
            {
                warn!(
                    "Failed to abort multipart upload for s3://{}/{}: {}",
                    bucket,
                    key,
                    DisplayErrorContext(e)
                );
            }
        }

        result
    }
}

fn backend_error(op: &str, e: impl std::error::Error) -> Error {
    Error::Storage(StorageError::Backend(format!(
        "S3 {} failed: {}",
        op,
        DisplayErrorContext(e)
    )))
}

fn to_chrono(dt: Option<&aws_sdk_s3::primitives::DateTime>) -> DateTime<Utc> {
    dt.and_then(|dt| DateTime::from_timestamp(dt.secs(), dt.subsec_nanos()))
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

#[async_trait]
impl StorageBackend for S3Backend {
    async fn list_buckets(&self) -> Result<Vec<String>> {
        debug!("S3 LIST BUCKETS");
        let output = self
            .client
            .list_buckets()
            .send()
            .await
            .map_err(|e| backend_error("LIST BUCKETS", e))?;

        Ok(output
            .buckets()
            .iter()
            .filter_map(|b| b.name().map(String::from))
            .collect())
    }

    async fn create_bucket(&self, bucket: &str, region: Option<&str>) -> Result<()> {
        debug!("S3 CREATE BUCKET: {} ({:?})", bucket, region);
        let mut request = self.client.create_bucket().bucket(bucket);

        // us-east-1 rejects an explicit location constraint
        if let Some(region) = region.filter(|r| *r != "us-east-1") {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region))
                    .build(),
            );
        }

        match request.send().await {
            Ok(_) => Ok(()),
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_bucket_already_owned_by_you() {
                    Ok(())
                } else if service_error.is_bucket_already_exists() {
                    Err(Error::Storage(StorageError::NameConflict(bucket.to_string())))
                } else {
                    Err(backend_error("CREATE BUCKET", service_error))
                }
            }
        }
    }

    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectMetadata>> {
        debug!("S3 LIST: s3://{}/{}", bucket, prefix);

        let mut objects = Vec::new();
        let mut continuation: Option<String> = None;
        loop {
            let mut request = self.client.list_objects_v2().bucket(bucket).prefix(prefix);
            if let Some(token) = continuation.take() {
                request = request.continuation_token(token);
            }

            let output = request.send().await.map_err(|e| {
                let service_error = e.into_service_error();
                if service_error.is_no_such_bucket() {
                    Error::Storage(StorageError::NotFound(bucket.to_string()))
                } else {
                    backend_error("LIST", service_error)
                }
            })?;

            for object in output.contents() {
                let Some(key) = object.key() else { continue };
                objects.push(ObjectMetadata {
                    key: key.to_string(),
                    size: object.size().unwrap_or(0).max(0) as u64,
                    last_modified: to_chrono(object.last_modified()),
                });
            }

            match output.next_continuation_token() {
                Some(token) => continuation = Some(token.to_string()),
                None => break,
            }
        }

        objects.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(objects)
    }

    async fn head(&self, bucket: &str, key: &str) -> Result<ObjectMetadata> {
        debug!("S3 HEAD: s3://{}/{}", bucket, key);
        let output = self
            .client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let service_error = e.into_service_error();
                if service_error.is_not_found() {
                    Error::Storage(StorageError::NotFound(key.to_string()))
                } else {
                    backend_error("HEAD", service_error)
                }
            })?;

        Ok(ObjectMetadata {
            key: key.to_string(),
            size: output.content_length().unwrap_or(0).max(0) as u64,
            last_modified: to_chrono(output.last_modified()),
        })
    }

    async fn put(&self, bucket: &str, key: &str, data: Bytes) -> Result<()> {
        debug!("S3 PUT: s3://{}/{} ({} bytes)", bucket, key, data.len());
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| backend_error("PUT", e))?;
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes> {
        debug!("S3 GET: s3://{}/{}", bucket, key);
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let service_error = e.into_service_error();
                if service_error.is_no_such_key() {
                    Error::Storage(StorageError::NotFound(key.to_string()))
                } else {
                    backend_error("GET", service_error)
                }
            })?;

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| backend_error("GET body", e))?;

        Ok(data.into_bytes())
    }

    async fn put_file(&self, bucket: &str, key: &str, path: &Path) -> Result<u64> {
        let len = tokio::fs::metadata(path).await?.len();

        if let Some(part_size) = part_size_for(len) {
            debug!(
                "S3 MULTIPART PUT: s3://{}/{} ({} bytes, {} byte parts)",
                bucket, key, len, part_size
            );
            self.put_multipart(bucket, key, path, len, part_size).await?;
            return Ok(len);
        }

        debug!("S3 PUT: s3://{}/{} ({} bytes from {})", bucket, key, len, path.display());
        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| backend_error("PUT body", e))?;
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .map_err(|e| backend_error("PUT", e))?;
        Ok(len)
    }

    async fn get_to_file(&self, bucket: &str, key: &str, path: &Path) -> Result<u64> {
        debug!("S3 GET: s3://{}/{} -> {}", bucket, key, path.display());
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let service_error = e.into_service_error();
                if service_error.is_no_such_key() {
                    Error::Storage(StorageError::NotFound(key.to_string()))
                } else {
                    backend_error("GET", service_error)
                }
            })?;

        let mut body = output.body;
        let mut file = tokio::fs::File::create(path).await?;
        let mut written = 0u64;
        while let Some(chunk) = body
            .try_next()
            .await
            .map_err(|e| backend_error("GET body", e))?
        {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        Ok(written)
    }

    fn region(&self) -> Option<String> {
        self.region.clone()
    }
}
