//! Artifact Store access: keyed uploads and signed read URLs.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use thiserror::Error;
use tracing::{info, warn};

/// Lifetime of the URL handed to the provider for reading the source photo.
pub const SOURCE_URL_TTL: Duration = Duration::from_secs(60 * 60);
/// Requested lifetime of URLs for stored photos (one year).
pub const STORED_URL_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 365);
/// SigV4 presigned URLs cannot outlive one week.
const S3_MAX_PRESIGN_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 7);

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("upload to '{path}' failed: {message}")]
    Upload { path: String, message: String },

    #[error("signing '{path}' failed: {message}")]
    Signing { path: String, message: String },

    #[error("deleting '{path}' failed: {message}")]
    Delete { path: String, message: String },
}

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Writes `bytes` at `path`, replacing any existing object.
    async fn upload(&self, path: &str, bytes: Bytes, content_type: &str) -> Result<(), StoreError>;

    /// Returns a URL that grants read access to `path` for about `ttl`.
    /// Stores may shorten `ttl` to their own maximum, so callers sign on
    /// every read instead of keeping URLs around.
    async fn signed_url(&self, path: &str, ttl: Duration) -> Result<String, StoreError>;

    /// Removes the object at `path`. Missing objects are not an error.
    async fn delete(&self, path: &str) -> Result<(), StoreError>;
}

/// Derives the storage path of a generated artifact by inserting `suffix`
/// before the extension of the source file name.
///
/// `u1/123.jpg` + `-enhanced` → `u1/123-enhanced.jpg`. Names without an
/// extension get the suffix appended, so the source is never overwritten.
pub fn derive_output_path(source_path: &str, suffix: &str) -> String {
    let (dir, file) = match source_path.rsplit_once('/') {
        Some((dir, file)) => (Some(dir), file),
        None => (None, source_path),
    };

    let renamed = match file.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < file.len() => {
            format!("{}{suffix}{}", &file[..idx], &file[idx..])
        }
        _ => format!("{file}{suffix}"),
    };

    match dir {
        Some(dir) => format!("{dir}/{renamed}"),
        None => renamed,
    }
}

/// S3 / MinIO backed store.
#[derive(Clone)]
pub struct S3ArtifactStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3ArtifactStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl ArtifactStore for S3ArtifactStore {
    async fn upload(&self, path: &str, bytes: Bytes, content_type: &str) -> Result<(), StoreError> {
        let size = bytes.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(path)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StoreError::Upload {
                path: path.to_string(),
                message: e.to_string(),
            })?;

        info!("Uploaded {size} bytes to s3://{}/{}", self.bucket, path);
        Ok(())
    }

    async fn signed_url(&self, path: &str, ttl: Duration) -> Result<String, StoreError> {
        let signing_error = |message: String| StoreError::Signing {
            path: path.to_string(),
            message,
        };

        if ttl > S3_MAX_PRESIGN_TTL {
            warn!(
                "Requested URL lifetime {}s for '{path}' exceeds the S3 limit, capping at {}s",
                ttl.as_secs(),
                S3_MAX_PRESIGN_TTL.as_secs()
            );
        }
        let presigning = PresigningConfig::expires_in(ttl.min(S3_MAX_PRESIGN_TTL))
            .map_err(|e| signing_error(e.to_string()))?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(path)
            .presigned(presigning)
            .await
            .map_err(|e| signing_error(e.to_string()))?;

        Ok(request.uri().to_string())
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
            .map_err(|e| StoreError::Delete {
                path: path.to_string(),
                message: e.to_string(),
            })?;

        info!("Deleted s3://{}/{}", self.bucket, path);
        Ok(())
    }
}
