use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use thiserror::Error;
use tracing::info;

use crate::errors::AppError;
use crate::storage::keys::ensure_json_key;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("S3 error: {0}")]
    S3(String),
}

/// Raw object storage: fetch bytes by key, write bytes to a key.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Bytes, BlobError>;

    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<(), BlobError>;
}

/// S3 (or MinIO) bucket-scoped store.
#[derive(Clone)]
pub struct S3BlobStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3BlobStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn get(&self, key: &str) -> Result<Bytes, BlobError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_no_such_key()) {
                    BlobError::NotFound(key.to_string())
                } else {
                    BlobError::S3(format!("get s3://{}/{key} failed: {e}", self.bucket))
                }
            })?;

        let body = output
            .body
            .collect()
            .await
            .map_err(|e| BlobError::S3(format!("reading s3://{}/{key} failed: {e}", self.bucket)))?;

        Ok(body.into_bytes())
    }

    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<(), BlobError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| BlobError::S3(format!("put s3://{}/{key} failed: {e}", self.bucket)))?;

        info!("Uploaded s3://{}/{}", self.bucket, key);
        Ok(())
    }
}

/// Loads a `.json` job or source object as text.
///
/// Any other extension is an input-format error. Invalid UTF-8 is replaced rather
/// than rejected, and surrounding whitespace is trimmed.
pub async fn load_json_object(blobs: &dyn BlobStore, key: &str) -> Result<String, AppError> {
    ensure_json_key(key)?;
    let bytes = blobs.get(key).await?;
    Ok(String::from_utf8_lossy(&bytes).trim().to_string())
}
