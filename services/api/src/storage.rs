//! Object storage for item and recovery photos
//!
//! Images live in an S3-compatible bucket. The service stores only the
//! public URL returned by [`ImageStorage::upload`], never the bytes.

use async_trait::async_trait;
use aws_sdk_s3::{Client, primitives::ByteStream};
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

/// Errors raised while storing an image
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Image upload failed: {0}")]
    Upload(String),
}

/// Destination for uploaded images
#[async_trait]
pub trait ImageStorage: Send + Sync {
    /// Store `data` under `key` and return its public URL
    async fn upload(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError>;
}

/// Build an object key namespaced by user and upload time:
/// `{user_id}/{unix_millis}.{ext}`
pub fn image_key(user_id: Uuid, file_name: Option<&str>, now: DateTime<Utc>) -> String {
    let ext = file_name
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.trim().to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| "bin".to_string());

    format!("{}/{}.{}", user_id, now.timestamp_millis(), ext)
}

/// Image storage backed by an S3 bucket
#[derive(Clone)]
pub struct S3ImageStorage {
    s3_client: Client,
    bucket: String,
    public_base_url: String,
}

impl S3ImageStorage {
    pub fn new(s3_client: Client, bucket: String, public_base_url: &str) -> Self {
        Self {
            s3_client,
            bucket,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }
}

#[async_trait]
impl ImageStorage for S3ImageStorage {
    async fn upload(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        info!("Uploading image to S3: {}/{}", self.bucket, key);

        self.s3_client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::Upload(e.to_string()))?;

        Ok(self.public_url(key))
    }
}
