//! Object storage for profile pictures.
//!
//! Upload and URL helpers never fail loudly: any storage error is logged and turned
//! into `None`, so a broken bucket degrades to "no picture".

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::{info, warn};

/// Minimal blob-store surface used by the API.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> Result<()>;

    /// Time-limited read URL for `key`.
    async fn presigned_get(&self, key: &str, expires_in: Duration) -> Result<String>;
}

/// `ObjectStore` backed by an S3 bucket.
#[derive(Clone)]
pub struct S3Store {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3Store {
    pub fn new(client: aws_sdk_s3::Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("S3 upload failed: {e}"))?;

        info!("Uploaded s3://{}/{}", self.bucket, key);
        Ok(())
    }

    async fn presigned_get(&self, key: &str, expires_in: Duration) -> Result<String> {
        let presigning = PresigningConfig::expires_in(expires_in)?;
        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| anyhow::anyhow!("S3 presign failed: {e}"))?;
        Ok(request.uri().to_string())
    }
}

/// File name stored for a user's picture: `profile_pic_{user_id}.{subtype}`,
/// where the subtype is everything after the last `/` of the content type.
pub fn profile_pic_name(user_id: i32, content_type: &str) -> String {
    let subtype = content_type.rsplit('/').next().unwrap_or(content_type);
    format!("profile_pic_{user_id}.{subtype}")
}

fn object_key(folder: &str, file_name: &str) -> String {
    let folder = folder.trim_end_matches('/');
    if folder.is_empty() {
        file_name.to_string()
    } else {
        format!("{folder}/{file_name}")
    }
}

/// Uploads a profile picture and returns the stored file name, or `None` on any failure.
pub async fn upload_profile_image(
    store: &dyn ObjectStore,
    folder: &str,
    user_id: i32,
    body: Bytes,
    content_type: &str,
) -> Option<String> {
    let file_name = profile_pic_name(user_id, content_type);
    let key = object_key(folder, &file_name);
    match store.put_object(&key, body, content_type).await {
        Ok(()) => Some(file_name),
        Err(e) => {
            warn!("Profile picture upload for user {user_id} failed: {e:#}");
            None
        }
    }
}

/// Presigned URL for a stored picture, or `None` on any failure.
pub async fn profile_pic_url(
    store: &dyn ObjectStore,
    folder: &str,
    image_key: &str,
    expires_in: Duration,
) -> Option<String> {
    let key = object_key(folder, image_key);
    match store.presigned_get(&key, expires_in).await {
        Ok(url) => Some(url),
        Err(e) => {
            warn!("Presigned URL for '{key}' failed: {e:#}");
            None
        }
    }
}
