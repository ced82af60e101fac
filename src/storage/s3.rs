//! S3 object store. Read access is governed by the bucket policy.

use anyhow::anyhow;
use async_trait::async_trait;
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    Client,
    config::{BehaviorVersion, Region},
    error::DisplayErrorContext,
    primitives::ByteStream,
};
use bytes::Bytes;

use super::{ObjectStore, ObjectStoreError, object_key};
use crate::config::StorageConfig;

pub struct S3ObjectStore {
    client: Client,
    bucket: String,
    public_base: String,
}

impl S3ObjectStore {
    pub async fn new(config: &StorageConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(Region::new(config.region.clone()));

        if let (Some(access_key), Some(secret_key)) = (&config.access_key, &config.secret_key) {
            loader = loader.credentials_provider(Credentials::new(
                access_key.clone(),
                secret_key.clone(),
                None,
                None,
                "locus-static",
            ));
        }

        let shared = loader.load().await;
        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint.clone()).force_path_style(true);
        }

        tracing::info!("🪣 Object storage: bucket {} in {}", config.bucket, config.region);

        Self {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket.clone(),
            public_base: public_base(config),
        }
    }
}

/// Public URL prefix for objects in the bucket
fn public_base(config: &StorageConfig) -> String {
    match &config.endpoint {
        Some(endpoint) => format!("{}/{}", endpoint.trim_end_matches('/'), config.bucket),
        None => format!("https://{}.s3.amazonaws.com", config.bucket),
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(&self, bytes: Bytes, file_name: &str, content_type: Option<&str>) -> Result<String, ObjectStoreError> {
        let key = object_key(file_name, content_type);
        let size = bytes.len();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(bytes))
            .set_content_type(content_type.map(str::to_string))
            .send()
            .await
            .map_err(|e| anyhow!("S3 upload of {} failed: {}", key, DisplayErrorContext(&e)))?;

        tracing::debug!("Uploaded {} ({} bytes)", key, size);
        Ok(format!("{}/{}", self.public_base, key))
    }
}
