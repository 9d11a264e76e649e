use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use bytes::Bytes;
use tracing::{debug, error};

use super::object_key;
use crate::domain::{DomainError, ImageStore};

/// Settings for an S3 or S3-compatible bucket
#[derive(Debug, Clone)]
pub struct S3ImageStoreConfig {
    pub bucket: String,
    /// Custom endpoint for S3-compatible services (MinIO, R2, ...)
    pub endpoint: Option<String>,
    /// Public URL prefix; defaults to the virtual-hosted AWS URL
    pub public_base_url: Option<String>,
}

/// Uploads demo images to an S3 bucket and returns their public URL
#[derive(Debug, Clone)]
pub struct S3ImageStore {
    client: S3Client,
    bucket: String,
    public_base_url: String,
}

impl S3ImageStore {
    pub fn new(client: S3Client, bucket: impl Into<String>, public_base_url: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            public_base_url: public_base_url.into(),
        }
    }

    /// Builds a client from the ambient AWS configuration
    pub async fn from_config(config: &S3ImageStoreConfig) -> Self {
        let region_provider = RegionProviderChain::default_provider().or_else("us-east-1");
        let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(region_provider)
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&aws_config);

        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        let public_base_url = config
            .public_base_url
            .clone()
            .unwrap_or_else(|| format!("https://{}.s3.amazonaws.com", config.bucket));

        Self::new(
            S3Client::from_conf(builder.build()),
            config.bucket.clone(),
            public_base_url,
        )
    }
}

#[async_trait]
impl ImageStore for S3ImageStore {
    async fn upload(&self, data: Bytes, content_type: &str) -> Result<String, DomainError> {
        let key = object_key(content_type);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| {
                error!(bucket = %self.bucket, key = %key, error = %e, "S3 upload failed");
                DomainError::storage(format!("Failed to upload image: {}", e))
            })?;

        debug!(key = %key, "Uploaded demo image");

        Ok(build_public_url(&self.public_base_url, &self.bucket, &key))
    }
}

/// Builds a public object URL from a base that may or may not include the bucket
///
/// Supports `{bucket}`/`{key}` templating for providers with custom URL layouts.
pub fn build_public_url(base: &str, bucket: &str, key: &str) -> String {
    let trimmed = base.trim_end_matches('/');

    if trimmed.contains("{bucket}") || trimmed.contains("{key}") {
        return trimmed.replace("{bucket}", bucket).replace("{key}", key);
    }

    if trimmed.contains(bucket) {
        format!("{}/{}", trimmed, key)
    } else {
        format!("{}/{}/{}", trimmed, bucket, key)
    }
}
