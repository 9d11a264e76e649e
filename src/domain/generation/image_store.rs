//! Object storage for user-supplied images

use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::DomainError;

/// Stores an uploaded image and returns a URL the provider can fetch
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn upload(&self, data: Bytes, content_type: &str) -> Result<String, DomainError>;
}
