use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;

use super::object_key;
use crate::domain::{DomainError, ImageStore};

/// Keeps uploads in process memory; for development and tests
#[derive(Debug)]
pub struct InMemoryImageStore {
    base_url: String,
    objects: RwLock<HashMap<String, (String, Bytes)>>,
}

impl InMemoryImageStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the content type and bytes stored under `key`
    pub fn get(&self, key: &str) -> Option<(String, Bytes)> {
        self.objects.read().ok()?.get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.read().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryImageStore {
    fn default() -> Self {
        Self::new("memory://uploads")
    }
}

#[async_trait]
impl ImageStore for InMemoryImageStore {
    async fn upload(&self, data: Bytes, content_type: &str) -> Result<String, DomainError> {
        let key = object_key(content_type);

        let mut objects = self.objects.write().map_err(|e| {
            DomainError::storage(format!("Failed to acquire write lock: {}", e))
        })?;
        objects.insert(key.clone(), (content_type.to_string(), data));

        Ok(format!("{}/{}", self.base_url, key))
    }
}
