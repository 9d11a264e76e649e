//! Product repository trait

use async_trait::async_trait;
use std::fmt::Debug;

use super::{Product, ProductId};
use crate::domain::DomainError;

/// Repository for products
#[async_trait]
pub trait ProductRepository: Send + Sync + Debug {
    /// Get a product by ID
    async fn get(&self, id: &ProductId) -> Result<Option<Product>, DomainError>;

    /// Insert or replace a product
    async fn save(&self, product: Product) -> Result<Product, DomainError>;

    /// Increment the usage counter by one. Returns the new count, `None` if missing.
    async fn increment_usage(&self, id: &ProductId) -> Result<Option<u64>, DomainError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;

    /// Product repository whose writes fail
    #[derive(Debug, Default)]
    pub struct FailingProductRepository;

    #[async_trait]
    impl ProductRepository for FailingProductRepository {
        async fn get(&self, _id: &ProductId) -> Result<Option<Product>, DomainError> {
            Ok(None)
        }

        async fn save(&self, _product: Product) -> Result<Product, DomainError> {
            Err(DomainError::storage("read-only"))
        }

        async fn increment_usage(&self, _id: &ProductId) -> Result<Option<u64>, DomainError> {
            Err(DomainError::storage("connection reset"))
        }
    }
}
