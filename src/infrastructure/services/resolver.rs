//! Merchant resolution for incoming widget requests

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::merchant::{MerchantProfile, MerchantRepository};
use crate::domain::product::{Product, ProductId, ProductRepository};
use crate::domain::DomainError;

/// Merchant that owns a request, with the product when it resolved
#[derive(Debug, Clone)]
pub struct ResolvedMerchant {
    pub merchant: MerchantProfile,
    /// `None` when the request fell back to the demo merchant
    pub product: Option<Product>,
}

impl ResolvedMerchant {
    pub fn is_fallback(&self) -> bool {
        self.product.is_none()
    }
}

/// Resolves the merchant and quota that apply to a product id
///
/// Unknown or missing products fall back to any existing merchant so widget
/// previews and the landing-page demo keep working.
#[derive(Debug, Clone)]
pub struct MerchantResolver {
    merchants: Arc<dyn MerchantRepository>,
    products: Arc<dyn ProductRepository>,
}

impl MerchantResolver {
    pub fn new(merchants: Arc<dyn MerchantRepository>, products: Arc<dyn ProductRepository>) -> Self {
        Self {
            merchants,
            products,
        }
    }

    pub async fn resolve(&self, product_id: Option<&str>) -> Result<ResolvedMerchant, DomainError> {
        let product = match product_id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => self.lookup_product(id).await,
            None => None,
        };

        match product {
            Some(product) => {
                let merchant = self
                    .merchants
                    .get(product.merchant_id())
                    .await?
                    .ok_or_else(|| DomainError::not_found("Merchant profile not found"))?;

                Ok(ResolvedMerchant {
                    merchant,
                    product: Some(product),
                })
            }
            None => {
                let merchant = self.merchants.any().await?.ok_or_else(|| {
                    DomainError::uninitialized("no merchant profiles exist")
                })?;

                debug!(
                    product_id = ?product_id,
                    merchant_id = %merchant.id(),
                    "Product not found, using fallback merchant"
                );

                Ok(ResolvedMerchant {
                    merchant,
                    product: None,
                })
            }
        }
    }

    async fn lookup_product(&self, id: &str) -> Option<Product> {
        match self.products.get(&ProductId::new(id)).await {
            Ok(product) => product,
            Err(e) => {
                warn!(product_id = %id, error = %e, "Product lookup failed, treating as unknown");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::merchant::mock::FailingMerchantRepository;
    use crate::infrastructure::storage::{InMemoryMerchantRepository, InMemoryProductRepository};

    fn resolver(merchants: Vec<MerchantProfile>, products: Vec<Product>) -> MerchantResolver {
        MerchantResolver::new(
            Arc::new(InMemoryMerchantRepository::with_merchants(merchants)),
            Arc::new(InMemoryProductRepository::with_products(products)),
        )
    }

    #[tokio::test]
    async fn test_resolves_product_owner() {
        let resolver = resolver(
            vec![
                MerchantProfile::new("m-a", 1),
                MerchantProfile::new("m-b", 7).with_rate_limit(9),
            ],
            vec![Product::new("p-1", "m-b")],
        );

        let resolved = resolver.resolve(Some("p-1")).await.unwrap();

        assert_eq!(resolved.merchant.id().as_str(), "m-b");
        assert_eq!(resolved.merchant.daily_quota(), 9);
        assert!(!resolved.is_fallback());
    }

    #[tokio::test]
    async fn test_unknown_product_falls_back() {
        let resolver = resolver(vec![MerchantProfile::new("m-a", 1)], vec![]);

        let resolved = resolver.resolve(Some("ghost")).await.unwrap();

        assert_eq!(resolved.merchant.id().as_str(), "m-a");
        assert_eq!(resolved.merchant.daily_quota(), 5);
        assert!(resolved.is_fallback());
    }

    #[tokio::test]
    async fn test_absent_product_falls_back() {
        let resolver = resolver(vec![MerchantProfile::new("m-a", 1)], vec![]);
        assert!(resolver.resolve(None).await.unwrap().is_fallback());
        assert!(resolver.resolve(Some("  ")).await.unwrap().is_fallback());
    }

    #[tokio::test]
    async fn test_no_merchants_is_uninitialized() {
        let resolver = resolver(vec![], vec![]);
        let err = resolver.resolve(Some("p-1")).await.unwrap_err();

        assert!(matches!(err, DomainError::Uninitialized { .. }));
    }

    #[tokio::test]
    async fn test_product_with_missing_merchant() {
        let resolver = resolver(
            vec![MerchantProfile::new("m-a", 1)],
            vec![Product::new("p-1", "m-deleted")],
        );

        let err = resolver.resolve(Some("p-1")).await.unwrap_err();

        assert!(matches!(err, DomainError::NotFound { .. }));
        assert_eq!(err.public_message(), "Merchant profile not found");
    }

    #[tokio::test]
    async fn test_merchant_storage_failure_propagates() {
        let resolver = MerchantResolver::new(
            Arc::new(FailingMerchantRepository),
            Arc::new(InMemoryProductRepository::new()),
        );

        assert!(matches!(
            resolver.resolve(None).await,
            Err(DomainError::Storage { .. })
        ));
    }
}
