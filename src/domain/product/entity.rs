//! Product entity

use serde::{Deserialize, Serialize};

use crate::domain::merchant::MerchantId;

/// Unique identifier for a product
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(String);

impl ProductId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ProductId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProductId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A product with try-on enabled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    merchant_id: MerchantId,
    /// Successful try-ons, monotonically non-decreasing
    usage_count: u64,
    /// Storefront page the widget links back to
    redirect_url: Option<String>,
}

impl Product {
    pub fn new(id: impl Into<ProductId>, merchant_id: impl Into<MerchantId>) -> Self {
        Self {
            id: id.into(),
            merchant_id: merchant_id.into(),
            usage_count: 0,
            redirect_url: None,
        }
    }

    pub fn with_redirect_url(mut self, url: impl Into<String>) -> Self {
        self.redirect_url = Some(url.into());
        self
    }

    pub fn with_usage_count(mut self, usage_count: u64) -> Self {
        self.usage_count = usage_count;
        self
    }

    pub fn id(&self) -> &ProductId {
        &self.id
    }

    pub fn merchant_id(&self) -> &MerchantId {
        &self.merchant_id
    }

    pub fn usage_count(&self) -> u64 {
        self.usage_count
    }

    pub fn redirect_url(&self) -> Option<&str> {
        self.redirect_url.as_deref()
    }

    /// Record one successful try-on. Returns the new count.
    pub fn record_usage(&mut self) -> u64 {
        self.usage_count = self.usage_count.saturating_add(1);
        self.usage_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_usage() {
        let mut product = Product::new("p-1", "m-1");
        assert_eq!(product.record_usage(), 1);
        assert_eq!(product.record_usage(), 2);
        assert_eq!(product.merchant_id().as_str(), "m-1");
    }

    #[test]
    fn test_redirect_url() {
        let product = Product::new("p-1", "m-1").with_redirect_url("https://shop.example/p-1");
        assert_eq!(product.redirect_url(), Some("https://shop.example/p-1"));
    }
}
