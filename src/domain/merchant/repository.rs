//! Merchant repository trait

use async_trait::async_trait;
use std::fmt::Debug;

use super::{MerchantId, MerchantProfile};
use crate::domain::DomainError;

/// Repository for merchant profiles
#[async_trait]
pub trait MerchantRepository: Send + Sync + Debug {
    /// Get a merchant by ID
    async fn get(&self, id: &MerchantId) -> Result<Option<MerchantProfile>, DomainError>;

    /// Get an arbitrary existing merchant (demo fallback)
    async fn any(&self) -> Result<Option<MerchantProfile>, DomainError>;

    /// Insert or replace a merchant
    async fn save(&self, merchant: MerchantProfile) -> Result<MerchantProfile, DomainError>;

    /// Conditionally subtract `amount` credits, flooring at zero.
    ///
    /// Only applies when the balance is positive. Returns the new balance,
    /// or `None` when the merchant is missing or already at zero.
    async fn debit_credits(&self, id: &MerchantId, amount: i64)
        -> Result<Option<i64>, DomainError>;

    /// Add credits (top-up). Returns the new balance.
    async fn add_credits(&self, id: &MerchantId, amount: i64) -> Result<Option<i64>, DomainError>;
}
