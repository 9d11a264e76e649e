//! Merchant profile entity

use serde::{Deserialize, Serialize};

/// Per-IP daily quota applied when a merchant has not configured one
pub const DEFAULT_DAILY_QUOTA: u32 = 5;

/// Unique identifier for a merchant profile
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MerchantId(String);

impl MerchantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a new unique ID
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for MerchantId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MerchantId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for MerchantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A merchant's billing and rate-limit state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerchantProfile {
    id: MerchantId,
    /// Remaining generation credits, never negative
    credits: i64,
    /// Configured per-IP quota for the rolling 24h window
    rate_limit: Option<u32>,
}

impl MerchantProfile {
    pub fn new(id: impl Into<MerchantId>, credits: i64) -> Self {
        Self {
            id: id.into(),
            credits: credits.max(0),
            rate_limit: None,
        }
    }

    pub fn with_rate_limit(mut self, rate_limit: u32) -> Self {
        self.rate_limit = Some(rate_limit);
        self
    }

    pub fn id(&self) -> &MerchantId {
        &self.id
    }

    pub fn credits(&self) -> i64 {
        self.credits
    }

    pub fn rate_limit(&self) -> Option<u32> {
        self.rate_limit
    }

    /// Effective per-IP quota
    pub fn daily_quota(&self) -> u32 {
        self.rate_limit.unwrap_or(DEFAULT_DAILY_QUOTA)
    }

    pub fn has_credits(&self) -> bool {
        self.credits > 0
    }

    /// Subtract `amount`, clamping at zero. Returns the new balance.
    pub fn debit(&mut self, amount: i64) -> i64 {
        self.credits = self.credits.saturating_sub(amount).max(0);
        self.credits
    }

    /// Add purchased credits. Returns the new balance.
    pub fn credit(&mut self, amount: i64) -> i64 {
        self.credits = self.credits.saturating_add(amount.max(0));
        self.credits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_quota() {
        let merchant = MerchantProfile::new("m-1", 10);
        assert_eq!(merchant.daily_quota(), DEFAULT_DAILY_QUOTA);

        let merchant = merchant.with_rate_limit(20);
        assert_eq!(merchant.daily_quota(), 20);
    }

    #[test]
    fn test_debit_clamps_at_zero() {
        let mut merchant = MerchantProfile::new("m-1", 1);
        assert_eq!(merchant.debit(1), 0);
        assert_eq!(merchant.debit(1), 0);
        assert!(!merchant.has_credits());
    }

    #[test]
    fn test_negative_balance_is_clamped_on_construction() {
        let merchant = MerchantProfile::new("m-1", -3);
        assert_eq!(merchant.credits(), 0);
    }

    #[test]
    fn test_credit_ignores_negative_amounts() {
        let mut merchant = MerchantProfile::new("m-1", 2);
        assert_eq!(merchant.credit(-5), 2);
        assert_eq!(merchant.credit(3), 5);
    }
}
