//! In-memory repository implementations
//!
//! Useful for testing and development. Data is lost when the process terminates.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::merchant::{MerchantId, MerchantProfile, MerchantRepository};
use crate::domain::product::{Product, ProductId, ProductRepository};
use crate::domain::usage_log::{UsageLogEntry, UsageLogId, UsageLogRepository, UsageStatus};
use crate::domain::verification::{normalize_email, VerificationCode, VerificationCodeRepository};
use crate::domain::DomainError;

fn read_lock_error(e: impl std::fmt::Display) -> DomainError {
    DomainError::storage(format!("Failed to acquire read lock: {}", e))
}

fn write_lock_error(e: impl std::fmt::Display) -> DomainError {
    DomainError::storage(format!("Failed to acquire write lock: {}", e))
}

/// In-memory merchant repository
#[derive(Debug, Default)]
pub struct InMemoryMerchantRepository {
    merchants: RwLock<HashMap<MerchantId, MerchantProfile>>,
}

impl InMemoryMerchantRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository pre-populated with merchants
    pub fn with_merchants(merchants: Vec<MerchantProfile>) -> Self {
        let map = merchants
            .into_iter()
            .map(|m| (m.id().clone(), m))
            .collect();

        Self {
            merchants: RwLock::new(map),
        }
    }
}

#[async_trait]
impl MerchantRepository for InMemoryMerchantRepository {
    async fn get(&self, id: &MerchantId) -> Result<Option<MerchantProfile>, DomainError> {
        let merchants = self.merchants.read().map_err(read_lock_error)?;
        Ok(merchants.get(id).cloned())
    }

    async fn any(&self) -> Result<Option<MerchantProfile>, DomainError> {
        let merchants = self.merchants.read().map_err(read_lock_error)?;

        // Lowest id keeps the demo fallback stable across calls
        Ok(merchants
            .values()
            .min_by(|a, b| a.id().as_str().cmp(b.id().as_str()))
            .cloned())
    }

    async fn save(&self, merchant: MerchantProfile) -> Result<MerchantProfile, DomainError> {
        let mut merchants = self.merchants.write().map_err(write_lock_error)?;
        merchants.insert(merchant.id().clone(), merchant.clone());
        Ok(merchant)
    }

    async fn debit_credits(
        &self,
        id: &MerchantId,
        amount: i64,
    ) -> Result<Option<i64>, DomainError> {
        let mut merchants = self.merchants.write().map_err(write_lock_error)?;

        match merchants.get_mut(id) {
            Some(merchant) if merchant.has_credits() => Ok(Some(merchant.debit(amount))),
            _ => Ok(None),
        }
    }

    async fn add_credits(&self, id: &MerchantId, amount: i64) -> Result<Option<i64>, DomainError> {
        let mut merchants = self.merchants.write().map_err(write_lock_error)?;
        Ok(merchants.get_mut(id).map(|m| m.credit(amount)))
    }
}

/// In-memory product repository
#[derive(Debug, Default)]
pub struct InMemoryProductRepository {
    products: RwLock<HashMap<ProductId, Product>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products(products: Vec<Product>) -> Self {
        let map = products.into_iter().map(|p| (p.id().clone(), p)).collect();

        Self {
            products: RwLock::new(map),
        }
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn get(&self, id: &ProductId) -> Result<Option<Product>, DomainError> {
        let products = self.products.read().map_err(read_lock_error)?;
        Ok(products.get(id).cloned())
    }

    async fn save(&self, product: Product) -> Result<Product, DomainError> {
        let mut products = self.products.write().map_err(write_lock_error)?;
        products.insert(product.id().clone(), product.clone());
        Ok(product)
    }

    async fn increment_usage(&self, id: &ProductId) -> Result<Option<u64>, DomainError> {
        let mut products = self.products.write().map_err(write_lock_error)?;
        Ok(products.get_mut(id).map(|p| p.record_usage()))
    }
}

/// In-memory usage log repository
#[derive(Debug)]
pub struct InMemoryUsageLogRepository {
    entries: RwLock<HashMap<UsageLogId, UsageLogEntry>>,
    max_entries: usize,
}

impl InMemoryUsageLogRepository {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_entries,
        }
    }

    /// Evict oldest entries once over limit, trimming down to 90% of it
    fn evict_if_needed(&self, entries: &mut HashMap<UsageLogId, UsageLogEntry>) {
        if entries.len() <= self.max_entries {
            return;
        }

        let target = self.max_entries - self.max_entries / 10;
        let to_remove = entries.len() - target;

        let mut by_age: Vec<_> = entries
            .iter()
            .map(|(k, v)| (v.created_at, k.clone()))
            .collect();
        by_age.select_nth_unstable_by(to_remove - 1, |a, b| a.0.cmp(&b.0));

        for (_, id) in by_age.into_iter().take(to_remove) {
            entries.remove(&id);
        }
    }
}

impl Default for InMemoryUsageLogRepository {
    fn default() -> Self {
        Self::new(100_000)
    }
}

#[async_trait]
impl UsageLogRepository for InMemoryUsageLogRepository {
    async fn create(&self, entry: UsageLogEntry) -> Result<UsageLogEntry, DomainError> {
        let mut entries = self.entries.write().map_err(write_lock_error)?;

        if entries.contains_key(entry.id()) {
            return Err(DomainError::storage(format!(
                "Usage log entry '{}' already exists",
                entry.id()
            )));
        }

        entries.insert(entry.id().clone(), entry.clone());
        self.evict_if_needed(&mut entries);

        Ok(entry)
    }

    async fn get(&self, id: &UsageLogId) -> Result<Option<UsageLogEntry>, DomainError> {
        let entries = self.entries.read().map_err(read_lock_error)?;
        Ok(entries.get(id).cloned())
    }

    async fn finalize(
        &self,
        id: &UsageLogId,
        status: UsageStatus,
        latency_ms: u64,
        metadata: Option<String>,
    ) -> Result<(), DomainError> {
        let mut entries = self.entries.write().map_err(write_lock_error)?;

        let entry = entries.get_mut(id).ok_or_else(|| {
            DomainError::not_found(format!("Usage log entry '{}' not found", id))
        })?;

        entry.status = status;
        entry.latency_ms = latency_ms;
        entry.metadata = metadata;

        Ok(())
    }

    async fn count_since(
        &self,
        merchant_id: &MerchantId,
        ip_address: &str,
        since: DateTime<Utc>,
    ) -> Result<u32, DomainError> {
        let entries = self.entries.read().map_err(read_lock_error)?;

        let count = entries
            .values()
            .filter(|e| {
                &e.merchant_id == merchant_id
                    && e.ip_address == ip_address
                    && e.created_at >= since
                    && e.status.counts_toward_quota()
            })
            .count();

        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    async fn list_by_merchant(
        &self,
        merchant_id: &MerchantId,
        limit: usize,
    ) -> Result<Vec<UsageLogEntry>, DomainError> {
        let entries = self.entries.read().map_err(read_lock_error)?;

        let mut results: Vec<_> = entries
            .values()
            .filter(|e| &e.merchant_id == merchant_id)
            .cloned()
            .collect();

        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        results.truncate(limit);

        Ok(results)
    }
}

/// In-memory verification code repository
#[derive(Debug, Default)]
pub struct InMemoryVerificationCodeRepository {
    codes: RwLock<HashMap<String, VerificationCode>>,
}

impl InMemoryVerificationCodeRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VerificationCodeRepository for InMemoryVerificationCodeRepository {
    async fn replace(&self, code: VerificationCode) -> Result<(), DomainError> {
        let mut codes = self.codes.write().map_err(write_lock_error)?;
        codes.insert(code.email().to_string(), code);
        Ok(())
    }

    async fn get(&self, email: &str) -> Result<Option<VerificationCode>, DomainError> {
        let codes = self.codes.read().map_err(read_lock_error)?;
        Ok(codes.get(&normalize_email(email)).cloned())
    }

    async fn record_failure(&self, email: &str) -> Result<u32, DomainError> {
        let mut codes = self.codes.write().map_err(write_lock_error)?;
        Ok(codes
            .get_mut(&normalize_email(email))
            .map(VerificationCode::record_failure)
            .unwrap_or(0))
    }

    async fn delete(&self, email: &str) -> Result<bool, DomainError> {
        let mut codes = self.codes.write().map_err(write_lock_error)?;
        Ok(codes.remove(&normalize_email(email)).is_some())
    }
}
