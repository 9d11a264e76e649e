//! Usage log repository trait

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt::Debug;

use super::{UsageLogEntry, UsageLogId, UsageStatus};
use crate::domain::merchant::MerchantId;
use crate::domain::DomainError;

/// Repository for usage log entries
#[async_trait]
pub trait UsageLogRepository: Send + Sync + Debug {
    /// Insert a new entry
    async fn create(&self, entry: UsageLogEntry) -> Result<UsageLogEntry, DomainError>;

    /// Get an entry by ID
    async fn get(&self, id: &UsageLogId) -> Result<Option<UsageLogEntry>, DomainError>;

    /// Move an entry to its terminal status
    async fn finalize(
        &self,
        id: &UsageLogId,
        status: UsageStatus,
        latency_ms: u64,
        metadata: Option<String>,
    ) -> Result<(), DomainError>;

    /// Count quota-relevant entries for (merchant, ip) created at or after `since`
    async fn count_since(
        &self,
        merchant_id: &MerchantId,
        ip_address: &str,
        since: DateTime<Utc>,
    ) -> Result<u32, DomainError>;

    /// Most recent entries for a merchant, newest first
    async fn list_by_merchant(
        &self,
        merchant_id: &MerchantId,
        limit: usize,
    ) -> Result<Vec<UsageLogEntry>, DomainError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Usage log repository that fails selected operations
    #[derive(Debug, Default)]
    pub struct FailingUsageLogRepository {
        pub fail_create: bool,
        pub fail_count: bool,
        pub finalize_calls: AtomicUsize,
    }

    impl FailingUsageLogRepository {
        pub fn failing_count() -> Self {
            Self {
                fail_count: true,
                ..Self::default()
            }
        }

        pub fn failing_create() -> Self {
            Self {
                fail_create: true,
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl UsageLogRepository for FailingUsageLogRepository {
        async fn create(&self, entry: UsageLogEntry) -> Result<UsageLogEntry, DomainError> {
            if self.fail_create {
                return Err(DomainError::storage("insert into usage_logs failed"));
            }
            Ok(entry)
        }

        async fn get(&self, _id: &UsageLogId) -> Result<Option<UsageLogEntry>, DomainError> {
            Ok(None)
        }

        async fn finalize(
            &self,
            _id: &UsageLogId,
            _status: UsageStatus,
            _latency_ms: u64,
            _metadata: Option<String>,
        ) -> Result<(), DomainError> {
            self.finalize_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn count_since(
            &self,
            _merchant_id: &MerchantId,
            _ip_address: &str,
            _since: DateTime<Utc>,
        ) -> Result<u32, DomainError> {
            if self.fail_count {
                return Err(DomainError::storage("column \"ip_address\" does not exist"));
            }
            Ok(0)
        }

        async fn list_by_merchant(
            &self,
            _merchant_id: &MerchantId,
            _limit: usize,
        ) -> Result<Vec<UsageLogEntry>, DomainError> {
            Ok(Vec::new())
        }
    }
}
