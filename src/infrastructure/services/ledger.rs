//! Best-effort usage ledger: audit trail and basis for quota counting

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::merchant::MerchantId;
use crate::domain::usage_log::{
    UsageLogEntry, UsageLogId, UsageLogRepository, UsageMetadata, UsageStatus,
};
use crate::infrastructure::observability::record_bookkeeping_failure;

/// Writes never fail the caller; storage errors are logged and counted.
#[derive(Debug, Clone)]
pub struct UsageLedger {
    usage_logs: Arc<dyn UsageLogRepository>,
}

impl UsageLedger {
    pub fn new(usage_logs: Arc<dyn UsageLogRepository>) -> Self {
        Self { usage_logs }
    }

    /// Writes a pending (202) entry; `None` if the write failed
    pub async fn open(
        &self,
        merchant_id: &MerchantId,
        ip: &str,
        product_id: Option<&str>,
    ) -> Option<UsageLogId> {
        let entry = UsageLogEntry::pending(merchant_id.clone(), ip, product_id.map(str::to_string));

        match self.usage_logs.create(entry).await {
            Ok(entry) => {
                debug!(entry_id = %entry.id(), "Opened usage log entry");
                Some(entry.id().clone())
            }
            Err(e) => {
                warn!(merchant_id = %merchant_id, error = %e, "Failed to open usage log entry");
                record_bookkeeping_failure("ledger");
                None
            }
        }
    }

    /// Moves an opened entry to its terminal status
    pub async fn finalize(
        &self,
        id: Option<&UsageLogId>,
        status: UsageStatus,
        latency_ms: u64,
        metadata: &UsageMetadata,
    ) {
        let Some(id) = id else {
            return;
        };

        if let Err(e) = self
            .usage_logs
            .finalize(id, status, latency_ms, Some(metadata.to_blob()))
            .await
        {
            warn!(entry_id = %id, status = %status, error = %e, "Failed to finalize usage log entry");
            record_bookkeeping_failure("ledger");
        }
    }

    /// Records a rate-limited attempt; blocked rows do not count toward the quota
    pub async fn record_blocked(
        &self,
        merchant_id: &MerchantId,
        ip: &str,
        product_id: Option<&str>,
        message: &str,
    ) {
        let entry = UsageLogEntry::pending(merchant_id.clone(), ip, product_id.map(str::to_string))
            .with_status(UsageStatus::Blocked)
            .with_metadata(UsageMetadata::new().with_error(message).to_blob());

        if let Err(e) = self.usage_logs.create(entry).await {
            warn!(merchant_id = %merchant_id, error = %e, "Failed to record blocked attempt");
            record_bookkeeping_failure("ledger");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::usage_log::mock::FailingUsageLogRepository;
    use crate::infrastructure::storage::InMemoryUsageLogRepository;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_open_then_finalize() {
        let repo = Arc::new(InMemoryUsageLogRepository::default());
        let ledger = UsageLedger::new(repo.clone());
        let merchant = MerchantId::new("m-1");

        let id = ledger.open(&merchant, "ip", Some("p-1")).await.unwrap();
        assert_eq!(repo.get(&id).await.unwrap().unwrap().status, UsageStatus::Pending);

        let metadata = UsageMetadata::new().with_task_id("t-1");
        ledger
            .finalize(Some(&id), UsageStatus::Success, 42, &metadata)
            .await;

        let entry = repo.get(&id).await.unwrap().unwrap();
        assert_eq!(entry.status, UsageStatus::Success);
        assert_eq!(entry.latency_ms, 42);
        assert_eq!(entry.product_id.as_deref(), Some("p-1"));
        let stored = UsageMetadata::parse_lenient(entry.metadata.as_deref().unwrap());
        assert_eq!(stored.task_id.as_deref(), Some("t-1"));
    }

    #[tokio::test]
    async fn test_open_failure_is_swallowed() {
        let repo = Arc::new(FailingUsageLogRepository::failing_create());
        let ledger = UsageLedger::new(repo.clone());

        assert!(ledger.open(&MerchantId::new("m-1"), "ip", None).await.is_none());

        // Nothing opened, nothing to finalize
        ledger
            .finalize(None, UsageStatus::Error(500), 0, &UsageMetadata::new())
            .await;
        assert_eq!(
            repo.finalize_calls.load(std::sync::atomic::Ordering::SeqCst),
            0
        );
    }

    #[tokio::test]
    async fn test_finalize_missing_entry_is_swallowed() {
        let ledger = UsageLedger::new(Arc::new(InMemoryUsageLogRepository::default()));
        ledger
            .finalize(
                Some(&UsageLogId::new("missing")),
                UsageStatus::Success,
                1,
                &UsageMetadata::new(),
            )
            .await;
    }

    #[tokio::test]
    async fn test_blocked_attempts_do_not_count() {
        let repo = Arc::new(InMemoryUsageLogRepository::default());
        let ledger = UsageLedger::new(repo.clone());
        let merchant = MerchantId::new("m-1");

        ledger
            .record_blocked(&merchant, "ip", None, "Daily limit reached")
            .await;

        let listed = repo.list_by_merchant(&merchant, 10).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].status, UsageStatus::Blocked);

        let counted = repo
            .count_since(&merchant, "ip", Utc::now() - Duration::hours(24))
            .await
            .unwrap();
        assert_eq!(counted, 0);
    }
}
