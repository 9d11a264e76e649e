//! Usage log entry entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::merchant::MerchantId;

/// Unique identifier for a usage log entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UsageLogId(String);

impl UsageLogId {
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

impl From<&str> for UsageLogId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for UsageLogId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for UsageLogId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// HTTP-style status of a usage entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", from = "u16")]
pub enum UsageStatus {
    /// 202 - provider call in flight
    Pending,
    /// 200 - generation succeeded
    Success,
    /// 429 - rejected by the rate gate
    Blocked,
    /// 5xx - provider or internal failure
    Error(u16),
}

impl UsageStatus {
    pub fn code(&self) -> u16 {
        match self {
            Self::Pending => 202,
            Self::Success => 200,
            Self::Blocked => 429,
            Self::Error(code) => *code,
        }
    }

    pub fn from_code(code: u16) -> Self {
        match code {
            202 => Self::Pending,
            200 => Self::Success,
            429 => Self::Blocked,
            other => Self::Error(other),
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Whether the entry counts against the per-IP window
    pub fn counts_toward_quota(&self) -> bool {
        !matches!(self, Self::Blocked)
    }
}

impl From<UsageStatus> for u16 {
    fn from(status: UsageStatus) -> Self {
        status.code()
    }
}

impl From<u16> for UsageStatus {
    fn from(code: u16) -> Self {
        Self::from_code(code)
    }
}

impl std::fmt::Display for UsageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// One try-on attempt as recorded in the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageLogEntry {
    id: UsageLogId,
    pub merchant_id: MerchantId,
    pub ip_address: String,
    pub product_id: Option<String>,
    pub status: UsageStatus,
    pub latency_ms: u64,
    /// Opaque metadata blob, JSON-encoded `UsageMetadata` for new rows
    pub metadata: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UsageLogEntry {
    /// Create a pending entry timestamped now
    pub fn pending(
        merchant_id: MerchantId,
        ip_address: impl Into<String>,
        product_id: Option<String>,
    ) -> Self {
        Self {
            id: UsageLogId::generate(),
            merchant_id,
            ip_address: ip_address.into(),
            product_id,
            status: UsageStatus::Pending,
            latency_ms: 0,
            metadata: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_id(mut self, id: impl Into<UsageLogId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_status(mut self, status: UsageStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_metadata(mut self, metadata: impl Into<String>) -> Self {
        self.metadata = Some(metadata.into());
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn id(&self) -> &UsageLogId {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(UsageStatus::Pending.code(), 202);
        assert_eq!(UsageStatus::Success.code(), 200);
        assert_eq!(UsageStatus::Blocked.code(), 429);
        assert_eq!(UsageStatus::Error(504).code(), 504);
        assert_eq!(UsageStatus::from_code(500), UsageStatus::Error(500));
    }

    #[test]
    fn test_status_serializes_as_number() {
        let json = serde_json::to_string(&UsageStatus::Pending).unwrap();
        assert_eq!(json, "202");

        let status: UsageStatus = serde_json::from_str("200").unwrap();
        assert_eq!(status, UsageStatus::Success);
    }

    #[test]
    fn test_pending_entry() {
        let entry = UsageLogEntry::pending(MerchantId::new("m-1"), "1.2.3.4", None);
        assert_eq!(entry.status, UsageStatus::Pending);
        assert!(!entry.status.is_terminal());
        assert!(entry.status.counts_toward_quota());
        assert!(!UsageStatus::Blocked.counts_toward_quota());
    }
}
