//! Credit and per-IP quota gates applied before any provider call

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderMap;
use chrono::{Duration, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::merchant::{MerchantProfile, MerchantRepository};
use crate::domain::usage_log::UsageLogRepository;
use crate::domain::DomainError;
use crate::infrastructure::observability::record_admission_denied;

/// Shared bucket for requests whose address cannot be determined
pub const UNKNOWN_IP: &str = "unknown";

pub const INSUFFICIENT_CREDITS_MESSAGE: &str =
    "Insufficient credits. Please contact the store owner.";
pub const RATE_LIMITED_MESSAGE: &str =
    "Daily try-on limit reached. Please try again in 24 hours.";

/// What to do when a gate cannot be evaluated
#[derive(Debug, Clone)]
pub struct AdmissionPolicy {
    /// Admit when the credit balance cannot be read
    pub credit_check_fail_open: bool,
    /// Admit when the usage window cannot be counted
    pub rate_limit_fail_open: bool,
    /// Length of the rolling quota window
    pub window: Duration,
}

impl Default for AdmissionPolicy {
    fn default() -> Self {
        Self {
            credit_check_fail_open: true,
            rate_limit_fail_open: true,
            window: Duration::hours(24),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    InsufficientCredits,
    RateLimited,
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InsufficientCredits => "credits",
            Self::RateLimited => "rate_limit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Allowed { used: u32, limit: u32 },
    Denied { reason: DenyReason, message: String },
}

impl Admission {
    /// Converts a denial into the error surfaced to the caller
    pub fn into_result(self) -> Result<(), DomainError> {
        match self {
            Self::Allowed { .. } => Ok(()),
            Self::Denied {
                reason: DenyReason::InsufficientCredits,
                message,
            } => Err(DomainError::insufficient_credits(message)),
            Self::Denied {
                reason: DenyReason::RateLimited,
                message,
            } => Err(DomainError::rate_limited(message)),
        }
    }
}

/// Read-only quota view for the widget
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaStatus {
    pub limit: u32,
    pub used: u32,
    pub remaining: u32,
    pub has_access: bool,
}

#[derive(Debug, Clone)]
pub struct AdmissionController {
    merchants: Arc<dyn MerchantRepository>,
    usage_logs: Arc<dyn UsageLogRepository>,
    policy: AdmissionPolicy,
}

impl AdmissionController {
    pub fn new(
        merchants: Arc<dyn MerchantRepository>,
        usage_logs: Arc<dyn UsageLogRepository>,
        policy: AdmissionPolicy,
    ) -> Self {
        Self {
            merchants,
            usage_logs,
            policy,
        }
    }

    /// Applies the credit gate, then the rate gate
    pub async fn admit(
        &self,
        merchant: &MerchantProfile,
        ip: &str,
    ) -> Result<Admission, DomainError> {
        let limit = merchant.daily_quota();

        if let Some(credits) = self.current_credits(merchant).await? {
            if credits <= 0 {
                info!(merchant_id = %merchant.id(), "Rejected: no credits left");
                record_admission_denied(DenyReason::InsufficientCredits.as_str());

                return Ok(Admission::Denied {
                    reason: DenyReason::InsufficientCredits,
                    message: INSUFFICIENT_CREDITS_MESSAGE.to_string(),
                });
            }
        }

        let Some(used) = self.used_in_window(merchant, ip).await? else {
            return Ok(Admission::Allowed { used: 0, limit });
        };

        if used >= limit {
            info!(
                merchant_id = %merchant.id(),
                ip = %ip,
                used,
                limit,
                "Rejected: daily quota exhausted"
            );
            record_admission_denied(DenyReason::RateLimited.as_str());

            return Ok(Admission::Denied {
                reason: DenyReason::RateLimited,
                message: RATE_LIMITED_MESSAGE.to_string(),
            });
        }

        Ok(Admission::Allowed { used, limit })
    }

    /// Same resolution and counting as `admit`, without side effects
    pub async fn status(
        &self,
        merchant: &MerchantProfile,
        ip: &str,
    ) -> Result<QuotaStatus, DomainError> {
        let limit = merchant.daily_quota();
        let has_credits = self
            .current_credits(merchant)
            .await?
            .map(|credits| credits > 0)
            .unwrap_or(true);
        let used = self.used_in_window(merchant, ip).await?.unwrap_or(0);
        let remaining = limit.saturating_sub(used);

        Ok(QuotaStatus {
            limit,
            used,
            remaining,
            has_access: has_credits && remaining > 0,
        })
    }

    /// Fresh balance read; `None` means the check was bypassed
    async fn current_credits(&self, merchant: &MerchantProfile) -> Result<Option<i64>, DomainError> {
        match self.merchants.get(merchant.id()).await {
            Ok(Some(fresh)) => Ok(Some(fresh.credits())),
            Ok(None) => Ok(Some(merchant.credits())),
            Err(e) if self.policy.credit_check_fail_open => {
                warn!(
                    merchant_id = %merchant.id(),
                    error = %e,
                    "Credit check failed, admitting (fail-open)"
                );
                Ok(None)
            }
            Err(e) => Err(DomainError::storage(format!("Credit check failed: {}", e))),
        }
    }

    /// Entries counted toward the quota; `None` means the check was bypassed
    async fn used_in_window(
        &self,
        merchant: &MerchantProfile,
        ip: &str,
    ) -> Result<Option<u32>, DomainError> {
        let since = Utc::now() - self.policy.window;

        match self.usage_logs.count_since(merchant.id(), ip, since).await {
            Ok(count) => Ok(Some(count)),
            Err(e) if self.policy.rate_limit_fail_open => {
                warn!(
                    merchant_id = %merchant.id(),
                    ip = %ip,
                    error = %e,
                    "Rate limit check failed, admitting (fail-open)"
                );
                Ok(None)
            }
            Err(e) => Err(DomainError::storage(format!("Rate limit check failed: {}", e))),
        }
    }
}

/// Client address used as the rate-limit key
///
/// First `x-forwarded-for` entry, then `x-real-ip`, then the socket peer.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let header_value = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    header_value("x-forwarded-for")
        .or_else(|| header_value("x-real-ip"))
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| UNKNOWN_IP.to_string())
}
