//! Verification code entity

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Number of digits in a code
pub const CODE_LENGTH: usize = 4;

/// Minutes a code stays valid
pub const CODE_TTL_MINUTES: i64 = 10;

/// Wrong guesses allowed before a code is discarded
pub const MAX_FAILED_ATTEMPTS: u32 = 5;

/// An active one-time code for an email address.
///
/// Only the SHA-256 digest of the code is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationCode {
    email: String,
    code_hash: String,
    expires_at: DateTime<Utc>,
    #[serde(default)]
    failed_attempts: u32,
}

impl VerificationCode {
    /// Create a code for `email` expiring `CODE_TTL_MINUTES` after `now`
    pub fn issue(email: &str, code: &str, now: DateTime<Utc>) -> Self {
        Self {
            email: normalize_email(email),
            code_hash: hash_code(code),
            expires_at: now + Duration::minutes(CODE_TTL_MINUTES),
            failed_attempts: 0,
        }
    }

    /// Rebuild from stored fields
    pub fn from_parts(email: String, code_hash: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            email,
            code_hash,
            expires_at,
            failed_attempts: 0,
        }
    }

    pub fn with_failed_attempts(mut self, failed_attempts: u32) -> Self {
        self.failed_attempts = failed_attempts;
        self
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn code_hash(&self) -> &str {
        &self.code_hash
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts
    }

    pub fn record_failure(&mut self) -> u32 {
        self.failed_attempts = self.failed_attempts.saturating_add(1);
        self.failed_attempts
    }

    pub fn is_exhausted(&self) -> bool {
        self.failed_attempts >= MAX_FAILED_ATTEMPTS
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn matches(&self, code: &str) -> bool {
        self.code_hash == hash_code(code.trim())
    }
}

/// Lowercase and trim an email so lookups are case-insensitive
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn hash_code(code: &str) -> String {
    hex::encode(Sha256::digest(code.as_bytes()))
}
