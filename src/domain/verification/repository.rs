//! Verification code repository trait

use async_trait::async_trait;
use std::fmt::Debug;

use super::VerificationCode;
use crate::domain::DomainError;

/// Repository for verification codes. At most one code per email is active.
#[async_trait]
pub trait VerificationCodeRepository: Send + Sync + Debug {
    /// Delete any prior code for the email and store this one
    async fn replace(&self, code: VerificationCode) -> Result<(), DomainError>;

    /// Get the active code for an email
    async fn get(&self, email: &str) -> Result<Option<VerificationCode>, DomainError>;

    /// Count a wrong guess against the active code; returns the new total, 0 if none exists
    async fn record_failure(&self, email: &str) -> Result<u32, DomainError>;

    /// Delete the code for an email, returns true if one existed
    async fn delete(&self, email: &str) -> Result<bool, DomainError>;
}
