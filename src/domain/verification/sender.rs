use async_trait::async_trait;
use std::fmt::Debug;

use crate::domain::DomainError;

/// Delivers verification codes to the merchant's inbox
#[async_trait]
pub trait EmailSender: Send + Sync + Debug {
    async fn send_verification_code(&self, email: &str, code: &str) -> Result<(), DomainError>;
}
