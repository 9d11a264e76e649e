//! Verification email delivery

use async_trait::async_trait;
use tracing::info;

use crate::domain::{DomainError, EmailSender};

/// Logs verification codes instead of sending mail
///
/// Stand-in for the transactional email service in development deployments.
#[derive(Debug, Default, Clone)]
pub struct LogEmailSender;

impl LogEmailSender {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send_verification_code(&self, email: &str, code: &str) -> Result<(), DomainError> {
        info!(email = %email, code = %code, "Verification code issued");
        Ok(())
    }
}
