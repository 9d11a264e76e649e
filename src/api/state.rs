//! Application state for shared services

use std::sync::Arc;

use crate::domain::merchant::MerchantRepository;
use crate::domain::DomainError;
use crate::infrastructure::services::{
    DemoCommand, QuotaStatus, TryOnCommand, TryOnResult, TryOnService, VerificationService,
};

/// Application state containing shared services using dynamic dispatch
#[derive(Clone)]
pub struct AppState {
    pub tryon_service: Arc<dyn TryOnServiceTrait>,
    pub verification_service: Arc<dyn VerificationServiceTrait>,
    /// Probed by the readiness check
    pub merchant_repository: Arc<dyn MerchantRepository>,
    /// Origin substituted into the widget loader; derived from the script URL when unset
    pub public_url: Option<String>,
}

/// Trait for the try-on flow
#[async_trait::async_trait]
pub trait TryOnServiceTrait: Send + Sync {
    async fn try_on(&self, command: TryOnCommand) -> Result<TryOnResult, DomainError>;
    async fn quota(&self, product_id: &str, ip: &str) -> Result<QuotaStatus, DomainError>;
    async fn demo(&self, command: DemoCommand) -> Result<TryOnResult, DomainError>;
}

/// Trait for email verification codes
#[async_trait::async_trait]
pub trait VerificationServiceTrait: Send + Sync {
    async fn send_code(&self, email: &str) -> Result<(), DomainError>;
    async fn verify_code(&self, email: &str, code: &str) -> Result<(), DomainError>;
}

#[async_trait::async_trait]
impl TryOnServiceTrait for TryOnService {
    async fn try_on(&self, command: TryOnCommand) -> Result<TryOnResult, DomainError> {
        TryOnService::try_on(self, command).await
    }

    async fn quota(&self, product_id: &str, ip: &str) -> Result<QuotaStatus, DomainError> {
        TryOnService::quota(self, product_id, ip).await
    }

    async fn demo(&self, command: DemoCommand) -> Result<TryOnResult, DomainError> {
        TryOnService::demo(self, command).await
    }
}

#[async_trait::async_trait]
impl VerificationServiceTrait for VerificationService {
    async fn send_code(&self, email: &str) -> Result<(), DomainError> {
        VerificationService::send_code(self, email).await
    }

    async fn verify_code(&self, email: &str, code: &str) -> Result<(), DomainError> {
        VerificationService::verify_code(self, email, code).await
    }
}

impl AppState {
    pub fn new(
        tryon_service: Arc<dyn TryOnServiceTrait>,
        verification_service: Arc<dyn VerificationServiceTrait>,
        merchant_repository: Arc<dyn MerchantRepository>,
    ) -> Self {
        Self {
            tryon_service,
            verification_service,
            merchant_repository,
            public_url: None,
        }
    }

    pub fn with_public_url(mut self, public_url: Option<String>) -> Self {
        self.public_url = public_url.map(|url| url.trim_end_matches('/').to_string());
        self
    }
}
