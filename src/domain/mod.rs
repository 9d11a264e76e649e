//! Domain layer - Core business logic and entities

pub mod error;
pub mod generation;
pub mod merchant;
pub mod product;
pub mod usage_log;
pub mod verification;

pub use error::DomainError;
pub use generation::{
    GenerationOutcome, GenerationProvider, GenerationRequest, ImageStore, TaskState,
};
pub use merchant::{MerchantId, MerchantProfile, MerchantRepository, DEFAULT_DAILY_QUOTA};
pub use product::{Product, ProductId, ProductRepository};
pub use usage_log::{UsageLogEntry, UsageLogId, UsageLogRepository, UsageMetadata, UsageStatus};
pub use verification::{EmailSender, VerificationCode, VerificationCodeRepository};
