//! Infrastructure services

pub mod admission;
pub mod ledger;
pub mod orchestrator;
pub mod resolver;
pub mod settlement;
mod tryon_service;
mod verification_service;

pub use admission::{
    client_ip, Admission, AdmissionController, AdmissionPolicy, DenyReason, QuotaStatus,
};
pub use ledger::UsageLedger;
pub use orchestrator::{GenerationOrchestrator, OrchestratorPolicy, PollSchedule};
pub use resolver::{MerchantResolver, ResolvedMerchant};
pub use settlement::{Settlement, SettlementReport};
pub use tryon_service::{
    decode_data_url, DemoCommand, TryOnCommand, TryOnResult, TryOnService, TryOnServiceDeps,
    TryOnSettings, MAX_DEMO_UPLOAD_BYTES,
};
pub use verification_service::VerificationService;
