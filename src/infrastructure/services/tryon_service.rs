//! Try-on request flow: resolve, admit, record, generate, settle

use std::sync::Arc;
use std::time::Instant;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use bytes::Bytes;
use tracing::{error, info, instrument, warn};

use super::admission::{Admission, AdmissionController, DenyReason, QuotaStatus};
use super::ledger::UsageLedger;
use super::orchestrator::{outcome_label, GenerationOrchestrator, OrchestratorPolicy};
use super::resolver::{MerchantResolver, ResolvedMerchant};
use super::settlement::Settlement;
use crate::domain::merchant::MerchantId;
use crate::domain::usage_log::{UsageMetadata, UsageStatus};
use crate::domain::{DomainError, GenerationOutcome, GenerationRequest, ImageStore};
use crate::infrastructure::observability::record_tryon_request;
use crate::infrastructure::provider::PAYLOAD_TOO_LARGE_MESSAGE;

/// Largest decoded demo upload accepted before contacting the provider
pub const MAX_DEMO_UPLOAD_BYTES: usize = 4 * 1024 * 1024;

/// Ledger bucket for landing-page demo runs; never a storefront merchant
pub const DEMO_BUCKET_ID: &str = "demo-bucket";

const TRYON_CHANNEL: &str = "tryon";
const DEMO_CHANNEL: &str = "demo";

/// A merchant widget try-on request
#[derive(Debug, Clone, Default)]
pub struct TryOnCommand {
    pub product_id: Option<String>,
    pub subject_url: String,
    pub garment_url: String,
    pub prompt: Option<String>,
    /// Style hint appended to the prompt
    pub style: Option<String>,
    pub num_images: Option<u32>,
    pub client_ip: String,
}

/// A landing-page demo request; `user_image` may be a base64 `data:` URL
#[derive(Debug, Clone, Default)]
pub struct DemoCommand {
    pub user_image: String,
    pub garment_url: String,
    pub client_ip: String,
}

/// Who a generation is recorded against
enum Account {
    /// Storefront try-on, settled against the merchant
    Merchant(ResolvedMerchant),
    /// Demo run, logged in its own bucket without settlement
    Demo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TryOnResult {
    pub task_id: Option<String>,
    pub result_url: String,
    /// The result is the garment image standing in for a failed generation
    pub placeholder: bool,
    pub remaining_credits: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct TryOnSettings {
    pub default_prompt: String,
    pub tryon_policy: OrchestratorPolicy,
    pub demo_policy: OrchestratorPolicy,
}

impl Default for TryOnSettings {
    fn default() -> Self {
        Self {
            default_prompt: "Dress the person in the first image with the garment from the second image."
                .to_string(),
            tryon_policy: OrchestratorPolicy {
                placeholder_on_failure: false,
            },
            demo_policy: OrchestratorPolicy {
                placeholder_on_failure: true,
            },
        }
    }
}

/// Dependencies for `TryOnService`
pub struct TryOnServiceDeps {
    pub resolver: MerchantResolver,
    pub admission: AdmissionController,
    pub ledger: UsageLedger,
    pub orchestrator: Arc<GenerationOrchestrator>,
    pub settlement: Settlement,
    pub image_store: Arc<dyn ImageStore>,
    pub settings: TryOnSettings,
}

#[derive(Clone)]
pub struct TryOnService {
    resolver: MerchantResolver,
    admission: AdmissionController,
    ledger: UsageLedger,
    orchestrator: Arc<GenerationOrchestrator>,
    settlement: Settlement,
    image_store: Arc<dyn ImageStore>,
    settings: TryOnSettings,
}

impl std::fmt::Debug for TryOnService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TryOnService")
            .field("orchestrator", &self.orchestrator)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl TryOnService {
    pub fn new(deps: TryOnServiceDeps) -> Self {
        Self {
            resolver: deps.resolver,
            admission: deps.admission,
            ledger: deps.ledger,
            orchestrator: deps.orchestrator,
            settlement: deps.settlement,
            image_store: deps.image_store,
            settings: deps.settings,
        }
    }

    /// Read-only quota view used by the widget to pre-disable uploads
    pub async fn quota(&self, product_id: &str, ip: &str) -> Result<QuotaStatus, DomainError> {
        let resolved = self.resolver.resolve(Some(product_id)).await?;
        self.admission.status(&resolved.merchant, ip).await
    }

    #[instrument(skip(self, command), fields(product_id = ?command.product_id, ip = %command.client_ip))]
    pub async fn try_on(&self, command: TryOnCommand) -> Result<TryOnResult, DomainError> {
        let subject_url = require(&command.subject_url, "Subject image URL is required")?;
        let garment_url = require(&command.garment_url, "Garment image URL is required")?;

        let resolved = self.resolver.resolve(command.product_id.as_deref()).await?;

        let admission = self
            .admission
            .admit(&resolved.merchant, &command.client_ip)
            .await?;

        if let Admission::Denied { reason, message } = &admission {
            if *reason == DenyReason::RateLimited {
                self.ledger
                    .record_blocked(
                        resolved.merchant.id(),
                        &command.client_ip,
                        command.product_id.as_deref(),
                        message,
                    )
                    .await;
            }
            record_tryon_request(TRYON_CHANNEL, "denied");
        }
        admission.into_result()?;

        let request = GenerationRequest::new(
            subject_url,
            garment_url,
            self.prompt_for(command.prompt.as_deref(), command.style.as_deref()),
        )
        .with_num_images(command.num_images.unwrap_or(1));

        // Detached so bookkeeping completes even if the client disconnects
        let service = self.clone();
        let ip = command.client_ip.clone();
        let policy = self.settings.tryon_policy;

        tokio::spawn(async move {
            service
                .generate(TRYON_CHANNEL, Account::Merchant(resolved), ip, request, policy)
                .await
        })
        .await
        .map_err(|e| DomainError::internal(format!("Generation task aborted: {}", e)))?
    }

    #[instrument(skip(self, command), fields(ip = %command.client_ip))]
    pub async fn demo(&self, command: DemoCommand) -> Result<TryOnResult, DomainError> {
        let user_image = require(&command.user_image, "User image is required")?;
        let garment_url = require(&command.garment_url, "Garment image URL is required")?;

        let subject_url = if user_image.starts_with("data:") {
            let (content_type, data) = decode_data_url(&user_image)?;
            self.image_store.upload(data, &content_type).await?
        } else {
            user_image
        };

        let request = GenerationRequest::new(
            subject_url,
            garment_url,
            self.settings.default_prompt.clone(),
        );

        let service = self.clone();
        let ip = command.client_ip.clone();
        let policy = self.settings.demo_policy;

        tokio::spawn(async move {
            service
                .generate(DEMO_CHANNEL, Account::Demo, ip, request, policy)
                .await
        })
        .await
        .map_err(|e| DomainError::internal(format!("Generation task aborted: {}", e)))?
    }

    fn prompt_for(&self, prompt: Option<&str>, style: Option<&str>) -> String {
        let base = prompt
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(&self.settings.default_prompt);

        match style.map(str::trim).filter(|s| !s.is_empty()) {
            Some(style) => format!("{} Style: {}.", base, style),
            None => base.to_string(),
        }
    }

    /// Ledger open, orchestration, settlement for merchants, ledger finalize
    async fn generate(
        &self,
        channel: &'static str,
        account: Account,
        ip: String,
        request: GenerationRequest,
        policy: OrchestratorPolicy,
    ) -> Result<TryOnResult, DomainError> {
        let started = Instant::now();

        let entry_id = match &account {
            Account::Merchant(resolved) => {
                let product_id = resolved.product.as_ref().map(|p| p.id().as_str());
                self.ledger
                    .open(resolved.merchant.id(), &ip, product_id)
                    .await
            }
            Account::Demo => {
                self.ledger
                    .open(&MerchantId::new(DEMO_BUCKET_ID), &ip, None)
                    .await
            }
        };

        let result = self.orchestrator.run(&request, policy).await;
        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let mut metadata = UsageMetadata::new()
            .with_input_images(request.input_images())
            .with_channel(self.orchestrator.provider_name());

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                let status = match &e {
                    DomainError::PayloadTooLarge { .. } => UsageStatus::Error(413),
                    _ => UsageStatus::Error(500),
                };
                metadata = metadata.with_error(e.public_message());
                self.ledger
                    .finalize(entry_id.as_ref(), status, latency_ms, &metadata)
                    .await;
                record_tryon_request(channel, "rejected");
                return Err(e);
            }
        };

        if let Some(task_id) = outcome.task_id() {
            metadata = metadata.with_task_id(task_id);
        }

        let report = match &account {
            Account::Merchant(resolved) => {
                self.settlement
                    .settle(
                        resolved.merchant.id(),
                        resolved.product.as_ref().map(|p| p.id()),
                        &outcome,
                    )
                    .await
            }
            Account::Demo => None,
        };

        if report.is_some() {
            metadata = metadata.with_credits_used(self.settlement.credit_cost());
        }

        record_tryon_request(channel, outcome_label(&outcome));

        let remaining_credits = report.and_then(|r| r.remaining_credits);

        match outcome {
            GenerationOutcome::Success {
                task_id,
                result_url,
            } => {
                metadata = metadata.with_result_url(&result_url);
                self.ledger
                    .finalize(entry_id.as_ref(), UsageStatus::Success, latency_ms, &metadata)
                    .await;

                info!(task_id = %task_id, latency_ms, "Try-on completed");

                Ok(TryOnResult {
                    task_id: Some(task_id),
                    result_url,
                    placeholder: false,
                    remaining_credits,
                })
            }
            GenerationOutcome::FailedWithPlaceholder {
                task_id,
                placeholder_url,
                error,
            } => {
                let status = if metadata.credits_used.is_some() {
                    UsageStatus::Success
                } else {
                    UsageStatus::Error(500)
                };
                metadata = metadata
                    .with_result_url(&placeholder_url)
                    .with_error(&error);
                self.ledger
                    .finalize(entry_id.as_ref(), status, latency_ms, &metadata)
                    .await;

                warn!(error = %error, "Generation failed, returning placeholder");

                Ok(TryOnResult {
                    task_id,
                    result_url: placeholder_url,
                    placeholder: true,
                    remaining_credits,
                })
            }
            GenerationOutcome::Failed { error, .. } => {
                metadata = metadata.with_error(&error);
                self.ledger
                    .finalize(entry_id.as_ref(), UsageStatus::Error(500), latency_ms, &metadata)
                    .await;

                error!(error = %error, "Try-on generation failed");

                Err(DomainError::provider(self.orchestrator.provider_name(), error))
            }
            GenerationOutcome::TimedOut { attempts, .. } => {
                let message = "Generation timed out";
                metadata = metadata.with_error(message);
                self.ledger
                    .finalize(entry_id.as_ref(), UsageStatus::Error(504), latency_ms, &metadata)
                    .await;

                error!(attempts, "Try-on generation timed out");

                Err(DomainError::timeout(message))
            }
        }
    }
}

fn require(value: &str, message: &str) -> Result<String, DomainError> {
    let value = value.trim();

    if value.is_empty() {
        return Err(DomainError::validation(message));
    }

    Ok(value.to_string())
}

/// Splits a `data:<mime>;base64,<payload>` URL into content type and bytes
pub fn decode_data_url(data_url: &str) -> Result<(String, Bytes), DomainError> {
    let rest = data_url
        .strip_prefix("data:")
        .ok_or_else(|| DomainError::validation("Expected a data URL"))?;

    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| DomainError::validation("Malformed data URL"))?;

    let content_type = header
        .strip_suffix(";base64")
        .ok_or_else(|| DomainError::validation("Only base64 data URLs are supported"))?;

    if !content_type.starts_with("image/") {
        return Err(DomainError::validation("Uploaded file must be an image"));
    }

    // Base64 expands by 4/3; reject before decoding oversized payloads
    if payload.len() / 4 * 3 > MAX_DEMO_UPLOAD_BYTES + 3 {
        return Err(DomainError::payload_too_large(PAYLOAD_TOO_LARGE_MESSAGE));
    }

    let data = BASE64
        .decode(payload.trim())
        .map_err(|e| DomainError::validation(format!("Invalid base64 image: {}", e)))?;

    if data.len() > MAX_DEMO_UPLOAD_BYTES {
        return Err(DomainError::payload_too_large(PAYLOAD_TOO_LARGE_MESSAGE));
    }

    Ok((content_type.to_string(), Bytes::from(data)))
}
