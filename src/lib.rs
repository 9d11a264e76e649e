//! DrOutfit try-on API
//!
//! Credit-gated virtual garment try-on for embeddable e-commerce widgets:
//! - Merchant resolution with demo fallback
//! - Credit and per-IP quota admission
//! - Usage ledger, generation orchestration and settlement
//! - Email verification codes for merchant onboarding

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;
use std::time::Duration;

use api::state::AppState;
use domain::{ImageStore, MerchantProfile, Product};
use infrastructure::{
    email::LogEmailSender,
    image_store::{InMemoryImageStore, S3ImageStore, S3ImageStoreConfig},
    provider::{HttpClient, KieImageProvider},
    services::{
        AdmissionController, AdmissionPolicy, GenerationOrchestrator, MerchantResolver,
        OrchestratorPolicy, PollSchedule, Settlement, TryOnService, TryOnServiceDeps,
        TryOnSettings, UsageLedger, VerificationService,
    },
    storage::{PostgresConfig, Repositories, StorageConfig, StorageFactory, StorageType},
};
use tracing::{info, warn};

/// Merchant id given to the seeded demo merchant
pub const DEMO_MERCHANT_ID: &str = "demo-merchant";

/// Create the application state with default configuration
pub async fn create_app_state() -> anyhow::Result<AppState> {
    create_app_state_with_config(&AppConfig::default()).await
}

/// Create the application state with custom configuration
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let storage_config = storage_config(config)?;
    info!("Storage backend: {:?}", storage_config.storage_type());

    let repositories = StorageFactory::create(&storage_config).await?;

    if storage_config.storage_type() == StorageType::InMemory {
        seed_demo_merchant(&repositories, config).await?;
    }

    let http_client =
        HttpClient::with_timeout(Duration::from_secs(config.provider.request_timeout_secs))?;

    if config.provider.api_key.is_empty() {
        warn!("Provider API key is not configured; generation requests will be rejected");
    }

    let provider = KieImageProvider::with_base_url(
        http_client,
        config.provider.api_key.clone(),
        config.provider.base_url.clone(),
    )
    .with_image_size(config.provider.image_size.clone());

    let orchestrator = GenerationOrchestrator::new(
        Arc::new(provider),
        PollSchedule {
            interval: Duration::from_millis(config.generation.poll_interval_ms),
            max_attempts: config.generation.max_poll_attempts,
        },
    );

    let tryon_service = TryOnService::new(TryOnServiceDeps {
        resolver: MerchantResolver::new(
            repositories.merchants.clone(),
            repositories.products.clone(),
        ),
        admission: AdmissionController::new(
            repositories.merchants.clone(),
            repositories.usage_logs.clone(),
            AdmissionPolicy {
                credit_check_fail_open: config.admission.credit_check_fail_open,
                rate_limit_fail_open: config.admission.rate_limit_fail_open,
                window: chrono::Duration::hours(config.admission.window_hours),
            },
        ),
        ledger: UsageLedger::new(repositories.usage_logs.clone()),
        orchestrator: Arc::new(orchestrator),
        settlement: Settlement::new(
            repositories.merchants.clone(),
            repositories.products.clone(),
        )
        .with_credit_cost(config.settlement.credit_cost)
        .with_charge_placeholder(config.settlement.charge_placeholder),
        image_store: create_image_store(config).await,
        settings: TryOnSettings {
            default_prompt: config.provider.default_prompt.clone(),
            tryon_policy: OrchestratorPolicy {
                placeholder_on_failure: config.generation.tryon_placeholder_on_failure,
            },
            demo_policy: OrchestratorPolicy {
                placeholder_on_failure: config.generation.demo_placeholder_on_failure,
            },
        },
    });

    let verification_service = VerificationService::new(
        repositories.verification_codes.clone(),
        Arc::new(LogEmailSender::new()),
    );

    Ok(AppState::new(
        Arc::new(tryon_service),
        Arc::new(verification_service),
        repositories.merchants.clone(),
    )
    .with_public_url(config.server.public_url.clone()))
}

fn storage_config(config: &AppConfig) -> anyhow::Result<StorageConfig> {
    let backend = StorageType::from_str(&config.storage.backend).unwrap_or_else(|| {
        warn!(backend = %config.storage.backend, "Unknown storage backend, using memory");
        StorageType::InMemory
    });

    match backend {
        StorageType::InMemory => Ok(StorageConfig::in_memory()),
        StorageType::Postgres => {
            let url = config
                .storage
                .database_url
                .clone()
                .or_else(|| std::env::var("DATABASE_URL").ok())
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is required for postgres storage"))?;

            Ok(StorageConfig::Postgres(
                PostgresConfig::new(url).with_max_connections(config.storage.max_connections),
            ))
        }
    }
}

async fn create_image_store(config: &AppConfig) -> Arc<dyn ImageStore> {
    match &config.object_store.bucket {
        Some(bucket) => {
            info!(bucket = %bucket, "Using S3 for demo uploads");
            let store = S3ImageStore::from_config(&S3ImageStoreConfig {
                bucket: bucket.clone(),
                endpoint: config.object_store.endpoint.clone(),
                public_base_url: config.object_store.public_base_url.clone(),
            })
            .await;
            Arc::new(store)
        }
        None => {
            info!("No object store bucket configured, keeping demo uploads in memory");
            Arc::new(InMemoryImageStore::default())
        }
    }
}

/// Creates a demo merchant and product on an empty store so the widget works out of the box
async fn seed_demo_merchant(repositories: &Repositories, config: &AppConfig) -> anyhow::Result<()> {
    if config.seed.demo_merchant_credits <= 0 || repositories.merchants.any().await?.is_some() {
        return Ok(());
    }

    repositories
        .merchants
        .save(MerchantProfile::new(
            DEMO_MERCHANT_ID,
            config.seed.demo_merchant_credits,
        ))
        .await?;
    repositories
        .products
        .save(Product::new(
            config.seed.demo_product_id.as_str(),
            DEMO_MERCHANT_ID,
        ))
        .await?;

    info!(
        merchant_id = DEMO_MERCHANT_ID,
        product_id = %config.seed.demo_product_id,
        credits = config.seed.demo_merchant_credits,
        "Seeded demo merchant"
    );

    Ok(())
}
