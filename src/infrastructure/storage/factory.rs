//! Storage factory for runtime backend selection

use std::sync::Arc;

use tracing::info;

use crate::domain::merchant::MerchantRepository;
use crate::domain::product::ProductRepository;
use crate::domain::usage_log::UsageLogRepository;
use crate::domain::verification::VerificationCodeRepository;
use crate::domain::DomainError;

use super::in_memory::{
    InMemoryMerchantRepository, InMemoryProductRepository, InMemoryUsageLogRepository,
    InMemoryVerificationCodeRepository,
};
use super::migrations::run_storage_migrations;
use super::postgres::{
    PostgresConfig, PostgresMerchantRepository, PostgresProductRepository,
    PostgresUsageLogRepository, PostgresVerificationCodeRepository,
};

/// Supported storage types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageType {
    /// In-memory storage (for testing/development)
    InMemory,
    /// PostgreSQL storage
    Postgres,
}

impl StorageType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "memory" | "inmemory" | "in-memory" | "in_memory" => Some(Self::InMemory),
            "postgres" | "postgresql" | "pg" => Some(Self::Postgres),
            _ => None,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone)]
pub enum StorageConfig {
    InMemory,
    Postgres(PostgresConfig),
}

impl StorageConfig {
    pub fn in_memory() -> Self {
        Self::InMemory
    }

    pub fn postgres_url(url: impl Into<String>) -> Self {
        Self::Postgres(PostgresConfig::new(url))
    }

    pub fn storage_type(&self) -> StorageType {
        match self {
            Self::InMemory => StorageType::InMemory,
            Self::Postgres(_) => StorageType::Postgres,
        }
    }
}

/// The full set of repositories the service runs against
#[derive(Clone)]
pub struct Repositories {
    pub merchants: Arc<dyn MerchantRepository>,
    pub products: Arc<dyn ProductRepository>,
    pub usage_logs: Arc<dyn UsageLogRepository>,
    pub verification_codes: Arc<dyn VerificationCodeRepository>,
}

impl std::fmt::Debug for Repositories {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repositories").finish_non_exhaustive()
    }
}

impl Repositories {
    /// Fresh, empty in-memory repositories
    pub fn in_memory() -> Self {
        Self {
            merchants: Arc::new(InMemoryMerchantRepository::new()),
            products: Arc::new(InMemoryProductRepository::new()),
            usage_logs: Arc::new(InMemoryUsageLogRepository::default()),
            verification_codes: Arc::new(InMemoryVerificationCodeRepository::new()),
        }
    }

    /// Postgres repositories sharing one pool
    pub fn postgres(pool: sqlx::PgPool) -> Self {
        Self {
            merchants: Arc::new(PostgresMerchantRepository::new(pool.clone())),
            products: Arc::new(PostgresProductRepository::new(pool.clone())),
            usage_logs: Arc::new(PostgresUsageLogRepository::new(pool.clone())),
            verification_codes: Arc::new(PostgresVerificationCodeRepository::new(pool)),
        }
    }
}

/// Factory for creating repository sets
#[derive(Debug)]
pub struct StorageFactory;

impl StorageFactory {
    /// Creates repositories for the configured backend, applying migrations for Postgres
    pub async fn create(config: &StorageConfig) -> Result<Repositories, DomainError> {
        match config {
            StorageConfig::InMemory => {
                info!("Using in-memory storage");
                Ok(Repositories::in_memory())
            }
            StorageConfig::Postgres(pg_config) => {
                info!("Connecting to PostgreSQL...");
                let pool = pg_config.connect().await?;
                run_storage_migrations(&pool).await?;
                info!("PostgreSQL connection established");
                Ok(Repositories::postgres(pool))
            }
        }
    }
}
