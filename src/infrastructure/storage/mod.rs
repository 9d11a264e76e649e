//! Storage infrastructure - Repository implementations

mod factory;
mod in_memory;
pub mod migrations;
mod postgres;

pub use factory::{Repositories, StorageConfig, StorageFactory, StorageType};
pub use in_memory::{
    InMemoryMerchantRepository, InMemoryProductRepository, InMemoryUsageLogRepository,
    InMemoryVerificationCodeRepository,
};
pub use migrations::{revert_last_migration, run_storage_migrations, Migration, PostgresMigrator};
pub use postgres::{
    PostgresConfig, PostgresMerchantRepository, PostgresProductRepository,
    PostgresUsageLogRepository, PostgresVerificationCodeRepository,
};
