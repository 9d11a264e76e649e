//! Application configuration

mod app_config;

pub use app_config::{
    AdmissionConfig, AppConfig, GenerationConfig, LogFormat, LoggingConfig, MetricsConfig,
    ObjectStoreConfig, ProviderConfig, SeedConfig, ServerConfig, SettlementConfig,
    StorageSettings,
};
