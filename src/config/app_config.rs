use serde::Deserialize;

/// Application configuration
///
/// Loaded from `config/default`, then `config/local`, then `APP__*` environment
/// variables (e.g. `APP__PROVIDER__API_KEY`).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub storage: StorageSettings,
    pub provider: ProviderConfig,
    pub generation: GenerationConfig,
    pub admission: AdmissionConfig,
    pub settlement: SettlementConfig,
    pub object_store: ObjectStoreConfig,
    pub metrics: MetricsConfig,
    pub seed: SeedConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Public origin used by the widget loader to build iframe URLs
    pub public_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// `memory` or `postgres`
    pub backend: String,
    pub database_url: Option<String>,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key: String,
    pub request_timeout_secs: u64,
    pub default_prompt: String,
    pub image_size: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub poll_interval_ms: u64,
    pub max_poll_attempts: u32,
    pub demo_placeholder_on_failure: bool,
    pub tryon_placeholder_on_failure: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AdmissionConfig {
    pub credit_check_fail_open: bool,
    pub rate_limit_fail_open: bool,
    pub window_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SettlementConfig {
    pub credit_cost: i64,
    pub charge_placeholder: bool,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ObjectStoreConfig {
    /// S3 bucket for demo uploads; uploads stay in memory when unset
    pub bucket: Option<String>,
    pub endpoint: Option<String>,
    pub public_base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    /// Credits for the demo merchant created on an empty in-memory store; 0 disables seeding
    pub demo_merchant_credits: i64,
    pub demo_product_id: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            public_url: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: "memory".to_string(),
            database_url: None,
            max_connections: 10,
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.kie.ai".to_string(),
            api_key: String::new(),
            request_timeout_secs: 30,
            default_prompt: "Dress the person in the first image with the garment from the \
                             second image. Keep the face, pose, body and background unchanged."
                .to_string(),
            image_size: "2:3".to_string(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 5_000,
            max_poll_attempts: 60,
            demo_placeholder_on_failure: true,
            tryon_placeholder_on_failure: false,
        }
    }
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            credit_check_fail_open: true,
            rate_limit_fail_open: true,
            window_hours: 24,
        }
    }
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            credit_cost: 1,
            charge_placeholder: false,
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            demo_merchant_credits: 50,
            demo_product_id: "demo".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_behaviour() {
        let config = AppConfig::default();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.storage.backend, "memory");
        assert_eq!(config.generation.poll_interval_ms, 5_000);
        assert_eq!(config.generation.max_poll_attempts, 60);
        assert!(config.generation.demo_placeholder_on_failure);
        assert!(!config.generation.tryon_placeholder_on_failure);
        assert!(config.admission.credit_check_fail_open);
        assert!(config.admission.rate_limit_fail_open);
        assert_eq!(config.admission.window_hours, 24);
        assert_eq!(config.settlement.credit_cost, 1);
        assert!(!config.settlement.charge_placeholder);
    }

    #[test]
    fn test_partial_sources_fill_defaults() {
        let config: AppConfig = config::Config::builder()
            .set_override("provider.api_key", "k-123")
            .unwrap()
            .set_override("generation.max_poll_attempts", 3)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.provider.api_key, "k-123");
        assert_eq!(config.provider.base_url, "https://api.kie.ai");
        assert_eq!(config.generation.max_poll_attempts, 3);
        assert_eq!(config.generation.poll_interval_ms, 5_000);
    }

    #[test]
    fn test_log_format_parsing() {
        let format: LogFormat = serde_json::from_str(r#""json""#).unwrap();
        assert!(matches!(format, LogFormat::Json));
    }
}
