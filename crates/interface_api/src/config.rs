//! API configuration

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use domain_claims::StoreConfig;

/// Where services persist their JSON blobs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    File,
    Postgres,
}

/// API configuration
///
/// Every field has a default, so any subset may be set through
/// `API_`-prefixed environment variables (e.g. `API_PORT`, `API_STORAGE_BACKEND`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// JWT secret for authentication
    pub jwt_secret: String,
    /// JWT expiration in seconds
    pub jwt_expiration_secs: u64,
    pub storage_backend: StorageBackend,
    /// Root directory for the file backend
    pub data_dir: PathBuf,
    /// Database URL for the postgres backend
    pub database_url: String,
    /// How long the claim index is trusted before re-reading storage
    pub cache_ttl_secs: u64,
    /// Claim write-back period; 0 writes through
    pub flush_interval_ms: u64,
    /// Simulated damage-analysis latency
    pub analysis_latency_ms: u64,
    /// Fixed seed for the mock services; random when unset
    pub rng_seed: Option<u64>,
    /// Log level
    pub log_level: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            jwt_secret: "change-me-in-production".to_string(),
            jwt_expiration_secs: 3600,
            storage_backend: StorageBackend::Memory,
            data_dir: PathBuf::from("./data"),
            database_url: "postgres://localhost/claims".to_string(),
            cache_ttl_secs: 30,
            flush_interval_ms: 0,
            analysis_latency_ms: 2000,
            rng_seed: None,
            log_level: "info".to_string(),
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("API").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            cache_ttl: Duration::from_secs(self.cache_ttl_secs),
            flush_interval: Duration::from_millis(self.flush_interval_ms),
        }
    }

    pub fn analysis_latency(&self) -> Duration {
        Duration::from_millis(self.analysis_latency_ms)
    }

    /// Settings for tests: in-memory storage, no latency, fixed seed
    pub fn for_tests() -> Self {
        Self {
            jwt_secret: "test-secret".to_string(),
            analysis_latency_ms: 0,
            rng_seed: Some(42),
            ..Self::default()
        }
    }
}
