// Layered configuration (defaults → file → env)

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main settings structure containing all configuration options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub publisher: PublisherConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    pub url: String,
}

/// Where the debounce gate keeps its records
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GateBackend {
    /// Shared across every process using the same Redis instance
    Redis,
    /// Local to this process
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublisherConfig {
    pub debounce_key: String,
    /// 0 disables the gate
    pub debounce_ttl_seconds: u64,
    pub max_items_per_run: usize,
    pub periodic_interval_seconds: u64,
    /// Initial value of the host-persisted periodic flag
    #[serde(default)]
    pub enable_periodic: bool,
    #[serde(default = "default_content_types")]
    pub default_content_types: Vec<String>,
    #[serde(default)]
    pub extra_content_types: Vec<String>,
    #[serde(default)]
    pub excluded_content_types: Vec<String>,
    #[serde(default = "default_gate_backend")]
    pub gate_backend: GateBackend,
}

fn default_content_types() -> Vec<String> {
    vec!["post".to_string(), "page".to_string()]
}

fn default_gate_backend() -> GateBackend {
    GateBackend::Redis
}

impl PublisherConfig {
    pub fn debounce_ttl(&self) -> Duration {
        Duration::from_secs(self.debounce_ttl_seconds)
    }

    pub fn periodic_interval(&self) -> Duration {
        Duration::from_secs(self.periodic_interval_seconds)
    }
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            debounce_key: "content_publisher_last_check".to_string(),
            debounce_ttl_seconds: 300,
            max_items_per_run: 10,
            periodic_interval_seconds: 3600,
            enable_periodic: false,
            default_content_types: default_content_types(),
            extra_content_types: Vec::new(),
            excluded_content_types: Vec::new(),
            gate_backend: default_gate_backend(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    pub log_level: String,
    pub metrics_port: u16,
    pub tracing_endpoint: Option<String>,
}

impl Settings {
    /// Load configuration with layered precedence: defaults → file → env
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from_path<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Not committed to git
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("publisher.default_content_types")
                    .with_list_parse_key("publisher.extra_content_types")
                    .with_list_parse_key("publisher.excluded_content_types")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.database.url.is_empty() {
            return Err("Database URL cannot be empty".to_string());
        }
        if self.database.max_connections == 0 {
            return Err("Database max_connections must be greater than 0".to_string());
        }

        if self.publisher.gate_backend == GateBackend::Redis && self.redis.url.is_empty() {
            return Err("Redis URL cannot be empty when gate_backend is 'redis'".to_string());
        }

        if self.publisher.debounce_key.trim().is_empty() {
            return Err("Publisher debounce_key cannot be empty".to_string());
        }
        if self.publisher.max_items_per_run == 0 {
            return Err("Publisher max_items_per_run must be greater than 0".to_string());
        }
        if self.publisher.periodic_interval_seconds == 0 {
            return Err("Publisher periodic_interval_seconds must be greater than 0".to_string());
        }

        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "postgresql://localhost/content".to_string(),
                max_connections: 10,
                min_connections: 1,
                connect_timeout_seconds: 30,
            },
            redis: RedisConfig {
                url: "redis://localhost:6379".to_string(),
            },
            publisher: PublisherConfig::default(),
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                metrics_port: 9090,
                tracing_endpoint: None,
            },
        }
    }
}
