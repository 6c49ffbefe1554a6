//! Configuration for the WES server.
//!
//! Supports YAML file and environment variable overrides, the same layering
//! as the teacher framework's `config.rs`: a `Config` struct with
//! `#[serde(default)]` throughout, loaded via the `config` crate.

use serde::Deserialize;
use std::time::Duration;

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub bus: BusConfig,
    pub thresholds: ThresholdConfig,
    pub outbox: OutboxConfig,
    pub idempotency: IdempotencyConfig,
    pub retry: RetryPolicyConfig,
    pub services: ServiceUrlsConfig,
    pub tracing_enabled: bool,
    pub log_level: String,
    pub environment: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            bus: BusConfig::default(),
            thresholds: ThresholdConfig::default(),
            outbox: OutboxConfig::default(),
            idempotency: IdempotencyConfig::default(),
            retry: RetryPolicyConfig::default(),
            services: ServiceUrlsConfig::default(),
            tracing_enabled: false,
            log_level: "info".to_string(),
            environment: "development".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from an optional YAML file plus environment
    /// variable overrides, mirroring spec §6.5's recognized keys.
    pub fn load() -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Ok(path) = std::env::var("WES_CONFIG") {
            builder = builder.add_source(config::File::with_name(&path));
        }
        let builder = builder
            .add_source(
                config::Environment::default()
                    .try_parsing(true)
                    .separator("__"),
            )
            .set_override_option("server.addr", std::env::var("SERVER_ADDR").ok())?
            .set_override_option("storage.uri", std::env::var("MONGODB_URI").ok())?
            .set_override_option("storage.database", std::env::var("MONGODB_DATABASE").ok())?
            .set_override_option("bus.brokers", std::env::var("KAFKA_BROKERS").ok())?
            .set_override_option(
                "thresholds.high_value_threshold",
                std::env::var("HIGH_VALUE_THRESHOLD").ok(),
            )?
            .set_override_option(
                "thresholds.oversized_weight_threshold",
                std::env::var("OVERSIZED_WEIGHT_THRESHOLD").ok(),
            )?
            .set_override_option("log_level", std::env::var("LOG_LEVEL").ok())?
            .set_override_option("environment", std::env::var("ENVIRONMENT").ok())?
            .set_override_option(
                "tracing_enabled",
                std::env::var("TRACING_ENABLED").ok().map(|v| v == "true"),
            )?
            .set_override_option("services.labor_url", std::env::var("LABOR_SERVICE_URL").ok())?
            .set_override_option("services.inventory_url", std::env::var("INVENTORY_SERVICE_URL").ok())?;
        builder.build()?.try_deserialize()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Storage configuration. `uri` is the MongoDB connection URI (spec §6.5
/// `MONGODB_URI`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub uri: String,
    pub database: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            uri: "mongodb://localhost:27017".to_string(),
            database: "wes".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    pub brokers: String,
    pub temporal_host: String,
    pub temporal_namespace: String,
    pub otel_exporter_otlp_endpoint: Option<String>,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            brokers: "localhost:9092".to_string(),
            temporal_host: "localhost:7233".to_string(),
            temporal_namespace: "default".to_string(),
            otel_exporter_otlp_endpoint: None,
        }
    }
}

/// Classification thresholds (spec §3.2, §4.3, §6.5). Passed as an explicit
/// record rather than read from process-wide globals (spec §9 "Config as
/// explicit record").
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    pub high_value_threshold: f64,
    pub oversized_weight_threshold: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            high_value_threshold: 500.0,
            oversized_weight_threshold: 30.0,
        }
    }
}

/// Outbox publisher configuration (spec §4.1).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutboxConfig {
    pub batch_size: usize,
    pub poll_interval_secs: u64,
    pub max_retries_before_poison: u32,
    pub initial_backoff_secs: u64,
    pub backoff_multiplier: f64,
    pub max_backoff_secs: u64,
}

impl Default for OutboxConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            poll_interval_secs: 1,
            max_retries_before_poison: 10,
            initial_backoff_secs: 2,
            backoff_multiplier: 2.0,
            max_backoff_secs: 300,
        }
    }
}

impl OutboxConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Exponential backoff delay before the `retries`-th retry (spec §4.1:
    /// "retried with exponential backoff"), capped at `max_backoff_secs`.
    pub fn backoff_delay(&self, retries: u32) -> Duration {
        let secs = self.initial_backoff_secs as f64 * self.backoff_multiplier.powi(retries as i32);
        Duration::from_secs_f64(secs.min(self.max_backoff_secs as f64))
    }
}

/// Idempotency-key configuration (spec §4.2).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IdempotencyConfig {
    pub ttl_hours: i64,
    pub max_key_length: usize,
}

impl Default for IdempotencyConfig {
    fn default() -> Self {
        Self {
            ttl_hours: 24,
            max_key_length: 255,
        }
    }
}

/// Base URLs for the external services consumed per spec §6.3.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceUrlsConfig {
    pub labor_url: String,
    pub inventory_url: String,
}

impl Default for ServiceUrlsConfig {
    fn default() -> Self {
        Self {
            labor_url: "http://localhost:8081".to_string(),
            inventory_url: "http://localhost:8082".to_string(),
        }
    }
}

/// Activity retry policy (spec §4.5.8).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryPolicyConfig {
    pub initial_secs: u64,
    pub backoff_multiplier: f64,
    pub max_secs: u64,
    pub max_attempts: u32,
    pub heartbeat_secs: u64,
}

impl Default for RetryPolicyConfig {
    fn default() -> Self {
        Self {
            initial_secs: 1,
            backoff_multiplier: 2.0,
            max_secs: 60,
            max_attempts: 3,
            heartbeat_secs: 30,
        }
    }
}
