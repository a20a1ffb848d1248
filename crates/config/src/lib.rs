mod chains;
mod engine;
mod error;
mod http;
mod log;
mod metrics;
mod notify;
mod store;

pub use chains::{ChainUrl, ChainsConfig};
pub use engine::EngineConfig;
pub use error::ConfigError;
pub use http::HttpConfig;
pub use log::{LogConfig, LogError};
pub use metrics::{MetricsConfig, MetricsError};
pub use notify::NotifyConfig;
pub use store::StoreConfig;

use serde::Deserialize;

/// Flat structure for loading from environment variables.
/// This works better with envy than nested structs.
#[derive(Debug, Deserialize)]
struct EnvConfig {
    #[serde(default = "default_http_bind_host")]
    http_bind_host: String,

    #[serde(default = "default_http_port")]
    http_port: u16,

    #[serde(default = "default_http_request_limit")]
    http_request_limit: usize,

    #[serde(default = "default_log_level")]
    log_level: String,

    #[serde(default)]
    log_json: bool,

    #[serde(default)]
    log_strip_ansi: bool,

    #[serde(default)]
    log_write: bool,

    #[serde(default = "default_log_write_path")]
    log_write_path: String,

    #[serde(default = "default_log_write_max_file_size")]
    log_write_max_file_size: u64,

    #[serde(default = "default_log_write_max_files")]
    log_write_max_files: usize,

    #[serde(default = "default_chain_urls")]
    chain_urls: String,

    #[serde(default = "default_reconnect_initial_delay_ms")]
    reconnect_initial_delay_ms: u64,

    #[serde(default = "default_reconnect_max_delay_ms")]
    reconnect_max_delay_ms: u64,

    #[serde(default = "default_reconnect_request_timeout_ms")]
    reconnect_request_timeout_ms: u64,

    #[serde(default)]
    metrics_enabled: bool,

    #[serde(default = "default_metrics_prom_host")]
    metrics_prom_host: String,

    #[serde(default = "default_metrics_prom_port")]
    metrics_prom_port: u16,

    #[serde(default = "default_metrics_prometheus_prefix")]
    metrics_prometheus_prefix: String,

    #[serde(default = "default_metrics_loki_host")]
    metrics_loki_host: String,

    #[serde(default = "default_metrics_loki_port")]
    metrics_loki_port: u16,

    #[serde(default)]
    metrics_include_queryparams: bool,

    #[serde(default = "default_subscription_max_ephemeral")]
    subscription_max_ephemeral: u32,

    #[serde(default = "default_subscription_max_persistent")]
    subscription_max_persistent: u32,

    #[serde(default = "default_scheduler_frequency_ms")]
    scheduler_frequency_ms: u32,

    #[serde(default = "default_sweep_expiry_ms")]
    sweep_expiry_ms: u32,

    #[serde(default = "default_sub_error_retry_ms")]
    sub_error_retry_ms: u32,

    #[serde(default = "default_outbound_ttl_ms")]
    default_outbound_ttl_ms: u64,

    #[serde(default = "default_subscription_store_path")]
    subscription_store_path: String,

    #[serde(default = "default_pending_store_path")]
    pending_store_path: String,

    #[serde(default)]
    webhook_url: Option<String>,

    #[serde(default = "default_webhook_timeout_ms")]
    webhook_timeout_ms: u64,
}

fn default_http_bind_host() -> String {
    "127.0.0.1".to_string()
}
fn default_http_port() -> u16 {
    8080
}
fn default_http_request_limit() -> usize {
    512_000
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_write_path() -> String {
    "./logs".to_string()
}
fn default_log_write_max_file_size() -> u64 {
    5_242_880
}
fn default_log_write_max_files() -> usize {
    5
}
fn default_chain_urls() -> String {
    String::new()
}
fn default_reconnect_initial_delay_ms() -> u64 {
    100
}
fn default_reconnect_max_delay_ms() -> u64 {
    10_000
}
fn default_reconnect_request_timeout_ms() -> u64 {
    30_000
}
fn default_metrics_prom_host() -> String {
    "127.0.0.1".to_string()
}
fn default_metrics_prom_port() -> u16 {
    9100
}
fn default_metrics_prometheus_prefix() -> String {
    "xcm_monitor".to_string()
}
fn default_metrics_loki_host() -> String {
    "127.0.0.1".to_string()
}
fn default_metrics_loki_port() -> u16 {
    3100
}
fn default_subscription_max_ephemeral() -> u32 {
    10_000
}
fn default_subscription_max_persistent() -> u32 {
    10_000
}
fn default_scheduler_frequency_ms() -> u32 {
    30_000
}
fn default_sweep_expiry_ms() -> u32 {
    20_000
}
fn default_sub_error_retry_ms() -> u32 {
    5_000
}
fn default_outbound_ttl_ms() -> u64 {
    21_600_000
}
fn default_subscription_store_path() -> String {
    "./data/subscriptions.jsonl".to_string()
}
fn default_pending_store_path() -> String {
    "./data/pending.jsonl".to_string()
}
fn default_webhook_timeout_ms() -> u64 {
    5_000
}

/// Top-level configuration for the xcm-monitor service.
#[derive(Debug, Clone, Default)]
pub struct MonitorConfig {
    pub http: HttpConfig,
    pub log: LogConfig,
    pub chains: ChainsConfig,
    pub metrics: MetricsConfig,
    pub engine: EngineConfig,
    pub store: StoreConfig,
    pub notify: NotifyConfig,
}

impl MonitorConfig {
    /// Load configuration from environment variables prefixed `XCM_MONITOR_`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let env_config = envy::prefixed("XCM_MONITOR_").from_env::<EnvConfig>()?;

        let urls = if env_config.chain_urls.is_empty() {
            vec![]
        } else {
            serde_json::from_str(&env_config.chain_urls)?
        };

        let config = Self {
            http: HttpConfig {
                bind_host: env_config.http_bind_host,
                port: env_config.http_port,
                request_limit: env_config.http_request_limit,
            },
            log: LogConfig {
                level: env_config.log_level,
                json: env_config.log_json,
                strip_ansi: env_config.log_strip_ansi,
                write: env_config.log_write,
                write_path: env_config.log_write_path,
                write_max_file_size: env_config.log_write_max_file_size,
                write_max_files: env_config.log_write_max_files,
            },
            chains: ChainsConfig {
                urls,
                reconnect_initial_delay_ms: env_config.reconnect_initial_delay_ms,
                reconnect_max_delay_ms: env_config.reconnect_max_delay_ms,
                reconnect_request_timeout_ms: env_config.reconnect_request_timeout_ms,
            },
            metrics: MetricsConfig {
                enabled: env_config.metrics_enabled,
                prom_host: env_config.metrics_prom_host,
                prom_port: env_config.metrics_prom_port,
                prometheus_prefix: env_config.metrics_prometheus_prefix,
                loki_host: env_config.metrics_loki_host,
                loki_port: env_config.metrics_loki_port,
                include_queryparams: env_config.metrics_include_queryparams,
            },
            engine: EngineConfig {
                subscription_max_ephemeral: env_config.subscription_max_ephemeral,
                subscription_max_persistent: env_config.subscription_max_persistent,
                scheduler_frequency_ms: env_config.scheduler_frequency_ms,
                sweep_expiry_ms: env_config.sweep_expiry_ms,
                sub_error_retry_ms: env_config.sub_error_retry_ms,
                default_outbound_ttl_ms: env_config.default_outbound_ttl_ms,
            },
            store: StoreConfig {
                subscription_store_path: env_config.subscription_store_path,
                pending_store_path: env_config.pending_store_path,
            },
            notify: NotifyConfig {
                webhook_url: env_config.webhook_url,
                webhook_timeout_ms: env_config.webhook_timeout_ms,
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.http.validate()?;
        self.log
            .validate()
            .map_err(|e| ConfigError::ValidateError(e.to_string()))?;
        self.chains.validate()?;
        self.metrics.validate().map_err(|e| {
            ConfigError::ValidateError(e.to_string())
        })?;
        self.engine.validate()?;
        self.store.validate()?;
        self.notify.validate()?;
        Ok(())
    }
}
