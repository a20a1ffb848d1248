use crate::ConfigError;
use std::time::Duration;

/// Configuration for the matching engine and subscription caps.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum number of concurrently-registered ephemeral subscriptions.
    ///
    /// Env: XCM_MONITOR_SUBSCRIPTION_MAX_EPHEMERAL
    /// Default: 10000
    pub subscription_max_ephemeral: u32,

    /// Maximum number of concurrently-registered persistent subscriptions.
    ///
    /// Env: XCM_MONITOR_SUBSCRIPTION_MAX_PERSISTENT
    /// Default: 10000
    pub subscription_max_persistent: u32,

    /// Cadence, in milliseconds, of the pending-entry sweep.
    ///
    /// Env: XCM_MONITOR_SCHEDULER_FREQUENCY_MS
    /// Default: 30000. Must be >= 1000.
    pub scheduler_frequency_ms: u32,

    /// Minimum age, in milliseconds, before a stale entry is eligible for
    /// sweep regardless of its own `outboundTTL` (a floor, not the TTL
    /// itself — see the engine for how per-entry TTLs are tracked).
    ///
    /// Env: XCM_MONITOR_SWEEP_EXPIRY_MS
    /// Default: 20000. Must be >= 20000.
    pub sweep_expiry_ms: u32,

    /// Backoff, in milliseconds, before a failed observer leg is retried.
    ///
    /// Env: XCM_MONITOR_SUB_ERROR_RETRY_MS
    /// Default: 5000
    pub sub_error_retry_ms: u32,

    /// Default outbound TTL applied to a subscription that does not
    /// specify one explicitly.
    ///
    /// Env: XCM_MONITOR_DEFAULT_OUTBOUND_TTL_MS
    /// Default: 21600000 (6 hours)
    pub default_outbound_ttl_ms: u64,
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

impl EngineConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.scheduler_frequency_ms < 1_000 {
            return Err(ConfigError::ValidateError(
                "scheduler_frequency_ms must be >= 1000".to_string(),
            ));
        }

        if self.sweep_expiry_ms < 20_000 {
            return Err(ConfigError::ValidateError(
                "sweep_expiry_ms must be >= 20000".to_string(),
            ));
        }

        if self.default_outbound_ttl_ms == 0 {
            return Err(ConfigError::ValidateError(
                "default_outbound_ttl_ms must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn scheduler_frequency(&self) -> Duration {
        Duration::from_millis(self.scheduler_frequency_ms as u64)
    }

    pub fn sweep_expiry(&self) -> Duration {
        Duration::from_millis(self.sweep_expiry_ms as u64)
    }

    pub fn sub_error_retry(&self) -> Duration {
        Duration::from_millis(self.sub_error_retry_ms as u64)
    }

    pub fn default_outbound_ttl(&self) -> Duration {
        Duration::from_millis(self.default_outbound_ttl_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            subscription_max_ephemeral: default_subscription_max_ephemeral(),
            subscription_max_persistent: default_subscription_max_persistent(),
            scheduler_frequency_ms: default_scheduler_frequency_ms(),
            sweep_expiry_ms: default_sweep_expiry_ms(),
            sub_error_retry_ms: default_sub_error_retry_ms(),
            default_outbound_ttl_ms: default_outbound_ttl_ms(),
        }
    }
}
