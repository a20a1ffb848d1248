use crate::ConfigError;
use url::Url;

/// Configuration for the optional webhook delivery sink.
#[derive(Debug, Clone)]
pub struct NotifyConfig {
    /// HTTP(S) endpoint every waypoint notification is POSTed to. When
    /// unset, the service falls back to the structured-logging notifier
    /// only.
    ///
    /// Env: XCM_MONITOR_WEBHOOK_URL
    /// Default: unset
    pub webhook_url: Option<String>,

    /// Request timeout for webhook deliveries, in milliseconds.
    ///
    /// Env: XCM_MONITOR_WEBHOOK_TIMEOUT_MS
    /// Default: 5000
    pub webhook_timeout_ms: u64,
}

fn default_webhook_timeout_ms() -> u64 {
    5_000
}

impl NotifyConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.webhook_url {
            let parsed = Url::parse(url).map_err(|e| {
                ConfigError::ValidateError(format!("invalid webhook_url '{url}': {e}"))
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ConfigError::ValidateError(format!(
                    "webhook_url '{url}' must use http or https"
                )));
            }
        }

        if self.webhook_timeout_ms == 0 {
            return Err(ConfigError::ValidateError(
                "webhook_timeout_ms must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            webhook_timeout_ms: default_webhook_timeout_ms(),
        }
    }
}
