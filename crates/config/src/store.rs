use crate::ConfigError;

/// Configuration for the durable subscription store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// File path backing the JSON-lines subscription store.
    ///
    /// Env: XCM_MONITOR_SUBSCRIPTION_STORE_PATH
    /// Default: ./data/subscriptions.jsonl
    pub subscription_store_path: String,

    /// File path backing the JSON-lines pending-entry store.
    ///
    /// Env: XCM_MONITOR_PENDING_STORE_PATH
    /// Default: ./data/pending.jsonl
    pub pending_store_path: String,
}

fn default_subscription_store_path() -> String {
    "./data/subscriptions.jsonl".to_string()
}

fn default_pending_store_path() -> String {
    "./data/pending.jsonl".to_string()
}

impl StoreConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.subscription_store_path.trim().is_empty() {
            return Err(ConfigError::ValidateError(
                "subscription_store_path cannot be empty".to_string(),
            ));
        }

        if self.pending_store_path.trim().is_empty() {
            return Err(ConfigError::ValidateError(
                "pending_store_path cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            subscription_store_path: default_subscription_store_path(),
            pending_store_path: default_pending_store_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_store_config() {
        let config = StoreConfig::default();
        assert_eq!(config.subscription_store_path, "./data/subscriptions.jsonl");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_path_rejected() {
        let config = StoreConfig {
            subscription_store_path: "  ".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
