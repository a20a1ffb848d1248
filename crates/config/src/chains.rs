use crate::ConfigError;
use serde::Deserialize;

/// A single chain's RPC endpoint and the `NetworkId` URN it is reachable
/// under.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ChainUrl {
    pub url: String,
    #[serde(rename = "networkId")]
    pub network_id: String,
}

/// Connection parameters shared by every chain's reconnecting RPC client.
#[derive(Debug, Clone)]
pub struct ChainsConfig {
    /// Chains to connect to and extract XCM activity from.
    ///
    /// Env: XCM_MONITOR_CHAIN_URLS
    /// Format: JSON array, e.g.
    /// `[{"url":"wss://rpc.polkadot.io","networkId":"urn:ocn:polkadot:0"}]`
    pub urls: Vec<ChainUrl>,

    /// Initial delay, in milliseconds, before the first reconnect attempt.
    ///
    /// Env: XCM_MONITOR_RECONNECT_INITIAL_DELAY_MS
    /// Default: 100
    pub reconnect_initial_delay_ms: u64,

    /// Maximum delay, in milliseconds, between reconnect attempts.
    ///
    /// Env: XCM_MONITOR_RECONNECT_MAX_DELAY_MS
    /// Default: 10000
    pub reconnect_max_delay_ms: u64,

    /// Per-request timeout, in milliseconds, for the chain RPC client.
    ///
    /// Env: XCM_MONITOR_RECONNECT_REQUEST_TIMEOUT_MS
    /// Default: 30000
    pub reconnect_request_timeout_ms: u64,
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

impl ChainsConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        for chain_url in &self.urls {
            let parsed = url::Url::parse(&chain_url.url).map_err(|e| {
                ConfigError::ValidateError(format!(
                    "Invalid chain URL '{}': {}",
                    chain_url.url, e
                ))
            })?;

            match parsed.scheme() {
                "ws" | "wss" | "http" | "https" => {}
                scheme => {
                    return Err(ConfigError::ValidateError(format!(
                        "Invalid URL scheme '{}' for chain URL '{}'. Must be ws://, wss://, http://, or https://",
                        scheme, chain_url.url
                    )));
                }
            }

            if chain_url.network_id.is_empty() {
                return Err(ConfigError::ValidateError(format!(
                    "Chain URL '{}' is missing a networkId",
                    chain_url.url
                )));
            }
        }

        Ok(())
    }
}

impl Default for ChainsConfig {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            reconnect_initial_delay_ms: default_reconnect_initial_delay_ms(),
            reconnect_max_delay_ms: default_reconnect_max_delay_ms(),
            reconnect_request_timeout_ms: default_reconnect_request_timeout_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_chains_config() {
        let config = ChainsConfig::default();
        assert!(config.urls.is_empty());
        assert_eq!(config.reconnect_initial_delay_ms, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_scheme() {
        let config = ChainsConfig {
            urls: vec![ChainUrl {
                url: "ftp://example.com".to_string(),
                network_id: "urn:ocn:polkadot:0".to_string(),
            }],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_network_id() {
        let config = ChainsConfig {
            urls: vec![ChainUrl {
                url: "wss://rpc.polkadot.io".to_string(),
                network_id: "".to_string(),
            }],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_multiple_chains() {
        let config = ChainsConfig {
            urls: vec![
                ChainUrl {
                    url: "wss://rpc.polkadot.io".to_string(),
                    network_id: "urn:ocn:polkadot:0".to_string(),
                },
                ChainUrl {
                    url: "wss://statemint-rpc.polkadot.io".to_string(),
                    network_id: "urn:ocn:polkadot:1000".to_string(),
                },
            ],
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
