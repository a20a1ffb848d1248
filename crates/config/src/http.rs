use crate::ConfigError;

/// Configuration for the management HTTP API (health, metrics, version):
/// host/port/body-limit for an axum-backed server.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Host address to bind the management API to.
    ///
    /// Env: XCM_MONITOR_HTTP_BIND_HOST
    /// Default: 127.0.0.1
    pub bind_host: String,

    /// Port to bind the management API to.
    ///
    /// Env: XCM_MONITOR_HTTP_PORT
    /// Default: 8080
    pub port: u16,

    /// Maximum request body size in bytes.
    ///
    /// Env: XCM_MONITOR_HTTP_REQUEST_LIMIT
    /// Default: 512000 (500kb)
    pub request_limit: usize,
}

fn default_bind_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_limit() -> usize {
    512_000
}

impl HttpConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::ValidateError(
                "HTTP port cannot be 0".to_string(),
            ));
        }

        self.bind_host.parse::<std::net::IpAddr>().map_err(|e| {
            ConfigError::ValidateError(format!(
                "Invalid bind host '{}': {}. Must be a valid IP address (IPv4 or IPv6)",
                self.bind_host, e
            ))
        })?;

        if self.request_limit == 0 {
            return Err(ConfigError::ValidateError(
                "Request limit cannot be 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_host: default_bind_host(),
            port: default_port(),
            request_limit: default_request_limit(),
        }
    }
}
