use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration from environment: {0}")]
    EnvError(#[from] envy::Error),

    #[error("Failed to parse chain URLs: {0}")]
    ChainUrlsParseError(#[from] serde_json::Error),

    #[error("Invalid configuration value: {0}")]
    ValidateError(String),
}
