//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid host address")]
    InvalidHost,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid Redis URL format")]
    InvalidRedisUrl,

    #[error("Invalid PayPal API base URL")]
    InvalidPayPalUrl,

    #[error("PayPal request id TTL must be positive")]
    InvalidRequestIdTtl,

    #[error("Webhook URL must use HTTPS")]
    WebhookUrlMustBeHttps,

    #[error("Webhook dedup TTL must be positive")]
    InvalidDedupTtl,

    #[error("Live PayPal credentials require the production environment")]
    LiveCredentialsOutsideProduction,
}
