//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `PAYPAL_COMMERCE` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use paypal_commerce::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {:?}", config.server.socket_addr());
//! ```

mod error;
mod paypal;
mod redis;
mod server;
mod webhooks;

pub use error::{ConfigError, ValidationError};
pub use paypal::PayPalConfig;
pub use redis::RedisConfig;
pub use server::{Environment, ServerConfig};
pub use webhooks::{WebhookConfig, DEFAULT_EVENT_TYPES};

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// PayPal REST credentials and client settings
    pub paypal: PayPalConfig,

    /// Redis configuration; absent selects in-memory stores
    #[serde(default)]
    pub redis: RedisConfig,

    /// Webhook endpoint, verification and dedup settings
    #[serde(default)]
    pub webhooks: WebhookConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `PAYPAL_COMMERCE` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `PAYPAL_COMMERCE__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `PAYPAL_COMMERCE__PAYPAL__CLIENT_ID=...` -> `paypal.client_id = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Required environment variables are missing
    /// - Values cannot be parsed into expected types
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("PAYPAL_COMMERCE")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// Live PayPal credentials are only accepted in production so a staging
    /// box cannot charge real buyers.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.paypal.validate()?;
        self.redis.validate()?;
        self.webhooks.validate()?;
        if !self.paypal.sandbox && !self.server.is_production() {
            return Err(ValidationError::LiveCredentialsOutsideProduction);
        }
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Helper to set environment variables for testing
    /// Uses double underscores to separate nested config values
    fn set_minimal_env() {
        env::set_var("PAYPAL_COMMERCE__PAYPAL__CLIENT_ID", "AaBbCc");
        env::set_var("PAYPAL_COMMERCE__PAYPAL__CLIENT_SECRET", "EeFfGg");
    }

    /// Helper to clear environment variables after testing
    fn clear_env() {
        env::remove_var("PAYPAL_COMMERCE__PAYPAL__CLIENT_ID");
        env::remove_var("PAYPAL_COMMERCE__PAYPAL__CLIENT_SECRET");
        env::remove_var("PAYPAL_COMMERCE__PAYPAL__SANDBOX");
        env::remove_var("PAYPAL_COMMERCE__REDIS__URL");
        env::remove_var("PAYPAL_COMMERCE__SERVER__PORT");
        env::remove_var("PAYPAL_COMMERCE__SERVER__ENVIRONMENT");
        env::remove_var("PAYPAL_COMMERCE__WEBHOOKS__VERIFY_SIGNATURES");
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("PAYPAL_COMMERCE__REDIS__URL", "redis://localhost:6379");
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.paypal.client_id, "AaBbCc");
        assert_eq!(config.redis.url, "redis://localhost:6379");
    }

    #[test]
    fn test_validate_minimal_config() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.validate().is_ok());
        assert!(!config.redis.is_enabled());
        assert!(config.webhooks.verify_signatures);
    }

    #[test]
    fn test_server_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.environment, Environment::Development);
    }

    #[test]
    fn test_live_credentials_outside_production_rejected() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("PAYPAL_COMMERCE__PAYPAL__SANDBOX", "false");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(matches!(
            config.validate(),
            Err(ValidationError::LiveCredentialsOutsideProduction)
        ));
    }

    #[test]
    fn test_is_production() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("PAYPAL_COMMERCE__SERVER__ENVIRONMENT", "production");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.is_production());
    }

    #[test]
    fn test_verification_can_be_disabled() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("PAYPAL_COMMERCE__WEBHOOKS__VERIFY_SIGNATURES", "false");
        let result = AppConfig::load();
        clear_env();

        assert!(!result.unwrap().webhooks.verify_signatures);
    }
}
