//! Redis configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Redis configuration
///
/// An empty URL selects the in-memory stores, which only hold within a
/// single server process.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    /// Redis connection URL
    #[serde(default)]
    pub url: String,

    /// Prefix applied to every key
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Connection timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl RedisConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// True when a Redis URL is configured
    pub fn is_enabled(&self) -> bool {
        !self.url.trim().is_empty()
    }

    /// Validate Redis configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.is_enabled() {
            return Ok(());
        }
        if !self.url.starts_with("redis://") && !self.url.starts_with("rediss://") {
            return Err(ValidationError::InvalidRedisUrl);
        }
        Ok(())
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            key_prefix: default_key_prefix(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_key_prefix() -> String {
    "paypal_commerce:".to_string()
}

fn default_timeout() -> u64 {
    5
}
