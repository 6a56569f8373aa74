//! Webhook configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Webhook endpoint, verification and dedup settings
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookConfig {
    /// Public URL PayPal delivers to, e.g. `https://shop.example/webhooks/paypal`
    pub url: Option<String>,

    /// Verify transmission signatures through PayPal
    #[serde(default = "default_verify")]
    pub verify_signatures: bool,

    /// How long processed event ids are remembered
    #[serde(default = "default_dedup_ttl")]
    pub dedup_ttl_secs: u64,

    /// A waiting simulation older than this reports as timed out
    #[serde(default = "default_simulation_timeout")]
    pub simulation_timeout_secs: i64,

    /// Event types to subscribe to (comma-separated)
    pub event_types: Option<String>,
}

/// Event types subscribed to when none are configured.
pub const DEFAULT_EVENT_TYPES: &[&str] = &[
    "CHECKOUT.ORDER.APPROVED",
    "CHECKOUT.ORDER.COMPLETED",
    "PAYMENT.AUTHORIZATION.CREATED",
    "PAYMENT.AUTHORIZATION.VOIDED",
    "PAYMENT.CAPTURE.COMPLETED",
    "PAYMENT.CAPTURE.DENIED",
    "PAYMENT.CAPTURE.PENDING",
    "PAYMENT.CAPTURE.REFUNDED",
    "PAYMENT.CAPTURE.REVERSED",
    "PAYMENT.ORDER.CANCELLED",
    "CUSTOMER.DISPUTE.CREATED",
    "CUSTOMER.DISPUTE.RESOLVED",
    "VAULT.PAYMENT-TOKEN.CREATED",
    "VAULT.PAYMENT-TOKEN.DELETED",
];

impl WebhookConfig {
    pub fn dedup_ttl(&self) -> Duration {
        Duration::from_secs(self.dedup_ttl_secs)
    }

    /// Subscribed event types, falling back to the defaults
    pub fn event_types_list(&self) -> Vec<String> {
        let configured: Vec<String> = self
            .event_types
            .as_ref()
            .map(|s| {
                s.split(',')
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        if configured.is_empty() {
            DEFAULT_EVENT_TYPES.iter().map(|t| t.to_string()).collect()
        } else {
            configured
        }
    }

    /// Validate webhook configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(url) = &self.url {
            if !url.starts_with("https://") {
                return Err(ValidationError::WebhookUrlMustBeHttps);
            }
        }
        if self.dedup_ttl_secs == 0 {
            return Err(ValidationError::InvalidDedupTtl);
        }
        if self.simulation_timeout_secs <= 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: None,
            verify_signatures: default_verify(),
            dedup_ttl_secs: default_dedup_ttl(),
            simulation_timeout_secs: default_simulation_timeout(),
            event_types: None,
        }
    }
}

fn default_verify() -> bool {
    true
}

fn default_dedup_ttl() -> u64 {
    24 * 60 * 60
}

fn default_simulation_timeout() -> i64 {
    10 * 60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WebhookConfig::default();
        assert!(config.verify_signatures);
        assert_eq!(config.dedup_ttl(), Duration::from_secs(86_400));
        assert_eq!(config.simulation_timeout_secs, 600);
        assert_eq!(config.event_types_list().len(), DEFAULT_EVENT_TYPES.len());
    }

    #[test]
    fn test_event_types_parsing() {
        let config = WebhookConfig {
            event_types: Some("PAYMENT.CAPTURE.COMPLETED, CHECKOUT.ORDER.APPROVED,".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.event_types_list(),
            vec!["PAYMENT.CAPTURE.COMPLETED", "CHECKOUT.ORDER.APPROVED"]
        );
    }

    #[test]
    fn test_validation_requires_https_url() {
        let config = WebhookConfig {
            url: Some("http://shop.test/webhooks/paypal".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = WebhookConfig {
            url: Some("https://shop.test/webhooks/paypal".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
