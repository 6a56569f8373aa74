//! PayPal API configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;

const SANDBOX_API: &str = "https://api-m.sandbox.paypal.com";
const LIVE_API: &str = "https://api-m.paypal.com";

/// PayPal REST app credentials and client behaviour
#[derive(Debug, Clone, Deserialize)]
pub struct PayPalConfig {
    /// REST app client id
    pub client_id: String,

    /// REST app secret
    pub client_secret: SecretString,

    /// Use the sandbox API
    #[serde(default = "default_sandbox")]
    pub sandbox: bool,

    /// Overrides the sandbox/live base URL (tests, proxies)
    pub api_base_url: Option<String>,

    /// Brand name shown on the PayPal checkout page
    pub brand_name: Option<String>,

    /// Merchant account email, used for support logs only
    pub merchant_email: Option<String>,

    /// Partner attribution (BN code) header value
    pub partner_attribution_id: Option<String>,

    /// How long a stored PayPal-Request-Id stays reusable
    #[serde(default = "default_request_id_ttl")]
    pub request_id_ttl_secs: u64,

    /// Refresh the OAuth token this many seconds before it expires
    #[serde(default = "default_token_margin")]
    pub token_expiry_margin_secs: i64,

    /// Per-request HTTP timeout
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,
}

impl PayPalConfig {
    /// Base URL for API calls
    pub fn base_url(&self) -> &str {
        match &self.api_base_url {
            Some(url) => url.trim_end_matches('/'),
            None if self.sandbox => SANDBOX_API,
            None => LIVE_API,
        }
    }

    /// Validate PayPal configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.client_id.trim().is_empty() {
            return Err(ValidationError::MissingRequired("PAYPAL_CLIENT_ID"));
        }
        if self.client_secret.expose_secret().trim().is_empty() {
            return Err(ValidationError::MissingRequired("PAYPAL_CLIENT_SECRET"));
        }
        if let Some(url) = &self.api_base_url {
            if !url.starts_with("https://") && !url.starts_with("http://") {
                return Err(ValidationError::InvalidPayPalUrl);
            }
        }
        if self.request_id_ttl_secs == 0 {
            return Err(ValidationError::InvalidRequestIdTtl);
        }
        if self.http_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for PayPalConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: SecretString::new(String::new()),
            sandbox: default_sandbox(),
            api_base_url: None,
            brand_name: None,
            merchant_email: None,
            partner_attribution_id: None,
            request_id_ttl_secs: default_request_id_ttl(),
            token_expiry_margin_secs: default_token_margin(),
            http_timeout_secs: default_http_timeout(),
        }
    }
}

fn default_sandbox() -> bool {
    true
}

fn default_request_id_ttl() -> u64 {
    7 * 24 * 60 * 60
}

fn default_token_margin() -> i64 {
    60
}

fn default_http_timeout() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> PayPalConfig {
        PayPalConfig {
            client_id: "AaBbCc".to_string(),
            client_secret: SecretString::new("EeFfGg".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = PayPalConfig::default();
        assert!(config.sandbox);
        assert_eq!(config.request_id_ttl_secs, 604_800);
        assert_eq!(config.token_expiry_margin_secs, 60);
    }

    #[test]
    fn test_base_url_follows_sandbox_flag() {
        let mut config = configured();
        assert_eq!(config.base_url(), SANDBOX_API);

        config.sandbox = false;
        assert_eq!(config.base_url(), LIVE_API);

        config.api_base_url = Some("http://127.0.0.1:9000/".to_string());
        assert_eq!(config.base_url(), "http://127.0.0.1:9000");
    }

    #[test]
    fn test_validation_requires_credentials() {
        assert!(PayPalConfig::default().validate().is_err());
        assert!(configured().validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_override() {
        let config = PayPalConfig {
            api_base_url: Some("ftp://paypal".to_string()),
            ..configured()
        };
        assert!(config.validate().is_err());
    }
}
