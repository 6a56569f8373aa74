//! PayPal gateway port.
//!
//! Defines the contract for the PayPal REST API (Orders v2, Payments v2,
//! Webhooks v1, Vault v3). The HTTP implementation lives in
//! `adapters::paypal`; tests use `MockPayPalGateway`.
//!
//! # Design
//!
//! - **Typed errors**: non-2xx responses become [`PayPalApiError`] carrying
//!   PayPal's `name`, `details` and `links`
//! - **Idempotent creation**: callers pass a `PayPal-Request-Id`
//! - **Token refresh**: implementations retry once after a 401

use std::fmt;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::foundation::Money;
use crate::domain::order::{Capture, OrderIntent, PayPalOrder};
use crate::domain::vault::PaymentToken;
use crate::domain::webhook::{TransmissionHeaders, WebhookEvent, WebhookRegistration};

/// Port for the PayPal REST API.
#[async_trait]
pub trait PayPalGateway: Send + Sync {
    /// Create an order. `request_id` is sent as `PayPal-Request-Id`.
    async fn create_order(
        &self,
        request: &CreateOrderRequest,
        request_id: &str,
    ) -> Result<PayPalOrder, GatewayError>;

    /// Fetch an order by id (the return URL `token` is the order id).
    async fn get_order(&self, order_id: &str) -> Result<PayPalOrder, GatewayError>;

    /// Capture an approved `CAPTURE`-intent order.
    async fn capture_order(
        &self,
        order_id: &str,
        request_id: Option<&str>,
    ) -> Result<PayPalOrder, GatewayError>;

    /// Authorize an approved `AUTHORIZE`-intent order.
    async fn authorize_order(&self, order_id: &str) -> Result<PayPalOrder, GatewayError>;

    /// Capture a previously created authorization.
    async fn capture_authorization(
        &self,
        authorization_id: &str,
        request_id: Option<&str>,
    ) -> Result<Capture, GatewayError>;

    /// Register a webhook for the given URL and event types.
    async fn register_webhook(
        &self,
        url: &str,
        event_types: &[String],
    ) -> Result<WebhookRegistration, GatewayError>;

    /// List webhooks registered for this app.
    async fn list_webhooks(&self) -> Result<Vec<WebhookRegistration>, GatewayError>;

    async fn delete_webhook(&self, webhook_id: &str) -> Result<(), GatewayError>;

    /// Ask PayPal to send a synthetic event to a registered webhook.
    ///
    /// Returns the event PayPal will deliver; its id is what the simulation waits for.
    async fn simulate_webhook(
        &self,
        webhook_id: &str,
        event_type: &str,
        event_version: &str,
    ) -> Result<WebhookEvent, GatewayError>;

    /// Verify a delivery through PayPal's verify endpoint.
    ///
    /// Returns `Ok(false)` when PayPal answers `FAILURE`.
    async fn verify_webhook_signature(
        &self,
        headers: &TransmissionHeaders,
        webhook_id: &str,
        event: &serde_json::Value,
    ) -> Result<bool, GatewayError>;

    /// List vaulted payment tokens for a PayPal vault customer.
    async fn payment_tokens(&self, customer_id: &str) -> Result<Vec<PaymentToken>, GatewayError>;
}

// ════════════════════════════════════════════════════════════════════════════════
// Request types
// ════════════════════════════════════════════════════════════════════════════════

/// Body of `POST /v2/checkout/orders`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub intent: OrderIntent,
    pub purchase_units: Vec<PurchaseUnitRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer: Option<Payer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_source: Option<PaymentSourceRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_context: Option<ApplicationContext>,
}

/// Checkout experience settings: brand shown to the buyer and where
/// PayPal sends them back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseUnitRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<String>,
    /// Local order id; links the PayPal order back to the shop.
    pub custom_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_id: Option<String>,
    pub amount: AmountWithBreakdown,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<ItemRequest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmountWithBreakdown {
    pub currency_code: String,
    pub value: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<AmountBreakdown>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AmountBreakdown {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_total: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_total: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<Money>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRequest {
    pub name: String,
    /// PayPal expects the quantity as a string.
    pub quantity: String,
    pub unit_amount: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<PayerName>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayerName {
    pub given_name: String,
    pub surname: String,
}

/// Vaulted source used to charge without buyer interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentSourceRequest {
    Paypal { vault_id: String },
    Card { vault_id: String },
}

// ════════════════════════════════════════════════════════════════════════════════
// Errors
// ════════════════════════════════════════════════════════════════════════════════

/// One entry of PayPal's `details[]` error array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub issue: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// HATEOAS link as returned in PayPal responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiLink {
    pub href: String,
    pub rel: String,
    #[serde(default)]
    pub method: Option<String>,
}

/// A non-2xx response from the PayPal API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayPalApiError {
    pub status: u16,
    pub name: String,
    pub message: String,
    pub debug_id: Option<String>,
    pub details: Vec<ApiErrorDetail>,
    pub links: Vec<ApiLink>,
}

impl PayPalApiError {
    pub fn new(status: u16, name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            name: name.into(),
            message: message.into(),
            debug_id: None,
            details: Vec::new(),
            links: Vec::new(),
        }
    }

    /// The `information_link` relation, when PayPal sends one.
    pub fn information_link(&self) -> Option<&str> {
        self.links
            .iter()
            .find(|link| link.rel == "information_link")
            .map(|link| link.href.as_str())
    }

    /// True when any detail carries the given issue code.
    pub fn has_issue(&self, issue: &str) -> bool {
        self.details.iter().any(|d| d.issue == issue)
    }

    /// Rate limits and server errors.
    pub fn is_retryable(&self) -> bool {
        self.status == 429 || self.status >= 500
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }
}

impl fmt::Display for PayPalApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.message)?;
        for detail in &self.details {
            match &detail.description {
                Some(description) => write!(f, " [{}: {}]", detail.issue, description)?,
                None => write!(f, " [{}]", detail.issue)?,
            }
        }
        if let Some(link) = self.information_link() {
            write!(f, " {}", link)?;
        }
        Ok(())
    }
}

impl std::error::Error for PayPalApiError {}

/// Errors from the PayPal gateway.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// PayPal answered with a non-2xx status.
    #[error("PayPal API error: {0}")]
    Api(#[from] PayPalApiError),

    /// The request never produced a response.
    #[error("Network error: {0}")]
    Network(String),

    /// A 2xx body could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The OAuth2 token could not be obtained.
    #[error("Authentication failed: {0}")]
    Authentication(String),
}

impl GatewayError {
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::Network(_) => true,
            GatewayError::Api(err) => err.is_retryable(),
            GatewayError::Decode(_) | GatewayError::Authentication(_) => false,
        }
    }

    /// The PayPal `debug_id`, for logs and support tickets.
    pub fn debug_id(&self) -> Option<&str> {
        match self {
            GatewayError::Api(err) => err.debug_id.as_deref(),
            _ => None,
        }
    }

    pub fn api(&self) -> Option<&PayPalApiError> {
        match self {
            GatewayError::Api(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unprocessable() -> PayPalApiError {
        PayPalApiError {
            status: 422,
            name: "UNPROCESSABLE_ENTITY".to_string(),
            message: "The requested action could not be performed.".to_string(),
            debug_id: Some("f1c1b7d6b5e1a".to_string()),
            details: vec![ApiErrorDetail {
                field: None,
                value: None,
                location: Some("body".to_string()),
                issue: "ORDER_ALREADY_CAPTURED".to_string(),
                description: Some("Order already captured.".to_string()),
            }],
            links: vec![ApiLink {
                href: "https://developer.paypal.com/docs/api/orders/v2/#error-ORDER_ALREADY_CAPTURED"
                    .to_string(),
                rel: "information_link".to_string(),
                method: Some("GET".to_string()),
            }],
        }
    }

    #[test]
    fn display_appends_details_and_information_link() {
        let text = unprocessable().to_string();
        assert!(text.starts_with("UNPROCESSABLE_ENTITY: The requested action"));
        assert!(text.contains("[ORDER_ALREADY_CAPTURED: Order already captured.]"));
        assert!(text.ends_with("#error-ORDER_ALREADY_CAPTURED"));
    }

    #[test]
    fn display_without_link_is_name_and_message() {
        let err = PayPalApiError::new(500, "INTERNAL_SERVER_ERROR", "An internal server error occurred.");
        assert_eq!(err.to_string(), "INTERNAL_SERVER_ERROR: An internal server error occurred.");
    }

    #[test]
    fn classifies_status_codes() {
        assert!(PayPalApiError::new(429, "RATE_LIMIT_REACHED", "").is_retryable());
        assert!(PayPalApiError::new(503, "SERVICE_UNAVAILABLE", "").is_retryable());
        assert!(!unprocessable().is_retryable());
        assert!(PayPalApiError::new(401, "AUTHENTICATION_FAILURE", "").is_unauthorized());
    }

    #[test]
    fn gateway_error_exposes_debug_id() {
        let err = GatewayError::from(unprocessable());
        assert_eq!(err.debug_id(), Some("f1c1b7d6b5e1a"));
        assert!(err.api().unwrap().has_issue("ORDER_ALREADY_CAPTURED"));
        assert!(GatewayError::Network("reset".to_string()).is_retryable());
    }

    #[test]
    fn payment_source_serializes_as_tagged_object() {
        let source = PaymentSourceRequest::Paypal {
            vault_id: "8kk8451t".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&source).unwrap(),
            serde_json::json!({"paypal": {"vault_id": "8kk8451t"}})
        );
    }
}
