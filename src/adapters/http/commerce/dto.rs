//! Data Transfer Objects for the commerce HTTP endpoints.
//!
//! Request types use `Deserialize`; response types use `Serialize`.

use serde::{Deserialize, Serialize};

use crate::application::handlers::webhooks::ProcessWebhookResult;
use crate::domain::foundation::LocalOrderId;
use crate::domain::webhook::WebhookRegistration;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Query string PayPal appends to the return URL.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutReturnQuery {
    /// PayPal order id.
    pub token: Option<String>,
    #[serde(rename = "PayerID")]
    pub payer_id: Option<String>,
}

/// Optional body for starting a webhook simulation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StartSimulationRequest {
    pub event_type: Option<String>,
    pub event_version: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Acknowledgement returned to PayPal for a webhook delivery.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WebhookAckResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handled: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched: Option<bool>,
}

impl WebhookAckResponse {
    fn status(status: &'static str) -> Self {
        Self {
            status,
            handled: None,
            failed: None,
            matched: None,
        }
    }
}

impl From<ProcessWebhookResult> for WebhookAckResponse {
    fn from(result: ProcessWebhookResult) -> Self {
        match result {
            ProcessWebhookResult::Dispatched { handled, failed } => Self {
                handled: Some(handled),
                failed: Some(failed),
                ..Self::status("dispatched")
            },
            ProcessWebhookResult::Duplicate => Self::status("duplicate"),
            ProcessWebhookResult::Ignored => Self::status("ignored"),
            ProcessWebhookResult::Simulation { matched } => Self {
                matched: Some(matched),
                ..Self::status("simulation")
            },
        }
    }
}

/// Result of a merchant capture.
#[derive(Debug, Clone, Serialize)]
pub struct CaptureResponse {
    pub order_id: LocalOrderId,
    pub captured: bool,
}

/// Stored webhook registration.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookRegistrationResponse {
    pub id: String,
    pub url: String,
    pub event_types: Vec<String>,
}

impl From<WebhookRegistration> for WebhookRegistrationResponse {
    fn from(registration: WebhookRegistration) -> Self {
        Self {
            id: registration.id,
            url: registration.url,
            event_types: registration.event_types,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Standard error response for API errors.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
    /// PayPal debug id, when the error came from PayPal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_id: Option<String>,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            debug_id: None,
        }
    }

    pub fn with_debug_id(mut self, debug_id: Option<String>) -> Self {
        self.debug_id = debug_id;
        self
    }
}
