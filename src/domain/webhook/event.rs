//! PayPal webhook event types.
//!
//! Defines the structures for parsing PayPal webhook payloads.
//! Only fields relevant to our processing are captured.

use serde::{Deserialize, Serialize};

/// PayPal webhook event.
///
/// The `resource` payload is polymorphic on `event_type` and kept as raw
/// JSON; handlers deserialize the part they need.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct WebhookEvent {
    /// Unique identifier for the event (WH-xxx format). Used for dedup.
    pub id: String,

    /// Type of event (e.g., "PAYMENT.CAPTURE.COMPLETED").
    pub event_type: String,

    /// Kind of resource carried (e.g., "capture", "checkout-order").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    /// Object that triggered the event.
    #[serde(default)]
    pub resource: serde_json::Value,

    /// RFC 3339 creation time as sent by PayPal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
}

impl WebhookEvent {
    /// Parse the event type into a known enum variant.
    pub fn parsed_type(&self) -> WebhookEventType {
        WebhookEventType::from_str(&self.event_type)
    }

    /// Attempts to deserialize the resource as the specified type.
    pub fn deserialize_resource<T: serde::de::DeserializeOwned>(
        &self,
    ) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.resource.clone())
    }

    /// The `id` of the resource (capture id, order id, token id...).
    pub fn resource_id(&self) -> Option<&str> {
        self.resource.get("id").and_then(|v| v.as_str())
    }

    /// Merchant-supplied `custom_id` on the resource, if any.
    pub fn custom_id(&self) -> Option<&str> {
        self.resource
            .get("custom_id")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
    }

    /// PayPal order id linked to a capture/authorization resource.
    pub fn related_order_id(&self) -> Option<&str> {
        self.resource
            .pointer("/supplementary_data/related_ids/order_id")
            .and_then(|v| v.as_str())
    }
}

/// Known PayPal event types that we handle or recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WebhookEventType {
    CheckoutOrderApproved,
    CheckoutOrderCompleted,
    PaymentAuthorizationCreated,
    PaymentAuthorizationVoided,
    PaymentCaptureCompleted,
    PaymentCapturePending,
    PaymentCaptureRefunded,
    PaymentCaptureReversed,
    PaymentCaptureDenied,
    PaymentOrderCancelled,
    CustomerDisputeCreated,
    CustomerDisputeResolved,
    VaultPaymentTokenCreated,
    VaultPaymentTokenDeleted,
    /// Unknown or unhandled event type.
    Unknown,
}

impl WebhookEventType {
    /// Every known type, in subscription order.
    pub const KNOWN: [WebhookEventType; 14] = [
        Self::CheckoutOrderApproved,
        Self::CheckoutOrderCompleted,
        Self::PaymentAuthorizationCreated,
        Self::PaymentAuthorizationVoided,
        Self::PaymentCaptureCompleted,
        Self::PaymentCapturePending,
        Self::PaymentCaptureRefunded,
        Self::PaymentCaptureReversed,
        Self::PaymentCaptureDenied,
        Self::PaymentOrderCancelled,
        Self::CustomerDisputeCreated,
        Self::CustomerDisputeResolved,
        Self::VaultPaymentTokenCreated,
        Self::VaultPaymentTokenDeleted,
    ];

    /// Parse event type from string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Self {
        Self::KNOWN
            .iter()
            .copied()
            .find(|known| known.as_str() == s)
            .unwrap_or(Self::Unknown)
    }

    /// Convert to the PayPal event type string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CheckoutOrderApproved => "CHECKOUT.ORDER.APPROVED",
            Self::CheckoutOrderCompleted => "CHECKOUT.ORDER.COMPLETED",
            Self::PaymentAuthorizationCreated => "PAYMENT.AUTHORIZATION.CREATED",
            Self::PaymentAuthorizationVoided => "PAYMENT.AUTHORIZATION.VOIDED",
            Self::PaymentCaptureCompleted => "PAYMENT.CAPTURE.COMPLETED",
            Self::PaymentCapturePending => "PAYMENT.CAPTURE.PENDING",
            Self::PaymentCaptureRefunded => "PAYMENT.CAPTURE.REFUNDED",
            Self::PaymentCaptureReversed => "PAYMENT.CAPTURE.REVERSED",
            Self::PaymentCaptureDenied => "PAYMENT.CAPTURE.DENIED",
            Self::PaymentOrderCancelled => "PAYMENT.ORDER.CANCELLED",
            Self::CustomerDisputeCreated => "CUSTOMER.DISPUTE.CREATED",
            Self::CustomerDisputeResolved => "CUSTOMER.DISPUTE.RESOLVED",
            Self::VaultPaymentTokenCreated => "VAULT.PAYMENT-TOKEN.CREATED",
            Self::VaultPaymentTokenDeleted => "VAULT.PAYMENT-TOKEN.DELETED",
            Self::Unknown => "unknown",
        }
    }
}

/// Builder for creating test WebhookEvent instances.
#[cfg(test)]
pub struct WebhookEventBuilder {
    event: WebhookEvent,
}

#[cfg(test)]
impl Default for WebhookEventBuilder {
    fn default() -> Self {
        Self {
            event: WebhookEvent {
                id: "WH-TEST-123".to_string(),
                event_type: "PAYMENT.CAPTURE.COMPLETED".to_string(),
                resource_type: Some("capture".to_string()),
                event_version: Some("1.0".to_string()),
                summary: None,
                resource: serde_json::json!({}),
                create_time: Some("2024-01-15T10:30:00Z".to_string()),
            },
        }
    }
}

#[cfg(test)]
impl WebhookEventBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.event.id = id.into();
        self
    }

    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event.event_type = event_type.into();
        self
    }

    pub fn resource(mut self, resource: serde_json::Value) -> Self {
        self.event.resource = resource;
        self
    }

    pub fn build(self) -> WebhookEvent {
        self.event
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_paypal_payload() {
        let payload = json!({
            "id": "WH-2WR32451HC0233532-67976317FL4543714",
            "event_version": "1.0",
            "create_time": "2024-01-15T10:30:00.000Z",
            "resource_type": "capture",
            "event_type": "PAYMENT.CAPTURE.COMPLETED",
            "summary": "Payment completed for $ 10.42 USD",
            "resource": {
                "id": "3C679366HH908993F",
                "custom_id": "1042",
                "supplementary_data": {"related_ids": {"order_id": "5O190127TN364715T"}}
            },
            "links": []
        });

        let event: WebhookEvent = serde_json::from_value(payload).unwrap();

        assert_eq!(event.parsed_type(), WebhookEventType::PaymentCaptureCompleted);
        assert_eq!(event.resource_id(), Some("3C679366HH908993F"));
        assert_eq!(event.custom_id(), Some("1042"));
        assert_eq!(event.related_order_id(), Some("5O190127TN364715T"));
    }

    #[test]
    fn unknown_event_types_parse_to_unknown() {
        let event = WebhookEventBuilder::new()
            .event_type("BILLING.PLAN.CREATED")
            .build();
        assert_eq!(event.parsed_type(), WebhookEventType::Unknown);
    }

    #[test]
    fn every_known_type_round_trips_through_its_string() {
        for known in WebhookEventType::KNOWN {
            assert_eq!(WebhookEventType::from_str(known.as_str()), known);
        }
    }

    #[test]
    fn empty_custom_id_is_treated_as_absent() {
        let event = WebhookEventBuilder::new()
            .resource(json!({"custom_id": ""}))
            .build();
        assert_eq!(event.custom_id(), None);
    }
}
