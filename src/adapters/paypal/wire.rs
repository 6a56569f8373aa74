//! PayPal REST request/response bodies not shared with the domain.

use serde::{Deserialize, Serialize};

use crate::domain::vault::{PaymentSourceKind, PaymentToken};
use crate::domain::webhook::{TransmissionHeaders, WebhookRegistration};

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EventTypeName {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct CreateWebhookRequest<'a> {
    pub url: &'a str,
    pub event_types: Vec<EventTypeName>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookResponse {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub event_types: Vec<EventTypeName>,
}

impl From<WebhookResponse> for WebhookRegistration {
    fn from(response: WebhookResponse) -> Self {
        WebhookRegistration::new(
            response.id,
            response.url,
            response.event_types.into_iter().map(|t| t.name).collect(),
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct WebhookListResponse {
    #[serde(default)]
    pub webhooks: Vec<WebhookResponse>,
}

#[derive(Debug, Serialize)]
pub struct SimulateEventRequest<'a> {
    pub webhook_id: &'a str,
    pub event_type: &'a str,
    pub resource_version: &'a str,
}

#[derive(Debug, Serialize)]
pub struct VerifySignatureRequest<'a> {
    pub auth_algo: &'a str,
    pub cert_url: &'a str,
    pub transmission_id: &'a str,
    pub transmission_sig: &'a str,
    pub transmission_time: &'a str,
    pub webhook_id: &'a str,
    pub webhook_event: &'a serde_json::Value,
}

impl<'a> VerifySignatureRequest<'a> {
    pub fn new(
        headers: &'a TransmissionHeaders,
        webhook_id: &'a str,
        webhook_event: &'a serde_json::Value,
    ) -> Self {
        Self {
            auth_algo: &headers.auth_algo,
            cert_url: &headers.cert_url,
            transmission_id: &headers.transmission_id,
            transmission_sig: &headers.transmission_sig,
            transmission_time: &headers.transmission_time,
            webhook_id,
            webhook_event,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct VerifySignatureResponse {
    pub verification_status: String,
}

impl VerifySignatureResponse {
    pub fn is_success(&self) -> bool {
        self.verification_status.eq_ignore_ascii_case("SUCCESS")
    }
}

#[derive(Debug, Deserialize)]
pub struct VaultCustomer {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct PaymentTokenResponse {
    pub id: String,
    #[serde(default)]
    pub customer: Option<VaultCustomer>,
    #[serde(default)]
    pub payment_source: serde_json::Value,
}

impl PaymentTokenResponse {
    /// Converts to a domain token. Sources other than card or PayPal are skipped.
    pub fn into_token(self, customer_id: &str) -> Option<PaymentToken> {
        let source = if self.payment_source.get("paypal").is_some() {
            PaymentSourceKind::Paypal
        } else if self.payment_source.get("card").is_some() {
            PaymentSourceKind::Card
        } else {
            return None;
        };
        let owner = self
            .customer
            .map(|c| c.id)
            .unwrap_or_else(|| customer_id.to_string());
        Some(PaymentToken::new(self.id, source, owner))
    }
}

#[derive(Debug, Deserialize)]
pub struct PaymentTokensResponse {
    #[serde(default)]
    pub payment_tokens: Vec<PaymentTokenResponse>,
}
