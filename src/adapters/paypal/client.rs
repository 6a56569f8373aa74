//! PayPal REST API adapter.
//!
//! Implements the `PayPalGateway` port over `reqwest`.
//!
//! # Authentication
//!
//! - OAuth2 client-credentials; the bearer token is cached until shortly
//!   before expiry (`token_expiry_margin_secs`)
//! - A 401 on any call drops the cached token, fetches a new one and
//!   retries that call once
//!
//! # Configuration
//!
//! ```ignore
//! let config = PayPalClientConfig::new(client_id, client_secret).sandbox();
//! let client = PayPalClient::new(config)?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::PayPalConfig;
use crate::domain::foundation::Timestamp;
use crate::domain::order::{Capture, PayPalOrder};
use crate::domain::vault::PaymentToken;
use crate::domain::webhook::{TransmissionHeaders, WebhookEvent, WebhookRegistration};
use crate::ports::{CreateOrderRequest, GatewayError, PayPalGateway};

use super::api_error::parse_error;
use super::auth::TokenCache;
use super::wire::{
    CreateWebhookRequest, EventTypeName, PaymentTokensResponse, SimulateEventRequest,
    TokenResponse, VerifySignatureRequest, VerifySignatureResponse, WebhookListResponse,
    WebhookResponse,
};

pub const SANDBOX_BASE_URL: &str = "https://api-m.sandbox.paypal.com";
pub const LIVE_BASE_URL: &str = "https://api-m.paypal.com";

const REQUEST_ID_HEADER: &str = "PayPal-Request-Id";
const DEBUG_ID_HEADER: &str = "paypal-debug-id";

/// PayPal API client configuration.
#[derive(Clone)]
pub struct PayPalClientConfig {
    client_id: String,
    client_secret: SecretString,
    api_base_url: String,
    token_expiry_margin_secs: i64,
    timeout: Duration,
    partner_attribution_id: Option<String>,
}

impl PayPalClientConfig {
    /// Create a configuration against the live API.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: SecretString::new(client_secret.into()),
            api_base_url: LIVE_BASE_URL.to_string(),
            token_expiry_margin_secs: 60,
            timeout: Duration::from_secs(30),
            partner_attribution_id: None,
        }
    }

    /// Build from the application configuration section.
    pub fn from_config(config: &PayPalConfig) -> Self {
        Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            api_base_url: config.base_url().to_string(),
            token_expiry_margin_secs: config.token_expiry_margin_secs,
            timeout: Duration::from_secs(config.http_timeout_secs),
            partner_attribution_id: config.partner_attribution_id.clone(),
        }
    }

    /// Use the sandbox environment.
    pub fn sandbox(mut self) -> Self {
        self.api_base_url = SANDBOX_BASE_URL.to_string();
        self
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_token_expiry_margin(mut self, secs: i64) -> Self {
        self.token_expiry_margin_secs = secs;
        self
    }
}

/// PayPal REST API adapter.
pub struct PayPalClient {
    config: PayPalClientConfig,
    http_client: reqwest::Client,
    tokens: TokenCache,
}

impl PayPalClient {
    pub fn new(config: PayPalClientConfig) -> Result<Self, GatewayError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Network(e.to_string()))?;
        let tokens = TokenCache::new(config.token_expiry_margin_secs);
        Ok(Self {
            config,
            http_client,
            tokens,
        })
    }

    /// Appends `segments` to the API base URL, percent-encoding each one so
    /// caller-supplied ids cannot add or climb path segments.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, GatewayError> {
        let mut url = Url::parse(&self.config.api_base_url)
            .map_err(|e| GatewayError::Network(format!("invalid API base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| GatewayError::Network("API base URL cannot take a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Returns a usable bearer token, fetching one when the cache is stale.
    async fn access_token(&self) -> Result<String, GatewayError> {
        if let Some(token) = self.tokens.current(Timestamp::now()).await {
            return Ok(token);
        }

        let response = self
            .http_client
            .post(self.endpoint(&["v1", "oauth2", "token"])?)
            .basic_auth(
                &self.config.client_id,
                Some(self.config.client_secret.expose_secret()),
            )
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let err = Self::api_error(response).await;
            tracing::error!(error = %err, "PayPal token request failed");
            return Err(GatewayError::Authentication(err.to_string()));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Decode(format!("token response: {}", e)))?;

        self.tokens
            .store(token.access_token.clone(), token.expires_in, Timestamp::now())
            .await;
        tracing::debug!(expires_in = token.expires_in, "Obtained PayPal access token");
        Ok(token.access_token)
    }

    async fn api_error(response: reqwest::Response) -> crate::ports::PayPalApiError {
        let status = response.status().as_u16();
        let debug_id = response
            .headers()
            .get(DEBUG_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.unwrap_or_default();
        parse_error(status, debug_id.as_deref(), &body)
    }

    fn build(
        &self,
        method: Method,
        url: &Url,
        body: Option<&serde_json::Value>,
        request_id: Option<&str>,
        token: &str,
    ) -> reqwest::RequestBuilder {
        let mut builder = self
            .http_client
            .request(method, url.clone())
            .bearer_auth(token)
            .header("Prefer", "return=representation");
        if let Some(request_id) = request_id {
            builder = builder.header(REQUEST_ID_HEADER, request_id);
        }
        if let Some(bn_code) = &self.config.partner_attribution_id {
            builder = builder.header("PayPal-Partner-Attribution-Id", bn_code);
        }
        match body {
            Some(body) => builder.json(body),
            None => builder,
        }
    }

    /// Sends an authenticated request, refreshing the token once on 401.
    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<serde_json::Value>,
        request_id: Option<&str>,
    ) -> Result<reqwest::Response, GatewayError> {
        let path = url.path().to_owned();
        let token = self.access_token().await?;
        let mut response = self
            .build(method.clone(), &url, body.as_ref(), request_id, &token)
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        if response.status() == StatusCode::UNAUTHORIZED {
            tracing::info!(path = %path, "PayPal rejected access token, refreshing once");
            self.tokens.invalidate().await;
            let token = self.access_token().await?;
            response = self
                .build(method, &url, body.as_ref(), request_id, &token)
                .send()
                .await
                .map_err(|e| GatewayError::Network(e.to_string()))?;
        }

        if !response.status().is_success() {
            let err = Self::api_error(response).await;
            tracing::warn!(
                path = %path,
                status = err.status,
                name = %err.name,
                debug_id = err.debug_id.as_deref().unwrap_or(""),
                "PayPal API call failed"
            );
            return Err(GatewayError::Api(err));
        }

        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<serde_json::Value>,
        request_id: Option<&str>,
    ) -> Result<T, GatewayError> {
        let path = url.path().to_string();
        let response = self.send(method, url, body, request_id).await?;
        response
            .json()
            .await
            .map_err(|e| GatewayError::Decode(format!("{}: {}", path, e)))
    }

    fn to_body<T: Serialize>(value: &T) -> Result<serde_json::Value, GatewayError> {
        serde_json::to_value(value).map_err(|e| GatewayError::Decode(e.to_string()))
    }
}

#[async_trait]
impl PayPalGateway for PayPalClient {
    async fn create_order(
        &self,
        request: &CreateOrderRequest,
        request_id: &str,
    ) -> Result<PayPalOrder, GatewayError> {
        let body = Self::to_body(request)?;
        let url = self.endpoint(&["v2", "checkout", "orders"])?;
        self.send_json(Method::POST, url, Some(body), Some(request_id))
            .await
    }

    async fn get_order(&self, order_id: &str) -> Result<PayPalOrder, GatewayError> {
        let url = self.endpoint(&["v2", "checkout", "orders", order_id])?;
        self.send_json(Method::GET, url, None, None).await
    }

    async fn capture_order(
        &self,
        order_id: &str,
        request_id: Option<&str>,
    ) -> Result<PayPalOrder, GatewayError> {
        let url = self.endpoint(&["v2", "checkout", "orders", order_id, "capture"])?;
        self.send_json(Method::POST, url, Some(serde_json::json!({})), request_id)
            .await
    }

    async fn authorize_order(&self, order_id: &str) -> Result<PayPalOrder, GatewayError> {
        let url = self.endpoint(&["v2", "checkout", "orders", order_id, "authorize"])?;
        self.send_json(Method::POST, url, Some(serde_json::json!({})), None)
            .await
    }

    async fn capture_authorization(
        &self,
        authorization_id: &str,
        request_id: Option<&str>,
    ) -> Result<Capture, GatewayError> {
        let url = self.endpoint(&["v2", "payments", "authorizations", authorization_id, "capture"])?;
        self.send_json(
            Method::POST,
            url,
            Some(serde_json::json!({"final_capture": true})),
            request_id,
        )
        .await
    }

    async fn register_webhook(
        &self,
        url: &str,
        event_types: &[String],
    ) -> Result<WebhookRegistration, GatewayError> {
        let request = CreateWebhookRequest {
            url,
            event_types: event_types
                .iter()
                .map(|name| EventTypeName { name: name.clone() })
                .collect(),
        };
        let body = Self::to_body(&request)?;
        let url = self.endpoint(&["v1", "notifications", "webhooks"])?;
        let response: WebhookResponse = self
            .send_json(Method::POST, url, Some(body), None)
            .await?;
        Ok(response.into())
    }

    async fn list_webhooks(&self) -> Result<Vec<WebhookRegistration>, GatewayError> {
        let url = self.endpoint(&["v1", "notifications", "webhooks"])?;
        let response: WebhookListResponse = self
            .send_json(Method::GET, url, None, None)
            .await?;
        Ok(response.webhooks.into_iter().map(Into::into).collect())
    }

    async fn delete_webhook(&self, webhook_id: &str) -> Result<(), GatewayError> {
        let url = self.endpoint(&["v1", "notifications", "webhooks", webhook_id])?;
        self.send(Method::DELETE, url, None, None).await?;
        Ok(())
    }

    async fn simulate_webhook(
        &self,
        webhook_id: &str,
        event_type: &str,
        event_version: &str,
    ) -> Result<WebhookEvent, GatewayError> {
        let request = SimulateEventRequest {
            webhook_id,
            event_type,
            resource_version: event_version,
        };
        let body = Self::to_body(&request)?;
        let url = self.endpoint(&["v1", "notifications", "simulate-event"])?;
        self.send_json(Method::POST, url, Some(body), None).await
    }

    async fn verify_webhook_signature(
        &self,
        headers: &TransmissionHeaders,
        webhook_id: &str,
        event: &serde_json::Value,
    ) -> Result<bool, GatewayError> {
        let request = VerifySignatureRequest::new(headers, webhook_id, event);
        let body = Self::to_body(&request)?;
        let url = self.endpoint(&["v1", "notifications", "verify-webhook-signature"])?;
        let response: VerifySignatureResponse = self
            .send_json(Method::POST, url, Some(body), None)
            .await?;
        Ok(response.is_success())
    }

    async fn payment_tokens(&self, customer_id: &str) -> Result<Vec<PaymentToken>, GatewayError> {
        let mut url = self.endpoint(&["v3", "vault", "payment-tokens"])?;
        url.query_pairs_mut().append_pair("customer_id", customer_id);
        let response: PaymentTokensResponse = self.send_json(Method::GET, url, None, None).await?;
        Ok(response
            .payment_tokens
            .into_iter()
            .filter_map(|token| token.into_token(customer_id))
            .collect())
    }
}
