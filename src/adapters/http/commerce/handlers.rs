//! HTTP handlers for the PayPal checkout, webhook and admin endpoints.
//!
//! These handlers connect Axum routes to the application layer services.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use http::HeaderMap;

use crate::adapters::storage::{
    KvPaymentTokenStore, KvProcessedEventStore, KvSimulationStore, KvWebhookRegistrationStore,
};
use crate::application::handlers::orders::{OrderReconciler, RequestIdRepository};
use crate::application::handlers::simulation::{SimulationError, SimulationService};
use crate::application::handlers::webhooks::{
    default_registry, ProcessWebhookCommand, RegisterWebhookHandler, RegistrationError,
    WebhookProcessor, WebhookProcessorConfig,
};
use crate::config::{AppConfig, DEFAULT_EVENT_TYPES};
use crate::domain::foundation::LocalOrderId;
use crate::domain::order::OrderError;
use crate::domain::webhook::WebhookError;
use crate::ports::{
    GatewayError, KeyValueStore, OrderEventPublisher, OrderRepository, PayPalGateway,
    PaymentTokenStore, WebhookRegistrationStore,
};

use super::dto::{
    CaptureResponse, CheckoutReturnQuery, ErrorResponse, HealthResponse, StartSimulationRequest,
    WebhookAckResponse, WebhookRegistrationResponse,
};

/// Shown to shoppers when checkout fails for a reason they can retry.
const PAYMENT_FAILED_MESSAGE: &str =
    "There was an error processing your payment. Please try again or choose another payment method.";

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Outbound collaborators the HTTP surface is wired from.
#[derive(Clone)]
pub struct CommercePorts {
    pub gateway: Arc<dyn PayPalGateway>,
    pub kv: Arc<dyn KeyValueStore>,
    pub orders: Arc<dyn OrderRepository>,
    pub events: Arc<dyn OrderEventPublisher>,
}

/// Settings that shape the wiring, extracted from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct CommerceSettings {
    /// Externally reachable base URL, without trailing slash.
    pub public_base_url: String,
    pub webhook_url: String,
    pub event_types: Vec<String>,
    pub verify_signatures: bool,
    pub dedup_ttl: Duration,
    pub simulation_timeout_secs: i64,
    pub request_id_ttl: Duration,
}

impl CommerceSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        let public_base_url = config.server.public_base_url();
        let webhook_url = config
            .webhooks
            .url
            .clone()
            .unwrap_or_else(|| format!("{}/webhooks/paypal", public_base_url));
        Self {
            public_base_url,
            webhook_url,
            event_types: config.webhooks.event_types_list(),
            verify_signatures: config.webhooks.verify_signatures,
            dedup_ttl: config.webhooks.dedup_ttl(),
            simulation_timeout_secs: config.webhooks.simulation_timeout_secs,
            request_id_ttl: Duration::from_secs(config.paypal.request_id_ttl_secs),
        }
    }
}

impl Default for CommerceSettings {
    fn default() -> Self {
        let public_base_url = "http://localhost:8080".to_string();
        Self {
            webhook_url: format!("{}/webhooks/paypal", public_base_url),
            public_base_url,
            event_types: DEFAULT_EVENT_TYPES.iter().map(|t| t.to_string()).collect(),
            verify_signatures: true,
            dedup_ttl: Duration::from_secs(24 * 60 * 60),
            simulation_timeout_secs: 600,
            request_id_ttl: Duration::from_secs(7 * 24 * 60 * 60),
        }
    }
}

/// Shared application state containing all dependencies.
///
/// Cloned for each request; every service is Arc-wrapped and built once at
/// startup because the webhook handler table is fixed for the process.
#[derive(Clone)]
pub struct CommerceAppState {
    pub reconciler: Arc<OrderReconciler>,
    pub processor: Arc<WebhookProcessor>,
    pub simulation: Arc<SimulationService>,
    pub registration: Arc<RegisterWebhookHandler>,
    /// Shoppers land here after a successful return, followed by the order id.
    pub order_received_url: String,
}

impl CommerceAppState {
    pub fn new(ports: CommercePorts, settings: CommerceSettings) -> Self {
        let CommercePorts {
            gateway,
            kv,
            orders,
            events,
        } = ports;

        let request_ids = Arc::new(RequestIdRepository::new(kv.clone(), settings.request_id_ttl));
        let reconciler = Arc::new(OrderReconciler::new(
            gateway.clone(),
            orders,
            events,
            request_ids,
        ));

        let registrations: Arc<dyn WebhookRegistrationStore> =
            Arc::new(KvWebhookRegistrationStore::new(kv.clone()));
        let simulation = Arc::new(SimulationService::new(
            gateway.clone(),
            registrations.clone(),
            Arc::new(KvSimulationStore::new(kv.clone())),
            settings.simulation_timeout_secs,
        ));

        let tokens: Arc<dyn PaymentTokenStore> = Arc::new(KvPaymentTokenStore::new(kv.clone()));
        let processor = Arc::new(WebhookProcessor::new(
            gateway.clone(),
            registrations.clone(),
            Arc::new(KvProcessedEventStore::new(kv)),
            simulation.clone(),
            default_registry(gateway.clone(), reconciler.clone(), tokens),
            WebhookProcessorConfig {
                verify_signatures: settings.verify_signatures,
                dedup_ttl: settings.dedup_ttl,
            },
        ));

        let registration = Arc::new(RegisterWebhookHandler::new(
            gateway,
            registrations,
            settings.webhook_url,
            settings.event_types,
        ));

        Self {
            reconciler,
            processor,
            simulation,
            registration,
            order_received_url: format!("{}/checkout/order-received", settings.public_base_url),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Shopper and PayPal endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// GET /health
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// POST /webhooks/paypal - Verify, deduplicate and dispatch a PayPal event
pub async fn receive_webhook(
    State(state): State<CommerceAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, CommerceApiError> {
    let cmd = ProcessWebhookCommand {
        payload: body.to_vec(),
        headers: lowercase_headers(&headers),
    };

    let result = state.processor.handle(cmd).await?;
    Ok(Json(WebhookAckResponse::from(result)))
}

/// GET /checkout/return?token= - Shopper comes back from PayPal
///
/// Redirects to the order-received page on success. An unusable token ends
/// the request with an empty body and no redirect; callers treat that as a
/// terminal failure.
pub async fn checkout_return(
    State(state): State<CommerceAppState>,
    Query(query): Query<CheckoutReturnQuery>,
) -> Response {
    let Some(token) = query.token.filter(|t| !t.trim().is_empty()) else {
        tracing::warn!("Checkout return without a PayPal token");
        return StatusCode::OK.into_response();
    };

    match state.reconciler.reconcile_return(&token).await {
        Ok(order) => {
            Redirect::to(&format!("{}/{}", state.order_received_url, order.id)).into_response()
        }
        Err(e) if e.is_fatal() => {
            tracing::warn!(paypal_order_id = %token, error = %e, "Checkout return rejected");
            StatusCode::OK.into_response()
        }
        Err(e) => {
            tracing::error!(
                paypal_order_id = %token,
                debug_id = ?gateway_debug_id(&e),
                error = %e,
                "Checkout return failed"
            );
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse::new("PAYMENT_FAILED", PAYMENT_FAILED_MESSAGE)),
            )
                .into_response()
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Admin endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// POST /admin/orders/:id/capture - Capture an authorized payment
pub async fn capture_order(
    State(state): State<CommerceAppState>,
    Path(order_id): Path<String>,
) -> Result<impl IntoResponse, CommerceApiError> {
    let order_id: LocalOrderId = order_id
        .parse()
        .map_err(|_| CommerceApiError::BadRequest(format!("Invalid order id: {}", order_id)))?;

    let captured = state.reconciler.capture_authorized_payment(order_id).await?;
    Ok(Json(CaptureResponse { order_id, captured }))
}

/// POST /admin/webhooks/register - Replace the shop's PayPal webhook
pub async fn register_webhook(
    State(state): State<CommerceAppState>,
) -> Result<impl IntoResponse, CommerceApiError> {
    let registration = state.registration.register().await?;
    Ok((
        StatusCode::CREATED,
        Json(WebhookRegistrationResponse::from(registration)),
    ))
}

/// DELETE /admin/webhooks/register - Remove the shop's PayPal webhook
pub async fn delete_webhook_registration(
    State(state): State<CommerceAppState>,
) -> Result<impl IntoResponse, CommerceApiError> {
    state.registration.delete_registration().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /admin/webhooks/simulate - Ask PayPal to send a test event
///
/// The body is optional; an empty one simulates the default event type.
pub async fn start_simulation(
    State(state): State<CommerceAppState>,
    body: Bytes,
) -> Result<impl IntoResponse, CommerceApiError> {
    let request: StartSimulationRequest = if body.is_empty() {
        StartSimulationRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| CommerceApiError::BadRequest(format!("Invalid request body: {}", e)))?
    };

    let session = state
        .simulation
        .start(request.event_type.as_deref(), request.event_version.as_deref())
        .await?;
    Ok((StatusCode::ACCEPTED, Json(session)))
}

/// GET /admin/webhooks/simulate - Current simulation status
pub async fn simulation_status(
    State(state): State<CommerceAppState>,
) -> Result<impl IntoResponse, CommerceApiError> {
    let report = state.simulation.status().await?;
    Ok(Json(report))
}

fn lowercase_headers(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
        })
        .collect()
}

fn gateway_debug_id(err: &OrderError) -> Option<&str> {
    match err {
        OrderError::Gateway(e) => e.debug_id(),
        _ => None,
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts application errors to HTTP responses.
#[derive(Debug)]
pub enum CommerceApiError {
    Order(OrderError),
    Webhook(WebhookError),
    Simulation(SimulationError),
    Registration(RegistrationError),
    BadRequest(String),
}

impl From<OrderError> for CommerceApiError {
    fn from(err: OrderError) -> Self {
        Self::Order(err)
    }
}

impl From<WebhookError> for CommerceApiError {
    fn from(err: WebhookError) -> Self {
        Self::Webhook(err)
    }
}

impl From<SimulationError> for CommerceApiError {
    fn from(err: SimulationError) -> Self {
        Self::Simulation(err)
    }
}

impl From<RegistrationError> for CommerceApiError {
    fn from(err: RegistrationError) -> Self {
        Self::Registration(err)
    }
}

fn gateway_response(err: &GatewayError) -> (StatusCode, ErrorResponse) {
    tracing::error!(debug_id = ?err.debug_id(), error = %err, "PayPal request failed");
    (
        StatusCode::BAD_GATEWAY,
        ErrorResponse::new("PAYPAL_ERROR", err.to_string())
            .with_debug_id(err.debug_id().map(str::to_string)),
    )
}

impl IntoResponse for CommerceApiError {
    fn into_response(self) -> Response {
        let (status, error) = match &self {
            CommerceApiError::Order(err) => match err {
                OrderError::InvalidState { .. } => {
                    (StatusCode::CONFLICT, ErrorResponse::new("INVALID_STATE", err.to_string()))
                }
                OrderError::CaptureInProgress(_) => (
                    StatusCode::CONFLICT,
                    ErrorResponse::new("CAPTURE_IN_PROGRESS", err.to_string()),
                ),
                OrderError::OrderNotFound(_) => (
                    StatusCode::NOT_FOUND,
                    ErrorResponse::new("ORDER_NOT_FOUND", err.to_string()),
                ),
                OrderError::MissingCustomId(_) | OrderError::PayPalOrderMissing { .. } => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    ErrorResponse::new("PAYPAL_ORDER_UNLINKED", err.to_string()),
                ),
                OrderError::Validation(_) => (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::new("VALIDATION_FAILED", err.to_string()),
                ),
                OrderError::Gateway(e) => gateway_response(e),
                OrderError::Storage(_) => {
                    tracing::error!(error = %err, "Order storage failure");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ErrorResponse::new("INTERNAL_ERROR", "An internal error occurred"),
                    )
                }
            },
            CommerceApiError::Webhook(err) => {
                let code = match err {
                    WebhookError::InvalidSignature => "INVALID_SIGNATURE",
                    WebhookError::NotRegistered => "WEBHOOK_NOT_REGISTERED",
                    WebhookError::MissingHeader(_) => "MISSING_HEADER",
                    WebhookError::ParseError(_) | WebhookError::MissingField(_) => "INVALID_PAYLOAD",
                    WebhookError::VerificationUnavailable(_) => "VERIFICATION_UNAVAILABLE",
                    WebhookError::Ignored(_) => "IGNORED",
                    WebhookError::Handler(_) | WebhookError::Storage(_) => "INTERNAL_ERROR",
                };
                (err.status_code(), ErrorResponse::new(code, err.to_string()))
            }
            CommerceApiError::Simulation(err) => match err {
                SimulationError::WebhookNotRegistered => (
                    StatusCode::CONFLICT,
                    ErrorResponse::new("WEBHOOK_NOT_REGISTERED", err.to_string()),
                ),
                SimulationError::Gateway(e) => gateway_response(e),
                SimulationError::Storage(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("INTERNAL_ERROR", err.to_string()),
                ),
            },
            CommerceApiError::Registration(err) => match err {
                RegistrationError::Gateway(e) => gateway_response(e),
                RegistrationError::Storage(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("INTERNAL_ERROR", err.to_string()),
                ),
            },
            CommerceApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("BAD_REQUEST", message.clone()),
            ),
        };

        (status, Json(error)).into_response()
    }
}
