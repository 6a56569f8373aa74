//! Mock PayPal gateway for testing.
//!
//! Provides a configurable mock implementation of `PayPalGateway` for unit
//! and integration tests. Supports:
//! - Pre-configured orders, capture and authorize results
//! - Webhook registration and simulation bookkeeping
//! - Error injection
//! - Call tracking

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::order::{
    Authorization, AuthorizationStatus, Capture, CaptureStatus, PayPalOrder, PayPalOrderStatus,
    Payments, PurchaseUnit,
};
use crate::domain::vault::PaymentToken;
use crate::domain::webhook::{TransmissionHeaders, WebhookEvent, WebhookRegistration};
use crate::ports::{CreateOrderRequest, GatewayError, PayPalApiError, PayPalGateway};

/// Mock PayPal gateway for testing.
///
/// # Example
///
/// ```ignore
/// let mock = MockPayPalGateway::new();
/// mock.add_order(order);
/// mock.set_method_error("capture_order", GatewayError::Network("reset".into()));
/// assert_eq!(mock.call_count("get_order"), 1);
/// ```
#[derive(Default, Clone)]
pub struct MockPayPalGateway {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    /// Orders returned by `get_order`.
    orders: HashMap<String, PayPalOrder>,

    /// Responses for `capture_order` by order id.
    capture_results: HashMap<String, PayPalOrder>,

    /// Responses for `authorize_order` by order id.
    authorize_results: HashMap<String, PayPalOrder>,

    /// Responses for `capture_authorization` by authorization id.
    authorization_captures: HashMap<String, Capture>,

    /// Queued responses for `create_order`.
    created_orders: VecDeque<PayPalOrder>,

    /// Requests received by `create_order`, with their request ids.
    create_requests: Vec<(CreateOrderRequest, String)>,

    webhooks: Vec<WebhookRegistration>,

    simulated_events: Vec<WebhookEvent>,

    reject_signatures: bool,

    payment_tokens: HashMap<String, Vec<PaymentToken>>,

    sequence: u32,

    /// Error to return on next call.
    next_error: Option<GatewayError>,

    /// Specific errors by method name.
    method_errors: HashMap<String, GatewayError>,

    /// Track method calls for assertions.
    call_log: Vec<MethodCall>,
}

/// Recorded method call for assertions.
#[derive(Debug, Clone)]
pub struct MethodCall {
    pub method: String,
    pub args: Vec<String>,
}

impl MockPayPalGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Methods
    // ════════════════════════════════════════════════════════════════════════════

    /// Add an order to the "API".
    pub fn add_order(&self, order: PayPalOrder) {
        self.state().orders.insert(order.id.clone(), order);
    }

    pub fn set_capture_result(&self, order: PayPalOrder) {
        self.state().capture_results.insert(order.id.clone(), order);
    }

    pub fn set_authorize_result(&self, order: PayPalOrder) {
        self.state().authorize_results.insert(order.id.clone(), order);
    }

    pub fn set_authorization_capture(&self, authorization_id: &str, capture: Capture) {
        self.state()
            .authorization_captures
            .insert(authorization_id.to_string(), capture);
    }

    /// Queue the response of the next `create_order` call.
    pub fn queue_created_order(&self, order: PayPalOrder) {
        self.state().created_orders.push_back(order);
    }

    pub fn add_webhook(&self, registration: WebhookRegistration) {
        self.state().webhooks.push(registration);
    }

    pub fn reject_signatures(&self, reject: bool) {
        self.state().reject_signatures = reject;
    }

    pub fn set_payment_tokens(&self, customer_id: &str, tokens: Vec<PaymentToken>) {
        self.state()
            .payment_tokens
            .insert(customer_id.to_string(), tokens);
    }

    /// Set an error to return on the next call to any method.
    pub fn set_error(&self, error: GatewayError) {
        self.state().next_error = Some(error);
    }

    /// Set an error for a specific method.
    pub fn set_method_error(&self, method: &str, error: GatewayError) {
        self.state().method_errors.insert(method.to_string(), error);
    }

    pub fn clear_errors(&self) {
        let mut state = self.state();
        state.next_error = None;
        state.method_errors.clear();
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Call Tracking
    // ════════════════════════════════════════════════════════════════════════════

    pub fn calls(&self) -> Vec<MethodCall> {
        self.state().call_log.clone()
    }

    pub fn was_called(&self, method: &str) -> bool {
        self.call_count(method) > 0
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.state()
            .call_log
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    /// Requests passed to `create_order`, with their request ids.
    pub fn create_requests(&self) -> Vec<(CreateOrderRequest, String)> {
        self.state().create_requests.clone()
    }

    pub fn webhooks(&self) -> Vec<WebhookRegistration> {
        self.state().webhooks.clone()
    }

    pub fn simulated_events(&self) -> Vec<WebhookEvent> {
        self.state().simulated_events.clone()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Internal Helpers
    // ════════════════════════════════════════════════════════════════════════════

    fn record_call(&self, method: &str, args: Vec<String>) {
        self.state().call_log.push(MethodCall {
            method: method.to_string(),
            args,
        });
    }

    fn check_error(&self, method: &str) -> Result<(), GatewayError> {
        let mut state = self.state();

        if let Some(error) = state.method_errors.get(method) {
            return Err(error.clone());
        }

        if let Some(error) = state.next_error.take() {
            return Err(error);
        }

        Ok(())
    }

    fn next_id(&self, prefix: &str) -> String {
        let mut state = self.state();
        state.sequence += 1;
        format!("{}-{}", prefix, state.sequence)
    }

    fn not_found(resource: &str) -> GatewayError {
        GatewayError::Api(PayPalApiError::new(
            404,
            "RESOURCE_NOT_FOUND",
            format!("The specified resource does not exist: {}", resource),
        ))
    }

    fn payments_mut(order: &mut PayPalOrder) -> &mut Payments {
        if order.purchase_units.is_empty() {
            order.purchase_units.push(PurchaseUnit {
                reference_id: None,
                custom_id: None,
                invoice_id: None,
                amount: None,
                payments: None,
            });
        }
        order.purchase_units[0]
            .payments
            .get_or_insert_with(Payments::default)
    }
}

#[async_trait]
impl PayPalGateway for MockPayPalGateway {
    async fn create_order(
        &self,
        request: &CreateOrderRequest,
        request_id: &str,
    ) -> Result<PayPalOrder, GatewayError> {
        self.record_call("create_order", vec![request_id.to_string()]);
        self.check_error("create_order")?;

        let queued = self.state().created_orders.pop_front();
        let order = match queued {
            Some(order) => order,
            None => PayPalOrder {
                id: self.next_id("MOCK-ORDER"),
                intent: request.intent,
                status: PayPalOrderStatus::Created,
                purchase_units: request
                    .purchase_units
                    .iter()
                    .map(|unit| PurchaseUnit {
                        reference_id: unit.reference_id.clone(),
                        custom_id: Some(unit.custom_id.clone()),
                        invoice_id: unit.invoice_id.clone(),
                        amount: None,
                        payments: None,
                    })
                    .collect(),
            },
        };

        let mut state = self.state();
        state
            .create_requests
            .push((request.clone(), request_id.to_string()));
        state.orders.insert(order.id.clone(), order.clone());
        Ok(order)
    }

    async fn get_order(&self, order_id: &str) -> Result<PayPalOrder, GatewayError> {
        self.record_call("get_order", vec![order_id.to_string()]);
        self.check_error("get_order")?;

        self.state()
            .orders
            .get(order_id)
            .cloned()
            .ok_or_else(|| Self::not_found(order_id))
    }

    async fn capture_order(
        &self,
        order_id: &str,
        request_id: Option<&str>,
    ) -> Result<PayPalOrder, GatewayError> {
        self.record_call(
            "capture_order",
            vec![order_id.to_string(), request_id.unwrap_or_default().to_string()],
        );
        self.check_error("capture_order")?;

        let configured = self.state().capture_results.get(order_id).cloned();
        let captured = match configured {
            Some(order) => order,
            None => {
                let mut order = self
                    .state()
                    .orders
                    .get(order_id)
                    .cloned()
                    .ok_or_else(|| Self::not_found(order_id))?;
                order.status = PayPalOrderStatus::Completed;
                let capture_id = format!("CAP-{}", order_id);
                Self::payments_mut(&mut order).captures.push(Capture {
                    id: capture_id,
                    status: CaptureStatus::Completed,
                    amount: None,
                    custom_id: None,
                    status_details: None,
                    seller_receivable_breakdown: None,
                });
                order
            }
        };

        self.state()
            .orders
            .insert(captured.id.clone(), captured.clone());
        Ok(captured)
    }

    async fn authorize_order(&self, order_id: &str) -> Result<PayPalOrder, GatewayError> {
        self.record_call("authorize_order", vec![order_id.to_string()]);
        self.check_error("authorize_order")?;

        let configured = self.state().authorize_results.get(order_id).cloned();
        let authorized = match configured {
            Some(order) => order,
            None => {
                let mut order = self
                    .state()
                    .orders
                    .get(order_id)
                    .cloned()
                    .ok_or_else(|| Self::not_found(order_id))?;
                order.status = PayPalOrderStatus::Completed;
                Self::payments_mut(&mut order)
                    .authorizations
                    .push(Authorization {
                        id: format!("AUTH-{}", order_id),
                        status: AuthorizationStatus::Created,
                        amount: None,
                        custom_id: None,
                    });
                order
            }
        };

        self.state()
            .orders
            .insert(authorized.id.clone(), authorized.clone());
        Ok(authorized)
    }

    async fn capture_authorization(
        &self,
        authorization_id: &str,
        request_id: Option<&str>,
    ) -> Result<Capture, GatewayError> {
        self.record_call(
            "capture_authorization",
            vec![
                authorization_id.to_string(),
                request_id.unwrap_or_default().to_string(),
            ],
        );
        self.check_error("capture_authorization")?;

        let configured = self
            .state()
            .authorization_captures
            .get(authorization_id)
            .cloned();
        Ok(configured.unwrap_or_else(|| Capture {
            id: format!("CAP-{}", authorization_id),
            status: CaptureStatus::Completed,
            amount: None,
            custom_id: None,
            status_details: None,
            seller_receivable_breakdown: None,
        }))
    }

    async fn register_webhook(
        &self,
        url: &str,
        event_types: &[String],
    ) -> Result<WebhookRegistration, GatewayError> {
        self.record_call("register_webhook", vec![url.to_string()]);
        self.check_error("register_webhook")?;

        let registration =
            WebhookRegistration::new(self.next_id("WH-MOCK"), url, event_types.to_vec());
        self.state().webhooks.push(registration.clone());
        Ok(registration)
    }

    async fn list_webhooks(&self) -> Result<Vec<WebhookRegistration>, GatewayError> {
        self.record_call("list_webhooks", vec![]);
        self.check_error("list_webhooks")?;

        Ok(self.state().webhooks.clone())
    }

    async fn delete_webhook(&self, webhook_id: &str) -> Result<(), GatewayError> {
        self.record_call("delete_webhook", vec![webhook_id.to_string()]);
        self.check_error("delete_webhook")?;

        let mut state = self.state();
        let before = state.webhooks.len();
        state.webhooks.retain(|w| w.id != webhook_id);
        if state.webhooks.len() == before {
            return Err(Self::not_found(webhook_id));
        }
        Ok(())
    }

    async fn simulate_webhook(
        &self,
        webhook_id: &str,
        event_type: &str,
        event_version: &str,
    ) -> Result<WebhookEvent, GatewayError> {
        self.record_call(
            "simulate_webhook",
            vec![webhook_id.to_string(), event_type.to_string()],
        );
        self.check_error("simulate_webhook")?;

        if !self.state().webhooks.iter().any(|w| w.id == webhook_id) {
            return Err(Self::not_found(webhook_id));
        }

        let event = WebhookEvent {
            id: self.next_id("WH-SIM"),
            event_type: event_type.to_string(),
            resource_type: None,
            event_version: Some(event_version.to_string()),
            summary: Some("Simulated event".to_string()),
            resource: serde_json::json!({"id": "SIMULATED"}),
            create_time: None,
        };
        self.state().simulated_events.push(event.clone());
        Ok(event)
    }

    async fn verify_webhook_signature(
        &self,
        headers: &TransmissionHeaders,
        webhook_id: &str,
        _event: &serde_json::Value,
    ) -> Result<bool, GatewayError> {
        self.record_call(
            "verify_webhook_signature",
            vec![headers.transmission_id.clone(), webhook_id.to_string()],
        );
        self.check_error("verify_webhook_signature")?;

        Ok(!self.state().reject_signatures)
    }

    async fn payment_tokens(&self, customer_id: &str) -> Result<Vec<PaymentToken>, GatewayError> {
        self.record_call("payment_tokens", vec![customer_id.to_string()]);
        self.check_error("payment_tokens")?;

        Ok(self
            .state()
            .payment_tokens
            .get(customer_id)
            .cloned()
            .unwrap_or_default())
    }
}
