//! Money taken back or never collected.
//!
//! - PAYMENT.CAPTURE.REVERSED: PayPal pulled a settled payment (chargeback,
//!   fraud review). The order goes on hold for the merchant to review.
//! - PAYMENT.CAPTURE.DENIED: the capture failed.
//! - PAYMENT.ORDER.CANCELLED: the PayPal order was voided before payment.

use std::sync::Arc;

use async_trait::async_trait;

use super::resolve::resolve_order_id;
use crate::application::handlers::orders::{resolve_local_order_id, OrderReconciler};
use crate::domain::foundation::LocalOrderId;
use crate::domain::webhook::{WebhookError, WebhookEvent, WebhookEventHandler, WebhookEventType};
use crate::ports::PayPalGateway;

pub struct PaymentReversalHandler {
    gateway: Arc<dyn PayPalGateway>,
    reconciler: Arc<OrderReconciler>,
}

impl PaymentReversalHandler {
    pub fn new(gateway: Arc<dyn PayPalGateway>, reconciler: Arc<OrderReconciler>) -> Self {
        Self { gateway, reconciler }
    }

    /// Cancelled-order resources are PayPal orders, linked by id rather
    /// than by `custom_id`.
    async fn cancelled_order_id(&self, event: &WebhookEvent) -> Result<LocalOrderId, WebhookError> {
        if event.custom_id().is_some() {
            return resolve_order_id(event, self.gateway.as_ref()).await;
        }
        let paypal_order_id = event
            .resource_id()
            .ok_or(WebhookError::MissingField("resource.id"))?;
        let paypal_order = self
            .gateway
            .get_order(paypal_order_id)
            .await
            .map_err(|e| WebhookError::Handler(e.to_string()))?;
        Ok(resolve_local_order_id(&paypal_order)?)
    }
}

#[async_trait]
impl WebhookEventHandler for PaymentReversalHandler {
    fn name(&self) -> &'static str {
        "payment_reversal"
    }

    fn handles(&self) -> Vec<WebhookEventType> {
        vec![
            WebhookEventType::PaymentCaptureReversed,
            WebhookEventType::PaymentCaptureDenied,
            WebhookEventType::PaymentOrderCancelled,
        ]
    }

    async fn handle(&self, event: &WebhookEvent) -> Result<(), WebhookError> {
        let resource_id = event.resource_id().unwrap_or("unknown");

        match event.parsed_type() {
            WebhookEventType::PaymentCaptureReversed => {
                let order_id = resolve_order_id(event, self.gateway.as_ref()).await?;
                let note = format!("PayPal reversed payment {}", resource_id);
                self.reconciler.hold(order_id, &note).await?;
                tracing::warn!(order_id = %order_id, resource_id, "Payment reversed");
            }
            WebhookEventType::PaymentCaptureDenied => {
                let order_id = resolve_order_id(event, self.gateway.as_ref()).await?;
                let reason = format!("capture {} denied", resource_id);
                self.reconciler.mark_failed(order_id, &reason).await?;
            }
            WebhookEventType::PaymentOrderCancelled => {
                let order_id = self.cancelled_order_id(event).await?;
                let note = format!("PayPal order {} cancelled", resource_id);
                self.reconciler.cancel(order_id, &note).await?;
            }
            other => {
                return Err(WebhookError::Ignored(format!(
                    "{} is not a reversal event",
                    other.as_str()
                )))
            }
        }
        Ok(())
    }
}
