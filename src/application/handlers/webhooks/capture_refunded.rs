//! PAYMENT.CAPTURE.REFUNDED - a full or partial refund was issued.
//!
//! The resource is the refund. Refunds issued from the PayPal dashboard
//! carry the capture's `custom_id`.

use std::sync::Arc;

use async_trait::async_trait;

use super::resolve::resolve_order_id;
use crate::application::handlers::orders::OrderReconciler;
use crate::domain::order::Refund;
use crate::domain::webhook::{WebhookError, WebhookEvent, WebhookEventHandler, WebhookEventType};
use crate::ports::PayPalGateway;

pub struct CaptureRefundedHandler {
    gateway: Arc<dyn PayPalGateway>,
    reconciler: Arc<OrderReconciler>,
}

impl CaptureRefundedHandler {
    pub fn new(gateway: Arc<dyn PayPalGateway>, reconciler: Arc<OrderReconciler>) -> Self {
        Self { gateway, reconciler }
    }
}

#[async_trait]
impl WebhookEventHandler for CaptureRefundedHandler {
    fn name(&self) -> &'static str {
        "capture_refunded"
    }

    fn handles(&self) -> Vec<WebhookEventType> {
        vec![WebhookEventType::PaymentCaptureRefunded]
    }

    async fn handle(&self, event: &WebhookEvent) -> Result<(), WebhookError> {
        let refund: Refund = event
            .deserialize_resource()
            .map_err(|e| WebhookError::ParseError(e.to_string()))?;
        let order_id = resolve_order_id(event, self.gateway.as_ref()).await?;

        if !self.reconciler.record_refund(order_id, &refund).await? {
            tracing::debug!(order_id = %order_id, refund_id = %refund.id, "Refund already recorded");
        }
        Ok(())
    }
}
