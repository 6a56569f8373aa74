//! PAYMENT.CAPTURE.COMPLETED - funds settled.

use std::sync::Arc;

use async_trait::async_trait;

use super::resolve::resolve_order_id;
use crate::application::handlers::orders::OrderReconciler;
use crate::domain::order::Capture;
use crate::domain::webhook::{WebhookError, WebhookEvent, WebhookEventHandler, WebhookEventType};
use crate::ports::PayPalGateway;

pub struct CaptureCompletedHandler {
    gateway: Arc<dyn PayPalGateway>,
    reconciler: Arc<OrderReconciler>,
}

impl CaptureCompletedHandler {
    pub fn new(gateway: Arc<dyn PayPalGateway>, reconciler: Arc<OrderReconciler>) -> Self {
        Self { gateway, reconciler }
    }
}

#[async_trait]
impl WebhookEventHandler for CaptureCompletedHandler {
    fn name(&self) -> &'static str {
        "capture_completed"
    }

    fn handles(&self) -> Vec<WebhookEventType> {
        vec![WebhookEventType::PaymentCaptureCompleted]
    }

    async fn handle(&self, event: &WebhookEvent) -> Result<(), WebhookError> {
        let capture: Capture = event
            .deserialize_resource()
            .map_err(|e| WebhookError::ParseError(e.to_string()))?;
        let order_id = resolve_order_id(event, self.gateway.as_ref()).await?;

        let recorded = self
            .reconciler
            .record_capture_completed(order_id, &capture)
            .await?;

        if !recorded {
            tracing::debug!(order_id = %order_id, capture_id = %capture.id, "Capture already recorded");
        }
        Ok(())
    }
}
