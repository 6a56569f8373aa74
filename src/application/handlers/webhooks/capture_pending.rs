//! PAYMENT.CAPTURE.PENDING - PayPal is holding the funds (eCheck, review).

use std::sync::Arc;

use async_trait::async_trait;

use super::resolve::resolve_order_id;
use crate::application::handlers::orders::OrderReconciler;
use crate::domain::order::Capture;
use crate::domain::webhook::{WebhookError, WebhookEvent, WebhookEventHandler, WebhookEventType};
use crate::ports::PayPalGateway;

pub struct CapturePendingHandler {
    gateway: Arc<dyn PayPalGateway>,
    reconciler: Arc<OrderReconciler>,
}

impl CapturePendingHandler {
    pub fn new(gateway: Arc<dyn PayPalGateway>, reconciler: Arc<OrderReconciler>) -> Self {
        Self { gateway, reconciler }
    }
}

#[async_trait]
impl WebhookEventHandler for CapturePendingHandler {
    fn name(&self) -> &'static str {
        "capture_pending"
    }

    fn handles(&self) -> Vec<WebhookEventType> {
        vec![WebhookEventType::PaymentCapturePending]
    }

    async fn handle(&self, event: &WebhookEvent) -> Result<(), WebhookError> {
        let capture: Capture = event
            .deserialize_resource()
            .map_err(|e| WebhookError::ParseError(e.to_string()))?;
        let order_id = resolve_order_id(event, self.gateway.as_ref()).await?;

        self.reconciler.mark_capture_pending(order_id, &capture).await?;
        Ok(())
    }
}
