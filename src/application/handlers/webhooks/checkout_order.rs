//! CHECKOUT.ORDER.APPROVED / CHECKOUT.ORDER.COMPLETED.
//!
//! The buyer may close the tab after approving, so the approved event
//! finalizes the order the same way the return URL would. The order is
//! re-fetched because the event payload may be older than PayPal's state.

use std::sync::Arc;

use async_trait::async_trait;

use crate::application::handlers::orders::OrderReconciler;
use crate::domain::webhook::{WebhookError, WebhookEvent, WebhookEventHandler, WebhookEventType};
use crate::ports::PayPalGateway;

pub struct CheckoutOrderHandler {
    gateway: Arc<dyn PayPalGateway>,
    reconciler: Arc<OrderReconciler>,
}

impl CheckoutOrderHandler {
    pub fn new(gateway: Arc<dyn PayPalGateway>, reconciler: Arc<OrderReconciler>) -> Self {
        Self { gateway, reconciler }
    }
}

#[async_trait]
impl WebhookEventHandler for CheckoutOrderHandler {
    fn name(&self) -> &'static str {
        "checkout_order"
    }

    fn handles(&self) -> Vec<WebhookEventType> {
        vec![
            WebhookEventType::CheckoutOrderApproved,
            WebhookEventType::CheckoutOrderCompleted,
        ]
    }

    async fn handle(&self, event: &WebhookEvent) -> Result<(), WebhookError> {
        let paypal_order_id = event
            .resource_id()
            .ok_or(WebhookError::MissingField("resource.id"))?;

        let paypal_order = self
            .gateway
            .get_order(paypal_order_id)
            .await
            .map_err(|e| WebhookError::Handler(e.to_string()))?;

        let order = self.reconciler.reconcile_paypal_order(paypal_order).await?;

        tracing::info!(
            event_id = %event.id,
            order_id = %order.id,
            paypal_order_id,
            status = ?order.status,
            "Checkout order event applied"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::webhooks::test_support::Harness;
    use crate::domain::order::{LocalOrderStatus, OrderIntent, PayPalOrderStatus};
    use crate::domain::webhook::WebhookEventBuilder;
    use serde_json::json;

    #[tokio::test]
    async fn approved_event_captures_and_marks_paid() {
        let h = Harness::with_order(OrderIntent::Capture).await;
        h.gateway.add_order(h.paypal_order(PayPalOrderStatus::Approved));
        let handler = CheckoutOrderHandler::new(h.gateway_arc(), h.reconciler.clone());
        let event = WebhookEventBuilder::new()
            .event_type("CHECKOUT.ORDER.APPROVED")
            .resource(json!({"id": Harness::PAYPAL_ORDER_ID, "status": "APPROVED"}))
            .build();

        handler.handle(&event).await.unwrap();

        assert!(h.gateway.was_called("capture_order"));
        assert_eq!(h.order().await.status, LocalOrderStatus::Processing);
    }

    #[tokio::test]
    async fn event_without_resource_id_is_rejected() {
        let h = Harness::with_order(OrderIntent::Capture).await;
        let handler = CheckoutOrderHandler::new(h.gateway_arc(), h.reconciler.clone());
        let event = WebhookEventBuilder::new()
            .event_type("CHECKOUT.ORDER.APPROVED")
            .resource(json!({}))
            .build();

        let err = handler.handle(&event).await.unwrap_err();

        assert!(matches!(err, WebhookError::MissingField(_)));
    }
}
