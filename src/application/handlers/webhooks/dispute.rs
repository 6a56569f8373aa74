//! CUSTOMER.DISPUTE.CREATED / CUSTOMER.DISPUTE.RESOLVED.
//!
//! Disputes carry the merchant's `custom` value on each disputed
//! transaction rather than a top-level `custom_id`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::application::handlers::orders::OrderReconciler;
use crate::domain::foundation::LocalOrderId;
use crate::domain::webhook::{WebhookError, WebhookEvent, WebhookEventHandler, WebhookEventType};

pub struct DisputeHandler {
    reconciler: Arc<OrderReconciler>,
}

impl DisputeHandler {
    pub fn new(reconciler: Arc<OrderReconciler>) -> Self {
        Self { reconciler }
    }
}

fn disputed_order_id(event: &WebhookEvent) -> Result<LocalOrderId, WebhookError> {
    let custom = event
        .custom_id()
        .or_else(|| {
            event
                .resource
                .pointer("/disputed_transactions/0/custom")
                .and_then(|v| v.as_str())
        })
        .ok_or(WebhookError::MissingField("disputed_transactions.custom"))?;

    custom
        .parse()
        .map_err(|_| WebhookError::Ignored(format!("dispute for foreign transaction {}", custom)))
}

#[async_trait]
impl WebhookEventHandler for DisputeHandler {
    fn name(&self) -> &'static str {
        "dispute"
    }

    fn handles(&self) -> Vec<WebhookEventType> {
        vec![
            WebhookEventType::CustomerDisputeCreated,
            WebhookEventType::CustomerDisputeResolved,
        ]
    }

    async fn handle(&self, event: &WebhookEvent) -> Result<(), WebhookError> {
        let order_id = disputed_order_id(event)?;
        let dispute_id = event
            .resource
            .get("dispute_id")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");

        if event.parsed_type() == WebhookEventType::CustomerDisputeCreated {
            let reason = event
                .resource
                .get("reason")
                .and_then(|v| v.as_str())
                .unwrap_or("unspecified");
            let note = format!("PayPal dispute {} opened: {}", dispute_id, reason);
            self.reconciler.hold(order_id, &note).await?;
            tracing::warn!(order_id = %order_id, dispute_id, reason, "Dispute opened");
        } else {
            let outcome = event
                .resource
                .pointer("/dispute_outcome/outcome_code")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown");
            let note = format!("PayPal dispute {} resolved: {}", dispute_id, outcome);
            self.reconciler.add_note(order_id, &note).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::webhooks::test_support::Harness;
    use crate::domain::order::LocalOrderStatus;
    use crate::domain::webhook::WebhookEventBuilder;
    use serde_json::json;

    fn dispute(event_type: &str, extra: serde_json::Value) -> WebhookEvent {
        let mut resource = json!({
            "dispute_id": "PP-D-27803",
            "reason": "MERCHANDISE_OR_SERVICE_NOT_RECEIVED",
            "disputed_transactions": [{"seller_transaction_id": "3C679366HH908993F", "custom": Harness::ORDER_ID.to_string()}]
        });
        if let (Some(target), Some(extra)) = (resource.as_object_mut(), extra.as_object()) {
            target.extend(extra.clone());
        }
        WebhookEventBuilder::new()
            .event_type(event_type)
            .resource(resource)
            .build()
    }

    #[tokio::test]
    async fn opened_dispute_holds_order() {
        let h = Harness::with_paid_order().await;
        let handler = DisputeHandler::new(h.reconciler.clone());

        handler
            .handle(&dispute("CUSTOMER.DISPUTE.CREATED", json!({})))
            .await
            .unwrap();

        let order = h.order().await;
        assert_eq!(order.status, LocalOrderStatus::OnHold);
        assert!(order.notes[0].contains("MERCHANDISE_OR_SERVICE_NOT_RECEIVED"));
    }

    #[tokio::test]
    async fn resolved_dispute_only_adds_note() {
        let h = Harness::with_paid_order().await;
        let handler = DisputeHandler::new(h.reconciler.clone());

        handler
            .handle(&dispute(
                "CUSTOMER.DISPUTE.RESOLVED",
                json!({"dispute_outcome": {"outcome_code": "RESOLVED_SELLER_FAVOUR"}}),
            ))
            .await
            .unwrap();

        let order = h.order().await;
        assert_eq!(order.status, LocalOrderStatus::Processing);
        assert!(order.notes[0].contains("RESOLVED_SELLER_FAVOUR"));
    }

    #[test]
    fn dispute_without_transaction_is_missing_field() {
        let event = WebhookEventBuilder::new()
            .event_type("CUSTOMER.DISPUTE.CREATED")
            .resource(json!({"dispute_id": "PP-D-1"}))
            .build();
        assert!(matches!(disputed_order_id(&event), Err(WebhookError::MissingField(_))));
    }
}
