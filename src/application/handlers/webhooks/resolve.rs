//! Shared lookups for order-affecting webhook handlers.

use crate::application::handlers::orders::resolve_local_order_id;
use crate::domain::foundation::LocalOrderId;
use crate::domain::order::OrderError;
use crate::domain::webhook::{WebhookError, WebhookEvent};
use crate::ports::PayPalGateway;

/// Finds the local order an event refers to.
///
/// The resource's own `custom_id` wins. Captures without one are traced
/// back through the related PayPal order.
pub(crate) async fn resolve_order_id(
    event: &WebhookEvent,
    gateway: &dyn PayPalGateway,
) -> Result<LocalOrderId, WebhookError> {
    if let Some(custom_id) = event.custom_id() {
        return custom_id
            .parse()
            .map_err(|_| WebhookError::Ignored(format!("custom id {} is not a local order", custom_id)));
    }

    let paypal_order_id = event
        .related_order_id()
        .ok_or(WebhookError::MissingField("custom_id"))?;

    let paypal_order = gateway
        .get_order(paypal_order_id)
        .await
        .map_err(|e| WebhookError::Handler(e.to_string()))?;

    Ok(resolve_local_order_id(&paypal_order)?)
}

impl From<OrderError> for WebhookError {
    fn from(err: OrderError) -> Self {
        match err {
            // Not one of this shop's orders, or already past this point.
            OrderError::MissingCustomId(_)
            | OrderError::OrderNotFound(_)
            | OrderError::PayPalOrderMissing { .. }
            | OrderError::InvalidState { .. } => WebhookError::Ignored(err.to_string()),
            OrderError::Storage(msg) => WebhookError::Storage(msg),
            other => WebhookError::Handler(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::paypal::MockPayPalGateway;
    use crate::domain::order::{OrderIntent, PayPalOrder, PayPalOrderStatus, PurchaseUnit};
    use crate::domain::webhook::WebhookEventBuilder;
    use serde_json::json;

    #[tokio::test]
    async fn custom_id_on_resource_is_used_directly() {
        let gateway = MockPayPalGateway::new();
        let event = WebhookEventBuilder::new()
            .resource(json!({"id": "CAP-1", "custom_id": "1042"}))
            .build();

        let id = resolve_order_id(&event, &gateway).await.unwrap();

        assert_eq!(id, LocalOrderId::new(1042));
        assert!(!gateway.was_called("get_order"));
    }

    #[tokio::test]
    async fn falls_back_to_related_paypal_order() {
        let gateway = MockPayPalGateway::new();
        gateway.add_order(PayPalOrder {
            id: "5O190127TN364715T".to_string(),
            intent: OrderIntent::Capture,
            status: PayPalOrderStatus::Completed,
            purchase_units: vec![PurchaseUnit {
                reference_id: None,
                custom_id: Some("77".to_string()),
                invoice_id: None,
                amount: None,
                payments: None,
            }],
        });
        let event = WebhookEventBuilder::new()
            .resource(json!({
                "id": "CAP-1",
                "supplementary_data": {"related_ids": {"order_id": "5O190127TN364715T"}}
            }))
            .build();

        assert_eq!(resolve_order_id(&event, &gateway).await.unwrap(), LocalOrderId::new(77));
    }

    #[tokio::test]
    async fn foreign_custom_id_is_ignored() {
        let gateway = MockPayPalGateway::new();
        let event = WebhookEventBuilder::new()
            .resource(json!({"id": "CAP-1", "custom_id": "other-plugin-123"}))
            .build();

        let err = resolve_order_id(&event, &gateway).await.unwrap_err();

        assert!(matches!(err, WebhookError::Ignored(_)));
    }

    #[tokio::test]
    async fn event_without_any_link_is_missing_field() {
        let gateway = MockPayPalGateway::new();
        let event = WebhookEventBuilder::new().resource(json!({"id": "CAP-1"})).build();

        let err = resolve_order_id(&event, &gateway).await.unwrap_err();

        assert!(matches!(err, WebhookError::MissingField("custom_id")));
    }
}
