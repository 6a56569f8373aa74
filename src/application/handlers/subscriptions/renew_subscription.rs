//! RenewSubscriptionHandler - charges a vaulted token for a renewal order.
//!
//! Triggered by an external scheduler, one renewal order at a time. A
//! failed renewal is recorded on the order and reported in the outcome,
//! never raised, so one bad subscription cannot stop a batch. Retrying is
//! left to the scheduler.

use std::sync::Arc;

use crate::application::handlers::orders::{
    CreatePayPalOrderCommand, CreatePayPalOrderHandler, OrderReconciler,
};
use crate::domain::foundation::{CustomerId, LocalOrderId, Timestamp};
use crate::domain::order::{evaluate, OrderError, OrderEvent, OrderIntent, OrderOutcome};
use crate::domain::vault::{PaymentSourceKind, PaymentToken};
use crate::ports::{OrderRepository, PaymentSourceRequest};

use super::{PaymentTokenResolver, RenewalError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenewalOutcome {
    /// `CAPTURE` renewal paid immediately.
    Completed { transaction_id: Option<String> },
    /// `AUTHORIZE` renewal authorized and then captured.
    Captured,
    /// Renewal not paid; the order is marked failed.
    Failed { reason: String },
}

impl RenewalOutcome {
    pub fn is_paid(&self) -> bool {
        !matches!(self, RenewalOutcome::Failed { .. })
    }
}

pub struct RenewSubscriptionHandler {
    orders: Arc<dyn OrderRepository>,
    create_order: Arc<CreatePayPalOrderHandler>,
    reconciler: Arc<OrderReconciler>,
    tokens: Arc<PaymentTokenResolver>,
}

impl RenewSubscriptionHandler {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        create_order: Arc<CreatePayPalOrderHandler>,
        reconciler: Arc<OrderReconciler>,
        tokens: Arc<PaymentTokenResolver>,
    ) -> Self {
        Self {
            orders,
            create_order,
            reconciler,
            tokens,
        }
    }

    /// Renews one order. Failures are logged, recorded and returned as
    /// `RenewalOutcome::Failed`.
    pub async fn renew(&self, order_id: LocalOrderId) -> RenewalOutcome {
        match self.try_renew(order_id).await {
            Ok(outcome) => outcome,
            Err(e) => self.record_failure(order_id, e).await,
        }
    }

    /// Renews each order in turn.
    pub async fn renew_batch(&self, order_ids: &[LocalOrderId]) -> Vec<(LocalOrderId, RenewalOutcome)> {
        let mut results = Vec::with_capacity(order_ids.len());
        for &order_id in order_ids {
            results.push((order_id, self.renew(order_id).await));
        }
        let failed = results.iter().filter(|(_, o)| !o.is_paid()).count();
        tracing::info!(total = results.len(), failed, "Renewal batch finished");
        results
    }

    async fn try_renew(&self, order_id: LocalOrderId) -> Result<RenewalOutcome, RenewalError> {
        let order = self
            .orders
            .find_by_id(order_id)
            .await
            .map_err(OrderError::from)?
            .ok_or(OrderError::OrderNotFound(order_id))?;

        let vault_customer_id = order
            .meta
            .vault_customer_id
            .clone()
            .ok_or(RenewalError::NoVaultCustomer(order_id))?;

        let token = self
            .tokens
            .resolve(&vault_customer_id, order.meta.payment_token_id.as_deref())
            .await?;

        let intent = order.meta.intent.unwrap_or(OrderIntent::Capture);
        let paypal_order = self
            .create_order
            .handle(CreatePayPalOrderCommand {
                order_id,
                intent,
                payment_source: Some(source_for(&token)),
            })
            .await?;

        let outcome = evaluate(&paypal_order);
        let order = self
            .orders
            .find_by_id(order_id)
            .await
            .map_err(OrderError::from)?
            .ok_or(OrderError::OrderNotFound(order_id))?;

        match (paypal_order.intent, outcome) {
            (OrderIntent::Capture, OrderOutcome::Paid { capture_id, .. }) => {
                self.reconciler.apply_paypal_order(order, &paypal_order).await?;
                self.reconciler
                    .complete(order_id, "Subscription renewal paid")
                    .await?;
                tracing::info!(order_id = %order_id, transaction_id = ?capture_id, "Renewal completed");
                Ok(RenewalOutcome::Completed {
                    transaction_id: capture_id,
                })
            }
            (OrderIntent::Authorize, OrderOutcome::Authorized { .. }) => {
                self.reconciler.apply_paypal_order(order, &paypal_order).await?;
                if self.reconciler.capture_authorized_payment(order_id).await? {
                    tracing::info!(order_id = %order_id, "Renewal authorized and captured");
                    Ok(RenewalOutcome::Captured)
                } else {
                    Err(RenewalError::Declined("authorization capture declined".to_string()))
                }
            }
            (_, outcome) => {
                self.reconciler.apply_paypal_order(order, &paypal_order).await?;
                Err(RenewalError::Declined(format!(
                    "PayPal order {} ended {:?}",
                    paypal_order.id, outcome
                )))
            }
        }
    }

    async fn record_failure(&self, order_id: LocalOrderId, error: RenewalError) -> RenewalOutcome {
        let reason = error.to_string();
        let customer_id = self.customer_of(order_id).await;

        tracing::error!(
            order_id = %order_id,
            customer_id = ?customer_id,
            error = %reason,
            "Subscription renewal failed"
        );

        if let Err(e) = self.reconciler.mark_failed(order_id, &reason).await {
            tracing::warn!(order_id = %order_id, error = %e, "Could not mark renewal order failed");
        }

        self.reconciler
            .publish(OrderEvent::RenewalFailed {
                order_id,
                customer_id,
                reason: reason.clone(),
                occurred_at: Timestamp::now(),
            })
            .await;

        RenewalOutcome::Failed { reason }
    }

    async fn customer_of(&self, order_id: LocalOrderId) -> Option<CustomerId> {
        self.orders
            .find_by_id(order_id)
            .await
            .ok()
            .flatten()
            .and_then(|o| o.customer_id)
    }
}

fn source_for(token: &PaymentToken) -> PaymentSourceRequest {
    match token.source {
        PaymentSourceKind::Paypal => PaymentSourceRequest::Paypal {
            vault_id: token.id.clone(),
        },
        PaymentSourceKind::Card => PaymentSourceRequest::Card {
            vault_id: token.id.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::events::RecordingOrderEventPublisher;
    use crate::adapters::paypal::MockPayPalGateway;
    use crate::adapters::storage::{InMemoryKeyValueStore, InMemoryOrderRepository, KvPaymentTokenStore};
    use crate::application::handlers::orders::RequestIdRepository;
    use crate::domain::order::{
        Capture, CaptureStatus, LocalOrder, LocalOrderStatus, OrderMeta, PayPalOrder,
        PayPalOrderStatus, Payments, PurchaseUnit,
    };
    use crate::ports::GatewayError;
    use rust_decimal::Decimal;
    use std::time::Duration;

    struct Fixture {
        gateway: MockPayPalGateway,
        orders: InMemoryOrderRepository,
        events: RecordingOrderEventPublisher,
        handler: RenewSubscriptionHandler,
    }

    fn fixture() -> Fixture {
        let gateway = MockPayPalGateway::new();
        let orders = InMemoryOrderRepository::new();
        let events = RecordingOrderEventPublisher::new();
        let kv = Arc::new(InMemoryKeyValueStore::new());
        let request_ids = Arc::new(RequestIdRepository::new(kv.clone(), Duration::from_secs(3600)));
        let gateway_port = Arc::new(gateway.clone());
        let orders_port = Arc::new(orders.clone());

        let reconciler = Arc::new(OrderReconciler::new(
            gateway_port.clone(),
            orders_port.clone(),
            Arc::new(events.clone()),
            request_ids.clone(),
        ));
        let create_order = Arc::new(CreatePayPalOrderHandler::new(
            gateway_port.clone(),
            orders_port.clone(),
            request_ids,
        ));
        let tokens = Arc::new(PaymentTokenResolver::new(
            gateway_port,
            Arc::new(KvPaymentTokenStore::new(kv)),
        ));

        Fixture {
            handler: RenewSubscriptionHandler::new(orders_port, create_order, reconciler, tokens),
            gateway,
            orders,
            events,
        }
    }

    async fn renewal_order(f: &Fixture, id: u64, intent: OrderIntent) -> LocalOrderId {
        let order_id = LocalOrderId::new(id);
        let order = LocalOrder::new(order_id, "USD", Decimal::new(1042, 2))
            .with_customer(CustomerId::new(7))
            .with_meta(OrderMeta {
                intent: Some(intent),
                vault_customer_id: Some("cust-7".to_string()),
                ..OrderMeta::default()
            });
        f.orders.insert(order).await;
        f.gateway.set_payment_tokens(
            "cust-7",
            vec![PaymentToken::new("tok-7", PaymentSourceKind::Paypal, "cust-7")],
        );
        order_id
    }

    fn completed_order(id: &str, custom_id: u64) -> PayPalOrder {
        PayPalOrder {
            id: id.to_string(),
            intent: OrderIntent::Capture,
            status: PayPalOrderStatus::Completed,
            purchase_units: vec![PurchaseUnit {
                reference_id: None,
                custom_id: Some(custom_id.to_string()),
                invoice_id: None,
                amount: None,
                payments: Some(Payments {
                    captures: vec![Capture {
                        id: "CAP-R1".to_string(),
                        status: CaptureStatus::Completed,
                        amount: None,
                        custom_id: None,
                        status_details: None,
                        seller_receivable_breakdown: None,
                    }],
                    ..Payments::default()
                }),
            }],
        }
    }

    #[tokio::test]
    async fn capture_renewal_completes_order() {
        let f = fixture();
        let order_id = renewal_order(&f, 501, OrderIntent::Capture).await;
        f.gateway.queue_created_order(completed_order("R-ORDER-1", 501));

        let outcome = f.handler.renew(order_id).await;

        assert_eq!(
            outcome,
            RenewalOutcome::Completed {
                transaction_id: Some("CAP-R1".to_string())
            }
        );
        let order = f.orders.get(order_id).await.unwrap();
        assert_eq!(order.status, LocalOrderStatus::Completed);
        assert_eq!(order.meta.payment_token_id.as_deref(), Some("tok-7"));
        let (request, _) = f.gateway.create_requests().remove(0);
        assert_eq!(
            request.payment_source,
            Some(PaymentSourceRequest::Paypal {
                vault_id: "tok-7".to_string()
            })
        );
    }

    #[tokio::test]
    async fn authorize_renewal_is_captured() {
        let f = fixture();
        let order_id = renewal_order(&f, 502, OrderIntent::Authorize).await;
        let mut authorized = completed_order("R-ORDER-2", 502);
        authorized.intent = OrderIntent::Authorize;
        authorized.purchase_units[0].payments = Some(Payments {
            authorizations: vec![crate::domain::order::Authorization {
                id: "AUTH-R2".to_string(),
                status: crate::domain::order::AuthorizationStatus::Created,
                amount: None,
                custom_id: None,
            }],
            ..Payments::default()
        });
        f.gateway.queue_created_order(authorized);

        let outcome = f.handler.renew(order_id).await;

        assert_eq!(outcome, RenewalOutcome::Captured);
        assert!(f.gateway.was_called("capture_authorization"));
        let order = f.orders.get(order_id).await.unwrap();
        assert!(order.meta.captured);
        assert_eq!(order.status, LocalOrderStatus::Processing);
    }

    #[tokio::test]
    async fn missing_token_fails_renewal_without_error() {
        let f = fixture();
        let order_id = renewal_order(&f, 503, OrderIntent::Capture).await;
        f.gateway.set_payment_tokens("cust-7", vec![]);

        let outcome = f.handler.renew(order_id).await;

        assert!(matches!(outcome, RenewalOutcome::Failed { .. }));
        assert!(!f.gateway.was_called("create_order"));
        assert_eq!(f.orders.get(order_id).await.unwrap().status, LocalOrderStatus::Failed);
        assert!(f.events.has_event("order.renewal_failed"));
    }

    #[tokio::test]
    async fn unpaid_paypal_order_fails_renewal() {
        let f = fixture();
        let order_id = renewal_order(&f, 504, OrderIntent::Capture).await;

        // Default mock order is CREATED with no capture.
        let outcome = f.handler.renew(order_id).await;

        assert!(matches!(outcome, RenewalOutcome::Failed { .. }));
        assert_eq!(f.orders.get(order_id).await.unwrap().status, LocalOrderStatus::Failed);
    }

    #[tokio::test]
    async fn batch_continues_after_a_failure() {
        let f = fixture();
        let failing = renewal_order(&f, 505, OrderIntent::Capture).await;
        let paying = renewal_order(&f, 506, OrderIntent::Capture).await;
        f.gateway.set_method_error(
            "create_order",
            GatewayError::Network("connection reset".to_string()),
        );

        let first = f.handler.renew_batch(&[failing]).await;
        f.gateway.clear_errors();
        f.gateway.queue_created_order(completed_order("R-ORDER-6", 506));
        let second = f.handler.renew_batch(&[paying]).await;

        assert!(matches!(first[0].1, RenewalOutcome::Failed { .. }));
        assert!(second[0].1.is_paid());
    }
}
