//! Webhook handlers.
//!
//! ## Processing
//! - `WebhookProcessor` - verify, dedupe and dispatch inbound deliveries
//!
//! ## Event Handlers
//! - Checkout order approved / completed
//! - Capture completed, pending, refunded
//! - Capture reversed or denied, order cancelled
//! - Disputes
//! - Vault token deleted
//!
//! ## Registration
//! - `RegisterWebhookHandler` - single webhook per shop URL

mod capture_completed;
mod capture_pending;
mod capture_refunded;
mod capture_reversed;
mod checkout_order;
mod dispute;
mod process_webhook;
mod register_webhook;
mod registry;
mod resolve;
mod vault_token_deleted;

pub use capture_completed::CaptureCompletedHandler;
pub use capture_pending::CapturePendingHandler;
pub use capture_refunded::CaptureRefundedHandler;
pub use capture_reversed::PaymentReversalHandler;
pub use checkout_order::CheckoutOrderHandler;
pub use dispute::DisputeHandler;
pub use process_webhook::{
    ProcessWebhookCommand, ProcessWebhookResult, WebhookProcessor, WebhookProcessorConfig,
};
pub use register_webhook::{RegisterWebhookHandler, RegistrationError};
pub use registry::default_registry;
pub use vault_token_deleted::VaultTokenDeletedHandler;

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;
    use std::time::Duration;

    use rust_decimal::Decimal;

    use crate::adapters::events::RecordingOrderEventPublisher;
    use crate::adapters::paypal::MockPayPalGateway;
    use crate::adapters::storage::{InMemoryKeyValueStore, InMemoryOrderRepository};
    use crate::application::handlers::orders::{OrderReconciler, RequestIdRepository};
    use crate::domain::foundation::LocalOrderId;
    use crate::domain::order::{
        LocalOrder, LocalOrderStatus, OrderIntent, OrderMeta, PayPalOrder, PayPalOrderStatus,
        PurchaseUnit,
    };
    use crate::ports::PayPalGateway;

    /// One local order wired to a mock gateway and in-memory stores.
    pub struct Harness {
        pub gateway: MockPayPalGateway,
        pub orders: InMemoryOrderRepository,
        pub events: RecordingOrderEventPublisher,
        pub reconciler: Arc<OrderReconciler>,
        intent: OrderIntent,
    }

    impl Harness {
        pub const ORDER_ID: u64 = 1042;
        pub const PAYPAL_ORDER_ID: &'static str = "5O190127TN364715T";

        pub async fn new() -> Self {
            let gateway = MockPayPalGateway::new();
            let orders = InMemoryOrderRepository::new();
            let events = RecordingOrderEventPublisher::new();
            let request_ids = Arc::new(RequestIdRepository::new(
                Arc::new(InMemoryKeyValueStore::new()),
                Duration::from_secs(3600),
            ));
            let reconciler = Arc::new(OrderReconciler::new(
                Arc::new(gateway.clone()),
                Arc::new(orders.clone()),
                Arc::new(events.clone()),
                request_ids,
            ));
            Self {
                gateway,
                orders,
                events,
                reconciler,
                intent: OrderIntent::Capture,
            }
        }

        pub async fn with_order(intent: OrderIntent) -> Self {
            let mut h = Self::new().await;
            h.intent = intent;
            let order = LocalOrder::new(LocalOrderId::new(Self::ORDER_ID), "USD", Decimal::new(1042, 2))
                .with_meta(OrderMeta {
                    paypal_order_id: Some(Self::PAYPAL_ORDER_ID.to_string()),
                    intent: Some(intent),
                    ..OrderMeta::default()
                });
            h.orders.insert(order).await;
            h
        }

        /// A `CAPTURE` order already marked paid.
        pub async fn with_paid_order() -> Self {
            let h = Self::with_order(OrderIntent::Capture).await;
            let mut order = h.order().await;
            order.status = LocalOrderStatus::Processing;
            order.meta.transaction_id = Some("3C679366HH908993F".to_string());
            h.orders.insert(order).await;
            h
        }

        pub fn gateway_arc(&self) -> Arc<dyn PayPalGateway> {
            Arc::new(self.gateway.clone())
        }

        pub fn paypal_order(&self, status: PayPalOrderStatus) -> PayPalOrder {
            PayPalOrder {
                id: Self::PAYPAL_ORDER_ID.to_string(),
                intent: self.intent,
                status,
                purchase_units: vec![PurchaseUnit {
                    reference_id: None,
                    custom_id: Some(Self::ORDER_ID.to_string()),
                    invoice_id: None,
                    amount: None,
                    payments: None,
                }],
            }
        }

        pub async fn order(&self) -> LocalOrder {
            self.orders
                .get(LocalOrderId::new(Self::ORDER_ID))
                .await
                .expect("harness order exists")
        }
    }
}
