//! Order domain events.
//!
//! Published after the order metadata is persisted. Dependents (shipment
//! tracking, analytics, accounting exports) subscribe through the
//! `OrderEventPublisher` port.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{CustomerId, LocalOrderId, Money, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    /// An authorized payment was captured.
    Captured {
        order_id: LocalOrderId,
        paypal_order_id: Option<String>,
        capture_id: String,
        gross: Option<Money>,
        occurred_at: Timestamp,
    },

    /// The order is paid and may be fulfilled.
    PaymentCompleted {
        order_id: LocalOrderId,
        transaction_id: Option<String>,
        occurred_at: Timestamp,
    },

    Refunded {
        order_id: LocalOrderId,
        refund_id: String,
        amount: Option<Money>,
        fully_refunded: bool,
        occurred_at: Timestamp,
    },

    Failed {
        order_id: LocalOrderId,
        reason: String,
        occurred_at: Timestamp,
    },

    /// A subscription renewal charge did not go through.
    RenewalFailed {
        order_id: LocalOrderId,
        customer_id: Option<CustomerId>,
        reason: String,
        occurred_at: Timestamp,
    },
}

impl OrderEvent {
    pub fn order_id(&self) -> LocalOrderId {
        match self {
            OrderEvent::Captured { order_id, .. }
            | OrderEvent::PaymentCompleted { order_id, .. }
            | OrderEvent::Refunded { order_id, .. }
            | OrderEvent::Failed { order_id, .. }
            | OrderEvent::RenewalFailed { order_id, .. } => *order_id,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::Captured { .. } => "order.captured",
            OrderEvent::PaymentCompleted { .. } => "order.payment_completed",
            OrderEvent::Refunded { .. } => "order.refunded",
            OrderEvent::Failed { .. } => "order.failed",
            OrderEvent::RenewalFailed { .. } => "order.renewal_failed",
        }
    }
}
