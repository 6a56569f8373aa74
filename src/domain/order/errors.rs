//! Order reconciliation errors.

use thiserror::Error;

use crate::domain::foundation::{DomainError, LocalOrderId, ValidationError};
use crate::ports::GatewayError;

/// Errors from creating, capturing and reconciling orders.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Capture preconditions not met (wrong intent, already captured).
    #[error("Invalid state for order {order_id}: {reason}")]
    InvalidState {
        order_id: LocalOrderId,
        reason: String,
    },

    #[error("Order {0} not found")]
    OrderNotFound(LocalOrderId),

    /// The PayPal order does not link back to a local order.
    #[error("PayPal order {0} carries no custom id")]
    MissingCustomId(String),

    /// The PayPal order referenced by a token could not be fetched.
    #[error("PayPal order {paypal_order_id} unavailable: {reason}")]
    PayPalOrderMissing {
        paypal_order_id: String,
        reason: String,
    },

    /// Another request holds the capture lock for this order.
    #[error("Capture already in progress for order {0}")]
    CaptureInProgress(LocalOrderId),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("Invalid order data: {0}")]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl OrderError {
    pub fn invalid_state(order_id: LocalOrderId, reason: impl Into<String>) -> Self {
        OrderError::InvalidState {
            order_id,
            reason: reason.into(),
        }
    }

    /// Data integrity failures: the request must stop, retrying won't help.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            OrderError::MissingCustomId(_)
                | OrderError::PayPalOrderMissing { .. }
                | OrderError::OrderNotFound(_)
                | OrderError::Validation(_)
        )
    }
}

impl From<DomainError> for OrderError {
    fn from(err: DomainError) -> Self {
        OrderError::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_state_displays_reason() {
        let err = OrderError::invalid_state(LocalOrderId::new(9), "payment already captured");
        assert_eq!(
            err.to_string(),
            "Invalid state for order 9: payment already captured"
        );
    }

    #[test]
    fn missing_links_are_fatal() {
        assert!(OrderError::MissingCustomId("5O19".to_string()).is_fatal());
        assert!(OrderError::OrderNotFound(LocalOrderId::new(1)).is_fatal());
    }

    #[test]
    fn gateway_and_state_errors_are_not_fatal() {
        assert!(!OrderError::Gateway(GatewayError::Network("reset".to_string())).is_fatal());
        assert!(!OrderError::invalid_state(LocalOrderId::new(1), "x").is_fatal());
    }

    #[test]
    fn domain_errors_become_storage_errors() {
        let err: OrderError = DomainError::storage("redis down").into();
        assert!(matches!(err, OrderError::Storage(_)));
    }
}
