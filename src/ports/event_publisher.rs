//! OrderEventPublisher port - Interface for publishing order domain events.
//!
//! The reconciler publishes after the order update is persisted, so a
//! publish failure never rolls back a captured payment.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::domain::order::OrderEvent;

/// Port for publishing order events.
///
/// # Example
///
/// ```ignore
/// publisher.publish(OrderEvent::PaymentCompleted { .. }).await?;
/// ```
#[async_trait]
pub trait OrderEventPublisher: Send + Sync {
    async fn publish(&self, event: OrderEvent) -> Result<(), DomainError>;
}
