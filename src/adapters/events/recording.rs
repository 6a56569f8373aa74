//! Order event publishers that stay in-process.
//!
//! `LoggingOrderEventPublisher` writes each event to the tracing pipeline
//! and is what the binary runs with. `RecordingOrderEventPublisher` keeps
//! events in memory for test assertions.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::domain::order::OrderEvent;
use crate::ports::OrderEventPublisher;

/// Emits order events as structured log lines.
#[derive(Debug, Default, Clone)]
pub struct LoggingOrderEventPublisher;

impl LoggingOrderEventPublisher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl OrderEventPublisher for LoggingOrderEventPublisher {
    async fn publish(&self, event: OrderEvent) -> Result<(), DomainError> {
        let payload = serde_json::to_string(&event)?;
        tracing::info!(
            event_type = event.event_type(),
            order_id = %event.order_id(),
            payload = %payload,
            "Order event published"
        );
        Ok(())
    }
}

/// Captures published events for assertions.
///
/// # Example
///
/// ```ignore
/// let events = RecordingOrderEventPublisher::new();
/// reconciler.record_capture_completed(..).await?;
/// assert!(events.has_event("order.payment_completed"));
/// ```
#[derive(Debug, Default, Clone)]
pub struct RecordingOrderEventPublisher {
    published: Arc<Mutex<Vec<OrderEvent>>>,
    fail_with: Arc<Mutex<Option<String>>>,
}

impl RecordingOrderEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    // === Test Helpers ===

    pub fn published(&self) -> Vec<OrderEvent> {
        self.published
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    pub fn has_event(&self, event_type: &str) -> bool {
        self.published()
            .iter()
            .any(|e| e.event_type() == event_type)
    }

    pub fn event_count(&self) -> usize {
        self.published().len()
    }

    /// Makes every subsequent publish fail with a storage error.
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.fail_with.lock().unwrap_or_else(|p| p.into_inner()) = Some(message.into());
    }
}

#[async_trait]
impl OrderEventPublisher for RecordingOrderEventPublisher {
    async fn publish(&self, event: OrderEvent) -> Result<(), DomainError> {
        if let Some(message) = self
            .fail_with
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
        {
            return Err(DomainError::storage(message));
        }
        self.published
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(event);
        Ok(())
    }
}
