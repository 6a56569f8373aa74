//! ProcessedEventStore port - webhook delivery deduplication.
//!
//! PayPal delivers webhooks at least once and retries on non-2xx or
//! timeout. The processor claims each event id before dispatch; a second
//! delivery of the same id finds the claim and is acknowledged without
//! running handlers again.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::foundation::DomainError;

/// Result of claiming an event id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimResult {
    /// First delivery; the caller must dispatch.
    Claimed,
    /// Already seen within the retention window.
    AlreadyProcessed,
}

/// Port for tracking which webhook event ids have been processed.
///
/// # Example
///
/// ```ignore
/// match store.claim(&event.id, retention).await? {
///     ClaimResult::Claimed => dispatch(&event).await,
///     ClaimResult::AlreadyProcessed => return Ok(WebhookOutcome::Duplicate),
/// }
/// ```
#[async_trait]
pub trait ProcessedEventStore: Send + Sync {
    /// Atomically records the event id for `retention`.
    async fn claim(&self, event_id: &str, retention: Duration) -> Result<ClaimResult, DomainError>;

    /// Checks whether an event id is currently recorded.
    async fn contains(&self, event_id: &str) -> Result<bool, DomainError>;
}
