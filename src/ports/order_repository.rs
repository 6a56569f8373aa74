//! OrderRepository port - access to storefront orders.
//!
//! The order aggregate belongs to the shop. The payment core reads orders
//! and writes only its metadata keys, the status and order notes.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, LocalOrderId};
use crate::domain::order::{LocalOrder, LocalOrderStatus, OrderMeta};

#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn find_by_id(&self, id: LocalOrderId) -> Result<Option<LocalOrder>, DomainError>;

    /// Overwrites the payment metadata of an order.
    async fn update_meta(&self, id: LocalOrderId, meta: &OrderMeta) -> Result<(), DomainError>;

    /// Sets the order status, optionally recording a note alongside.
    async fn update_status(
        &self,
        id: LocalOrderId,
        status: LocalOrderStatus,
        note: Option<&str>,
    ) -> Result<(), DomainError>;

    async fn add_note(&self, id: LocalOrderId, note: &str) -> Result<(), DomainError>;

    /// Takes the per-order capture lock. Returns `false` when already held.
    ///
    /// The lock expires after `ttl` so a crashed request cannot wedge an order.
    async fn try_lock_capture(&self, id: LocalOrderId, ttl: Duration) -> Result<bool, DomainError>;

    async fn release_capture(&self, id: LocalOrderId) -> Result<(), DomainError>;
}
