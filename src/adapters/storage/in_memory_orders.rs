//! In-memory order repository.
//!
//! Stands in for the storefront's order storage in tests and in the
//! standalone binary, where orders are seeded through `insert`.
//!
//! The capture lock lives in a local map unless a shared
//! [`KeyValueStore`] is attached with `with_lock_store`, in which case it
//! is a `SET NX EX` key visible to every server.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, LocalOrderId};
use crate::domain::order::{LocalOrder, LocalOrderStatus, OrderMeta};
use crate::ports::{KeyValueStore, OrderRepository};

#[derive(Default, Clone)]
pub struct InMemoryOrderRepository {
    orders: Arc<RwLock<HashMap<LocalOrderId, LocalOrder>>>,
    capture_locks: Arc<RwLock<HashMap<LocalOrderId, Instant>>>,
    lock_store: Option<Arc<dyn KeyValueStore>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep capture locks in a shared store instead of process memory.
    pub fn with_lock_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.lock_store = Some(store);
        self
    }

    fn lock_key(id: LocalOrderId) -> String {
        format!("capture_lock:{}", id)
    }

    /// Adds or replaces an order.
    pub async fn insert(&self, order: LocalOrder) {
        self.orders.write().await.insert(order.id, order);
    }

    /// Snapshot of an order for assertions.
    pub async fn get(&self, id: LocalOrderId) -> Option<LocalOrder> {
        self.orders.read().await.get(&id).cloned()
    }

    async fn modify<F>(&self, id: LocalOrderId, f: F) -> Result<(), DomainError>
    where
        F: FnOnce(&mut LocalOrder),
    {
        let mut orders = self.orders.write().await;
        let order = orders.get_mut(&id).ok_or_else(|| {
            DomainError::new(ErrorCode::OrderNotFound, format!("Order {} not found", id))
        })?;
        f(order);
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn find_by_id(&self, id: LocalOrderId) -> Result<Option<LocalOrder>, DomainError> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn update_meta(&self, id: LocalOrderId, meta: &OrderMeta) -> Result<(), DomainError> {
        self.modify(id, |order| order.meta = meta.clone()).await
    }

    async fn update_status(
        &self,
        id: LocalOrderId,
        status: LocalOrderStatus,
        note: Option<&str>,
    ) -> Result<(), DomainError> {
        self.modify(id, |order| {
            order.status = status;
            if let Some(note) = note {
                order.notes.push(note.to_string());
            }
        })
        .await
    }

    async fn add_note(&self, id: LocalOrderId, note: &str) -> Result<(), DomainError> {
        self.modify(id, |order| order.notes.push(note.to_string()))
            .await
    }

    async fn try_lock_capture(&self, id: LocalOrderId, ttl: Duration) -> Result<bool, DomainError> {
        if let Some(store) = &self.lock_store {
            return store.set_if_absent(&Self::lock_key(id), "1", ttl).await;
        }
        let now = Instant::now();
        let mut locks = self.capture_locks.write().await;
        if locks.get(&id).is_some_and(|expires| now < *expires) {
            return Ok(false);
        }
        locks.insert(id, now + ttl);
        Ok(true)
    }

    async fn release_capture(&self, id: LocalOrderId) -> Result<(), DomainError> {
        if let Some(store) = &self.lock_store {
            return store.delete(&Self::lock_key(id)).await.map(|_| ());
        }
        self.capture_locks.write().await.remove(&id);
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryOrderRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryOrderRepository")
            .field("shared_locks", &self.lock_store.is_some())
            .finish_non_exhaustive()
    }
}
