//! RequestIdRepository - stores `PayPal-Request-Id` values per entity and purpose.
//!
//! PayPal treats a repeated request id as the same request, so a retried
//! order creation returns the order created the first time instead of a
//! duplicate. Ids are kept for a bounded window; once a record's
//! `expires_at` has passed it is discarded and a fresh UUID is minted.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::foundation::{DomainError, Timestamp};
use crate::ports::KeyValueStore;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredRequestId {
    value: String,
    expires_at: Timestamp,
}

pub struct RequestIdRepository {
    kv: Arc<dyn KeyValueStore>,
    ttl: Duration,
}

impl RequestIdRepository {
    pub fn new(kv: Arc<dyn KeyValueStore>, ttl: Duration) -> Self {
        Self { kv, ttl }
    }

    fn key(purpose: &str, entity: &str) -> String {
        format!("request_id:{}:{}", purpose, entity)
    }

    /// Returns the stored id for `(purpose, entity)`, minting one if absent or expired.
    pub async fn get_or_create(&self, purpose: &str, entity: &str) -> Result<String, DomainError> {
        let key = Self::key(purpose, entity);
        let now = Timestamp::now();

        if let Some(raw) = self.kv.get(&key).await? {
            match serde_json::from_str::<StoredRequestId>(&raw) {
                Ok(stored) if stored.expires_at.is_after(&now) => return Ok(stored.value),
                Ok(_) => {
                    tracing::debug!(key = %key, "Discarding expired PayPal request id");
                }
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Discarding unreadable PayPal request id");
                }
            }
        }

        let stored = StoredRequestId {
            value: Uuid::new_v4().to_string(),
            expires_at: now.plus_secs(self.ttl.as_secs() as i64),
        };
        self.kv
            .set(&key, &serde_json::to_string(&stored)?, Some(self.ttl))
            .await?;
        Ok(stored.value)
    }

    /// Drops the stored id so the next call mints a new one.
    pub async fn forget(&self, purpose: &str, entity: &str) -> Result<(), DomainError> {
        self.kv.delete(&Self::key(purpose, entity)).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::InMemoryKeyValueStore;

    fn repository(kv: Arc<dyn KeyValueStore>) -> RequestIdRepository {
        RequestIdRepository::new(kv, Duration::from_secs(3600))
    }

    #[tokio::test]
    async fn same_entity_and_purpose_reuse_the_id() {
        let repo = repository(Arc::new(InMemoryKeyValueStore::new()));

        let first = repo.get_or_create("create_order", "42").await.unwrap();
        let second = repo.get_or_create("create_order", "42").await.unwrap();

        assert_eq!(first, second);
        assert!(Uuid::parse_str(&first).is_ok());
    }

    #[tokio::test]
    async fn purposes_are_keyed_separately() {
        let repo = repository(Arc::new(InMemoryKeyValueStore::new()));

        let create = repo.get_or_create("create_order", "42").await.unwrap();
        let capture = repo.get_or_create("capture_order", "42").await.unwrap();

        assert_ne!(create, capture);
    }

    #[tokio::test]
    async fn expired_record_is_replaced() {
        let kv: Arc<dyn KeyValueStore> = Arc::new(InMemoryKeyValueStore::new());
        let stale = StoredRequestId {
            value: "stale-id".to_string(),
            expires_at: Timestamp::now().minus_secs(1),
        };
        kv.set(
            "request_id:create_order:42",
            &serde_json::to_string(&stale).unwrap(),
            None,
        )
        .await
        .unwrap();

        let id = repository(kv).get_or_create("create_order", "42").await.unwrap();

        assert_ne!(id, "stale-id");
    }

    #[tokio::test]
    async fn forget_mints_a_new_id() {
        let repo = repository(Arc::new(InMemoryKeyValueStore::new()));
        let first = repo.get_or_create("create_order", "42").await.unwrap();

        repo.forget("create_order", "42").await.unwrap();

        assert_ne!(repo.get_or_create("create_order", "42").await.unwrap(), first);
    }
}
