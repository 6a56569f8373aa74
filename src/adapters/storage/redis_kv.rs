//! Redis-backed key-value store for production deployments.
//!
//! `set_if_absent` maps to `SET key value NX EX ttl`, which is atomic across
//! servers and is what makes webhook dedup and the capture lock safe.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::domain::foundation::DomainError;
use crate::ports::KeyValueStore;

#[derive(Clone)]
pub struct RedisKeyValueStore {
    conn: MultiplexedConnection,
    prefix: String,
}

impl RedisKeyValueStore {
    /// Create a store; every key is namespaced with `prefix`.
    pub fn new(conn: MultiplexedConnection, prefix: impl Into<String>) -> Self {
        Self {
            conn,
            prefix: prefix.into(),
        }
    }

    /// Open a multiplexed connection to `url`.
    pub async fn connect(url: &str, prefix: impl Into<String>) -> Result<Self, DomainError> {
        let client = redis::Client::open(url)
            .map_err(|e: redis::RedisError| DomainError::storage(e.to_string()))?;
        let conn = client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(|e: redis::RedisError| DomainError::storage(e.to_string()))?;
        Ok(Self::new(conn, prefix))
    }

    fn key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }
}

fn ttl_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

#[async_trait]
impl KeyValueStore for RedisKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
        let mut conn = self.conn.clone();
        conn.get(self.key(key))
            .await
            .map_err(|e: redis::RedisError| DomainError::storage(e.to_string()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), DomainError> {
        let mut conn = self.conn.clone();
        let key = self.key(key);
        match ttl {
            Some(ttl) => conn.set_ex::<_, _, ()>(key, value, ttl_secs(ttl)).await,
            None => conn.set::<_, _, ()>(key, value).await,
        }
        .map_err(|e: redis::RedisError| DomainError::storage(e.to_string()))
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, DomainError> {
        let mut conn = self.conn.clone();
        let reply: Option<String> = redis::cmd("SET")
            .arg(self.key(key))
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(ttl_secs(ttl))
            .query_async(&mut conn)
            .await
            .map_err(|e: redis::RedisError| DomainError::storage(e.to_string()))?;
        Ok(reply.is_some())
    }

    async fn delete(&self, key: &str) -> Result<bool, DomainError> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn
            .del(self.key(key))
            .await
            .map_err(|e: redis::RedisError| DomainError::storage(e.to_string()))?;
        Ok(removed > 0)
    }
}

impl std::fmt::Debug for RedisKeyValueStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisKeyValueStore")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ttl_is_at_least_one_second() {
        assert_eq!(ttl_secs(Duration::from_millis(10)), 1);
        assert_eq!(ttl_secs(Duration::from_secs(86_400)), 86_400);
    }

    #[tokio::test]
    #[ignore = "needs a Redis server on 127.0.0.1:6379"]
    async fn set_if_absent_against_redis() {
        let store = RedisKeyValueStore::connect("redis://127.0.0.1/", "paypal-commerce-test:")
            .await
            .unwrap();
        let key = format!("dedup:{}", uuid::Uuid::new_v4());

        assert!(store
            .set_if_absent(&key, "1", Duration::from_secs(5))
            .await
            .unwrap());
        assert!(!store
            .set_if_absent(&key, "2", Duration::from_secs(5))
            .await
            .unwrap());
        assert_eq!(store.get(&key).await.unwrap().as_deref(), Some("1"));
        assert!(store.delete(&key).await.unwrap());
    }
}
