//! In-memory key-value store for testing and single-node deployments.
//!
//! Reads skip expired entries; writes sweep them out at most once per
//! sweep interval, so the map holds live keys plus one interval of writes.
//! Not shared across processes, so webhook dedup only holds within one
//! server.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::DomainError;
use crate::ports::KeyValueStore;

const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

#[derive(Debug)]
struct Entries {
    map: HashMap<String, Entry>,
    last_sweep: Instant,
}

impl Entries {
    fn sweep_if_due(&mut self, now: Instant, interval: Duration) {
        if now.duration_since(self.last_sweep) < interval {
            return;
        }
        let before = self.map.len();
        self.map.retain(|_, e| e.is_live(now));
        self.last_sweep = now;
        let removed = before - self.map.len();
        if removed > 0 {
            tracing::trace!(removed, remaining = self.map.len(), "Swept expired keys");
        }
    }
}

#[derive(Debug, Clone)]
pub struct InMemoryKeyValueStore {
    entries: Arc<RwLock<Entries>>,
    sweep_interval: Duration,
}

impl Default for InMemoryKeyValueStore {
    fn default() -> Self {
        Self {
            entries: Arc::new(RwLock::new(Entries {
                map: HashMap::new(),
                last_sweep: Instant::now(),
            })),
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Minimum time between sweeps of expired keys.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Number of live entries.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .map
            .values()
            .filter(|e| e.is_live(now))
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Number of stored entries, expired ones included.
    pub async fn stored_len(&self) -> usize {
        self.entries.read().await.map.len()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        Ok(entries
            .map
            .get(key)
            .filter(|e| e.is_live(now))
            .map(|e| e.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), DomainError> {
        let now = Instant::now();
        let entry = Entry {
            value: value.to_string(),
            expires_at: ttl.map(|ttl| now + ttl),
        };
        let mut entries = self.entries.write().await;
        entries.sweep_if_due(now, self.sweep_interval);
        entries.map.insert(key.to_string(), entry);
        Ok(())
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, DomainError> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.sweep_if_due(now, self.sweep_interval);
        if entries.map.get(key).is_some_and(|e| e.is_live(now)) {
            return Ok(false);
        }
        entries.map.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Some(now + ttl),
            },
        );
        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<bool, DomainError> {
        let now = Instant::now();
        let removed = self.entries.write().await.map.remove(key);
        Ok(removed.is_some_and(|e| e.is_live(now)))
    }
}
