//! Storage Adapters
//!
//! Implementations of the key-value port and the stores built on top of it.
//!
//! ## Available Adapters
//!
//! - **RedisKeyValueStore** - Shared state across servers (production)
//! - **InMemoryKeyValueStore** - Process-local state (testing/development)
//! - **Kv*Store** - Dedup, webhook registration, simulation session and
//!   vault token cache, each over any `KeyValueStore`
//! - **InMemoryOrderRepository** - Order storage for tests and the demo binary
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::storage::{InMemoryKeyValueStore, KvProcessedEventStore, RedisKeyValueStore};
//!
//! // Production: Redis
//! let kv: Arc<dyn KeyValueStore> = Arc::new(RedisKeyValueStore::connect(url, "paypal:").await?);
//!
//! // Testing: in-memory
//! let kv: Arc<dyn KeyValueStore> = Arc::new(InMemoryKeyValueStore::new());
//!
//! let dedup = KvProcessedEventStore::new(kv.clone());
//! ```

mod in_memory_kv;
mod in_memory_orders;
mod kv_stores;
mod redis_kv;

pub use in_memory_kv::InMemoryKeyValueStore;
pub use in_memory_orders::InMemoryOrderRepository;
pub use kv_stores::{
    KvPaymentTokenStore, KvProcessedEventStore, KvSimulationStore, KvWebhookRegistrationStore,
};
pub use redis_kv::RedisKeyValueStore;
