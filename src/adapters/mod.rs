//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `paypal` - PayPal REST client and its scripted test double
//! - `storage` - Redis and in-memory key-value stores, order repository
//! - `events` - Order event publishers
//! - `http` - Axum router for webhooks, checkout return and admin calls

pub mod events;
pub mod http;
pub mod paypal;
pub mod storage;

pub use events::{LoggingOrderEventPublisher, RecordingOrderEventPublisher};
pub use paypal::{MockPayPalGateway, PayPalClient, PayPalClientConfig};
pub use storage::{InMemoryKeyValueStore, InMemoryOrderRepository, RedisKeyValueStore};
