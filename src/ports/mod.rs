//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## PayPal
//!
//! - `PayPalGateway` - Orders, payments, webhooks and vault REST calls
//!
//! ## Shop
//!
//! - `OrderRepository` - Storefront orders (metadata, status, notes, capture lock)
//! - `OrderEventPublisher` - Order domain events for dependents
//!
//! ## Shared State
//!
//! - `KeyValueStore` - Expiring key-value storage
//! - `ProcessedEventStore` - Webhook delivery dedup
//! - `WebhookRegistrationStore` / `SimulationStore` - Single-record webhook state
//! - `PaymentTokenStore` - Cached vault tokens

mod event_publisher;
mod key_value_store;
mod order_repository;
mod payment_token_store;
mod paypal_gateway;
mod processed_event_store;
mod webhook_stores;

pub use event_publisher::OrderEventPublisher;
pub use key_value_store::KeyValueStore;
pub use order_repository::OrderRepository;
pub use payment_token_store::PaymentTokenStore;
pub use paypal_gateway::{
    AmountBreakdown, AmountWithBreakdown, ApplicationContext, ApiErrorDetail, ApiLink, CreateOrderRequest,
    GatewayError, ItemRequest, Payer, PayerName, PayPalApiError, PayPalGateway,
    PaymentSourceRequest, PurchaseUnitRequest,
};
pub use processed_event_store::{ClaimResult, ProcessedEventStore};
pub use webhook_stores::{SimulationStore, WebhookRegistrationStore};
