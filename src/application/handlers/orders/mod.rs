//! Order handlers.
//!
//! ## Commands
//! - Creating the PayPal order for a local order
//! - Capturing an authorized payment
//! - Reconciling the buyer's return and PayPal-side payment events
//!
//! Idempotency keys sent as `PayPal-Request-Id` are kept in
//! `RequestIdRepository` so retries reuse them.

mod create_order;
mod reconciler;
mod request_ids;

pub use create_order::{
    payer_for, purchase_unit_for, CreatePayPalOrderCommand, CreatePayPalOrderHandler,
};
pub use reconciler::{resolve_local_order_id, OrderReconciler};
pub use request_ids::RequestIdRepository;
