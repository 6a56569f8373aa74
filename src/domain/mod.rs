//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors, state machine)
//! - `order` - PayPal orders, the storefront order and reconciliation rules
//! - `webhook` - Webhook events, handler registry, registration and simulation
//! - `vault` - Vaulted payment tokens for renewals

pub mod foundation;
pub mod order;
pub mod vault;
pub mod webhook;
