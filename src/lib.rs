//! PayPal Commerce - order reconciliation and webhook processing
//!
//! Connects a storefront's local orders to PayPal Checkout: creates and
//! captures PayPal orders, reconciles the shopper's return, processes
//! verified webhook deliveries exactly once and renews vaulted
//! subscriptions.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
