//! Vault domain module: payment tokens used for subscription renewals.

mod payment_token;

pub use payment_token::{select_token, PaymentSourceKind, PaymentToken};
