//! Subscription renewal.
//!
//! Renewal orders are charged against a vaulted PayPal or card token
//! without buyer interaction.

mod payment_token_resolver;
mod renew_subscription;

use thiserror::Error;

use crate::domain::foundation::{DomainError, LocalOrderId};
use crate::domain::order::OrderError;
use crate::ports::GatewayError;

pub use payment_token_resolver::PaymentTokenResolver;
pub use renew_subscription::{RenewSubscriptionHandler, RenewalOutcome};

/// Why a renewal did not get paid.
#[derive(Debug, Error)]
pub enum RenewalError {
    #[error("Order {0} has no PayPal vault customer")]
    NoVaultCustomer(LocalOrderId),

    #[error("No vaulted payment token for customer {0}")]
    NoPaymentToken(String),

    #[error("Payment token lookup failed: {0}")]
    TokenLookup(String),

    #[error("Renewal declined: {0}")]
    Declined(String),

    #[error(transparent)]
    Order(#[from] OrderError),
}

impl From<GatewayError> for RenewalError {
    fn from(err: GatewayError) -> Self {
        RenewalError::TokenLookup(err.to_string())
    }
}

impl From<DomainError> for RenewalError {
    fn from(err: DomainError) -> Self {
        RenewalError::TokenLookup(err.to_string())
    }
}
