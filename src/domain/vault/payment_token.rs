//! Vaulted payment credential references.

use serde::{Deserialize, Serialize};

/// Where a vaulted token came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentSourceKind {
    Card,
    Paypal,
}

/// A reusable payment token stored in the PayPal vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentToken {
    pub id: String,
    pub source: PaymentSourceKind,
    /// PayPal vault customer id the token belongs to.
    pub customer_id: String,
}

impl PaymentToken {
    pub fn new(id: impl Into<String>, source: PaymentSourceKind, customer_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source,
            customer_id: customer_id.into(),
        }
    }
}

/// Picks the token to charge for a renewal.
///
/// Prefers `preferred_id` when it is still vaulted, then PayPal wallet
/// tokens over cards, otherwise the first token.
pub fn select_token<'a>(tokens: &'a [PaymentToken], preferred_id: Option<&str>) -> Option<&'a PaymentToken> {
    if let Some(preferred) = preferred_id {
        if let Some(token) = tokens.iter().find(|t| t.id == preferred) {
            return Some(token);
        }
    }
    tokens
        .iter()
        .find(|t| t.source == PaymentSourceKind::Paypal)
        .or_else(|| tokens.first())
}
