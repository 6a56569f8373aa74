//! Strongly-typed identifier value objects.
//!
//! Local identifiers are numeric (the storefront owns them); PayPal
//! identifiers are opaque strings and stay `String` on the wire types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

/// Identifier of a storefront order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalOrderId(u64);

impl LocalOrderId {
    /// Creates a LocalOrderId from a raw numeric id.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw numeric id.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for LocalOrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for LocalOrderId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::empty_field("order_id"));
        }
        trimmed
            .parse::<u64>()
            .map(Self)
            .map_err(|e| ValidationError::invalid_format("order_id", e.to_string()))
    }
}

/// Identifier of a storefront customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(u64);

impl CustomerId {
    /// Creates a CustomerId from a raw numeric id.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw numeric id.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
