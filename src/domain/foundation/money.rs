//! Money value object matching PayPal's `{currency_code, value}` shape.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ValidationError;

/// An amount in a given ISO-4217 currency.
///
/// PayPal transmits amounts as decimal strings (`"10.42"`); `rust_decimal`
/// keeps them exact through arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub currency_code: String,
    pub value: Decimal,
}

impl Money {
    /// Creates a new amount.
    pub fn new(currency_code: impl Into<String>, value: Decimal) -> Self {
        Self {
            currency_code: currency_code.into(),
            value,
        }
    }

    /// Zero amount in the given currency.
    pub fn zero(currency_code: impl Into<String>) -> Self {
        Self::new(currency_code, Decimal::ZERO)
    }

    /// Adds two amounts of the same currency.
    pub fn checked_add(&self, other: &Money) -> Result<Money, ValidationError> {
        self.ensure_same_currency(other)?;
        Ok(Money::new(self.currency_code.clone(), self.value + other.value))
    }

    /// Subtracts an amount of the same currency.
    pub fn checked_sub(&self, other: &Money) -> Result<Money, ValidationError> {
        self.ensure_same_currency(other)?;
        Ok(Money::new(self.currency_code.clone(), self.value - other.value))
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    fn ensure_same_currency(&self, other: &Money) -> Result<(), ValidationError> {
        if self.currency_code != other.currency_code {
            return Err(ValidationError::currency_mismatch(
                self.currency_code.clone(),
                other.currency_code.clone(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.currency_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn usd(v: &str) -> Money {
        Money::new("USD", Decimal::from_str(v).unwrap())
    }

    #[test]
    fn deserializes_paypal_amount_strings() {
        let m: Money = serde_json::from_str(r#"{"currency_code":"USD","value":"10.42"}"#).unwrap();
        assert_eq!(m, usd("10.42"));
    }

    #[test]
    fn serializes_value_as_string() {
        let json = serde_json::to_string(&usd("0.41")).unwrap();
        assert_eq!(json, r#"{"currency_code":"USD","value":"0.41"}"#);
    }

    #[test]
    fn arithmetic_is_exact() {
        let net = usd("10.42").checked_sub(&usd("0.41")).unwrap();
        assert_eq!(net, usd("10.01"));
        assert_eq!(usd("0.1").checked_add(&usd("0.2")).unwrap(), usd("0.3"));
    }

    #[test]
    fn arithmetic_rejects_mixed_currencies() {
        let eur = Money::new("EUR", Decimal::ONE);
        assert!(usd("1").checked_add(&eur).is_err());
    }
}
