//! Gross/fee/net breakdowns recorded on the local order.
//!
//! Capture fees and refund fees are stored under separate keys; readers
//! tolerate either being absent.

use serde::{Deserialize, Serialize};

use super::paypal_order::{SellerPayableBreakdown, SellerReceivableBreakdown};
use crate::domain::foundation::{Money, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    pub gross: Money,
    pub fee: Money,
    pub net: Money,
}

impl FeeBreakdown {
    /// Builds a breakdown, deriving net from gross minus fee when PayPal omits it.
    pub fn new(gross: Money, fee: Option<Money>, net: Option<Money>) -> Result<Self, ValidationError> {
        let fee = fee.unwrap_or_else(|| Money::zero(gross.currency_code.clone()));
        let net = match net {
            Some(net) => net,
            None => gross.checked_sub(&fee)?,
        };
        Ok(Self { gross, fee, net })
    }

    /// Adds another breakdown into this one (partial refunds).
    pub fn accumulate(&self, other: &FeeBreakdown) -> Result<Self, ValidationError> {
        Ok(Self {
            gross: self.gross.checked_add(&other.gross)?,
            fee: self.fee.checked_add(&other.fee)?,
            net: self.net.checked_add(&other.net)?,
        })
    }
}

impl TryFrom<&SellerReceivableBreakdown> for FeeBreakdown {
    type Error = ValidationError;

    fn try_from(b: &SellerReceivableBreakdown) -> Result<Self, Self::Error> {
        FeeBreakdown::new(b.gross_amount.clone(), b.paypal_fee.clone(), b.net_amount.clone())
    }
}

impl TryFrom<&SellerPayableBreakdown> for FeeBreakdown {
    type Error = ValidationError;

    fn try_from(b: &SellerPayableBreakdown) -> Result<Self, Self::Error> {
        FeeBreakdown::new(b.gross_amount.clone(), b.paypal_fee.clone(), b.net_amount.clone())
    }
}
