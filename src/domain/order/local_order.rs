//! The storefront order as seen by the payment core.
//!
//! The order aggregate itself is owned by the shop. This module models the
//! parts the core reads (totals, items, billing contact) and the metadata
//! keys it is allowed to write.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::fees::FeeBreakdown;
use super::paypal_order::OrderIntent;
use crate::domain::foundation::{CustomerId, LocalOrderId, Money, StateMachine, ValidationError};

/// Storefront order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LocalOrderStatus {
    /// Awaiting payment.
    Pending,
    /// Payment received; fulfilment may start.
    Processing,
    /// Payment held (pending capture, authorization awaiting capture, dispute).
    OnHold,
    Completed,
    Cancelled,
    Refunded,
    /// Payment declined or renewal failed.
    Failed,
}

impl LocalOrderStatus {
    /// True when the shop considers the order paid.
    pub fn is_paid(&self) -> bool {
        matches!(self, LocalOrderStatus::Processing | LocalOrderStatus::Completed)
    }
}

impl StateMachine for LocalOrderStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use LocalOrderStatus::*;
        matches!(
            (self, target),
            // From PENDING
            (Pending, Processing)
                | (Pending, OnHold)
                | (Pending, Completed)
                | (Pending, Cancelled)
                | (Pending, Failed)
            // From ON_HOLD
                | (OnHold, Processing)
                | (OnHold, Completed)
                | (OnHold, Cancelled)
                | (OnHold, Failed)
                | (OnHold, Refunded)
            // From PROCESSING
                | (Processing, Completed)
                | (Processing, OnHold) // Reversal or dispute
                | (Processing, Refunded)
                | (Processing, Cancelled)
            // From COMPLETED
                | (Completed, OnHold)
                | (Completed, Refunded)
            // From FAILED (buyer retried, late capture)
                | (Failed, Pending)
                | (Failed, Processing)
                | (Failed, OnHold)
                | (Failed, Cancelled)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use LocalOrderStatus::*;
        [Pending, Processing, OnHold, Completed, Cancelled, Refunded, Failed]
            .into_iter()
            .filter(|target| self.can_transition_to(target))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    #[serde(default)]
    pub sku: Option<String>,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl LineItem {
    pub fn new(name: impl Into<String>, quantity: u32, unit_price: Decimal) -> Self {
        Self {
            name: name.into(),
            sku: None,
            quantity,
            unit_price,
        }
    }

    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Metadata keys the payment core writes on the order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderMeta {
    #[serde(default)]
    pub paypal_order_id: Option<String>,
    /// Mirrors the PayPal order intent.
    #[serde(default)]
    pub intent: Option<OrderIntent>,
    /// At-most-once capture guard for `AUTHORIZE` orders.
    #[serde(default)]
    pub captured: bool,
    #[serde(default)]
    pub authorization_id: Option<String>,
    /// Capture id of the settled payment.
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub fees: Option<FeeBreakdown>,
    #[serde(default)]
    pub refund_fees: Option<FeeBreakdown>,
    /// Refund ids already recorded, so repeated refund events are no-ops.
    #[serde(default)]
    pub refund_ids: Vec<String>,
    #[serde(default)]
    pub payment_token_id: Option<String>,
    /// PayPal vault customer id used to look up tokens.
    #[serde(default)]
    pub vault_customer_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingContact {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalOrder {
    pub id: LocalOrderId,
    #[serde(default)]
    pub customer_id: Option<CustomerId>,
    pub status: LocalOrderStatus,
    pub currency: String,
    pub total: Decimal,
    #[serde(default)]
    pub shipping_total: Decimal,
    #[serde(default)]
    pub tax_total: Decimal,
    #[serde(default)]
    pub discount_total: Decimal,
    #[serde(default)]
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub billing: Option<BillingContact>,
    #[serde(default)]
    pub meta: OrderMeta,
    #[serde(default)]
    pub notes: Vec<String>,
}

impl LocalOrder {
    /// A pending order with no items.
    pub fn new(id: LocalOrderId, currency: impl Into<String>, total: Decimal) -> Self {
        Self {
            id,
            customer_id: None,
            status: LocalOrderStatus::Pending,
            currency: currency.into(),
            total,
            shipping_total: Decimal::ZERO,
            tax_total: Decimal::ZERO,
            discount_total: Decimal::ZERO,
            items: Vec::new(),
            billing: None,
            meta: OrderMeta::default(),
            notes: Vec::new(),
        }
    }

    pub fn with_item(mut self, item: LineItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn with_customer(mut self, customer_id: CustomerId) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    pub fn with_meta(mut self, meta: OrderMeta) -> Self {
        self.meta = meta;
        self
    }

    pub fn amount(&self) -> Money {
        Money::new(self.currency.clone(), self.total)
    }

    pub fn item_total(&self) -> Decimal {
        self.items.iter().map(LineItem::subtotal).sum()
    }

    /// True when items, shipping, tax and discount add up to the total.
    ///
    /// PayPal rejects a breakdown that does not match, so callers send the
    /// bare amount when this is false.
    pub fn breakdown_matches_total(&self) -> bool {
        !self.items.is_empty()
            && self.item_total() + self.shipping_total + self.tax_total - self.discount_total
                == self.total
    }

    /// Capture preconditions: `AUTHORIZE` intent and not yet captured.
    pub fn ensure_capturable(&self) -> Result<(), String> {
        match self.meta.intent {
            Some(OrderIntent::Authorize) if !self.meta.captured => Ok(()),
            Some(OrderIntent::Authorize) => Err("payment already captured".to_string()),
            Some(OrderIntent::Capture) => {
                Err("only AUTHORIZE orders can be captured".to_string())
            }
            None => Err("order has no PayPal intent".to_string()),
        }
    }

    /// Moves to `target`. Returns `Ok(false)` when already there.
    pub fn transition(&mut self, target: LocalOrderStatus) -> Result<bool, ValidationError> {
        if self.status == target {
            return Ok(false);
        }
        self.status = self.status.transition_to(target)?;
        Ok(true)
    }
}
