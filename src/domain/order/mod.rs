//! Order domain module.
//!
//! # Module Structure
//!
//! - `paypal_order` - PayPal Orders v2 resource
//! - `local_order` - Storefront order, status state machine and payment metadata
//! - `fees` - Gross/fee/net breakdowns for captures and refunds
//! - `reconciliation` - Pure mapping from a PayPal order to an outcome
//! - `events` - Domain events published after reconciliation

mod errors;
mod events;
mod fees;
mod local_order;
mod paypal_order;
mod reconciliation;

pub use errors::OrderError;
pub use events::OrderEvent;
pub use fees::FeeBreakdown;
pub use local_order::{BillingContact, LineItem, LocalOrder, LocalOrderStatus, OrderMeta};
pub use paypal_order::{
    Authorization, AuthorizationStatus, Capture, CaptureStatus, OrderIntent, PayPalOrder,
    PayPalOrderStatus, Payments, PurchaseUnit, Refund, SellerPayableBreakdown,
    SellerReceivableBreakdown, StatusDetails,
};
pub use reconciliation::{evaluate, OrderOutcome};
