//! PayPal Orders v2 resource as returned by the REST API.
//!
//! Only the fields the reconciler reads are modelled; anything else in the
//! payload is ignored on deserialization. Status enums carry an `Unknown`
//! variant so new PayPal states never fail parsing.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{LocalOrderId, Money, ValidationError};

/// Declared payment flow of a PayPal order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderIntent {
    /// Funds are captured immediately on approval.
    Capture,
    /// Funds are held; a separate capture collects them later.
    Authorize,
}

impl OrderIntent {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderIntent::Capture => "CAPTURE",
            OrderIntent::Authorize => "AUTHORIZE",
        }
    }
}

/// Order-level status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayPalOrderStatus {
    Created,
    Saved,
    Approved,
    Voided,
    Completed,
    PayerActionRequired,
    #[serde(other)]
    Unknown,
}

/// Status of a single capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CaptureStatus {
    Completed,
    Declined,
    PartiallyRefunded,
    Pending,
    Refunded,
    Failed,
    #[serde(other)]
    Unknown,
}

/// Status of a single authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthorizationStatus {
    Created,
    Captured,
    Denied,
    PartiallyCaptured,
    Voided,
    Pending,
    #[serde(other)]
    Unknown,
}

/// Fee breakdown PayPal attaches to a capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellerReceivableBreakdown {
    pub gross_amount: Money,
    #[serde(default)]
    pub paypal_fee: Option<Money>,
    #[serde(default)]
    pub net_amount: Option<Money>,
}

/// Fee breakdown PayPal attaches to a refund.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellerPayableBreakdown {
    pub gross_amount: Money,
    #[serde(default)]
    pub paypal_fee: Option<Money>,
    #[serde(default)]
    pub net_amount: Option<Money>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusDetails {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capture {
    pub id: String,
    pub status: CaptureStatus,
    #[serde(default)]
    pub amount: Option<Money>,
    #[serde(default)]
    pub custom_id: Option<String>,
    #[serde(default)]
    pub status_details: Option<StatusDetails>,
    #[serde(default)]
    pub seller_receivable_breakdown: Option<SellerReceivableBreakdown>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorization {
    pub id: String,
    pub status: AuthorizationStatus,
    #[serde(default)]
    pub amount: Option<Money>,
    #[serde(default)]
    pub custom_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Refund {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub amount: Option<Money>,
    #[serde(default)]
    pub custom_id: Option<String>,
    #[serde(default)]
    pub seller_payable_breakdown: Option<SellerPayableBreakdown>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payments {
    #[serde(default)]
    pub captures: Vec<Capture>,
    #[serde(default)]
    pub authorizations: Vec<Authorization>,
    #[serde(default)]
    pub refunds: Vec<Refund>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseUnit {
    #[serde(default)]
    pub reference_id: Option<String>,
    #[serde(default)]
    pub custom_id: Option<String>,
    #[serde(default)]
    pub invoice_id: Option<String>,
    #[serde(default)]
    pub amount: Option<Money>,
    #[serde(default)]
    pub payments: Option<Payments>,
}

/// A PayPal order. Immutable locally; refreshed only by re-fetching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayPalOrder {
    pub id: String,
    pub intent: OrderIntent,
    pub status: PayPalOrderStatus,
    #[serde(default)]
    pub purchase_units: Vec<PurchaseUnit>,
}

impl PayPalOrder {
    pub fn first_purchase_unit(&self) -> Option<&PurchaseUnit> {
        self.purchase_units.first()
    }

    /// Resolves the local order id carried in the first purchase unit.
    ///
    /// Returns `Ok(None)` when no custom id is present.
    pub fn local_order_id(&self) -> Result<Option<LocalOrderId>, ValidationError> {
        match self
            .first_purchase_unit()
            .and_then(|unit| unit.custom_id.as_deref())
        {
            Some(raw) if !raw.trim().is_empty() => raw.parse().map(Some),
            _ => Ok(None),
        }
    }

    /// All captures across purchase units.
    pub fn captures(&self) -> impl Iterator<Item = &Capture> {
        self.purchase_units
            .iter()
            .filter_map(|unit| unit.payments.as_ref())
            .flat_map(|payments| payments.captures.iter())
    }

    /// All authorizations across purchase units.
    pub fn authorizations(&self) -> impl Iterator<Item = &Authorization> {
        self.purchase_units
            .iter()
            .filter_map(|unit| unit.payments.as_ref())
            .flat_map(|payments| payments.authorizations.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPLETED_ORDER: &str = r#"{
        "id": "5O190127TN364715T",
        "intent": "CAPTURE",
        "status": "COMPLETED",
        "purchase_units": [{
            "reference_id": "default",
            "custom_id": "1042",
            "payments": {
                "captures": [{
                    "id": "3C679366HH908993F",
                    "status": "COMPLETED",
                    "amount": {"currency_code": "USD", "value": "10.42"},
                    "seller_receivable_breakdown": {
                        "gross_amount": {"currency_code": "USD", "value": "10.42"},
                        "paypal_fee": {"currency_code": "USD", "value": "0.41"},
                        "net_amount": {"currency_code": "USD", "value": "10.01"}
                    }
                }]
            }
        }],
        "links": [{"href": "https://api-m.paypal.com/v2/checkout/orders/5O190127TN364715T", "rel": "self"}]
    }"#;

    #[test]
    fn deserializes_completed_capture_order() {
        let order: PayPalOrder = serde_json::from_str(COMPLETED_ORDER).unwrap();

        assert_eq!(order.intent, OrderIntent::Capture);
        assert_eq!(order.status, PayPalOrderStatus::Completed);
        assert_eq!(order.local_order_id().unwrap(), Some(LocalOrderId::new(1042)));

        let capture = order.captures().next().unwrap();
        assert_eq!(capture.status, CaptureStatus::Completed);
        let breakdown = capture.seller_receivable_breakdown.as_ref().unwrap();
        assert_eq!(breakdown.paypal_fee.as_ref().unwrap().value.to_string(), "0.41");
    }

    #[test]
    fn unknown_statuses_do_not_fail_parsing() {
        let order: PayPalOrder = serde_json::from_str(
            r#"{"id":"X","intent":"AUTHORIZE","status":"SOMETHING_NEW","purchase_units":[]}"#,
        )
        .unwrap();
        assert_eq!(order.status, PayPalOrderStatus::Unknown);
    }

    #[test]
    fn missing_custom_id_resolves_to_none() {
        let order: PayPalOrder = serde_json::from_str(
            r#"{"id":"X","intent":"CAPTURE","status":"APPROVED","purchase_units":[{"custom_id":""}]}"#,
        )
        .unwrap();
        assert_eq!(order.local_order_id().unwrap(), None);
    }

    #[test]
    fn malformed_custom_id_is_an_error() {
        let order: PayPalOrder = serde_json::from_str(
            r#"{"id":"X","intent":"CAPTURE","status":"APPROVED","purchase_units":[{"custom_id":"abc"}]}"#,
        )
        .unwrap();
        assert!(order.local_order_id().is_err());
    }

    #[test]
    fn intent_serializes_screaming_case() {
        assert_eq!(serde_json::to_string(&OrderIntent::Authorize).unwrap(), "\"AUTHORIZE\"");
        assert_eq!(OrderIntent::Capture.as_str(), "CAPTURE");
    }
}
