//! Pure evaluation of a PayPal order into the outcome the shop should apply.

use super::fees::FeeBreakdown;
use super::paypal_order::{AuthorizationStatus, CaptureStatus, OrderIntent, PayPalOrder, PayPalOrderStatus};

/// What a PayPal order means for the local order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderOutcome {
    /// Funds settled.
    Paid {
        capture_id: Option<String>,
        fees: Option<FeeBreakdown>,
    },
    /// Capture created but held by PayPal (eCheck, review, ...).
    CapturePending {
        capture_id: String,
        reason: Option<String>,
    },
    /// Funds held, awaiting a merchant capture.
    Authorized { authorization_id: String },
    Declined { reason: String },
    Voided,
    /// Buyer approved; capture or authorize still has to be called.
    Approved { intent: OrderIntent },
    /// Buyer has not finished checkout yet.
    AwaitingPayer,
}

impl OrderOutcome {
    pub fn is_paid(&self) -> bool {
        matches!(self, OrderOutcome::Paid { .. })
    }
}

/// Evaluates captures first, then authorizations, then the order status.
pub fn evaluate(order: &PayPalOrder) -> OrderOutcome {
    if let Some(capture) = order.captures().next() {
        return match capture.status {
            CaptureStatus::Completed
            | CaptureStatus::PartiallyRefunded
            | CaptureStatus::Refunded => OrderOutcome::Paid {
                capture_id: Some(capture.id.clone()),
                fees: capture
                    .seller_receivable_breakdown
                    .as_ref()
                    .and_then(|b| FeeBreakdown::try_from(b).ok()),
            },
            CaptureStatus::Pending | CaptureStatus::Unknown => OrderOutcome::CapturePending {
                capture_id: capture.id.clone(),
                reason: capture
                    .status_details
                    .as_ref()
                    .and_then(|d| d.reason.clone()),
            },
            CaptureStatus::Declined | CaptureStatus::Failed => OrderOutcome::Declined {
                reason: format!("capture {} {:?}", capture.id, capture.status),
            },
        };
    }

    if let Some(authorization) = order.authorizations().next() {
        return match authorization.status {
            AuthorizationStatus::Denied => OrderOutcome::Declined {
                reason: format!("authorization {} denied", authorization.id),
            },
            AuthorizationStatus::Voided => OrderOutcome::Voided,
            _ => OrderOutcome::Authorized {
                authorization_id: authorization.id.clone(),
            },
        };
    }

    match order.status {
        PayPalOrderStatus::Approved => OrderOutcome::Approved {
            intent: order.intent,
        },
        PayPalOrderStatus::Voided => OrderOutcome::Voided,
        PayPalOrderStatus::Completed if order.intent == OrderIntent::Capture => {
            OrderOutcome::Paid {
                capture_id: None,
                fees: None,
            }
        }
        _ => OrderOutcome::AwaitingPayer,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn order(value: serde_json::Value) -> PayPalOrder {
        serde_json::from_value(value).unwrap()
    }

    fn with_payments(intent: &str, status: &str, payments: serde_json::Value) -> PayPalOrder {
        order(json!({
            "id": "5O190127TN364715T",
            "intent": intent,
            "status": status,
            "purchase_units": [{"custom_id": "42", "payments": payments}]
        }))
    }

    #[test]
    fn completed_capture_is_paid_with_fees() {
        let o = with_payments("CAPTURE", "COMPLETED", json!({"captures": [{
            "id": "CAP-1",
            "status": "COMPLETED",
            "seller_receivable_breakdown": {
                "gross_amount": {"currency_code": "USD", "value": "10.42"},
                "paypal_fee": {"currency_code": "USD", "value": "0.41"},
                "net_amount": {"currency_code": "USD", "value": "10.01"}
            }
        }]}));

        match evaluate(&o) {
            OrderOutcome::Paid { capture_id, fees } => {
                assert_eq!(capture_id.as_deref(), Some("CAP-1"));
                assert_eq!(fees.unwrap().net.value.to_string(), "10.01");
            }
            other => panic!("expected Paid, got {:?}", other),
        }
    }

    #[test]
    fn pending_capture_carries_reason() {
        let o = with_payments("CAPTURE", "COMPLETED", json!({"captures": [{
            "id": "CAP-2",
            "status": "PENDING",
            "status_details": {"reason": "PENDING_REVIEW"}
        }]}));

        assert_eq!(
            evaluate(&o),
            OrderOutcome::CapturePending {
                capture_id: "CAP-2".to_string(),
                reason: Some("PENDING_REVIEW".to_string()),
            }
        );
    }

    #[test]
    fn declined_capture_is_declined() {
        let o = with_payments("CAPTURE", "COMPLETED", json!({"captures": [{"id": "CAP-3", "status": "DECLINED"}]}));
        assert!(matches!(evaluate(&o), OrderOutcome::Declined { .. }));
    }

    #[test]
    fn created_authorization_awaits_capture() {
        let o = with_payments("AUTHORIZE", "COMPLETED", json!({"authorizations": [{"id": "AUTH-1", "status": "CREATED"}]}));
        assert_eq!(
            evaluate(&o),
            OrderOutcome::Authorized {
                authorization_id: "AUTH-1".to_string()
            }
        );
    }

    #[test]
    fn denied_authorization_is_declined() {
        let o = with_payments("AUTHORIZE", "COMPLETED", json!({"authorizations": [{"id": "AUTH-2", "status": "DENIED"}]}));
        assert!(matches!(evaluate(&o), OrderOutcome::Declined { .. }));
    }

    #[test]
    fn approved_order_without_payments_awaits_merchant_action() {
        let o = order(json!({"id": "X", "intent": "CAPTURE", "status": "APPROVED", "purchase_units": []}));
        assert_eq!(
            evaluate(&o),
            OrderOutcome::Approved {
                intent: OrderIntent::Capture
            }
        );
    }

    #[test]
    fn created_order_awaits_payer() {
        let o = order(json!({"id": "X", "intent": "CAPTURE", "status": "PAYER_ACTION_REQUIRED"}));
        assert_eq!(evaluate(&o), OrderOutcome::AwaitingPayer);
    }
}
