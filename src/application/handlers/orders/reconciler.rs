//! OrderReconciler - applies PayPal order state to local orders.
//!
//! Every path that learns something about a payment (checkout return,
//! merchant capture, webhooks, renewals) goes through here, so metadata
//! and status changes are written in one place and each one is safe to
//! repeat.
//!
//! # Capture
//!
//! ```text
//! AUTHORIZE, captured=false --capture()--> AUTHORIZE, captured=true
//! AUTHORIZE, captured=true  --capture()--> InvalidState
//! CAPTURE                   --capture()--> InvalidState
//! ```
//!
//! The `captured` check runs twice: once before taking the per-order
//! capture lock and again under it, so two concurrent captures cannot both
//! reach PayPal.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::foundation::{LocalOrderId, Timestamp};
use crate::domain::order::{
    evaluate, AuthorizationStatus, Capture, CaptureStatus, FeeBreakdown, LocalOrder,
    LocalOrderStatus, OrderError, OrderEvent, OrderIntent, OrderOutcome, PayPalOrder,
    PayPalOrderStatus, Refund,
};
use crate::ports::{GatewayError, OrderEventPublisher, OrderRepository, PayPalGateway};

use super::RequestIdRepository;

const CAPTURE_ORDER_PURPOSE: &str = "capture_order";
const CAPTURE_AUTHORIZATION_PURPOSE: &str = "capture_authorization";
const DEFAULT_CAPTURE_LOCK_TTL: Duration = Duration::from_secs(60);

pub struct OrderReconciler {
    gateway: Arc<dyn PayPalGateway>,
    orders: Arc<dyn OrderRepository>,
    events: Arc<dyn OrderEventPublisher>,
    request_ids: Arc<RequestIdRepository>,
    capture_lock_ttl: Duration,
}

impl OrderReconciler {
    pub fn new(
        gateway: Arc<dyn PayPalGateway>,
        orders: Arc<dyn OrderRepository>,
        events: Arc<dyn OrderEventPublisher>,
        request_ids: Arc<RequestIdRepository>,
    ) -> Self {
        Self {
            gateway,
            orders,
            events,
            request_ids,
            capture_lock_ttl: DEFAULT_CAPTURE_LOCK_TTL,
        }
    }

    pub fn with_capture_lock_ttl(mut self, ttl: Duration) -> Self {
        self.capture_lock_ttl = ttl;
        self
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Merchant capture
    // ════════════════════════════════════════════════════════════════════════════

    /// Captures the authorization of an `AUTHORIZE` order.
    ///
    /// Returns `Ok(true)` when funds were captured and `Ok(false)` when
    /// PayPal declined the capture. On a gateway error the order is left
    /// unmodified and the error is returned; retrying is up to the caller.
    pub async fn capture_authorized_payment(&self, order_id: LocalOrderId) -> Result<bool, OrderError> {
        let order = self.load(order_id).await?;
        order
            .ensure_capturable()
            .map_err(|reason| OrderError::invalid_state(order_id, reason))?;

        if !self
            .orders
            .try_lock_capture(order_id, self.capture_lock_ttl)
            .await?
        {
            return Err(OrderError::CaptureInProgress(order_id));
        }

        let result = self.capture_locked(order_id).await;

        if let Err(e) = self.orders.release_capture(order_id).await {
            tracing::warn!(order_id = %order_id, error = %e, "Failed to release capture lock");
        }
        result
    }

    async fn capture_locked(&self, order_id: LocalOrderId) -> Result<bool, OrderError> {
        let mut order = self.load(order_id).await?;
        order
            .ensure_capturable()
            .map_err(|reason| OrderError::invalid_state(order_id, reason))?;

        let authorization_id = self.authorization_for(&order).await?;
        let request_id = self
            .request_ids
            .get_or_create(CAPTURE_AUTHORIZATION_PURPOSE, &authorization_id)
            .await?;

        let capture = self
            .gateway
            .capture_authorization(&authorization_id, Some(&request_id))
            .await
            .map_err(|e| {
                tracing::error!(
                    order_id = %order_id,
                    authorization_id = %authorization_id,
                    debug_id = e.debug_id().unwrap_or("-"),
                    error = %e,
                    "Authorization capture failed"
                );
                OrderError::Gateway(e)
            })?;

        order.meta.authorization_id = Some(authorization_id);

        if matches!(capture.status, CaptureStatus::Declined | CaptureStatus::Failed) {
            self.orders.update_meta(order_id, &order.meta).await?;
            let note = format!("PayPal declined capture {}", capture.id);
            self.orders.add_note(order_id, &note).await?;
            tracing::warn!(order_id = %order_id, capture_id = %capture.id, "Capture declined");
            return Ok(false);
        }

        order.meta.captured = true;
        order.meta.transaction_id = Some(capture.id.clone());
        if let Some(fees) = capture_fees(&capture) {
            order.meta.fees = Some(fees);
        }
        self.orders.update_meta(order_id, &order.meta).await?;

        if capture.status == CaptureStatus::Completed {
            let note = format!("PayPal payment captured ({})", capture.id);
            self.move_to(&mut order, LocalOrderStatus::Processing, &note)
                .await?;
        } else {
            let note = pending_note(&capture);
            self.move_to(&mut order, LocalOrderStatus::OnHold, &note)
                .await?;
        }

        tracing::info!(
            order_id = %order_id,
            capture_id = %capture.id,
            status = ?capture.status,
            "Authorized payment captured"
        );

        self.publish(OrderEvent::Captured {
            order_id,
            paypal_order_id: order.meta.paypal_order_id.clone(),
            capture_id: capture.id.clone(),
            gross: capture.amount.clone(),
            occurred_at: Timestamp::now(),
        })
        .await;

        Ok(true)
    }

    async fn authorization_for(&self, order: &LocalOrder) -> Result<String, OrderError> {
        if let Some(id) = &order.meta.authorization_id {
            return Ok(id.clone());
        }
        let paypal_order_id = order
            .meta
            .paypal_order_id
            .as_deref()
            .ok_or_else(|| OrderError::invalid_state(order.id, "order has no PayPal order"))?;

        let paypal_order = self.gateway.get_order(paypal_order_id).await?;
        let open = paypal_order
            .authorizations()
            .find(|a| {
                matches!(
                    a.status,
                    AuthorizationStatus::Created
                        | AuthorizationStatus::PartiallyCaptured
                        | AuthorizationStatus::Pending
                )
            })
            .map(|a| a.id.clone())
            .ok_or_else(|| OrderError::invalid_state(order.id, "no open authorization to capture"));
        open
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Checkout return and order-level events
    // ════════════════════════════════════════════════════════════════════════════

    /// Resolves the buyer's return from PayPal.
    ///
    /// The token is the PayPal order id. A malformed token, a missing PayPal
    /// order, custom id or local order is fatal: the link is broken or the
    /// token forged.
    pub async fn reconcile_return(&self, token: &str) -> Result<LocalOrder, OrderError> {
        if !is_paypal_order_id(token) {
            return Err(OrderError::PayPalOrderMissing {
                paypal_order_id: token.to_string(),
                reason: "token is not a PayPal order id".to_string(),
            });
        }

        let paypal_order = self.gateway.get_order(token).await.map_err(|e| {
            let not_found = e.api().filter(|api| api.status == 404).map(|api| api.to_string());
            match not_found {
                Some(reason) => OrderError::PayPalOrderMissing {
                    paypal_order_id: token.to_string(),
                    reason,
                },
                None => OrderError::Gateway(e),
            }
        })?;

        self.reconcile_paypal_order(paypal_order).await
    }

    /// Finalizes and applies a PayPal order already in hand (return URL or
    /// `CHECKOUT.ORDER.*` webhook).
    pub async fn reconcile_paypal_order(&self, paypal_order: PayPalOrder) -> Result<LocalOrder, OrderError> {
        let order_id = resolve_local_order_id(&paypal_order)?;
        let order = self.load(order_id).await?;

        if let Some(linked) = &order.meta.paypal_order_id {
            if linked != &paypal_order.id {
                return Err(OrderError::PayPalOrderMissing {
                    paypal_order_id: paypal_order.id.clone(),
                    reason: format!("order {} is linked to PayPal order {}", order_id, linked),
                });
            }
        }

        let paypal_order = self.finalize_approved_order(&order, paypal_order).await?;
        self.apply_paypal_order(order, &paypal_order).await
    }

    /// Captures (or authorizes) an order the buyer has approved. Other
    /// statuses are returned unchanged.
    pub async fn finalize_approved_order(
        &self,
        order: &LocalOrder,
        paypal_order: PayPalOrder,
    ) -> Result<PayPalOrder, OrderError> {
        if paypal_order.status != PayPalOrderStatus::Approved {
            return Ok(paypal_order);
        }

        let result = match paypal_order.intent {
            OrderIntent::Capture => {
                let request_id = self
                    .request_ids
                    .get_or_create(CAPTURE_ORDER_PURPOSE, &paypal_order.id)
                    .await?;
                self.gateway
                    .capture_order(&paypal_order.id, Some(&request_id))
                    .await
            }
            OrderIntent::Authorize => self.gateway.authorize_order(&paypal_order.id).await,
        };

        match result {
            Ok(updated) => Ok(updated),
            Err(e) if already_processed(&e) => {
                tracing::info!(
                    order_id = %order.id,
                    paypal_order_id = %paypal_order.id,
                    "PayPal order already finalized, refetching"
                );
                Ok(self.gateway.get_order(&paypal_order.id).await?)
            }
            Err(e) => {
                tracing::warn!(
                    order_id = %order.id,
                    paypal_order_id = %paypal_order.id,
                    debug_id = e.debug_id().unwrap_or("-"),
                    error = %e,
                    "Finalizing approved PayPal order failed"
                );
                Err(OrderError::Gateway(e))
            }
        }
    }

    /// Writes what a PayPal order means onto the local order.
    pub async fn apply_paypal_order(
        &self,
        mut order: LocalOrder,
        paypal_order: &PayPalOrder,
    ) -> Result<LocalOrder, OrderError> {
        let outcome = evaluate(paypal_order);
        order.meta.paypal_order_id = Some(paypal_order.id.clone());
        order.meta.intent = Some(paypal_order.intent);

        tracing::debug!(
            order_id = %order.id,
            paypal_order_id = %paypal_order.id,
            outcome = ?outcome,
            "Applying PayPal order"
        );

        match outcome {
            OrderOutcome::Paid { capture_id, fees } => {
                if paypal_order.intent == OrderIntent::Authorize {
                    order.meta.captured = true;
                }
                if capture_id.is_some() {
                    order.meta.transaction_id = capture_id.clone();
                }
                if fees.is_some() {
                    order.meta.fees = fees;
                }
                self.orders.update_meta(order.id, &order.meta).await?;

                let note = match &capture_id {
                    Some(id) => format!("PayPal payment completed ({})", id),
                    None => "PayPal payment completed".to_string(),
                };
                if self
                    .move_to(&mut order, LocalOrderStatus::Processing, &note)
                    .await?
                {
                    self.publish(OrderEvent::PaymentCompleted {
                        order_id: order.id,
                        transaction_id: capture_id,
                        occurred_at: Timestamp::now(),
                    })
                    .await;
                }
            }
            OrderOutcome::CapturePending { capture_id, reason } => {
                order.meta.transaction_id = Some(capture_id.clone());
                self.orders.update_meta(order.id, &order.meta).await?;
                let note = format!(
                    "PayPal capture {} pending: {}",
                    capture_id,
                    reason.as_deref().unwrap_or("no reason given")
                );
                self.move_to(&mut order, LocalOrderStatus::OnHold, &note)
                    .await?;
            }
            OrderOutcome::Authorized { authorization_id } => {
                let note = format!("PayPal payment authorized ({}), awaiting capture", authorization_id);
                order.meta.authorization_id = Some(authorization_id);
                self.orders.update_meta(order.id, &order.meta).await?;
                self.move_to(&mut order, LocalOrderStatus::OnHold, &note)
                    .await?;
            }
            OrderOutcome::Declined { reason } => {
                self.orders.update_meta(order.id, &order.meta).await?;
                self.fail_order(&mut order, &reason).await?;
            }
            OrderOutcome::Voided => {
                self.orders.update_meta(order.id, &order.meta).await?;
                self.move_to(&mut order, LocalOrderStatus::Cancelled, "PayPal order voided")
                    .await?;
            }
            OrderOutcome::Approved { .. } | OrderOutcome::AwaitingPayer => {
                self.orders.update_meta(order.id, &order.meta).await?;
            }
        }

        Ok(order)
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Payment-level events
    // ════════════════════════════════════════════════════════════════════════════

    /// Records a completed capture. Returns `Ok(false)` when already recorded.
    pub async fn record_capture_completed(
        &self,
        order_id: LocalOrderId,
        capture: &Capture,
    ) -> Result<bool, OrderError> {
        let mut order = self.load(order_id).await?;
        if order.meta.transaction_id.as_deref() == Some(capture.id.as_str()) && order.status.is_paid() {
            return Ok(false);
        }

        order.meta.transaction_id = Some(capture.id.clone());
        if let Some(fees) = capture_fees(capture) {
            order.meta.fees = Some(fees);
        }
        if order.meta.intent == Some(OrderIntent::Authorize) {
            order.meta.captured = true;
        }
        self.orders.update_meta(order_id, &order.meta).await?;

        let note = format!("PayPal capture {} completed", capture.id);
        let moved = self
            .move_to(&mut order, LocalOrderStatus::Processing, &note)
            .await?;
        if moved {
            self.publish(OrderEvent::PaymentCompleted {
                order_id,
                transaction_id: Some(capture.id.clone()),
                occurred_at: Timestamp::now(),
            })
            .await;
        }
        Ok(moved)
    }

    /// Puts the order on hold while PayPal holds the capture.
    pub async fn mark_capture_pending(
        &self,
        order_id: LocalOrderId,
        capture: &Capture,
    ) -> Result<bool, OrderError> {
        let mut order = self.load(order_id).await?;
        if order.meta.transaction_id.is_none() {
            order.meta.transaction_id = Some(capture.id.clone());
            self.orders.update_meta(order_id, &order.meta).await?;
        }
        let note = pending_note(capture);
        self.move_to(&mut order, LocalOrderStatus::OnHold, &note)
            .await
    }

    /// Records a refund and accumulates its fee breakdown.
    ///
    /// Returns `Ok(false)` for a refund id already recorded. The order
    /// moves to `Refunded` once the refunded gross reaches the total.
    pub async fn record_refund(&self, order_id: LocalOrderId, refund: &Refund) -> Result<bool, OrderError> {
        let mut order = self.load(order_id).await?;
        if order.meta.refund_ids.iter().any(|id| id == &refund.id) {
            return Ok(false);
        }

        let breakdown = match (&refund.seller_payable_breakdown, &refund.amount) {
            (Some(payable), _) => Some(FeeBreakdown::try_from(payable)?),
            (None, Some(amount)) => Some(FeeBreakdown::new(amount.clone(), None, None)?),
            (None, None) => None,
        };

        order.meta.refund_fees = match (order.meta.refund_fees.take(), &breakdown) {
            (Some(total), Some(this)) => Some(total.accumulate(this)?),
            (None, this) => this.clone(),
            (total, None) => total,
        };
        order.meta.refund_ids.push(refund.id.clone());
        self.orders.update_meta(order_id, &order.meta).await?;

        let fully_refunded = order
            .meta
            .refund_fees
            .as_ref()
            .is_some_and(|f| f.gross.value >= order.total);

        let amount = refund
            .amount
            .clone()
            .or_else(|| breakdown.map(|b| b.gross));
        let note = match &amount {
            Some(amount) => format!("PayPal refund {} of {}", refund.id, amount),
            None => format!("PayPal refund {}", refund.id),
        };

        if fully_refunded {
            self.move_to(&mut order, LocalOrderStatus::Refunded, &note)
                .await?;
        } else {
            self.orders.add_note(order_id, &note).await?;
        }

        tracing::info!(
            order_id = %order_id,
            refund_id = %refund.id,
            fully_refunded,
            "Refund recorded"
        );

        self.publish(OrderEvent::Refunded {
            order_id,
            refund_id: refund.id.clone(),
            amount,
            fully_refunded,
            occurred_at: Timestamp::now(),
        })
        .await;

        Ok(true)
    }

    /// Puts a paid order on hold (reversal, dispute).
    pub async fn hold(&self, order_id: LocalOrderId, note: &str) -> Result<bool, OrderError> {
        let mut order = self.load(order_id).await?;
        self.move_to(&mut order, LocalOrderStatus::OnHold, note)
            .await
    }

    /// Marks the order failed and publishes `OrderEvent::Failed`.
    pub async fn mark_failed(&self, order_id: LocalOrderId, reason: &str) -> Result<bool, OrderError> {
        let mut order = self.load(order_id).await?;
        self.fail_order(&mut order, reason).await
    }

    /// Marks a paid order completed. Renewals have no fulfilment step.
    pub async fn complete(&self, order_id: LocalOrderId, note: &str) -> Result<bool, OrderError> {
        let mut order = self.load(order_id).await?;
        self.move_to(&mut order, LocalOrderStatus::Completed, note)
            .await
    }

    pub async fn cancel(&self, order_id: LocalOrderId, reason: &str) -> Result<bool, OrderError> {
        let mut order = self.load(order_id).await?;
        self.move_to(&mut order, LocalOrderStatus::Cancelled, reason)
            .await
    }

    pub async fn add_note(&self, order_id: LocalOrderId, note: &str) -> Result<(), OrderError> {
        self.orders.add_note(order_id, note).await?;
        Ok(())
    }

    /// Publishes an event, logging instead of failing.
    pub async fn publish(&self, event: OrderEvent) {
        let event_type = event.event_type();
        let order_id = event.order_id();
        if let Err(e) = self.events.publish(event).await {
            tracing::warn!(
                order_id = %order_id,
                event_type,
                error = %e,
                "Failed to publish order event"
            );
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Internal Helpers
    // ════════════════════════════════════════════════════════════════════════════

    async fn load(&self, order_id: LocalOrderId) -> Result<LocalOrder, OrderError> {
        self.orders
            .find_by_id(order_id)
            .await?
            .ok_or(OrderError::OrderNotFound(order_id))
    }

    async fn fail_order(&self, order: &mut LocalOrder, reason: &str) -> Result<bool, OrderError> {
        let note = format!("PayPal payment failed: {}", reason);
        let moved = self
            .move_to(order, LocalOrderStatus::Failed, &note)
            .await?;
        if moved {
            self.publish(OrderEvent::Failed {
                order_id: order.id,
                reason: reason.to_string(),
                occurred_at: Timestamp::now(),
            })
            .await;
        }
        Ok(moved)
    }

    /// Moves the order to `target` with a note.
    ///
    /// Events arrive out of order, so a transition the state machine
    /// rejects is not an error: the note is still recorded and `false`
    /// returned.
    async fn move_to(
        &self,
        order: &mut LocalOrder,
        target: LocalOrderStatus,
        note: &str,
    ) -> Result<bool, OrderError> {
        let from = order.status;
        match order.transition(target) {
            Ok(true) => {
                self.orders.update_status(order.id, target, Some(note)).await?;
                order.notes.push(note.to_string());
                tracing::info!(order_id = %order.id, from = ?from, to = ?target, "Order status changed");
                Ok(true)
            }
            Ok(false) => Ok(false),
            Err(e) => {
                tracing::warn!(
                    order_id = %order.id,
                    from = ?from,
                    to = ?target,
                    error = %e,
                    "Skipping status change"
                );
                self.orders.add_note(order.id, note).await?;
                order.notes.push(note.to_string());
                Ok(false)
            }
        }
    }
}

/// Resolves the local order id carried in the first purchase unit.
pub fn resolve_local_order_id(paypal_order: &PayPalOrder) -> Result<LocalOrderId, OrderError> {
    match paypal_order.local_order_id() {
        Ok(Some(id)) => Ok(id),
        Ok(None) | Err(_) => {
            tracing::error!(
                paypal_order_id = %paypal_order.id,
                "PayPal order carries no usable custom id"
            );
            Err(OrderError::MissingCustomId(paypal_order.id.clone()))
        }
    }
}

fn capture_fees(capture: &Capture) -> Option<FeeBreakdown> {
    capture
        .seller_receivable_breakdown
        .as_ref()
        .and_then(|b| FeeBreakdown::try_from(b).ok())
}

fn pending_note(capture: &Capture) -> String {
    let reason = capture
        .status_details
        .as_ref()
        .and_then(|d| d.reason.as_deref())
        .unwrap_or("no reason given");
    format!("PayPal capture {} pending: {}", capture.id, reason)
}

fn already_processed(err: &GatewayError) -> bool {
    err.api().is_some_and(|api| {
        api.has_issue("ORDER_ALREADY_CAPTURED") || api.has_issue("ORDER_ALREADY_AUTHORIZED")
    })
}

/// PayPal order ids are short upper-case alphanumeric strings.
fn is_paypal_order_id(token: &str) -> bool {
    !token.is_empty()
        && token.len() <= 64
        && token
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}
