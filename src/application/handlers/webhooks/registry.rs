//! The handler table the processor dispatches through.

use std::sync::Arc;

use crate::application::handlers::orders::OrderReconciler;
use crate::domain::webhook::HandlerRegistry;
use crate::ports::{PayPalGateway, PaymentTokenStore};

use super::{
    CaptureCompletedHandler, CapturePendingHandler, CaptureRefundedHandler, CheckoutOrderHandler,
    DisputeHandler, PaymentReversalHandler, VaultTokenDeletedHandler,
};

/// Builds the registry with every order and vault handler.
pub fn default_registry(
    gateway: Arc<dyn PayPalGateway>,
    reconciler: Arc<OrderReconciler>,
    tokens: Arc<dyn PaymentTokenStore>,
) -> HandlerRegistry {
    HandlerRegistry::new()
        .with(Arc::new(CheckoutOrderHandler::new(gateway.clone(), reconciler.clone())))
        .with(Arc::new(CaptureCompletedHandler::new(gateway.clone(), reconciler.clone())))
        .with(Arc::new(CapturePendingHandler::new(gateway.clone(), reconciler.clone())))
        .with(Arc::new(CaptureRefundedHandler::new(gateway.clone(), reconciler.clone())))
        .with(Arc::new(PaymentReversalHandler::new(gateway, reconciler.clone())))
        .with(Arc::new(DisputeHandler::new(reconciler)))
        .with(Arc::new(VaultTokenDeletedHandler::new(tokens)))
}
