//! CreatePayPalOrderHandler - Command handler for creating the PayPal order of a local order.

use std::sync::Arc;

use crate::domain::foundation::{LocalOrderId, Money};
use crate::domain::order::{LocalOrder, OrderError, OrderIntent, PayPalOrder};
use crate::ports::{
    AmountBreakdown, AmountWithBreakdown, ApplicationContext, CreateOrderRequest, ItemRequest,
    OrderRepository, Payer, PayerName, PayPalGateway, PaymentSourceRequest, PurchaseUnitRequest,
};

use super::RequestIdRepository;

pub(crate) const CREATE_ORDER_PURPOSE: &str = "create_order";

/// Command to create a PayPal order for a local order.
#[derive(Debug, Clone)]
pub struct CreatePayPalOrderCommand {
    pub order_id: LocalOrderId,
    pub intent: OrderIntent,
    /// Vaulted source to charge without buyer approval (renewals).
    pub payment_source: Option<PaymentSourceRequest>,
}

/// Handler for creating PayPal orders.
///
/// Links the PayPal order back to the local order through `custom_id` and
/// records the PayPal order id and intent in the order metadata.
pub struct CreatePayPalOrderHandler {
    gateway: Arc<dyn PayPalGateway>,
    orders: Arc<dyn OrderRepository>,
    request_ids: Arc<RequestIdRepository>,
    context: Option<ApplicationContext>,
}

impl CreatePayPalOrderHandler {
    pub fn new(
        gateway: Arc<dyn PayPalGateway>,
        orders: Arc<dyn OrderRepository>,
        request_ids: Arc<RequestIdRepository>,
    ) -> Self {
        Self {
            gateway,
            orders,
            request_ids,
            context: None,
        }
    }

    /// Brand and return/cancel URLs sent with every order.
    pub fn with_context(mut self, context: ApplicationContext) -> Self {
        self.context = Some(context);
        self
    }

    pub async fn handle(&self, cmd: CreatePayPalOrderCommand) -> Result<PayPalOrder, OrderError> {
        let mut order = self
            .orders
            .find_by_id(cmd.order_id)
            .await?
            .ok_or(OrderError::OrderNotFound(cmd.order_id))?;

        if order.status.is_paid() {
            return Err(OrderError::invalid_state(order.id, "order is already paid"));
        }

        let request = CreateOrderRequest {
            intent: cmd.intent,
            purchase_units: vec![purchase_unit_for(&order)],
            payer: payer_for(&order),
            payment_source: cmd.payment_source.clone(),
            application_context: self.context.clone(),
        };

        let request_id = self
            .request_ids
            .get_or_create(CREATE_ORDER_PURPOSE, &order.id.to_string())
            .await?;

        let paypal_order = self
            .gateway
            .create_order(&request, &request_id)
            .await
            .map_err(|e| {
                tracing::warn!(
                    order_id = %order.id,
                    debug_id = e.debug_id().unwrap_or("-"),
                    error = %e,
                    "PayPal order creation failed"
                );
                OrderError::Gateway(e)
            })?;

        order.meta.paypal_order_id = Some(paypal_order.id.clone());
        order.meta.intent = Some(paypal_order.intent);
        if let Some(source) = &cmd.payment_source {
            order.meta.payment_token_id = Some(vault_id(source).to_string());
        }
        self.orders.update_meta(order.id, &order.meta).await?;

        tracing::info!(
            order_id = %order.id,
            paypal_order_id = %paypal_order.id,
            intent = paypal_order.intent.as_str(),
            "PayPal order created"
        );

        Ok(paypal_order)
    }
}

fn vault_id(source: &PaymentSourceRequest) -> &str {
    match source {
        PaymentSourceRequest::Paypal { vault_id } | PaymentSourceRequest::Card { vault_id } => {
            vault_id
        }
    }
}

/// Builds the purchase unit for a local order.
///
/// The item/shipping/tax breakdown is only sent when it adds up to the
/// total; PayPal rejects the order otherwise.
pub fn purchase_unit_for(order: &LocalOrder) -> PurchaseUnitRequest {
    let money = |value| Money::new(order.currency.clone(), value);

    let (breakdown, items) = if order.breakdown_matches_total() {
        let breakdown = AmountBreakdown {
            item_total: Some(money(order.item_total())),
            shipping: Some(money(order.shipping_total)),
            tax_total: Some(money(order.tax_total)),
            discount: (!order.discount_total.is_zero()).then(|| money(order.discount_total)),
        };
        let items = order
            .items
            .iter()
            .map(|item| ItemRequest {
                name: item.name.clone(),
                quantity: item.quantity.to_string(),
                unit_amount: money(item.unit_price),
                sku: item.sku.clone(),
            })
            .collect();
        (Some(breakdown), items)
    } else {
        (None, Vec::new())
    };

    PurchaseUnitRequest {
        reference_id: None,
        custom_id: order.id.to_string(),
        invoice_id: Some(format!("order-{}", order.id)),
        amount: AmountWithBreakdown {
            currency_code: order.currency.clone(),
            value: order.total,
            breakdown,
        },
        items,
    }
}

/// Payer details from the billing contact, when there is one.
pub fn payer_for(order: &LocalOrder) -> Option<Payer> {
    let billing = order.billing.as_ref()?;
    let name = match (&billing.first_name, &billing.last_name) {
        (Some(given), Some(surname)) => Some(PayerName {
            given_name: given.clone(),
            surname: surname.clone(),
        }),
        _ => None,
    };
    if billing.email.is_none() && name.is_none() {
        return None;
    }
    Some(Payer {
        email_address: billing.email.clone(),
        name,
    })
}
