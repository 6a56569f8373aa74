//! HTTP adapter for the PayPal commerce endpoints.
//!
//! - `POST /webhooks/paypal` - PayPal webhook deliveries
//! - `GET /checkout/return?token=` - Shopper returning from PayPal
//! - `POST /admin/orders/:id/capture` - Capture an authorized payment
//! - `POST|DELETE /admin/webhooks/register` - Webhook registration
//! - `POST|GET /admin/webhooks/simulate` - Webhook simulation
//! - `GET /health`

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::*;
pub use handlers::{CommerceApiError, CommerceAppState, CommercePorts, CommerceSettings};
pub use routes::{admin_routes, commerce_router};
