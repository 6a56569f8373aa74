//! PayPal REST adapter and its test double.

mod api_error;
mod auth;
mod client;
mod mock_gateway;
mod wire;

pub use api_error::parse_error;
pub use client::{PayPalClient, PayPalClientConfig, LIVE_BASE_URL, SANDBOX_BASE_URL};
pub use mock_gateway::{MethodCall, MockPayPalGateway};
