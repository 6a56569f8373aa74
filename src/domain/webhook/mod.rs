//! Webhook domain module.
//!
//! PayPal webhook events, the handler registration table, the shop's
//! webhook registration and the delivery simulation session.

mod errors;
mod event;
mod handler;
mod registration;
pub mod signature;
mod simulation;

pub use errors::WebhookError;
#[cfg(test)]
pub use event::WebhookEventBuilder;
pub use event::{WebhookEvent, WebhookEventType};
pub use handler::{HandlerRegistry, WebhookEventHandler};
pub use registration::WebhookRegistration;
pub use signature::TransmissionHeaders;
pub use simulation::{SimulationSession, SimulationState, SimulationStatus};
