//! Application handlers.
//!
//! Command handlers that orchestrate domain operations through ports.

pub mod orders;
pub mod simulation;
pub mod subscriptions;
pub mod webhooks;

pub use orders::{
    CreatePayPalOrderCommand, CreatePayPalOrderHandler, OrderReconciler, RequestIdRepository,
};
pub use simulation::{SimulationError, SimulationReport, SimulationService};
pub use subscriptions::{
    PaymentTokenResolver, RenewSubscriptionHandler, RenewalError, RenewalOutcome,
};
pub use webhooks::{
    default_registry, ProcessWebhookCommand, ProcessWebhookResult, RegisterWebhookHandler,
    RegistrationError, WebhookProcessor, WebhookProcessorConfig,
};
