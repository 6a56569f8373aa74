//! Application layer - Commands and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Handlers receive their collaborators at construction and hold no state
//! of their own.

pub mod handlers;

pub use handlers::{
    // Orders
    CreatePayPalOrderCommand, CreatePayPalOrderHandler, OrderReconciler, RequestIdRepository,
    // Webhooks
    ProcessWebhookCommand, ProcessWebhookResult, RegisterWebhookHandler, WebhookProcessor,
    WebhookProcessorConfig,
    // Simulation
    SimulationService,
    // Subscriptions
    RenewSubscriptionHandler, RenewalOutcome,
};
