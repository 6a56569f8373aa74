//! WebhookProcessor - verifies, deduplicates and dispatches PayPal webhooks.
//!
//! ```text
//! payload ─► parse ─► simulation? ──yes──► SimulationService::receive
//!                        │no
//!                        ▼
//!                     verify ─► claim(event id) ─► handlers_for(type)
//!                                     │dup              │each isolated
//!                                     ▼                 ▼
//!                                 Duplicate        Dispatched
//! ```
//!
//! Anything that reaches dispatch is acknowledged. PayPal retries on non-2xx,
//! so a broken handler must not turn into a retry storm.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;

use crate::application::handlers::simulation::SimulationService;
use crate::domain::webhook::{HandlerRegistry, TransmissionHeaders, WebhookError, WebhookEvent};
use crate::ports::{ClaimResult, PayPalGateway, ProcessedEventStore, WebhookRegistrationStore};

/// A raw delivery as received over HTTP.
#[derive(Debug, Clone)]
pub struct ProcessWebhookCommand {
    /// Raw request body.
    pub payload: Vec<u8>,
    /// Request headers, names lowercased.
    pub headers: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessWebhookResult {
    /// Handlers ran. `failed` counts handlers that errored or panicked.
    Dispatched { handled: usize, failed: usize },
    /// Seen before within the retention window.
    Duplicate,
    /// No handler is registered for the event type.
    Ignored,
    /// Event belongs to the diagnostic simulation flow.
    Simulation { matched: bool },
}

#[derive(Debug, Clone)]
pub struct WebhookProcessorConfig {
    pub verify_signatures: bool,
    pub dedup_ttl: Duration,
}

impl Default for WebhookProcessorConfig {
    fn default() -> Self {
        Self {
            verify_signatures: true,
            dedup_ttl: Duration::from_secs(86_400),
        }
    }
}

pub struct WebhookProcessor {
    gateway: Arc<dyn PayPalGateway>,
    registrations: Arc<dyn WebhookRegistrationStore>,
    processed: Arc<dyn ProcessedEventStore>,
    simulation: Arc<SimulationService>,
    registry: HandlerRegistry,
    config: WebhookProcessorConfig,
}

impl WebhookProcessor {
    pub fn new(
        gateway: Arc<dyn PayPalGateway>,
        registrations: Arc<dyn WebhookRegistrationStore>,
        processed: Arc<dyn ProcessedEventStore>,
        simulation: Arc<SimulationService>,
        registry: HandlerRegistry,
        config: WebhookProcessorConfig,
    ) -> Self {
        Self {
            gateway,
            registrations,
            processed,
            simulation,
            registry,
            config,
        }
    }

    pub async fn handle(&self, cmd: ProcessWebhookCommand) -> Result<ProcessWebhookResult, WebhookError> {
        let raw: serde_json::Value = serde_json::from_slice(&cmd.payload)
            .map_err(|e| WebhookError::ParseError(e.to_string()))?;
        let event: WebhookEvent = serde_json::from_value(raw.clone())
            .map_err(|e| WebhookError::ParseError(e.to_string()))?;

        if self.simulation.is_simulation_event(&event).await {
            let matched = self.simulation.receive(&event).await.unwrap_or_else(|e| {
                tracing::warn!(event_id = %event.id, error = %e, "Failed to record simulation event");
                false
            });
            return Ok(ProcessWebhookResult::Simulation { matched });
        }

        if self.config.verify_signatures {
            self.verify(&cmd.headers, &raw, &event).await?;
        }

        match self.processed.claim(&event.id, self.config.dedup_ttl).await? {
            ClaimResult::Claimed => {}
            ClaimResult::AlreadyProcessed => {
                tracing::info!(
                    event_id = %event.id,
                    event_type = %event.event_type,
                    "Duplicate webhook delivery acknowledged"
                );
                return Ok(ProcessWebhookResult::Duplicate);
            }
        }

        Ok(self.dispatch(&event).await)
    }

    async fn verify(
        &self,
        headers: &HashMap<String, String>,
        raw: &serde_json::Value,
        event: &WebhookEvent,
    ) -> Result<(), WebhookError> {
        let result = self.verify_delivery(headers, raw).await;
        if let Err(e) = &result {
            tracing::warn!(
                event_id = %event.id,
                event_type = %event.event_type,
                error = %e,
                "Webhook verification failed"
            );
        }
        result
    }

    async fn verify_delivery(
        &self,
        headers: &HashMap<String, String>,
        raw: &serde_json::Value,
    ) -> Result<(), WebhookError> {
        let registration = self
            .registrations
            .load()
            .await?
            .ok_or(WebhookError::NotRegistered)?;

        let transmission = TransmissionHeaders::from_lookup(|name| headers.get(name).map(String::as_str))?;

        let verified = self
            .gateway
            .verify_webhook_signature(&transmission, &registration.id, raw)
            .await
            .map_err(|e| WebhookError::VerificationUnavailable(e.to_string()))?;

        if verified {
            Ok(())
        } else {
            Err(WebhookError::InvalidSignature)
        }
    }

    async fn dispatch(&self, event: &WebhookEvent) -> ProcessWebhookResult {
        let handlers = self.registry.handlers_for(event.parsed_type());
        if handlers.is_empty() {
            tracing::debug!(
                event_id = %event.id,
                event_type = %event.event_type,
                "No handler for webhook event type"
            );
            return ProcessWebhookResult::Ignored;
        }

        let mut handled = 0;
        let mut failed = 0;

        for handler in handlers {
            let outcome = AssertUnwindSafe(handler.handle(event)).catch_unwind().await;
            match outcome {
                Ok(Ok(())) => handled += 1,
                Ok(Err(WebhookError::Ignored(reason))) => {
                    tracing::debug!(
                        event_id = %event.id,
                        handler = handler.name(),
                        reason = %reason,
                        "Webhook handler skipped event"
                    );
                    handled += 1;
                }
                Ok(Err(e)) => {
                    tracing::error!(
                        event_id = %event.id,
                        event_type = %event.event_type,
                        handler = handler.name(),
                        error = %e,
                        "Webhook handler failed"
                    );
                    failed += 1;
                }
                Err(_) => {
                    tracing::error!(
                        event_id = %event.id,
                        event_type = %event.event_type,
                        handler = handler.name(),
                        "Webhook handler panicked"
                    );
                    failed += 1;
                }
            }
        }

        tracing::info!(
            event_id = %event.id,
            event_type = %event.event_type,
            handled,
            failed,
            "Webhook dispatched"
        );
        ProcessWebhookResult::Dispatched { handled, failed }
    }
}
