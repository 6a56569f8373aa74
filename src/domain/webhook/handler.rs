//! Webhook handler trait and the registration table used for dispatch.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use super::{WebhookError, WebhookEvent, WebhookEventType};

/// Handler for one or more PayPal webhook event types.
///
/// Implementations should be stateless apart from their injected ports.
#[async_trait]
pub trait WebhookEventHandler: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Returns the event type(s) this handler processes.
    fn handles(&self) -> Vec<WebhookEventType>;

    /// Handles the webhook event.
    ///
    /// Returns `Err(WebhookError::Ignored(_))` if the event should be
    /// acknowledged but was not applicable.
    async fn handle(&self, event: &WebhookEvent) -> Result<(), WebhookError>;
}

/// Event type to handlers table, built once at startup.
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<WebhookEventType, Vec<Arc<dyn WebhookEventHandler>>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler under every type it declares.
    pub fn register(&mut self, handler: Arc<dyn WebhookEventHandler>) {
        for event_type in handler.handles() {
            if event_type == WebhookEventType::Unknown {
                continue;
            }
            self.handlers
                .entry(event_type)
                .or_default()
                .push(Arc::clone(&handler));
        }
    }

    pub fn with(mut self, handler: Arc<dyn WebhookEventHandler>) -> Self {
        self.register(handler);
        self
    }

    /// Handlers for a type, in registration order. Empty for unknown types.
    pub fn handlers_for(&self, event_type: WebhookEventType) -> &[Arc<dyn WebhookEventHandler>] {
        self.handlers
            .get(&event_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Event type strings with at least one handler, for webhook registration.
    pub fn event_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self
            .handlers
            .keys()
            .map(|t| t.as_str().to_string())
            .collect();
        types.sort();
        types
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str, Vec<WebhookEventType>);

    #[async_trait]
    impl WebhookEventHandler for Named {
        fn name(&self) -> &'static str {
            self.0
        }

        fn handles(&self) -> Vec<WebhookEventType> {
            self.1.clone()
        }

        async fn handle(&self, _event: &WebhookEvent) -> Result<(), WebhookError> {
            Ok(())
        }
    }

    #[test]
    fn handler_is_registered_under_each_declared_type() {
        let registry = HandlerRegistry::new().with(Arc::new(Named(
            "reversal",
            vec![
                WebhookEventType::PaymentCaptureReversed,
                WebhookEventType::PaymentCaptureDenied,
            ],
        )));

        assert_eq!(registry.handlers_for(WebhookEventType::PaymentCaptureReversed).len(), 1);
        assert_eq!(registry.handlers_for(WebhookEventType::PaymentCaptureDenied).len(), 1);
    }

    #[test]
    fn multiple_handlers_keep_registration_order() {
        let registry = HandlerRegistry::new()
            .with(Arc::new(Named("first", vec![WebhookEventType::PaymentCaptureCompleted])))
            .with(Arc::new(Named("second", vec![WebhookEventType::PaymentCaptureCompleted])));

        let names: Vec<_> = registry
            .handlers_for(WebhookEventType::PaymentCaptureCompleted)
            .iter()
            .map(|h| h.name())
            .collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn unknown_types_have_no_handlers() {
        let registry = HandlerRegistry::new()
            .with(Arc::new(Named("odd", vec![WebhookEventType::Unknown])));
        assert!(registry.handlers_for(WebhookEventType::Unknown).is_empty());
        assert!(registry.event_types().is_empty());
    }
}
