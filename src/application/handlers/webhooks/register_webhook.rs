//! RegisterWebhookHandler - keeps exactly one PayPal webhook pointed at the shop.

use std::sync::Arc;

use thiserror::Error;

use crate::domain::foundation::DomainError;
use crate::domain::webhook::WebhookRegistration;
use crate::ports::{GatewayError, PayPalGateway, WebhookRegistrationStore};

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<DomainError> for RegistrationError {
    fn from(err: DomainError) -> Self {
        RegistrationError::Storage(err.to_string())
    }
}

pub struct RegisterWebhookHandler {
    gateway: Arc<dyn PayPalGateway>,
    registrations: Arc<dyn WebhookRegistrationStore>,
    url: String,
    event_types: Vec<String>,
}

impl RegisterWebhookHandler {
    pub fn new(
        gateway: Arc<dyn PayPalGateway>,
        registrations: Arc<dyn WebhookRegistrationStore>,
        url: impl Into<String>,
        event_types: Vec<String>,
    ) -> Self {
        Self {
            gateway,
            registrations,
            url: url.into(),
            event_types,
        }
    }

    /// Replaces any webhook for this shop's URL with a fresh registration.
    ///
    /// PayPal rejects a second webhook for the same URL, so stale ones
    /// (including ones created by a previous install) are deleted first.
    pub async fn register(&self) -> Result<WebhookRegistration, RegistrationError> {
        self.delete_existing().await?;

        let registration = self
            .gateway
            .register_webhook(&self.url, &self.event_types)
            .await
            .map_err(|e| {
                tracing::error!(
                    url = %self.url,
                    debug_id = e.debug_id().unwrap_or("-"),
                    error = %e,
                    "Webhook registration failed"
                );
                RegistrationError::Gateway(e)
            })?;

        self.registrations.save(&registration).await?;

        tracing::info!(
            webhook_id = %registration.id,
            url = %registration.url,
            event_types = registration.event_types.len(),
            "Webhook registered"
        );
        Ok(registration)
    }

    /// Removes the webhook at PayPal and the stored record.
    pub async fn delete_registration(&self) -> Result<(), RegistrationError> {
        self.delete_existing().await?;
        if let Some(stored) = self.registrations.load().await? {
            if let Err(e) = self.gateway.delete_webhook(&stored.id).await {
                // Already gone at PayPal is fine.
                if e.api().map(|api| api.status) != Some(404) {
                    return Err(e.into());
                }
            }
        }
        self.registrations.clear().await?;
        Ok(())
    }

    async fn delete_existing(&self) -> Result<(), RegistrationError> {
        let existing = self.gateway.list_webhooks().await?;
        for webhook in existing.iter().filter(|w| w.points_to(&self.url)) {
            self.gateway.delete_webhook(&webhook.id).await?;
            tracing::debug!(webhook_id = %webhook.id, "Deleted stale webhook");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::paypal::MockPayPalGateway;
    use crate::adapters::storage::{InMemoryKeyValueStore, KvWebhookRegistrationStore};

    const URL: &str = "https://shop.test/webhooks/paypal";

    fn handler() -> (MockPayPalGateway, Arc<KvWebhookRegistrationStore>, RegisterWebhookHandler) {
        let gateway = MockPayPalGateway::new();
        let store = Arc::new(KvWebhookRegistrationStore::new(Arc::new(InMemoryKeyValueStore::new())));
        let handler = RegisterWebhookHandler::new(
            Arc::new(gateway.clone()),
            store.clone(),
            URL,
            vec!["PAYMENT.CAPTURE.COMPLETED".to_string()],
        );
        (gateway, store, handler)
    }

    #[tokio::test]
    async fn register_replaces_webhooks_for_same_url() {
        let (gateway, store, handler) = handler();
        gateway.add_webhook(WebhookRegistration::new("WH-OLD", format!("{}/", URL), vec![]));
        gateway.add_webhook(WebhookRegistration::new("WH-OTHER", "https://other.test/hook", vec![]));

        let registration = handler.register().await.unwrap();

        let ids: Vec<_> = gateway.webhooks().into_iter().map(|w| w.id).collect();
        assert!(!ids.contains(&"WH-OLD".to_string()));
        assert!(ids.contains(&"WH-OTHER".to_string()));
        assert!(ids.contains(&registration.id));
        assert_eq!(store.load().await.unwrap(), Some(registration));
    }

    #[tokio::test]
    async fn failed_registration_keeps_previous_record() {
        let (gateway, store, handler) = handler();
        let previous = WebhookRegistration::new("WH-PREV", URL, vec![]);
        store.save(&previous).await.unwrap();
        gateway.set_method_error(
            "register_webhook",
            GatewayError::Network("timeout".to_string()),
        );

        assert!(matches!(handler.register().await, Err(RegistrationError::Gateway(_))));
        assert_eq!(store.load().await.unwrap(), Some(previous));
    }

    #[tokio::test]
    async fn delete_registration_clears_record() {
        let (gateway, store, handler) = handler();
        let registration = handler.register().await.unwrap();

        handler.delete_registration().await.unwrap();

        assert!(store.load().await.unwrap().is_none());
        assert!(gateway.webhooks().iter().all(|w| w.id != registration.id));
    }
}
