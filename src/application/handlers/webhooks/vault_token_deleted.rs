//! VAULT.PAYMENT-TOKEN.DELETED - drops the token from the local cache so
//! renewals stop selecting it.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::webhook::{WebhookError, WebhookEvent, WebhookEventHandler, WebhookEventType};
use crate::ports::PaymentTokenStore;

pub struct VaultTokenDeletedHandler {
    tokens: Arc<dyn PaymentTokenStore>,
}

impl VaultTokenDeletedHandler {
    pub fn new(tokens: Arc<dyn PaymentTokenStore>) -> Self {
        Self { tokens }
    }
}

#[async_trait]
impl WebhookEventHandler for VaultTokenDeletedHandler {
    fn name(&self) -> &'static str {
        "vault_token_deleted"
    }

    fn handles(&self) -> Vec<WebhookEventType> {
        vec![WebhookEventType::VaultPaymentTokenDeleted]
    }

    async fn handle(&self, event: &WebhookEvent) -> Result<(), WebhookError> {
        let token_id = event
            .resource_id()
            .ok_or(WebhookError::MissingField("resource.id"))?;

        self.tokens.evict_token(token_id).await?;
        tracing::info!(token_id, "Vaulted payment token evicted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::{InMemoryKeyValueStore, KvPaymentTokenStore};
    use crate::domain::vault::{PaymentSourceKind, PaymentToken};
    use crate::domain::webhook::WebhookEventBuilder;
    use serde_json::json;

    #[tokio::test]
    async fn deleted_token_is_evicted_from_cache() {
        let store = Arc::new(KvPaymentTokenStore::new(Arc::new(InMemoryKeyValueStore::new())));
        store
            .store(
                "cust-1",
                &[
                    PaymentToken::new("tok-1", PaymentSourceKind::Card, "cust-1"),
                    PaymentToken::new("tok-2", PaymentSourceKind::Paypal, "cust-1"),
                ],
            )
            .await
            .unwrap();
        let handler = VaultTokenDeletedHandler::new(store.clone());
        let event = WebhookEventBuilder::new()
            .event_type("VAULT.PAYMENT-TOKEN.DELETED")
            .resource(json!({"id": "tok-1"}))
            .build();

        handler.handle(&event).await.unwrap();

        let remaining = store.get("cust-1").await.unwrap().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, "tok-2");
    }
}
