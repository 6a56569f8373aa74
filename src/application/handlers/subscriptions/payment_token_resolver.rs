//! Resolves the vaulted token a renewal charges.

use std::sync::Arc;

use crate::domain::vault::{select_token, PaymentToken};
use crate::ports::{PayPalGateway, PaymentTokenStore};

use super::RenewalError;

/// Cache-first lookup of a customer's vaulted tokens.
pub struct PaymentTokenResolver {
    gateway: Arc<dyn PayPalGateway>,
    store: Arc<dyn PaymentTokenStore>,
}

impl PaymentTokenResolver {
    pub fn new(gateway: Arc<dyn PayPalGateway>, store: Arc<dyn PaymentTokenStore>) -> Self {
        Self { gateway, store }
    }

    /// Picks a token for `vault_customer_id`, preferring `preferred_id`.
    ///
    /// The cache is refreshed from PayPal when it is empty or no longer
    /// holds the preferred token.
    pub async fn resolve(
        &self,
        vault_customer_id: &str,
        preferred_id: Option<&str>,
    ) -> Result<PaymentToken, RenewalError> {
        let cached = self.store.get(vault_customer_id).await?;
        let usable = cached.filter(|tokens| {
            !tokens.is_empty()
                && preferred_id.map_or(true, |id| tokens.iter().any(|t| t.id == id))
        });

        let tokens = match usable {
            Some(tokens) => tokens,
            None => {
                let fetched = self.gateway.payment_tokens(vault_customer_id).await?;
                self.store.store(vault_customer_id, &fetched).await?;
                tracing::debug!(
                    vault_customer_id,
                    count = fetched.len(),
                    "Payment tokens refreshed from PayPal"
                );
                fetched
            }
        };

        select_token(&tokens, preferred_id)
            .cloned()
            .ok_or_else(|| RenewalError::NoPaymentToken(vault_customer_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::paypal::MockPayPalGateway;
    use crate::adapters::storage::{InMemoryKeyValueStore, KvPaymentTokenStore};
    use crate::domain::vault::PaymentSourceKind;

    fn resolver() -> (MockPayPalGateway, Arc<KvPaymentTokenStore>, PaymentTokenResolver) {
        let gateway = MockPayPalGateway::new();
        let store = Arc::new(KvPaymentTokenStore::new(Arc::new(InMemoryKeyValueStore::new())));
        let resolver = PaymentTokenResolver::new(Arc::new(gateway.clone()), store.clone());
        (gateway, store, resolver)
    }

    #[tokio::test]
    async fn fetches_and_caches_on_miss() {
        let (gateway, store, resolver) = resolver();
        gateway.set_payment_tokens(
            "cust-1",
            vec![PaymentToken::new("tok-1", PaymentSourceKind::Paypal, "cust-1")],
        );

        let first = resolver.resolve("cust-1", None).await.unwrap();
        let second = resolver.resolve("cust-1", None).await.unwrap();

        assert_eq!(first.id, "tok-1");
        assert_eq!(second.id, "tok-1");
        assert_eq!(gateway.call_count("payment_tokens"), 1);
        assert!(store.get("cust-1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn refreshes_when_preferred_token_not_cached() {
        let (gateway, store, resolver) = resolver();
        store
            .store("cust-1", &[PaymentToken::new("old", PaymentSourceKind::Card, "cust-1")])
            .await
            .unwrap();
        gateway.set_payment_tokens(
            "cust-1",
            vec![PaymentToken::new("new", PaymentSourceKind::Card, "cust-1")],
        );

        let token = resolver.resolve("cust-1", Some("new")).await.unwrap();

        assert_eq!(token.id, "new");
    }

    #[tokio::test]
    async fn no_tokens_is_an_error() {
        let (_gateway, _store, resolver) = resolver();

        let err = resolver.resolve("cust-empty", None).await.unwrap_err();

        assert!(matches!(err, RenewalError::NoPaymentToken(_)));
    }
}
