//! Stores layered over a [`KeyValueStore`].
//!
//! Each store owns a key namespace and serializes its records as JSON, so
//! the same Redis instance can back all of them.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::foundation::DomainError;
use crate::domain::vault::PaymentToken;
use crate::domain::webhook::{SimulationSession, WebhookRegistration};
use crate::ports::{
    ClaimResult, KeyValueStore, PaymentTokenStore, ProcessedEventStore, SimulationStore,
    WebhookRegistrationStore,
};

const DEDUP_PREFIX: &str = "dedup:";
const REGISTRATION_KEY: &str = "webhook:registration";
const SIMULATION_KEY: &str = "webhook:simulation";
const TOKENS_PREFIX: &str = "payment_tokens:";
const TOKEN_OWNER_PREFIX: &str = "payment_token_owner:";

async fn load_json<T: DeserializeOwned>(
    kv: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, DomainError> {
    match kv.get(key).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

async fn save_json<T: Serialize>(
    kv: &dyn KeyValueStore,
    key: &str,
    value: &T,
    ttl: Option<Duration>,
) -> Result<(), DomainError> {
    let raw = serde_json::to_string(value)?;
    kv.set(key, &raw, ttl).await
}

// ════════════════════════════════════════════════════════════════════════════
// Webhook dedup
// ════════════════════════════════════════════════════════════════════════════

pub struct KvProcessedEventStore {
    kv: Arc<dyn KeyValueStore>,
}

impl KvProcessedEventStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }
}

#[async_trait]
impl ProcessedEventStore for KvProcessedEventStore {
    async fn claim(&self, event_id: &str, retention: Duration) -> Result<ClaimResult, DomainError> {
        let key = format!("{}{}", DEDUP_PREFIX, event_id);
        if self.kv.set_if_absent(&key, "1", retention).await? {
            Ok(ClaimResult::Claimed)
        } else {
            Ok(ClaimResult::AlreadyProcessed)
        }
    }

    async fn contains(&self, event_id: &str) -> Result<bool, DomainError> {
        let key = format!("{}{}", DEDUP_PREFIX, event_id);
        Ok(self.kv.get(&key).await?.is_some())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Webhook registration and simulation session
// ════════════════════════════════════════════════════════════════════════════

pub struct KvWebhookRegistrationStore {
    kv: Arc<dyn KeyValueStore>,
}

impl KvWebhookRegistrationStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }
}

#[async_trait]
impl WebhookRegistrationStore for KvWebhookRegistrationStore {
    async fn load(&self) -> Result<Option<WebhookRegistration>, DomainError> {
        load_json(self.kv.as_ref(), REGISTRATION_KEY).await
    }

    async fn save(&self, registration: &WebhookRegistration) -> Result<(), DomainError> {
        save_json(self.kv.as_ref(), REGISTRATION_KEY, registration, None).await
    }

    async fn clear(&self) -> Result<(), DomainError> {
        self.kv.delete(REGISTRATION_KEY).await.map(|_| ())
    }
}

pub struct KvSimulationStore {
    kv: Arc<dyn KeyValueStore>,
}

impl KvSimulationStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }
}

#[async_trait]
impl SimulationStore for KvSimulationStore {
    async fn load(&self) -> Result<SimulationSession, DomainError> {
        Ok(load_json(self.kv.as_ref(), SIMULATION_KEY)
            .await?
            .unwrap_or_default())
    }

    async fn save(&self, session: &SimulationSession) -> Result<(), DomainError> {
        save_json(self.kv.as_ref(), SIMULATION_KEY, session, None).await
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Vault token cache
// ════════════════════════════════════════════════════════════════════════════

/// Caches a customer's tokens plus a token-to-owner index for eviction.
pub struct KvPaymentTokenStore {
    kv: Arc<dyn KeyValueStore>,
    ttl: Option<Duration>,
}

impl KvPaymentTokenStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv, ttl: None }
    }

    /// Expire cached token lists after `ttl`.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    fn tokens_key(customer_id: &str) -> String {
        format!("{}{}", TOKENS_PREFIX, customer_id)
    }

    fn owner_key(token_id: &str) -> String {
        format!("{}{}", TOKEN_OWNER_PREFIX, token_id)
    }
}

#[async_trait]
impl PaymentTokenStore for KvPaymentTokenStore {
    async fn get(&self, customer_id: &str) -> Result<Option<Vec<PaymentToken>>, DomainError> {
        load_json(self.kv.as_ref(), &Self::tokens_key(customer_id)).await
    }

    async fn store(&self, customer_id: &str, tokens: &[PaymentToken]) -> Result<(), DomainError> {
        save_json(self.kv.as_ref(), &Self::tokens_key(customer_id), &tokens, self.ttl).await?;
        for token in tokens {
            self.kv
                .set(&Self::owner_key(&token.id), customer_id, self.ttl)
                .await?;
        }
        Ok(())
    }

    async fn evict_token(&self, token_id: &str) -> Result<(), DomainError> {
        let owner_key = Self::owner_key(token_id);
        let Some(customer_id) = self.kv.get(&owner_key).await? else {
            return Ok(());
        };

        let key = Self::tokens_key(&customer_id);
        if let Some(mut tokens) = load_json::<Vec<PaymentToken>>(self.kv.as_ref(), &key).await? {
            tokens.retain(|t| t.id != token_id);
            save_json(self.kv.as_ref(), &key, &tokens, self.ttl).await?;
        }
        self.kv.delete(&owner_key).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::InMemoryKeyValueStore;
    use crate::domain::foundation::Timestamp;
    use crate::domain::vault::PaymentSourceKind;
    use crate::domain::webhook::SimulationState;

    fn kv() -> Arc<dyn KeyValueStore> {
        Arc::new(InMemoryKeyValueStore::new())
    }

    #[tokio::test]
    async fn second_claim_is_already_processed() {
        let store = KvProcessedEventStore::new(kv());
        let retention = Duration::from_secs(60);

        assert_eq!(store.claim("WH-1", retention).await.unwrap(), ClaimResult::Claimed);
        assert_eq!(
            store.claim("WH-1", retention).await.unwrap(),
            ClaimResult::AlreadyProcessed
        );
        assert!(store.contains("WH-1").await.unwrap());
        assert!(!store.contains("WH-2").await.unwrap());
    }

    #[tokio::test]
    async fn registration_round_trips_and_clears() {
        let store = KvWebhookRegistrationStore::new(kv());
        assert!(store.load().await.unwrap().is_none());

        let registration = WebhookRegistration::new(
            "WH-REG-1",
            "https://shop.test/webhooks/paypal",
            vec!["*".to_string()],
        );
        store.save(&registration).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(registration));

        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn missing_simulation_loads_idle() {
        let store = KvSimulationStore::new(kv());
        assert_eq!(store.load().await.unwrap().state, SimulationState::Idle);

        let session = SimulationSession::begin(
            "PAYMENT.AUTHORIZATION.CREATED",
            "1.0",
            "WH-SIM-1",
            Timestamp::now(),
        );
        store.save(&session).await.unwrap();
        assert_eq!(store.load().await.unwrap(), session);
    }

    #[tokio::test]
    async fn evicting_a_token_removes_it_from_its_owner() {
        let store = KvPaymentTokenStore::new(kv());
        let tokens = vec![
            PaymentToken::new("tok-1", PaymentSourceKind::Card, "cust-1"),
            PaymentToken::new("tok-2", PaymentSourceKind::Paypal, "cust-1"),
        ];
        store.store("cust-1", &tokens).await.unwrap();

        store.evict_token("tok-2").await.unwrap();

        let remaining = store.get("cust-1").await.unwrap().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, "tok-1");
    }

    #[tokio::test]
    async fn evicting_unknown_token_is_a_noop() {
        let store = KvPaymentTokenStore::new(kv());
        store.evict_token("nope").await.unwrap();
        assert!(store.get("cust-1").await.unwrap().is_none());
    }
}
