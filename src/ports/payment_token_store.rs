//! Local cache of vaulted payment tokens, keyed by PayPal vault customer id.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::domain::vault::PaymentToken;

#[async_trait]
pub trait PaymentTokenStore: Send + Sync {
    /// Cached tokens for a customer. `None` means nothing cached yet.
    async fn get(&self, customer_id: &str) -> Result<Option<Vec<PaymentToken>>, DomainError>;

    async fn store(&self, customer_id: &str, tokens: &[PaymentToken]) -> Result<(), DomainError>;

    /// Drops a single token wherever it is cached.
    async fn evict_token(&self, token_id: &str) -> Result<(), DomainError>;
}
