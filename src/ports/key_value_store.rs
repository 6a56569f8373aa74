//! KeyValueStore port - shared cross-request state with expiry.
//!
//! Backs the PayPal-Request-Id cache, the webhook dedup set, the webhook
//! registration record, the simulation session and cached vault tokens.
//! Implementations: Redis (production) and in-memory (tests, single node).

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::foundation::DomainError;

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the value, or `None` when absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError>;

    /// Stores a value, replacing any previous one. `None` TTL never expires.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), DomainError>;

    /// Stores a value only if the key is absent. Returns `true` when stored.
    ///
    /// Must be atomic: of two concurrent callers exactly one gets `true`.
    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, DomainError>;

    /// Removes a key. Returns `true` when something was removed.
    async fn delete(&self, key: &str) -> Result<bool, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn KeyValueStore) {}
}
