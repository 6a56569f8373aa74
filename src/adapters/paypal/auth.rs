//! OAuth2 client-credentials token cache.

use tokio::sync::RwLock;

use crate::domain::foundation::Timestamp;

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    refresh_at: Timestamp,
}

/// Bearer token cached until `margin_secs` before PayPal's expiry.
#[derive(Debug)]
pub struct TokenCache {
    inner: RwLock<Option<CachedToken>>,
    margin_secs: i64,
}

impl TokenCache {
    pub fn new(margin_secs: i64) -> Self {
        Self {
            inner: RwLock::new(None),
            margin_secs: margin_secs.max(0),
        }
    }

    /// The cached token if it is still usable at `now`.
    pub async fn current(&self, now: Timestamp) -> Option<String> {
        let guard = self.inner.read().await;
        guard
            .as_ref()
            .filter(|token| now.is_before(&token.refresh_at))
            .map(|token| token.value.clone())
    }

    /// Caches a freshly issued token.
    pub async fn store(&self, value: String, expires_in_secs: i64, now: Timestamp) {
        let lifetime = (expires_in_secs - self.margin_secs).max(0);
        let mut guard = self.inner.write().await;
        *guard = Some(CachedToken {
            value,
            refresh_at: now.plus_secs(lifetime),
        });
    }

    /// Drops the cached token after PayPal rejected it.
    pub async fn invalidate(&self) {
        let mut guard = self.inner.write().await;
        *guard = None;
    }
}
