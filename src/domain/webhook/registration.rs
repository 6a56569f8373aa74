//! The shop's webhook registration with PayPal.

use serde::{Deserialize, Serialize};

/// A webhook registered with PayPal.
///
/// At most one registration exists per shop; re-registering replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookRegistration {
    /// PayPal webhook id; signature verification is checked against it.
    pub id: String,
    pub url: String,
    pub event_types: Vec<String>,
}

impl WebhookRegistration {
    pub fn new(id: impl Into<String>, url: impl Into<String>, event_types: Vec<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            event_types,
        }
    }

    /// Whether this registration delivers to the given URL.
    ///
    /// Trailing slashes are ignored.
    pub fn points_to(&self, url: &str) -> bool {
        self.url.trim_end_matches('/') == url.trim_end_matches('/')
    }

    pub fn subscribes_to(&self, event_type: &str) -> bool {
        self.event_types.iter().any(|t| t == event_type || t == "*")
    }
}
