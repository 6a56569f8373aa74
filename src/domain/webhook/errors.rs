//! Webhook error types for PayPal webhook handling.
//!
//! Defines all error conditions that can occur during webhook processing,
//! with HTTP status code mapping and retryability semantics.

use axum::http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::DomainError;

/// Errors that occur during webhook processing.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// PayPal reported the signature as invalid.
    #[error("Invalid signature")]
    InvalidSignature,

    /// A PayPal transmission header is absent.
    #[error("Missing header: {0}")]
    MissingHeader(&'static str),

    /// No webhook is registered, so there is nothing to verify against.
    #[error("No webhook registered")]
    NotRegistered,

    /// The verification call itself could not be completed.
    #[error("Signature verification unavailable: {0}")]
    VerificationUnavailable(String),

    /// Failed to parse webhook payload.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Required field missing from the event resource.
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// Event was intentionally ignored (not an error condition).
    #[error("Event ignored: {0}")]
    Ignored(String),

    /// A handler failed while applying the event.
    #[error("Handler error: {0}")]
    Handler(String),

    /// Storage operation failed (dedup store, registration record).
    #[error("Storage error: {0}")]
    Storage(String),
}

impl WebhookError {
    /// Returns true if PayPal should retry delivering this webhook.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WebhookError::Storage(_) | WebhookError::VerificationUnavailable(_)
        )
    }

    /// Maps the error to an appropriate HTTP status code.
    ///
    /// Status codes determine PayPal's retry behavior:
    /// - 2xx: Event acknowledged, no retry
    /// - 4xx/5xx: PayPal retries with backoff
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::InvalidSignature | WebhookError::NotRegistered => {
                StatusCode::UNAUTHORIZED
            }

            WebhookError::MissingHeader(_)
            | WebhookError::ParseError(_)
            | WebhookError::MissingField(_) => StatusCode::BAD_REQUEST,

            WebhookError::Ignored(_) => StatusCode::OK,

            WebhookError::VerificationUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,

            WebhookError::Handler(_) | WebhookError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<DomainError> for WebhookError {
    fn from(err: DomainError) -> Self {
        WebhookError::Storage(err.to_string())
    }
}
