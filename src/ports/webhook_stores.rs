//! Single-record stores for the webhook registration and simulation session.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::domain::webhook::{SimulationSession, WebhookRegistration};

/// Holds the shop's one webhook registration.
#[async_trait]
pub trait WebhookRegistrationStore: Send + Sync {
    async fn load(&self) -> Result<Option<WebhookRegistration>, DomainError>;

    /// Replaces the stored registration.
    async fn save(&self, registration: &WebhookRegistration) -> Result<(), DomainError>;

    async fn clear(&self) -> Result<(), DomainError>;
}

/// Holds the current simulation session.
#[async_trait]
pub trait SimulationStore: Send + Sync {
    /// Returns the stored session, or an idle one when none exists.
    async fn load(&self) -> Result<SimulationSession, DomainError>;

    async fn save(&self, session: &SimulationSession) -> Result<(), DomainError>;
}
