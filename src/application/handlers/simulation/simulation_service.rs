//! SimulationService - round-trips a synthetic PayPal event to confirm the
//! registered webhook URL actually receives deliveries.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::domain::foundation::{DomainError, Timestamp};
use crate::domain::webhook::{SimulationSession, SimulationStatus, WebhookEvent};
use crate::ports::{GatewayError, PayPalGateway, SimulationStore, WebhookRegistrationStore};

pub const DEFAULT_SIMULATION_EVENT_TYPE: &str = "PAYMENT.AUTHORIZATION.CREATED";
pub const DEFAULT_SIMULATION_EVENT_VERSION: &str = "1.0";

#[derive(Debug, Error)]
pub enum SimulationError {
    /// A simulation needs a registered webhook to send to.
    #[error("No webhook registered")]
    WebhookNotRegistered,

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<DomainError> for SimulationError {
    fn from(err: DomainError) -> Self {
        SimulationError::Storage(err.to_string())
    }
}

/// Session plus the status derived from it at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulationReport {
    pub status: SimulationStatus,
    pub session: SimulationSession,
}

pub struct SimulationService {
    gateway: Arc<dyn PayPalGateway>,
    registrations: Arc<dyn WebhookRegistrationStore>,
    sessions: Arc<dyn SimulationStore>,
    timeout_secs: i64,
}

impl SimulationService {
    pub fn new(
        gateway: Arc<dyn PayPalGateway>,
        registrations: Arc<dyn WebhookRegistrationStore>,
        sessions: Arc<dyn SimulationStore>,
        timeout_secs: i64,
    ) -> Self {
        Self {
            gateway,
            registrations,
            sessions,
            timeout_secs,
        }
    }

    /// Asks PayPal to send a synthetic event and starts waiting for it.
    ///
    /// Replaces any previous session, finished or not.
    pub async fn start(
        &self,
        event_type: Option<&str>,
        event_version: Option<&str>,
    ) -> Result<SimulationSession, SimulationError> {
        let registration = self
            .registrations
            .load()
            .await?
            .ok_or(SimulationError::WebhookNotRegistered)?;

        let event_type = event_type.unwrap_or(DEFAULT_SIMULATION_EVENT_TYPE);
        let event_version = event_version.unwrap_or(DEFAULT_SIMULATION_EVENT_VERSION);

        let event = self
            .gateway
            .simulate_webhook(&registration.id, event_type, event_version)
            .await?;

        let session = SimulationSession::begin(event_type, event_version, event.id, Timestamp::now());
        self.sessions.save(&session).await?;

        tracing::info!(
            webhook_id = %registration.id,
            event_type,
            expected_event_id = session.expected_event_id.as_deref().unwrap_or("-"),
            "Webhook simulation started"
        );
        Ok(session)
    }

    /// True when the event is the one an active simulation is waiting for.
    ///
    /// Never fails: any lookup problem means "not a simulation event".
    pub async fn is_simulation_event(&self, event: &WebhookEvent) -> bool {
        match self.registrations.load().await {
            Ok(Some(_)) => {}
            Ok(None) => return false,
            Err(e) => {
                tracing::warn!(error = %e, "Could not load webhook registration");
                return false;
            }
        }

        match self.sessions.load().await {
            Ok(session) => session.matches(event),
            Err(e) => {
                tracing::warn!(error = %e, "Could not load simulation session");
                false
            }
        }
    }

    /// Marks the simulation received if `event` is the expected one.
    pub async fn receive(&self, event: &WebhookEvent) -> Result<bool, SimulationError> {
        let mut session = self.sessions.load().await?;
        if !session.receive(event, Timestamp::now()) {
            return Ok(false);
        }
        self.sessions.save(&session).await?;
        tracing::info!(event_id = %event.id, "Webhook simulation received");
        Ok(true)
    }

    pub async fn status(&self) -> Result<SimulationReport, SimulationError> {
        let session = self.sessions.load().await?;
        Ok(SimulationReport {
            status: session.status(Timestamp::now(), self.timeout_secs),
            session,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::paypal::MockPayPalGateway;
    use crate::adapters::storage::{InMemoryKeyValueStore, KvSimulationStore, KvWebhookRegistrationStore};
    use crate::domain::webhook::{SimulationState, WebhookEventBuilder, WebhookRegistration};
    use crate::ports::KeyValueStore;
    use proptest::prelude::*;

    struct Fixture {
        gateway: MockPayPalGateway,
        registrations: Arc<KvWebhookRegistrationStore>,
        service: SimulationService,
    }

    fn fixture_with_timeout(timeout_secs: i64) -> Fixture {
        let kv: Arc<dyn KeyValueStore> = Arc::new(InMemoryKeyValueStore::new());
        let gateway = MockPayPalGateway::new();
        let registrations = Arc::new(KvWebhookRegistrationStore::new(kv.clone()));
        let service = SimulationService::new(
            Arc::new(gateway.clone()),
            registrations.clone(),
            Arc::new(KvSimulationStore::new(kv)),
            timeout_secs,
        );
        Fixture {
            gateway,
            registrations,
            service,
        }
    }

    fn fixture() -> Fixture {
        fixture_with_timeout(600)
    }

    async fn register(f: &Fixture) {
        let registration =
            WebhookRegistration::new("WH-MOCK-0", "https://shop.test/webhooks/paypal", vec![]);
        f.gateway.add_webhook(registration.clone());
        f.registrations.save(&registration).await.unwrap();
    }

    fn event_with_id(id: &str) -> WebhookEvent {
        WebhookEventBuilder::new()
            .id(id)
            .event_type(DEFAULT_SIMULATION_EVENT_TYPE)
            .build()
    }

    #[tokio::test]
    async fn start_without_registration_fails() {
        let f = fixture();

        let result = f.service.start(None, None).await;

        assert!(matches!(result, Err(SimulationError::WebhookNotRegistered)));
        assert!(!f.gateway.was_called("simulate_webhook"));
    }

    #[tokio::test]
    async fn start_waits_for_simulated_event_id() {
        let f = fixture();
        register(&f).await;

        let session = f.service.start(None, None).await.unwrap();

        assert_eq!(session.state, SimulationState::Waiting);
        assert_eq!(session.event_type, DEFAULT_SIMULATION_EVENT_TYPE);
        assert_eq!(session.expected_event_id.as_deref(), Some("WH-SIM-1"));
        assert_eq!(f.service.status().await.unwrap().status, SimulationStatus::Waiting);
    }

    #[tokio::test]
    async fn walks_idle_waiting_received_and_stays_received() {
        let f = fixture();
        register(&f).await;
        assert_eq!(f.service.status().await.unwrap().status, SimulationStatus::Idle);

        f.service.start(None, None).await.unwrap();

        assert!(!f.service.receive(&event_with_id("WH-OTHER")).await.unwrap());
        assert_eq!(f.service.status().await.unwrap().status, SimulationStatus::Waiting);

        assert!(f.service.receive(&event_with_id("WH-SIM-1")).await.unwrap());
        assert_eq!(f.service.status().await.unwrap().status, SimulationStatus::Received);

        assert!(!f.service.receive(&event_with_id("WH-SIM-1")).await.unwrap());
        assert_eq!(f.service.status().await.unwrap().status, SimulationStatus::Received);
    }

    #[tokio::test]
    async fn is_simulation_event_is_false_without_registration() {
        let f = fixture();
        register(&f).await;
        f.service.start(None, None).await.unwrap();
        f.registrations.clear().await.unwrap();

        assert!(!f.service.is_simulation_event(&event_with_id("WH-SIM-1")).await);
    }

    #[tokio::test]
    async fn is_simulation_event_matches_only_expected_id() {
        let f = fixture();
        register(&f).await;
        assert!(!f.service.is_simulation_event(&event_with_id("WH-SIM-1")).await);

        f.service.start(None, None).await.unwrap();

        assert!(f.service.is_simulation_event(&event_with_id("WH-SIM-1")).await);
        assert!(!f.service.is_simulation_event(&event_with_id("WH-SIM-2")).await);
    }

    #[tokio::test]
    async fn stale_waiting_session_reports_timed_out() {
        let f = fixture_with_timeout(-1);
        register(&f).await;

        f.service.start(None, None).await.unwrap();

        let report = f.service.status().await.unwrap();
        assert_eq!(report.status, SimulationStatus::TimedOut);
        assert_eq!(report.session.state, SimulationState::Waiting);
    }

    proptest! {
        #[test]
        fn unexpected_ids_never_complete_the_session(ids in prop::collection::vec("[A-Z0-9-]{1,12}", 0..8)) {
            let runtime = tokio::runtime::Runtime::new().unwrap();
            runtime.block_on(async {
                let f = fixture();
                register(&f).await;
                f.service.start(None, None).await.unwrap();

                for id in ids.iter().filter(|id| id.as_str() != "WH-SIM-1") {
                    assert!(!f.service.receive(&event_with_id(id)).await.unwrap());
                }
                assert_eq!(f.service.status().await.unwrap().status, SimulationStatus::Waiting);
                assert!(f.service.receive(&event_with_id("WH-SIM-1")).await.unwrap());
            });
        }
    }
}
