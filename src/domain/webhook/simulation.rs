//! Webhook simulation session.
//!
//! A simulation asks PayPal to send a synthetic event to the registered
//! webhook URL and waits for it to come back through the processor.
//!
//! ```text
//! IDLE --start--> WAITING --receive(expected id)--> RECEIVED
//! ```
//!
//! The session only moves forward. A non-matching or late event leaves it
//! untouched. Staleness is reported by [`SimulationSession::status`], it
//! never rewrites the stored state.

use serde::{Deserialize, Serialize};

use super::WebhookEvent;
use crate::domain::foundation::{StateMachine, Timestamp};

/// Stored state of a simulation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulationState {
    Idle,
    Waiting,
    Received,
}

impl StateMachine for SimulationState {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SimulationState::*;
        matches!((self, target), (Idle, Waiting) | (Waiting, Received))
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SimulationState::*;
        match self {
            Idle => vec![Waiting],
            Waiting => vec![Received],
            Received => vec![],
        }
    }
}

/// Status reported to operators, including the derived timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationStatus {
    Idle,
    Waiting,
    Received,
    TimedOut,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationSession {
    pub event_type: String,
    pub event_version: String,
    pub expected_event_id: Option<String>,
    pub state: SimulationState,
    pub started_at: Option<Timestamp>,
    pub received_at: Option<Timestamp>,
}

impl SimulationSession {
    /// A session with no simulation in flight.
    pub fn idle() -> Self {
        Self {
            event_type: String::new(),
            event_version: String::new(),
            expected_event_id: None,
            state: SimulationState::Idle,
            started_at: None,
            received_at: None,
        }
    }

    /// Starts waiting for the event PayPal confirmed it dispatched.
    pub fn begin(
        event_type: impl Into<String>,
        event_version: impl Into<String>,
        expected_event_id: impl Into<String>,
        started_at: Timestamp,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            event_version: event_version.into(),
            expected_event_id: Some(expected_event_id.into()),
            state: SimulationState::Waiting,
            started_at: Some(started_at),
            received_at: None,
        }
    }

    /// True when the event is the one this session is waiting for.
    pub fn matches(&self, event: &WebhookEvent) -> bool {
        self.state == SimulationState::Waiting
            && self.expected_event_id.as_deref() == Some(event.id.as_str())
    }

    /// Records the expected event. Returns false without mutating otherwise.
    pub fn receive(&mut self, event: &WebhookEvent, at: Timestamp) -> bool {
        if !self.matches(event) {
            return false;
        }
        match self.state.transition_to(SimulationState::Received) {
            Ok(next) => {
                self.state = next;
                self.received_at = Some(at);
                true
            }
            Err(_) => false,
        }
    }

    /// Reports the session, treating a `Waiting` session older than
    /// `timeout_secs` as timed out.
    pub fn status(&self, now: Timestamp, timeout_secs: i64) -> SimulationStatus {
        match self.state {
            SimulationState::Idle => SimulationStatus::Idle,
            SimulationState::Received => SimulationStatus::Received,
            SimulationState::Waiting => match self.started_at {
                Some(started) if now.duration_since(&started).num_seconds() > timeout_secs => {
                    SimulationStatus::TimedOut
                }
                _ => SimulationStatus::Waiting,
            },
        }
    }
}

impl Default for SimulationSession {
    fn default() -> Self {
        Self::idle()
    }
}
