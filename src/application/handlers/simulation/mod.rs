//! Webhook delivery simulation.

mod simulation_service;

pub use simulation_service::{
    SimulationError, SimulationReport, SimulationService, DEFAULT_SIMULATION_EVENT_TYPE,
    DEFAULT_SIMULATION_EVENT_VERSION,
};
