//! Error types and utilities for simulation operations.

use thiserror::Error;

/// Errors raised by the simulation infrastructure itself.
///
/// These are distinct from the modeled faults (see
/// [`StoreError`](crate::store::StoreError)): a `SimulationError` means the
/// run can no longer proceed, not that a simulated request failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimulationError {
    /// The simulation world was dropped while a task still referenced it.
    #[error("Simulation has been shut down")]
    SimulationShutdown,
    /// The simulation is in an invalid state.
    #[error("Invalid simulation state: {0}")]
    InvalidState(String),
    /// A configuration value is outside its documented range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// A type alias for `Result<T, SimulationError>`.
pub type SimulationResult<T> = Result<T, SimulationError>;
