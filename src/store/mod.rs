//! The two storage tiers and their shared fault taxonomy.

use std::fmt;

use thiserror::Error;

use crate::error::SimulationError;

mod fast;
mod slow;

pub use fast::FastStore;
pub use slow::SlowStore;

/// Which tier an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreTier {
    /// The instantaneous, unreliable cache tier.
    Fast,
    /// The delayed, concurrency-bounded tier.
    Slow,
}

impl fmt::Display for StoreTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreTier::Fast => write!(f, "fast"),
            StoreTier::Slow => write!(f, "slow"),
        }
    }
}

/// Failure surfaced by a store operation.
///
/// Every operation terminates in exactly one of success, `ServiceFailure`, or
/// (reads only) `NotFound`; operations never vanish silently. `Simulation`
/// is the infrastructure escape hatch for a world torn down mid-operation and
/// is not part of the modeled fault space.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store's fault model rolled a failure for this operation.
    #[error("{0} store failed")]
    ServiceFailure(StoreTier),
    /// No record exists for the requested id at this store.
    #[error("{0} store has no record for the requested id")]
    NotFound(StoreTier),
    /// The simulation world went away while the operation was in flight.
    #[error(transparent)]
    Simulation(#[from] SimulationError),
}
