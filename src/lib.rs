//! # Pipesim
//!
//! A deterministic discrete-event fault-injection simulator of a four-tier
//! request pipeline: a request generator, a routing orchestrator, a
//! fast-but-unreliable store, and a slower store with bounded concurrency.
//!
//! The core pieces:
//! - a virtual-time scheduler ([`SimWorld`]) that advances a logical clock by
//!   processing timer events in deterministic order,
//! - suspendable request tasks driven cooperatively on a current-thread
//!   runtime,
//! - an await-first [`race`](race::race) between an in-flight store operation
//!   and a response deadline, where losers are abandoned rather than
//!   cancelled,
//! - a FIFO-fair [`ResourcePool`] bounding the slow tier's concurrency.
//!
//! Outcomes depend on per-tier failure probabilities, per-operation latency,
//! the fast→slow fallback chain and the response timeout. Identical
//! configuration and seed reproduce identical outcome logs.
//!
//! ## Example
//!
//! ```rust
//! use pipesim::{run, SimulationConfig};
//!
//! let mut config = SimulationConfig::default();
//! config.seed = 42;
//! config.generator.request_count = 20;
//!
//! let (outcomes, summary) = run(&config).expect("simulation run");
//! assert_eq!(outcomes.len(), 20);
//! assert_eq!(summary.success_count + summary.error_count, 20);
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]

/// Assertion macros and result tracking for simulation testing.
pub mod assertions;
/// Configuration consumed by the simulation core.
pub mod config;
/// Error types and utilities for simulation operations.
pub mod error;
/// Event scheduling and processing for the simulation engine.
pub mod events;
/// Request stream generation and outcome recording.
pub mod generator;
/// Aggregation of the outcome log into a run summary.
pub mod metrics;
/// Per-request routing across the two storage tiers.
pub mod orchestrator;
/// Bounded-concurrency slot allocation with FIFO fairness.
pub mod pool;
/// Await-first racing with abandon semantics.
pub mod race;
/// Request and outcome types.
pub mod request;
/// Thread-local random number generation for simulation.
pub mod rng;
/// Simulation entry point and cooperative driver.
pub mod runner;
/// Core simulation world and virtual-time coordination.
pub mod sim;
/// Sleep functionality for simulation time.
pub mod sleep;
/// The fast and slow storage tiers.
pub mod store;

// Public API exports
pub use assertions::{
    get_assertion_results, reset_assertion_results, validate_assertion_contracts, AssertionStats,
};
pub use config::{
    ArrivalProcess, FastStoreConfig, GeneratorConfig, OrchestratorConfig, SimulationConfig,
    SlowStoreConfig,
};
pub use error::{SimulationError, SimulationResult};
pub use events::{Event, EventQueue, ScheduledEvent};
pub use generator::{OutcomeLog, RequestGenerator};
pub use metrics::{summarize, RunSummary};
pub use orchestrator::Orchestrator;
pub use pool::{Acquire, PoolPermit, ResourcePool};
pub use race::{race, AbandonedOperation, RaceWinner};
pub use request::{ErrorReason, Outcome, OutcomeStatus, Request, RequestId, RequestKind};
pub use rng::{
    get_current_sim_seed, reset_sim_rng, set_sim_seed, sim_random, sim_random_bool,
    sim_random_range, sim_random_range_or_default,
};
pub use runner::{drive, run, run_with_seed};
pub use sim::{SimWorld, WeakSimWorld};
pub use sleep::SleepFuture;
pub use store::{FastStore, SlowStore, StoreError, StoreTier};
